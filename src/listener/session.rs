//! SMPP session state machine.
//!
//! Handles the SMSC side of one ESME connection: bind authentication,
//! submit_sm acknowledgement and the deferred delivery receipts.

use chrono::Local;
use futures::{SinkExt, StreamExt};
use rusmpp::pdus::{SubmitSm, SubmitSmResp};
use rusmpp::types::COctetString;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn, Instrument, Span};

use crate::bootstrap::{SharedSimulatorState, ShutdownState};
use crate::protocol::{
    CodecError, Command, CommandId, CommandParts, CommandStatus, Frame, Pdu, SmppCodec,
};
use crate::simulator::PendingDelivery;

use super::connection::{BindKind, ConnectionId, SessionState};

/// Session error types.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SMPP codec error: {0}")]
    Codec(#[from] CodecError),
}

/// SMPP session handler.
pub struct SmppSession<T> {
    /// Connection ID
    id: ConnectionId,

    /// Framed transport
    framed: Framed<T, SmppCodec>,

    /// Protocol state
    state: SessionState,

    /// System ID (set after bind)
    system_id: Option<String>,

    /// Shared simulator state
    simulator: SharedSimulatorState,

    /// Outstanding delivery timers
    deliveries: JoinSet<()>,

    /// Receipts ready to be written, fed by the delivery timers
    outbound_tx: mpsc::UnboundedSender<Command>,
    outbound_rx: mpsc::UnboundedReceiver<Command>,

    /// Server shutdown signal
    shutdown: watch::Receiver<ShutdownState>,
}

impl<T> SmppSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new session over an accepted transport.
    pub fn new(
        id: ConnectionId,
        stream: T,
        simulator: SharedSimulatorState,
        shutdown: watch::Receiver<ShutdownState>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            id,
            framed: Framed::new(stream, SmppCodec::new()),
            state: SessionState::Connected,
            system_id: None,
            simulator,
            deliveries: JoinSet::new(),
            outbound_tx,
            outbound_rx,
            shutdown,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session until the connection closes.
    ///
    /// Pending delivery timers are cancelled however the session ends.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let result = self.run_loop().await;
        self.teardown();
        result
    }

    /// Main session loop.
    async fn run_loop(&mut self) -> Result<(), SessionError> {
        while self.state != SessionState::Closed {
            tokio::select! {
                biased;

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() != ShutdownState::Running {
                        info!("server shutting down, closing session");
                        break;
                    }
                }

                Some(deliver_sm) = self.outbound_rx.recv() => {
                    self.write_receipt(deliver_sm).await;
                }

                frame = self.framed.next() => {
                    match frame {
                        Some(Ok(Frame::Command(command))) => {
                            self.handle_command(command).await?;
                        }
                        Some(Ok(Frame::Malformed { id, sequence_number, error })) => {
                            warn!(
                                command = ?id,
                                sequence = sequence_number,
                                error = %error,
                                "malformed PDU body"
                            );
                            self.simulator.stats.malformed_pdu();
                            self.send_nack(sequence_number, CommandStatus::EsmeRinvcmdlen).await?;
                        }
                        // Framing is lost, the stream cannot be resynchronised.
                        Some(Err(e)) => {
                            warn!(error = %e, "decode error");
                            return Err(e.into());
                        }
                        None => {
                            debug!("connection closed by peer");
                            break;
                        }
                    }
                }

                Some(joined) = self.deliveries.join_next(), if !self.deliveries.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "delivery task panicked");
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle an incoming command.
    async fn handle_command(&mut self, command: Command) -> Result<(), SessionError> {
        let CommandParts {
            id,
            status,
            sequence_number,
            pdu,
        } = command.into_parts();

        if id.is_response() {
            self.handle_response(id, status, sequence_number);
            return Ok(());
        }

        match pdu {
            Some(Pdu::BindTransmitter(bind)) => {
                self.handle_bind(
                    sequence_number,
                    BindKind::Transmitter,
                    bind.system_id.as_str(),
                    bind.password.as_str(),
                )
                .await
            }
            Some(Pdu::BindReceiver(bind)) => {
                self.handle_bind(
                    sequence_number,
                    BindKind::Receiver,
                    bind.system_id.as_str(),
                    bind.password.as_str(),
                )
                .await
            }
            Some(Pdu::BindTransceiver(bind)) => {
                self.handle_bind(
                    sequence_number,
                    BindKind::Transceiver,
                    bind.system_id.as_str(),
                    bind.password.as_str(),
                )
                .await
            }

            Some(Pdu::SubmitSm(submit)) => self.handle_submit_sm(sequence_number, submit).await,

            Some(Pdu::Unbind) => {
                if !self.state.is_bound() {
                    return self
                        .send_nack(sequence_number, CommandStatus::EsmeRinvbndsts)
                        .await;
                }
                self.handle_unbind(sequence_number).await
            }

            // Answered in any state.
            Some(Pdu::EnquireLink) => {
                trace!("enquire_link request");
                self.send_command(Command::new(
                    CommandStatus::EsmeRok,
                    sequence_number,
                    Pdu::EnquireLinkResp,
                ))
                .await
            }

            // Known command whose body is missing or has trailing bytes.
            None if matches!(
                id,
                CommandId::BindTransmitter
                    | CommandId::BindReceiver
                    | CommandId::BindTransceiver
                    | CommandId::SubmitSm
                    | CommandId::Unbind
                    | CommandId::EnquireLink
            ) =>
            {
                warn!(command = ?id, sequence = sequence_number, "unexpected PDU body length");
                self.simulator.stats.malformed_pdu();
                self.send_nack(sequence_number, CommandStatus::EsmeRinvcmdlen)
                    .await
            }

            _ => {
                warn!(command = ?id, "unsupported command");
                self.send_nack(sequence_number, CommandStatus::EsmeRinvcmdid)
                    .await
            }
        }
    }

    /// Responses from the ESME only need logging.
    fn handle_response(&self, id: CommandId, status: CommandStatus, sequence_number: u32) {
        match id {
            CommandId::DeliverSmResp if status == CommandStatus::EsmeRok => {
                debug!(sequence = sequence_number, "deliver_sm_resp received");
            }
            CommandId::DeliverSmResp => {
                warn!(
                    sequence = sequence_number,
                    status = ?status,
                    "deliver_sm rejected by client"
                );
            }
            CommandId::GenericNack => {
                warn!(sequence = sequence_number, status = ?status, "received generic_nack");
            }
            other => debug!(command = ?other, "ignoring unsolicited response"),
        }
    }

    /// Handle a bind request of any kind.
    async fn handle_bind(
        &mut self,
        sequence_number: u32,
        kind: BindKind,
        system_id: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Connected {
            warn!(
                bind_type = kind.name(),
                state = %self.state,
                "bind on an already bound session"
            );
            return self
                .send_nack(sequence_number, CommandStatus::EsmeRalybnd)
                .await;
        }

        info!(system_id, bind_type = kind.name(), "bind request");

        // The loop does not poll the transport again until this resolves.
        self.set_state(SessionState::Authenticating);
        let granted = self.simulator.credentials.authenticate(system_id, password);
        self.simulator.stats.bind(granted);

        let resp = kind.response(self.simulator.system_id.clone());

        if !granted {
            warn!(system_id, bind_type = kind.name(), "bind rejected");
            self.send_command(Command::new(CommandStatus::EsmeRbindfail, sequence_number, resp))
                .await?;
            self.set_state(SessionState::Closed);
            return Ok(());
        }

        self.send_command(Command::new(CommandStatus::EsmeRok, sequence_number, resp))
            .await?;

        self.system_id = Some(system_id.to_string());
        self.set_state(kind.bound_state());
        info!(system_id, bind_type = kind.name(), "bound");

        Ok(())
    }

    /// Handle unbind request.
    async fn handle_unbind(&mut self, sequence_number: u32) -> Result<(), SessionError> {
        info!(system_id = self.system_id.as_deref().unwrap_or_default(), "unbind request");

        self.send_command(Command::new(
            CommandStatus::EsmeRok,
            sequence_number,
            Pdu::UnbindResp,
        ))
        .await?;

        self.set_state(SessionState::Closed);

        Ok(())
    }

    /// Handle submit_sm request.
    ///
    /// Acknowledges immediately and, for sessions that receive, schedules the
    /// delivery receipt.
    async fn handle_submit_sm(
        &mut self,
        sequence_number: u32,
        submit: SubmitSm,
    ) -> Result<(), SessionError> {
        if !self.state.can_send() {
            debug!(state = %self.state, "submit_sm outside transmit bind");
            return self
                .send_nack(sequence_number, CommandStatus::EsmeRinvbndsts)
                .await;
        }

        let submitted_at = Local::now();
        let message_id = self.simulator.message_ids.next(&submitted_at);

        debug!(
            message_id = %message_id,
            source = submit.source_addr.as_str(),
            dest = submit.destination_addr.as_str(),
            sequence = sequence_number,
            "submit_sm request"
        );

        let Ok(wire_id) = message_id.parse::<COctetString<1, 65>>() else {
            warn!(message_id = %message_id, "message id not encodable");
            return self
                .send_nack(sequence_number, CommandStatus::EsmeRsyserr)
                .await;
        };

        self.send_command(Command::new(
            CommandStatus::EsmeRok,
            sequence_number,
            SubmitSmResp::new(wire_id, Vec::new()),
        ))
        .await?;
        self.simulator.stats.message_submitted();

        if !self.state.can_receive() {
            trace!(message_id = %message_id, "transmitter bind, no receipt scheduled");
            return Ok(());
        }

        let pending = PendingDelivery::new(message_id, submitted_at, sequence_number, &submit);
        self.schedule_delivery(pending);

        Ok(())
    }

    /// Spawn the timer that reports `pending` after a sampled delay.
    fn schedule_delivery(&mut self, pending: PendingDelivery) {
        let delay = self.simulator.delay.sample();
        let simulator = self.simulator.clone();
        let outbound = self.outbound_tx.clone();

        trace!(
            message_id = %pending.message_id,
            delay_ms = delay.as_millis() as u64,
            "delivery scheduled"
        );

        self.deliveries.spawn(
            async move {
                tokio::time::sleep(delay).await;

                let outcome = simulator.statuses.next();
                let message_id = pending.message_id.clone();
                let deliver_sm = pending.into_deliver_sm(&outcome, &Local::now());

                if outbound.send(deliver_sm).is_err() {
                    debug!(message_id = %message_id, "session closed before receipt");
                    return;
                }
                debug!(message_id = %message_id, outcome = outcome.name, "delivery receipt ready");
            }
            .instrument(Span::current()),
        );
    }

    /// Write a delivery receipt produced by a timer. Failures are dropped.
    async fn write_receipt(&mut self, deliver_sm: Command) {
        let sequence = deliver_sm.sequence_number();
        match self.send_command(deliver_sm).await {
            Ok(()) => self.simulator.stats.receipt_sent(),
            Err(e) => warn!(sequence, error = %e, "failed to send deliver_sm"),
        }
    }

    /// Send a generic_nack.
    async fn send_nack(
        &mut self,
        sequence_number: u32,
        status: CommandStatus,
    ) -> Result<(), SessionError> {
        self.send_command(Command::new(status, sequence_number, Pdu::GenericNack))
            .await
    }

    /// Send a command.
    async fn send_command(&mut self, command: Command) -> Result<(), SessionError> {
        trace!(command = ?command.id(), sequence = command.sequence_number(), "sending");
        self.framed.send(command).await?;
        Ok(())
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(id = %self.id, from = %self.state, to = %state, "state transition");
        self.state = state;
    }

    /// Cancel outstanding timers and mark the session closed.
    fn teardown(&mut self) {
        let cancelled = self.deliveries.len();
        self.deliveries.abort_all();
        self.outbound_rx.close();

        if cancelled > 0 {
            debug!(cancelled, "pending deliveries cancelled");
            self.simulator.stats.receipts_cancelled(cancelled as u64);
        }

        if self.state != SessionState::Closed {
            self.set_state(SessionState::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use rusmpp::pdus::{BindReceiver, BindTransceiver, BindTransmitter, DeliverSmResp, QuerySm};
    use rusmpp::types::OctetString;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio::task::JoinHandle;

    use crate::bootstrap::{Shutdown, SimulatorState};
    use crate::protocol::{is_delivery_receipt, MessageText};
    use crate::simulator::{
        Credentials, DelaySampler, InMemoryCredentialStore, StatusSelector,
    };

    struct Harness {
        client: Framed<DuplexStream, SmppCodec>,
        session: JoinHandle<Result<(), SessionError>>,
        shutdown: Arc<Shutdown>,
        simulator: SharedSimulatorState,
    }

    fn simulator(statuses: &[&str], delay: DelaySampler) -> SharedSimulatorState {
        let credentials: InMemoryCredentialStore =
            [Credentials::new("user", "pass")].into_iter().collect();
        Arc::new(SimulatorState::new(
            credentials,
            StatusSelector::from_names(statuses).unwrap(),
            delay,
            "smsc".parse().unwrap(),
        ))
    }

    fn start(simulator: SharedSimulatorState) -> Harness {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let shutdown = Shutdown::new(Duration::from_secs(1));
        let session = SmppSession::new(
            ConnectionId(1),
            server,
            simulator.clone(),
            shutdown.subscribe(),
        );
        Harness {
            client: Framed::new(client, SmppCodec::new()),
            session: tokio::spawn(session.run()),
            shutdown,
            simulator,
        }
    }

    fn bind_transceiver(password: &str) -> BindTransceiver {
        BindTransceiver::builder()
            .system_id("user".parse().unwrap())
            .password(password.parse().unwrap())
            .build()
    }

    /// submit_sm whose source_addr is never NUL-terminated.
    fn malformed_submit_sm(sequence: u32) -> Vec<u8> {
        let body = b"\0\x01\x01no-terminator";
        let mut wire = Vec::new();
        wire.extend_from_slice(&(16 + body.len() as u32).to_be_bytes());
        wire.extend_from_slice(&0x0000_0004u32.to_be_bytes());
        wire.extend_from_slice(&0u32.to_be_bytes());
        wire.extend_from_slice(&sequence.to_be_bytes());
        wire.extend_from_slice(body);
        wire
    }

    impl Harness {
        async fn send(&mut self, sequence: u32, pdu: impl Into<Pdu>) {
            self.client
                .send(Command::new(CommandStatus::EsmeRok, sequence, pdu))
                .await
                .unwrap();
        }

        async fn recv(&mut self) -> Command {
            let frame = tokio::time::timeout(Duration::from_secs(2), self.client.next())
                .await
                .expect("timed out waiting for PDU")
                .expect("stream closed")
                .unwrap();
            match frame {
                Frame::Command(command) => command,
                Frame::Malformed { error, .. } => panic!("malformed PDU from session: {}", error),
            }
        }

        async fn bind(&mut self, pdu: impl Into<Pdu>) -> Command {
            self.send(1, pdu).await;
            self.recv().await
        }

        async fn bind_trx(&mut self) {
            let resp = self.bind(bind_transceiver("pass")).await;
            assert_eq!(resp.status(), CommandStatus::EsmeRok);
        }

        async fn submit(&mut self, sequence: u32, text: &'static str) -> Command {
            let submit = SubmitSm::builder()
                .source_addr("1234".parse().unwrap())
                .destination_addr("5678".parse().unwrap())
                .short_message(OctetString::from_static_slice(text.as_bytes()).unwrap())
                .build();
            self.send(sequence, submit).await;
            self.recv().await
        }
    }

    fn receipt_text(command: &Command) -> String {
        match command.pdu() {
            Some(Pdu::DeliverSm(body)) => body.text(),
            other => panic!("expected deliver_sm, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bind_transceiver_success() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));

        let resp = h.bind(bind_transceiver("pass")).await;

        assert_eq!(resp.id(), CommandId::BindTransceiverResp);
        assert_eq!(resp.sequence_number(), 1);
        assert_eq!(resp.status(), CommandStatus::EsmeRok);
        match resp.pdu() {
            Some(Pdu::BindTransceiverResp(body)) => assert_eq!(body.system_id.as_str(), "smsc"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(h.simulator.stats.snapshot().binds_accepted, 1);
    }

    #[tokio::test]
    async fn test_bind_failure_closes_session() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));

        let resp = h.bind(bind_transceiver("nope")).await;
        assert_eq!(resp.id(), CommandId::BindTransceiverResp);
        assert_eq!(resp.status(), CommandStatus::EsmeRbindfail);

        // Session ends on its own and the client sees EOF.
        h.session.await.unwrap().unwrap();
        assert!(h.client.next().await.is_none());
        assert_eq!(h.simulator.stats.snapshot().binds_rejected, 1);
    }

    #[tokio::test]
    async fn test_submit_before_bind_is_nacked() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));

        let resp = h.submit(7, "hi").await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.sequence_number(), 7);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvbndsts);

        h.send(8, Pdu::Unbind).await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvbndsts);
    }

    #[tokio::test]
    async fn test_enquire_link_before_bind() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));

        h.send(3, Pdu::EnquireLink).await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::EnquireLinkResp);
        assert_eq!(resp.sequence_number(), 3);
        assert_eq!(resp.status(), CommandStatus::EsmeRok);
    }

    #[tokio::test]
    async fn test_submit_then_receipt() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        h.bind_trx().await;

        let resp = h.submit(2, "Hello World, this is a test").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);
        assert_eq!(resp.sequence_number(), 2);
        let Some(Pdu::SubmitSmResp(submit_resp)) = resp.pdu() else {
            panic!("expected submit_sm_resp");
        };
        let message_id = submit_resp.message_id().as_str().to_string();

        let receipt = h.recv().await;
        assert_eq!(receipt.id(), CommandId::DeliverSm);
        assert_eq!(receipt.sequence_number(), 2);

        let text = receipt_text(&receipt);
        assert!(text.starts_with(&format!("id:{} sub:001 dlvrd:1 ", message_id)));
        assert!(text.contains("stat:DELIVRD err:0 text:Hello World, this is"));

        let Some(Pdu::DeliverSm(body)) = receipt.pdu() else {
            unreachable!()
        };
        assert!(is_delivery_receipt(body.esm_class));
        assert_eq!(body.source_addr.as_str(), "1234");
        assert_eq!(body.destination_addr.as_str(), "5678");

        h.send(2, DeliverSmResp::default()).await;

        // The resp is consumed silently; the link stays up.
        h.send(3, Pdu::EnquireLink).await;
        assert_eq!(h.recv().await.id(), CommandId::EnquireLinkResp);

        let stats = h.simulator.stats.snapshot();
        assert_eq!((stats.messages_submitted, stats.receipts_sent), (1, 1));
    }

    #[tokio::test]
    async fn test_outcomes_rotate() {
        let mut h = start(simulator(
            &["delivered", "expired"],
            DelaySampler::default(),
        ));
        h.bind_trx().await;

        let mut stats = Vec::new();
        for seq in 2..6 {
            let resp = h.submit(seq, "x").await;
            assert_eq!(resp.id(), CommandId::SubmitSmResp);
            let receipt = h.recv().await;
            let text = receipt_text(&receipt);
            let stat = text
                .split_whitespace()
                .find_map(|field| field.strip_prefix("stat:"))
                .unwrap()
                .to_string();
            stats.push(stat);
        }

        assert_eq!(stats, vec!["DELIVRD", "EXPIRED", "DELIVRD", "EXPIRED"]);
    }

    #[tokio::test]
    async fn test_transmitter_gets_no_receipt() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        let resp = h
            .bind(
                BindTransmitter::builder()
                    .system_id("user".parse().unwrap())
                    .password("pass".parse().unwrap())
                    .build(),
            )
            .await;
        assert_eq!(resp.id(), CommandId::BindTransmitterResp);
        assert_eq!(resp.status(), CommandStatus::EsmeRok);

        let resp = h.submit(2, "x").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);

        // The next PDU is the enquire_link_resp, not a receipt.
        h.send(3, Pdu::EnquireLink).await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::EnquireLinkResp);
    }

    #[tokio::test]
    async fn test_receiver_cannot_submit() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        let resp = h
            .bind(
                BindReceiver::builder()
                    .system_id("user".parse().unwrap())
                    .password("pass".parse().unwrap())
                    .build(),
            )
            .await;
        assert_eq!(resp.id(), CommandId::BindReceiverResp);

        let resp = h.submit(2, "x").await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvbndsts);
    }

    #[tokio::test]
    async fn test_second_bind_is_nacked() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        h.bind_trx().await;

        h.send(
            4,
            BindTransmitter::builder()
                .system_id("user".parse().unwrap())
                .password("pass".parse().unwrap())
                .build(),
        )
        .await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.sequence_number(), 4);
        assert_eq!(resp.status(), CommandStatus::EsmeRalybnd);
    }

    #[tokio::test]
    async fn test_unknown_command_is_nacked() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        h.bind_trx().await;

        h.send(9, QuerySm::default()).await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.sequence_number(), 9);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvcmdid);
    }

    #[tokio::test]
    async fn test_malformed_submit_keeps_session() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));
        h.bind_trx().await;

        h.client
            .get_mut()
            .write_all(&malformed_submit_sm(5))
            .await
            .unwrap();
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.sequence_number(), 5);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvcmdlen);

        // Still bound and still answering.
        h.send(6, Pdu::EnquireLink).await;
        assert_eq!(h.recv().await.id(), CommandId::EnquireLinkResp);
        let resp = h.submit(7, "after").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);
        assert_eq!(h.recv().await.id(), CommandId::DeliverSm);

        assert_eq!(h.simulator.stats.snapshot().malformed_pdus, 1);
        assert!(!h.session.is_finished());
    }

    #[tokio::test]
    async fn test_empty_bind_body_is_nacked() {
        let mut h = start(simulator(&["delivered"], DelaySampler::default()));

        // bind_transceiver with a bare header
        let mut wire = Vec::new();
        for word in [16u32, 0x0000_0009, 0, 4] {
            wire.extend_from_slice(&word.to_be_bytes());
        }
        h.client.get_mut().write_all(&wire).await.unwrap();

        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::GenericNack);
        assert_eq!(resp.sequence_number(), 4);
        assert_eq!(resp.status(), CommandStatus::EsmeRinvcmdlen);

        // Still unbound, so a proper bind goes through.
        h.bind_trx().await;
    }

    #[tokio::test]
    async fn test_unbind_cancels_pending_receipts() {
        let mut h = start(simulator(
            &["delivered"],
            DelaySampler::fixed(Duration::from_millis(300)),
        ));
        h.bind_trx().await;

        let resp = h.submit(2, "late").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);

        h.send(3, Pdu::Unbind).await;
        let resp = h.recv().await;
        assert_eq!(resp.id(), CommandId::UnbindResp);
        assert_eq!(resp.status(), CommandStatus::EsmeRok);

        h.session.await.unwrap().unwrap();

        // No deliver_sm arrives after the unbind_resp.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(h.client.next().await.is_none());
        assert_eq!(h.simulator.stats.snapshot().receipts_cancelled, 1);
    }

    #[tokio::test]
    async fn test_peer_drop_cancels_pending_receipt() {
        let mut h = start(simulator(
            &["delivered"],
            DelaySampler::fixed(Duration::from_millis(200)),
        ));
        h.bind_trx().await;
        let resp = h.submit(2, "x").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);

        let Harness {
            client,
            session,
            simulator,
            ..
        } = h;
        drop(client);

        session.await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let stats = simulator.stats.snapshot();
        assert_eq!(stats.receipts_cancelled, 1);
        assert_eq!(stats.receipts_sent, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let mut h = start(simulator(
            &["delivered"],
            DelaySampler::fixed(Duration::from_secs(30)),
        ));
        h.bind_trx().await;
        let resp = h.submit(2, "x").await;
        assert_eq!(resp.id(), CommandId::SubmitSmResp);

        h.shutdown.start_drain();

        tokio::time::timeout(Duration::from_secs(1), h.session)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_frame_length_ends_session() {
        let (mut client, server) = tokio::io::duplex(1024);
        let shutdown = Shutdown::new(Duration::from_secs(1));
        let session = SmppSession::new(
            ConnectionId(2),
            server,
            simulator(&["delivered"], DelaySampler::default()),
            shutdown.subscribe(),
        );
        let handle = tokio::spawn(session.run());

        // command_length of 8 is below the header size
        client.write_all(&[0, 0, 0, 8, 0, 0, 0, 0x15]).await.unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(
            result,
            Err(SessionError::Codec(CodecError::InvalidLength(8)))
        ));
    }
}
