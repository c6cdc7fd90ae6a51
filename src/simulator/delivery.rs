//! Deferred delivery receipts.

use bytes::Bytes;
use chrono::{DateTime, Local};
use rusmpp::pdus::{DeliverSm, SubmitSm};
use rusmpp::tlvs::MessageDeliveryRequestTlvValue;
use rusmpp::types::{AnyOctetString, COctetString, OctetString};
use rusmpp::values::{EsmClass, MessagePayload, Npi, Ton};
use rusmpp::{Command, CommandStatus};

use crate::protocol::{MessageText, DELIVERY_RECEIPT_ESM_CLASS};

use super::catalog::OutcomeStatus;
use super::receipt::{ReceiptFormatter, RECEIPT_TEXT_CHARS};

/// What a delivery timer needs to answer one submit_sm.
///
/// Correlation with the submission is by echoing its addresses and sequence
/// number; the session keeps no map of outstanding messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelivery {
    pub message_id: String,
    pub submitted_at: DateTime<Local>,
    pub source_addr_ton: Ton,
    pub source_addr_npi: Npi,
    pub source_addr: COctetString<1, 21>,
    pub dest_addr_ton: Ton,
    pub dest_addr_npi: Npi,
    pub destination_addr: COctetString<1, 21>,
    pub sequence_number: u32,
    /// First characters of the submitted text.
    pub text: String,
}

impl PendingDelivery {
    pub fn new(
        message_id: String,
        submitted_at: DateTime<Local>,
        sequence_number: u32,
        submit: &SubmitSm,
    ) -> Self {
        Self {
            message_id,
            submitted_at,
            source_addr_ton: submit.source_addr_ton,
            source_addr_npi: submit.source_addr_npi,
            source_addr: submit.source_addr.clone(),
            dest_addr_ton: submit.dest_addr_ton,
            dest_addr_npi: submit.dest_addr_npi,
            destination_addr: submit.destination_addr.clone(),
            sequence_number,
            text: submit.text().chars().take(RECEIPT_TEXT_CHARS).collect(),
        }
    }

    /// Render the receipt text for the given outcome.
    pub fn receipt(&self, outcome: &OutcomeStatus, completed_at: &DateTime<Local>) -> String {
        ReceiptFormatter::format(
            &self.message_id,
            outcome,
            &self.submitted_at,
            completed_at,
            &self.text,
        )
    }

    /// Consume the pending delivery into the deliver_sm that reports it.
    ///
    /// A receipt too long for short_message goes in message_payload.
    pub fn into_deliver_sm(
        self,
        outcome: &OutcomeStatus,
        completed_at: &DateTime<Local>,
    ) -> Command {
        let receipt = Bytes::from(self.receipt(outcome, completed_at).into_bytes());

        let builder = DeliverSm::builder()
            .source_addr_ton(self.source_addr_ton)
            .source_addr_npi(self.source_addr_npi)
            .source_addr(self.source_addr)
            .dest_addr_ton(self.dest_addr_ton)
            .dest_addr_npi(self.dest_addr_npi)
            .destination_addr(self.destination_addr)
            .esm_class(EsmClass::from(DELIVERY_RECEIPT_ESM_CLASS));

        let builder = match OctetString::<0, 255>::from_bytes(receipt.clone()) {
            Ok(short_message) => builder.short_message(short_message),
            Err(_) => builder.push_tlv(MessageDeliveryRequestTlvValue::MessagePayload(
                MessagePayload::new(AnyOctetString::from_bytes(receipt)),
            )),
        };

        Command::new(CommandStatus::EsmeRok, self.sequence_number, builder.build())
    }
}
