//! Text access for submit_sm / deliver_sm bodies.

use rusmpp::pdus::{DeliverSm, SubmitSm};
use rusmpp::tlvs::{Tlv, TlvValue};
use rusmpp::values::{DataCoding, EsmClass, MessageType};

/// esm_class of a deliver_sm that carries an SMSC delivery receipt.
pub const DELIVERY_RECEIPT_ESM_CLASS: u8 = 0x04;

/// Whether `esm_class` marks an SMSC delivery receipt.
pub fn is_delivery_receipt(esm_class: EsmClass) -> bool {
    esm_class.message_type == MessageType::ShortMessageContainsMCDeliveryReceipt
}

/// User data of a short message PDU.
pub trait MessageText {
    fn data_coding(&self) -> DataCoding;

    fn short_message_bytes(&self) -> &[u8];

    fn tlv_list(&self) -> &[Tlv];

    /// The short_message, or the message_payload TLV when short_message is
    /// empty.
    fn payload(&self) -> &[u8] {
        let short_message = self.short_message_bytes();
        if !short_message.is_empty() {
            return short_message;
        }
        self.tlv_list()
            .iter()
            .find_map(|tlv| match tlv.value() {
                Some(TlvValue::MessagePayload(payload)) => Some(&payload.value[..]),
                _ => None,
            })
            .unwrap_or(short_message)
    }

    /// User data decoded as text according to data_coding.
    ///
    /// UCS2 is read as UTF-16BE; everything else as lossy UTF-8.
    fn text(&self) -> String {
        let payload = self.payload();
        if self.data_coding() == DataCoding::Ucs2 {
            let units = payload
                .chunks(2)
                .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]));
            char::decode_utf16(units)
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        } else {
            String::from_utf8_lossy(payload).into_owned()
        }
    }
}

impl MessageText for SubmitSm {
    fn data_coding(&self) -> DataCoding {
        self.data_coding
    }

    fn short_message_bytes(&self) -> &[u8] {
        self.short_message().as_ref()
    }

    fn tlv_list(&self) -> &[Tlv] {
        self.tlvs()
    }
}

impl MessageText for DeliverSm {
    fn data_coding(&self) -> DataCoding {
        self.data_coding
    }

    fn short_message_bytes(&self) -> &[u8] {
        self.short_message().as_ref()
    }

    fn tlv_list(&self) -> &[Tlv] {
        self.tlvs()
    }
}
