//! Delivery receipt text rendering.
//!
//! Consumers parse this layout, so field order and spelling are fixed:
//!
//! ```text
//! id:<id> sub:001 dlvrd:1 submit date:<yyMMddHHmm> done date:<yyMMddHHmm> stat:<STAT> err:<ERR> text:<first 20 chars>
//! ```

use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use super::catalog::OutcomeStatus;

/// Number of characters of the submitted message echoed in `text:`.
pub const RECEIPT_TEXT_CHARS: usize = 20;

const DATE_FORMAT: &str = "%y%m%d%H%M";

pub struct ReceiptFormatter;

impl ReceiptFormatter {
    pub fn format<Tz>(
        message_id: &str,
        outcome: &OutcomeStatus,
        submitted_at: &DateTime<Tz>,
        completed_at: &DateTime<Tz>,
        message_text: &str,
    ) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let text: String = message_text.chars().take(RECEIPT_TEXT_CHARS).collect();
        format!(
            "id:{} sub:001 dlvrd:1 submit date:{} done date:{} stat:{} err:{} text:{}",
            message_id,
            submitted_at.format(DATE_FORMAT),
            completed_at.format(DATE_FORMAT),
            outcome.stat,
            outcome.err,
            text,
        )
    }
}
