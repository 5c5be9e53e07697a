//! Invoice numbering
//!
//! Numbers are a fixed prefix followed by a zero-padded sequence, e.g.
//! `INV000042`. The next number is derived from the most recent one; callers
//! must serialize "read latest, then insert" themselves.

use serde::{Deserialize, Serialize};

/// Default literal prefix
pub const DEFAULT_PREFIX: &str = "INV";
/// Default zero-padding width of the sequence
pub const DEFAULT_WIDTH: usize = 6;

/// Invoice number format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumbering {
    prefix: String,
    width: usize,
}

impl Default for InvoiceNumbering {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_WIDTH)
    }
}

impl InvoiceNumbering {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Formats sequence `n`
    pub fn format(&self, sequence: u64) -> String {
        format!("{}{:0width$}", self.prefix, sequence, width = self.width)
    }

    /// Next number after `latest`
    ///
    /// Starts at 1 when there is no previous number or its trailing digits
    /// cannot be parsed.
    pub fn next_after(&self, latest: Option<&str>) -> String {
        let next = latest
            .and_then(trailing_sequence)
            .and_then(|n| n.checked_add(1))
            .unwrap_or(1);
        self.format(next)
    }
}

/// Parses the run of ASCII digits at the end of `number`
pub fn trailing_sequence(number: &str) -> Option<u64> {
    let digits_start = number
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    number[digits_start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_number() {
        let numbering = InvoiceNumbering::default();
        assert_eq!(numbering.next_after(None), "INV000001");
    }

    #[test]
    fn test_increments_latest() {
        let numbering = InvoiceNumbering::default();
        assert_eq!(numbering.next_after(Some("INV000001")), "INV000002");
        assert_eq!(numbering.next_after(Some("INV000041")), "INV000042");
    }

    #[test]
    fn test_unparsable_falls_back_to_one() {
        let numbering = InvoiceNumbering::default();
        assert_eq!(numbering.next_after(Some("INV-ABC")), "INV000001");
        assert_eq!(numbering.next_after(Some("")), "INV000001");
    }

    #[test]
    fn test_overflowing_width_keeps_all_digits() {
        let numbering = InvoiceNumbering::default();
        assert_eq!(numbering.next_after(Some("INV999999")), "INV1000000");
    }

    #[test]
    fn test_custom_format() {
        let numbering = InvoiceNumbering::new("PH-", 4);
        assert_eq!(numbering.next_after(Some("INV000007")), "PH-0008");
    }

    #[test]
    fn test_trailing_sequence() {
        assert_eq!(trailing_sequence("INV000042"), Some(42));
        assert_eq!(trailing_sequence("2024-17"), Some(17));
        assert_eq!(trailing_sequence("INV"), None);
    }
}
