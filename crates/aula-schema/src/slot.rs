//! Slot-label normalization and the booking-date rule.

use crate::SchemaError;
use chrono::NaiveDate;

/// Strip a trailing parenthetical annotation from a slot label.
///
/// Client front ends historically appended the wall-clock range to the slot
/// number, e.g. `3 (11:00-12:00)`. Conflict checks must treat that as slot
/// `3`, so every comparison goes through this normalization first.
pub fn normalize_slot(label: &str) -> &str {
    match label.find('(') {
        Some(idx) => label[..idx].trim(),
        None => label.trim(),
    }
}

/// Compare two slot labels after normalization.
pub fn same_slot(a: &str, b: &str) -> bool {
    normalize_slot(a) == normalize_slot(b)
}

/// Parse a booking date in `YYYY-MM-DD` form.
pub fn parse_booking_date(s: &str) -> Result<NaiveDate, SchemaError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| SchemaError::InvalidDate(s.to_owned()))
}

/// The earliest date a reservation may target: bookings must be made at
/// least one day ahead.
pub fn earliest_allowed(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_parenthetical() {
        assert_eq!(normalize_slot("3 (11:00-12:00)"), "3");
        assert_eq!(normalize_slot("3(11:00-12:00)"), "3");
    }

    #[test]
    fn normalize_plain_label_is_trimmed() {
        assert_eq!(normalize_slot(" 5 "), "5");
        assert_eq!(normalize_slot("5"), "5");
    }

    #[test]
    fn same_slot_across_annotations() {
        assert!(same_slot("2", "2 (10:00-11:00)"));
        assert!(same_slot("2 (10:00-11:00)", "2 (anything)"));
        assert!(!same_slot("2", "3"));
    }

    #[test]
    fn parse_valid_date() {
        let d = parse_booking_date("2030-03-10").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2030, 3, 10).unwrap());
    }

    #[test]
    fn parse_date_trims_whitespace() {
        assert!(parse_booking_date(" 2030-03-10 ").is_ok());
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(parse_booking_date("2030/03/10").is_err());
        assert!(parse_booking_date("not-a-date").is_err());
        assert!(parse_booking_date("").is_err());
    }

    #[test]
    fn earliest_allowed_is_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2030, 3, 9).unwrap();
        assert_eq!(
            earliest_allowed(today),
            NaiveDate::from_ymd_opt(2030, 3, 10).unwrap()
        );
    }
}
