//! Human-readable property codes (`PROP-YYYYMMDD-NNN`).

use chrono::NaiveDate;

pub const CODE_PREFIX: &str = "PROP";

/// Render the code for the `seq`-th property registered on `date`.
///
/// The sequence is zero padded to three digits and simply grows wider past
/// 999.
#[must_use]
pub fn format_code(date: NaiveDate, seq: u32) -> String {
    format!("{CODE_PREFIX}-{}-{seq:03}", date.format("%Y%m%d"))
}

/// Split a code into its registration date and sequence number.
#[must_use]
pub fn parse_code(code: &str) -> Option<(NaiveDate, u32)> {
    let mut parts = code.trim().splitn(3, '-');
    if !parts.next()?.eq_ignore_ascii_case(CODE_PREFIX) {
        return None;
    }
    let date_part = parts.next()?;
    if date_part.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()?;
    let seq_part = parts.next()?;
    if seq_part.len() < 3 || !seq_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let seq = seq_part.parse().ok()?;
    (seq > 0).then_some((date, seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn formats_with_padding() {
        assert_eq!(format_code(day(2024, 3, 7), 1), "PROP-20240307-001");
        assert_eq!(format_code(day(2024, 3, 7), 42), "PROP-20240307-042");
        assert_eq!(format_code(day(2024, 3, 7), 1234), "PROP-20240307-1234");
    }

    #[test]
    fn parses_valid_codes() {
        assert_eq!(parse_code("PROP-20240307-015"), Some((day(2024, 3, 7), 15)));
        assert_eq!(parse_code("prop-20240307-015"), Some((day(2024, 3, 7), 15)));
    }

    #[test]
    fn rejects_malformed_codes() {
        for bad in [
            "",
            "PROP-2024037-001",
            "PROP-20241301-001",
            "PROP-20240307-01",
            "PROP-20240307-000",
            "HOUSE-20240307-001",
            "PROP-20240307",
        ] {
            assert!(parse_code(bad).is_none(), "{bad} should not parse");
        }
    }

    proptest! {
        #[test]
        fn format_then_parse_recovers_parts(
            y in 2000i32..2100,
            m in 1u32..=12,
            d in 1u32..=28,
            seq in 1u32..100_000,
        ) {
            let date = day(y, m, d);
            prop_assert_eq!(parse_code(&format_code(date, seq)), Some((date, seq)));
        }
    }
}
