//! Utility functions for price-paid field decoding

use crate::valuation::types::{PropertyType, Tenure};
use crate::valuation::utils::{parse_property_type, parse_tenure};
use chrono::NaiveDate;
use uuid::Uuid;

/// Parse a price field, tolerating "£" and thousands separators
pub fn parse_price(raw: &str) -> Option<i64> {
    let clean = raw.replace(['£', ','], "");
    clean.trim().parse::<i64>().ok()
}

/// Parse a transfer date. Accepts "YYYY-MM-DD", the published
/// "YYYY-MM-DD HH:MM" form, and "DD/MM/YYYY".
pub fn parse_transfer_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split_whitespace().next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .ok()
}

/// Normalise a transaction GUID such as "{1F2E...}" to lowercase hyphenated form.
/// Identifiers that are not GUIDs are kept as trimmed text.
pub fn normalise_transaction_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('{').trim_end_matches('}');
    if trimmed.is_empty() {
        return None;
    }

    match Uuid::parse_str(trimmed) {
        Ok(uuid) => Some(uuid.hyphenated().to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Decode a property type code (D, S, T, F, M) or full name.
/// "O" (other) and anything unrecognised yield None.
pub fn decode_property_type(raw: &str) -> Option<PropertyType> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "D" => Some(PropertyType::Detached),
        "S" => Some(PropertyType::SemiDetached),
        "T" => Some(PropertyType::Terraced),
        "F" => Some(PropertyType::Flat),
        "M" => Some(PropertyType::Maisonette),
        "O" => None,
        _ => parse_property_type(raw),
    }
}

/// Decode a duration code (F, L) or full tenure name
pub fn decode_tenure(raw: &str) -> Option<Tenure> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "F" => Some(Tenure::Freehold),
        "L" => Some(Tenure::Leasehold),
        _ => parse_tenure(raw),
    }
}

/// Drop empty optional text fields
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("£250,000"), Some(250_000));
        assert_eq!(parse_price(" 199950 "), Some(199_950));
        assert_eq!(parse_price("n/a"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_transfer_date() {
        let expected = NaiveDate::from_ymd_opt(2023, 11, 17);
        assert_eq!(parse_transfer_date("2023-11-17 00:00"), expected);
        assert_eq!(parse_transfer_date("2023-11-17"), expected);
        assert_eq!(parse_transfer_date("17/11/2023"), expected);
        assert_eq!(parse_transfer_date("invalid"), None);
    }

    #[test]
    fn test_normalise_transaction_id() {
        assert_eq!(
            normalise_transaction_id("{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9}"),
            Some("0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9".to_string())
        );
        assert_eq!(
            normalise_transaction_id(" sale-42 "),
            Some("sale-42".to_string())
        );
        assert_eq!(normalise_transaction_id("{}"), None);
    }

    #[test]
    fn test_decode_property_type() {
        assert_eq!(decode_property_type("D"), Some(PropertyType::Detached));
        assert_eq!(decode_property_type("s"), Some(PropertyType::SemiDetached));
        assert_eq!(decode_property_type("Maisonette"), Some(PropertyType::Maisonette));
        assert_eq!(decode_property_type("O"), None);
        assert_eq!(decode_property_type("bungalow"), None);
    }

    #[test]
    fn test_decode_tenure() {
        assert_eq!(decode_tenure("F"), Some(Tenure::Freehold));
        assert_eq!(decode_tenure("leasehold"), Some(Tenure::Leasehold));
        assert_eq!(decode_tenure("U"), None);
    }
}
