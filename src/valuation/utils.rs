//! Pure helpers: distance, month arithmetic, postcode and enum parsing

use crate::valuation::types::{Coordinates, PropertyType, Tenure};
use chrono::{Months, NaiveDate};

/// Mean Earth radius in statute miles
const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle (haversine) distance between two points in miles
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

/// First day of a `months`-long window ending on `reference_date`.
/// Month ends clamp, so 12 months before 2024-02-29 is 2023-02-28.
pub fn window_start(reference_date: NaiveDate, months: u32) -> NaiveDate {
    reference_date
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Whether `sale_date` falls in the `months` window ending on `reference_date`.
/// A sale after the reference date is never inside; a partial month counts
/// against the sale, so 12 months and a day is outside a 12-month window.
pub fn within_months(sale_date: NaiveDate, reference_date: NaiveDate, months: u32) -> bool {
    sale_date <= reference_date && sale_date >= window_start(reference_date, months)
}

/// Lowercase and drop separators so "Semi_Detached", "semi-detached" and
/// " SEMI DETACHED " all compare equal
fn normalise_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parse a free-text property type. Returns None for anything outside the
/// five supported types.
pub fn parse_property_type(raw: &str) -> Option<PropertyType> {
    match normalise_token(raw).as_str() {
        "flat" | "apartment" => Some(PropertyType::Flat),
        "maisonette" => Some(PropertyType::Maisonette),
        "terraced" | "terrace" => Some(PropertyType::Terraced),
        "semidetached" | "semi" => Some(PropertyType::SemiDetached),
        "detached" => Some(PropertyType::Detached),
        _ => None,
    }
}

/// Parse a free-text tenure. Shared ownership is rejected.
pub fn parse_tenure(raw: &str) -> Option<Tenure> {
    match normalise_token(raw).as_str() {
        "freehold" => Some(Tenure::Freehold),
        "leasehold" => Some(Tenure::Leasehold),
        _ => None,
    }
}

/// Validate a UK postcode and normalise it to "<outward> <inward>".
/// The outward code needs a digit, except for the non-geographic "GIR 0AA".
pub fn normalise_postcode(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.is_ascii() || !(5..=7).contains(&compact.len()) {
        return None;
    }

    let compact = compact.to_ascii_uppercase();
    if compact == "GIR0AA" {
        return Some("GIR 0AA".to_string());
    }
    let (outward, inward) = compact.split_at(compact.len() - 3);

    let inward_bytes = inward.as_bytes();
    let inward_ok = inward_bytes[0].is_ascii_digit()
        && inward_bytes[1].is_ascii_alphabetic()
        && inward_bytes[2].is_ascii_alphabetic();

    let outward_ok = outward.as_bytes()[0].is_ascii_alphabetic()
        && outward.bytes().all(|b| b.is_ascii_alphanumeric())
        && outward.bytes().any(|b| b.is_ascii_digit());

    if inward_ok && outward_ok {
        Some(format!("{} {}", outward, inward))
    } else {
        None
    }
}

/// Postcode district (outward code) of a postcode
pub fn postcode_district(postcode: &str) -> Option<String> {
    normalise_postcode(postcode)
        .and_then(|pc| pc.split_whitespace().next().map(str::to_string))
}

/// Format a value as whole pounds with thousands separators, e.g. "£212,000"
pub fn format_gbp(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-£{}", grouped)
    } else {
        format!("£{}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_haversine_known_distance() {
        // Buckingham Palace to the Houses of Parliament, roughly 0.7 miles
        let palace = Coordinates::new(51.5014, -0.1419);
        let parliament = Coordinates::new(51.4995, -0.1248);
        let distance = haversine_miles(palace, parliament);
        assert!((distance - 0.74).abs() < 0.05, "got {}", distance);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates::new(53.4808, -2.2426);
        assert_eq!(haversine_miles(point, point), 0.0);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(52.4862, -1.8904);
        assert!((haversine_miles(a, b) - haversine_miles(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_window_start_clamps_month_end() {
        assert_eq!(window_start(date(2024, 6, 30), 12), date(2023, 6, 30));
        assert_eq!(window_start(date(2024, 2, 29), 12), date(2023, 2, 28));
        assert_eq!(window_start(date(2024, 8, 31), 18), date(2023, 2, 28));
    }

    #[test]
    fn test_within_months() {
        let reference = date(2024, 6, 30);
        assert!(within_months(date(2024, 6, 30), reference, 12));
        assert!(within_months(date(2023, 6, 30), reference, 12));
        assert!(!within_months(date(2023, 6, 29), reference, 12));
        assert!(!within_months(date(2024, 7, 1), reference, 12));
    }

    #[test]
    fn test_partial_month_is_outside_window() {
        // 12 months and 29 days back
        let reference = date(2024, 6, 30);
        assert!(!within_months(date(2023, 6, 1), reference, 12));
        assert!(within_months(date(2023, 6, 1), reference, 13));

        // 24 months and 29 days back
        assert!(!within_months(date(2022, 6, 1), reference, 24));
    }

    #[test]
    fn test_parse_property_type() {
        assert_eq!(parse_property_type("Flat"), Some(PropertyType::Flat));
        assert_eq!(
            parse_property_type(" semi_detached "),
            Some(PropertyType::SemiDetached)
        );
        assert_eq!(
            parse_property_type("Semi-Detached"),
            Some(PropertyType::SemiDetached)
        );
        assert_eq!(parse_property_type("TERRACED"), Some(PropertyType::Terraced));
        assert_eq!(parse_property_type("bungalow"), None);
        assert_eq!(parse_property_type(""), None);
    }

    #[test]
    fn test_parse_tenure() {
        assert_eq!(parse_tenure("Freehold"), Some(Tenure::Freehold));
        assert_eq!(parse_tenure(" LEASEHOLD"), Some(Tenure::Leasehold));
        assert_eq!(parse_tenure("shared_ownership"), None);
    }

    #[test]
    fn test_normalise_postcode() {
        assert_eq!(normalise_postcode("sw1a1aa"), Some("SW1A 1AA".to_string()));
        assert_eq!(normalise_postcode(" M1  1AE "), Some("M1 1AE".to_string()));
        assert_eq!(normalise_postcode("B33 8TH"), Some("B33 8TH".to_string()));
        assert_eq!(normalise_postcode("12345"), None);
        assert_eq!(normalise_postcode("SW1A"), None);
        assert_eq!(normalise_postcode("SW1A 1A1"), None);
    }

    #[test]
    fn test_normalise_girobank_postcode() {
        assert_eq!(normalise_postcode("gir0aa"), Some("GIR 0AA".to_string()));
        assert_eq!(normalise_postcode("GIR 0AA"), Some("GIR 0AA".to_string()));
        assert_eq!(postcode_district("GIR 0AA"), Some("GIR".to_string()));
        assert_eq!(normalise_postcode("GIR 0AB"), None);
    }

    #[test]
    fn test_postcode_district() {
        assert_eq!(postcode_district("sw1a 1aa"), Some("SW1A".to_string()));
        assert_eq!(postcode_district("not a postcode"), None);
    }

    #[test]
    fn test_format_gbp() {
        assert_eq!(format_gbp(212_000.0), "£212,000");
        assert_eq!(format_gbp(999.4), "£999");
        assert_eq!(format_gbp(1_250_500.5), "£1,250,501");
        assert_eq!(format_gbp(0.0), "£0");
    }
}
