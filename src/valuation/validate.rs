//! Precondition checks run before any filtering starts

use crate::valuation::error::ValidationError;
use crate::valuation::types::{ComparableSale, Coordinates, SubjectProperty};
use crate::valuation::utils::normalise_postcode;
use std::collections::HashSet;

fn check_coordinates(coordinates: Coordinates) -> Result<(), ValidationError> {
    if coordinates.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::InvalidCoordinates {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        })
    }
}

fn check_postcode(postcode: &str) -> Result<(), ValidationError> {
    normalise_postcode(postcode)
        .map(|_| ())
        .ok_or_else(|| ValidationError::InvalidPostcode(postcode.to_string()))
}

/// Validate the subject. Missing coordinates or postcode are only accepted
/// when the caller opted into location-free matching.
pub fn validate_subject(
    subject: &SubjectProperty,
    allow_location_free: bool,
) -> Result<(), ValidationError> {
    if subject.guide_price <= 0 {
        return Err(ValidationError::InvalidGuidePrice(subject.guide_price));
    }

    match &subject.postcode {
        Some(postcode) => check_postcode(postcode)?,
        None if !allow_location_free => return Err(ValidationError::MissingLocation("postcode")),
        None => {}
    }

    match subject.coordinates {
        Some(coordinates) => check_coordinates(coordinates)?,
        None if !allow_location_free => {
            return Err(ValidationError::MissingLocation("coordinates"))
        }
        None => {}
    }

    Ok(())
}

pub fn validate_sale(sale: &ComparableSale) -> Result<(), ValidationError> {
    if sale.transaction_id.trim().is_empty() {
        return Err(ValidationError::MissingTransactionId);
    }

    if sale.price <= 0 {
        return Err(ValidationError::InvalidSalePrice {
            transaction_id: sale.transaction_id.clone(),
            price: sale.price,
        });
    }

    check_postcode(&sale.postcode)?;
    check_coordinates(sale.coordinates)
}

/// Fails on the first invalid or repeated record; nothing is silently dropped.
/// A repeated transaction id would count one sale as several comps.
pub fn validate_sales(sales: &[ComparableSale]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(sales.len());
    sales.iter().try_for_each(|sale| {
        validate_sale(sale)?;
        if seen.insert(sale.transaction_id.trim()) {
            Ok(())
        } else {
            Err(ValidationError::DuplicateTransactionId(
                sale.transaction_id.clone(),
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::types::{PropertyType, SaleAddress, Tenure};
    use chrono::NaiveDate;

    fn mock_subject() -> SubjectProperty {
        SubjectProperty {
            postcode: Some("M14 5RG".to_string()),
            property_type: PropertyType::Terraced,
            tenure: Tenure::Freehold,
            coordinates: Some(Coordinates::new(53.4481, -2.2196)),
            guide_price: 200_000,
            address: None,
        }
    }

    fn mock_sale() -> ComparableSale {
        ComparableSale {
            transaction_id: "A1B2C3D4-0000-0000-0000-000000000001".to_string(),
            price: 210_000,
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            property_type: PropertyType::Terraced,
            tenure: Tenure::Freehold,
            postcode: "M14 5RH".to_string(),
            coordinates: Coordinates::new(53.4483, -2.2190),
            address: SaleAddress::default(),
            new_build: false,
        }
    }

    #[test]
    fn test_valid_subject_passes() {
        assert_eq!(validate_subject(&mock_subject(), false), Ok(()));
    }

    #[test]
    fn test_subject_guide_price_must_be_positive() {
        let mut subject = mock_subject();
        subject.guide_price = -1;
        assert_eq!(
            validate_subject(&subject, false),
            Err(ValidationError::InvalidGuidePrice(-1))
        );
    }

    #[test]
    fn test_subject_missing_location_requires_opt_in() {
        let mut subject = mock_subject();
        subject.coordinates = None;
        assert_eq!(
            validate_subject(&subject, false),
            Err(ValidationError::MissingLocation("coordinates"))
        );
        assert_eq!(validate_subject(&subject, true), Ok(()));

        subject.postcode = None;
        assert_eq!(
            validate_subject(&subject, false),
            Err(ValidationError::MissingLocation("postcode"))
        );
    }

    #[test]
    fn test_subject_bad_coordinates_rejected_even_with_opt_in() {
        let mut subject = mock_subject();
        subject.coordinates = Some(Coordinates::new(123.0, 0.0));
        assert!(matches!(
            validate_subject(&subject, true),
            Err(ValidationError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_sale_negative_price_rejected() {
        let mut sale = mock_sale();
        sale.price = -5;
        assert!(matches!(
            validate_sale(&sale),
            Err(ValidationError::InvalidSalePrice { price: -5, .. })
        ));
    }

    #[test]
    fn test_sale_invalid_postcode_rejected() {
        let mut sale = mock_sale();
        sale.postcode = "NOWHERE".to_string();
        assert_eq!(
            validate_sale(&sale),
            Err(ValidationError::InvalidPostcode("NOWHERE".to_string()))
        );
    }

    #[test]
    fn test_validate_sales_stops_at_first_failure() {
        let mut bad = mock_sale();
        bad.transaction_id = "  ".to_string();
        let sales = vec![mock_sale(), bad, mock_sale()];
        assert_eq!(
            validate_sales(&sales),
            Err(ValidationError::MissingTransactionId)
        );
    }

    #[test]
    fn test_validate_sales_rejects_repeated_transaction_id() {
        let mut other = mock_sale();
        other.transaction_id = "B0000000-0000-0000-0000-000000000002".to_string();
        let sales = vec![mock_sale(), other, mock_sale()];

        assert_eq!(
            validate_sales(&sales),
            Err(ValidationError::DuplicateTransactionId(
                "A1B2C3D4-0000-0000-0000-000000000001".to_string()
            ))
        );
    }

    #[test]
    fn test_validate_sales_accepts_distinct_ids() {
        let mut other = mock_sale();
        other.transaction_id = "B0000000-0000-0000-0000-000000000002".to_string();
        assert_eq!(validate_sales(&[mock_sale(), other]), Ok(()));
    }
}
