//! Seam to the sale-record supplier
//!
//! The engine never owns a supplier. Callers pass one in, and connection
//! pooling or caching behind it is theirs to manage.

use crate::valuation::error::SourceError;
use crate::valuation::tiers::ValuationConfig;
use crate::valuation::types::{ComparableSale, Coordinates, PropertyType, SubjectProperty, Tenure};
use crate::valuation::utils::postcode_district;
use chrono::NaiveDate;
use std::sync::Arc;

/// What to ask a supplier for: completed sales of one type and tenure near
/// a point, within a radius and date window ending at `reference_date`
#[derive(Debug, Clone, PartialEq)]
pub struct SaleQuery {
    pub postcode_district: Option<String>,
    pub property_type: PropertyType,
    pub tenure: Tenure,
    pub centre: Option<Coordinates>,
    pub radius_miles: f64,
    pub date_range_months: u32,
    pub reference_date: NaiveDate,
}

impl SaleQuery {
    /// Query covering the widest configured tier, so the filter can relax
    /// without going back to the supplier
    pub fn widest_for(
        subject: &SubjectProperty,
        reference_date: NaiveDate,
        config: &ValuationConfig,
    ) -> Self {
        let widest = config.widest_tier();
        Self {
            postcode_district: subject.postcode.as_deref().and_then(postcode_district),
            property_type: subject.property_type,
            tenure: subject.tenure,
            centre: subject.coordinates,
            radius_miles: widest.radius_miles,
            date_range_months: widest.date_months,
            reference_date,
        }
    }
}

pub trait SaleRecordSource {
    fn comparable_sales(&self, query: &SaleQuery) -> Result<Vec<ComparableSale>, SourceError>;
}

impl<S: SaleRecordSource + ?Sized> SaleRecordSource for Arc<S> {
    fn comparable_sales(&self, query: &SaleQuery) -> Result<Vec<ComparableSale>, SourceError> {
        (**self).comparable_sales(query)
    }
}
