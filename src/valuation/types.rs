//! Core data types for the valuation pipeline
//! Sale records and subjects go in, immutable results come out

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum number of comps for a valuation to count as evidenced
pub const MIN_VIABLE_COMPS: usize = 3;

/// Residential property types recognised by the sale-record supplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Flat,
    Maisonette,
    Terraced,
    #[serde(alias = "semi-detached")]
    SemiDetached,
    Detached,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::Flat => write!(f, "flat"),
            PropertyType::Maisonette => write!(f, "maisonette"),
            PropertyType::Terraced => write!(f, "terraced"),
            PropertyType::SemiDetached => write!(f, "semi-detached"),
            PropertyType::Detached => write!(f, "detached"),
        }
    }
}

/// Tenure of a sale or subject. Shared ownership is never a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenure {
    Freehold,
    Leasehold,
}

impl std::fmt::Display for Tenure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tenure::Freehold => write!(f, "freehold"),
            Tenure::Leasehold => write!(f, "leasehold"),
        }
    }
}

/// WGS84 latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components finite and within ±90 / ±180
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Optional address parts as published with a price-paid record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleAddress {
    pub paon: Option<String>,
    pub saon: Option<String>,
    pub street: Option<String>,
    pub town: Option<String>,
}

/// A completed historical sale - never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    pub transaction_id: String,
    pub price: i64,
    pub sale_date: NaiveDate,
    pub property_type: PropertyType,
    pub tenure: Tenure,
    pub postcode: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub address: SaleAddress,
    #[serde(default)]
    pub new_build: bool,
}

impl ComparableSale {
    /// Outward half of the postcode, e.g. "SW1A" for "SW1A 1AA"
    pub fn postcode_district(&self) -> Option<String> {
        crate::valuation::utils::postcode_district(&self.postcode)
    }
}

/// The property being valued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub postcode: Option<String>,
    pub property_type: PropertyType,
    pub tenure: Tenure,
    pub coordinates: Option<Coordinates>,
    pub guide_price: i64,
    #[serde(default)]
    pub address: Option<String>,
}

/// Output of the eligibility filter
#[derive(Debug, Clone, PartialEq)]
pub struct CompSelectionResult {
    pub comps: Vec<ComparableSale>,
    pub radius_miles: f64,
    pub date_range_months: u32,
    /// Position of the tier used in the configured tier table
    pub tier_index: usize,
    pub initial_count: usize,
    pub outliers_removed: usize,
    pub fallback_used: bool,
    /// False when the subject had no coordinates and radius filtering was skipped
    pub location_filtered: bool,
}

impl CompSelectionResult {
    pub fn comp_count(&self) -> usize {
        self.comps.len()
    }

    pub fn is_sufficient(&self) -> bool {
        self.comp_count() >= MIN_VIABLE_COMPS
    }

    /// Prices of the selected comps, in selection order
    pub fn prices(&self) -> Vec<i64> {
        self.comps.iter().map(|comp| comp.price).collect()
    }
}

/// Deal signal derived from BMV%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Overpriced,
    Avoid,
    Weak,
    Moderate,
    Strong,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Strong => write!(f, "Strong"),
            Recommendation::Moderate => write!(f, "Moderate"),
            Recommendation::Weak => write!(f, "Weak"),
            Recommendation::Avoid => write!(f, "Avoid"),
            Recommendation::Overpriced => write!(f, "Overpriced"),
        }
    }
}

/// Trust label on a valuation. Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

/// Final valuation - produced once per request, never updated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub estimated_market_value: f64,
    /// None when there were no comps to value against
    pub bmv_percentage: Option<f64>,
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub comps_used: usize,
    pub comp_radius_miles: f64,
    pub comp_date_range_months: u32,
    pub comp_prices: Vec<i64>,
    pub valuation_statement: String,
    pub insufficient_evidence: bool,
}

impl ValuationResult {
    /// Stable field set handed to report and export collaborators
    pub fn summary(&self) -> ValuationSummary {
        ValuationSummary {
            estimated_market_value: self.estimated_market_value,
            bmv_percentage: self.bmv_percentage,
            recommendation: self.recommendation,
            confidence: self.confidence,
            comps_used: self.comps_used,
            comp_radius_miles: self.comp_radius_miles,
            comp_date_range_months: self.comp_date_range_months,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSummary {
    pub estimated_market_value: f64,
    pub bmv_percentage: Option<f64>,
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub comps_used: usize,
    pub comp_radius_miles: f64,
    pub comp_date_range_months: u32,
}
