//! Search tiers and engine configuration
//!
//! Tiers are plain data walked narrowest-first by the eligibility filter.
//! Adding a tier means adding a row here, not touching the filter loop.

use crate::valuation::utils::within_months;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A (date window, radius) pair defining how far back and how far out to look
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchTier {
    pub date_months: u32,
    pub radius_miles: f64,
}

impl SearchTier {
    pub const fn new(date_months: u32, radius_miles: f64) -> Self {
        Self {
            date_months,
            radius_miles,
        }
    }

    /// Whether a sale on `sale_date`, `distance_miles` away, falls inside this
    /// tier as of `reference_date`. A missing distance means radius filtering is off.
    pub fn admits(
        &self,
        sale_date: NaiveDate,
        reference_date: NaiveDate,
        distance_miles: Option<f64>,
    ) -> bool {
        within_months(sale_date, reference_date, self.date_months)
            && distance_miles.map_or(true, |distance| distance <= self.radius_miles)
    }

    fn contains(&self, other: &SearchTier) -> bool {
        self.date_months >= other.date_months && self.radius_miles >= other.radius_miles
    }
}

/// Date window widens before radius: an older sale on the same street is
/// better evidence than a recent one a mile away.
pub const DEFAULT_TIERS: [SearchTier; 5] = [
    SearchTier::new(12, 0.5),
    SearchTier::new(18, 0.5),
    SearchTier::new(18, 1.0),
    SearchTier::new(24, 1.0),
    SearchTier::new(24, 1.5),
];

/// Tukey fence multiplier for price outliers
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationConfig {
    tiers: Vec<SearchTier>,
    iqr_multiplier: f64,
    allow_location_free: bool,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.to_vec(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            allow_location_free: false,
        }
    }
}

impl ValuationConfig {
    /// Replace the tier table. Returns None unless the table is non-empty and
    /// every tier is at least as wide as the one before it.
    pub fn with_tiers(self, tiers: Vec<SearchTier>) -> Option<Self> {
        let widening = tiers.windows(2).all(|pair| pair[1].contains(&pair[0]));
        if tiers.is_empty() || !widening {
            return None;
        }
        Some(Self { tiers, ..self })
    }

    /// Replace the fence multiplier. Returns None for a negative or
    /// non-finite multiplier, which would invert the fences.
    pub fn with_iqr_multiplier(self, iqr_multiplier: f64) -> Option<Self> {
        if !iqr_multiplier.is_finite() || iqr_multiplier < 0.0 {
            return None;
        }
        Some(Self {
            iqr_multiplier,
            ..self
        })
    }

    /// Opt into matching subjects that have no coordinates or postcode on
    /// type, tenure and date alone
    pub fn with_location_free_matching(self, allow: bool) -> Self {
        Self {
            allow_location_free: allow,
            ..self
        }
    }

    pub fn tiers(&self) -> &[SearchTier] {
        &self.tiers
    }

    pub fn preferred_tier(&self) -> SearchTier {
        self.tiers[0]
    }

    pub fn widest_tier(&self) -> SearchTier {
        self.tiers[self.tiers.len() - 1]
    }

    pub fn iqr_multiplier(&self) -> f64 {
        self.iqr_multiplier
    }

    pub fn allow_location_free(&self) -> bool {
        self.allow_location_free
    }
}
