//! Valuation engine - filter, trim, aggregate and classify
//!
//! The pipeline is strictly linear and holds no state between calls, so the
//! same (subject, sales, reference date) always yields the same result.

use crate::calculate_bmv_percentage;
use crate::valuation::error::ValuationError;
use crate::valuation::filter::select_comps;
use crate::valuation::source::{SaleQuery, SaleRecordSource};
use crate::valuation::tiers::ValuationConfig;
use crate::valuation::types::{
    CompSelectionResult, ComparableSale, Confidence, Recommendation, SubjectProperty,
    ValuationResult, MIN_VIABLE_COMPS,
};
use crate::valuation::utils::format_gbp;
use crate::valuation::validate::{validate_sales, validate_subject};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Comps needed, on top of the preferred tier, for High confidence
pub const HIGH_CONFIDENCE_COMPS: usize = 5;
const HIGH_CONFIDENCE_MAX_MONTHS: u32 = 12;
const HIGH_CONFIDENCE_MAX_MILES: f64 = 0.5;
const MEDIUM_CONFIDENCE_MAX_MONTHS: u32 = 18;

#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value `subject` against a caller-supplied sale population.
    ///
    /// Errors only on structurally invalid input. Thin evidence comes back as
    /// a Low-confidence result.
    pub fn valuate(
        &self,
        subject: &SubjectProperty,
        sales: &[ComparableSale],
        reference_date: NaiveDate,
    ) -> Result<ValuationResult, ValuationError> {
        validate_subject(subject, self.config.allow_location_free())?;
        validate_sales(sales)?;

        let selection = select_comps(subject, sales, reference_date, &self.config)?;
        let result = aggregate(subject, &selection);

        info!(
            "Valued {} {} at {} from {} comps ({} months, {} miles): {} / {}",
            subject.tenure,
            subject.property_type,
            format_gbp(result.estimated_market_value),
            result.comps_used,
            result.comp_date_range_months,
            result.comp_radius_miles,
            result.recommendation,
            result.confidence
        );

        Ok(result)
    }

    /// Query an injected sale-record source with the widest tier, then value
    pub fn valuate_from_source<S>(
        &self,
        subject: &SubjectProperty,
        source: &S,
        reference_date: NaiveDate,
    ) -> Result<ValuationResult, ValuationError>
    where
        S: SaleRecordSource + ?Sized,
    {
        validate_subject(subject, self.config.allow_location_free())?;

        let query = SaleQuery::widest_for(subject, reference_date, &self.config);
        let sales = source.comparable_sales(&query)?;
        debug!("Source returned {} candidate sales", sales.len());

        self.valuate(subject, &sales, reference_date)
    }
}

/// Median of a price list; mean of the two central values for even counts
pub fn median(prices: &[i64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }

    let mut sorted = prices.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    let value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    };

    Some(value)
}

/// Confidence from the tier actually used and the final comp count.
///
/// High needs the preferred tier with five or more comps. Up to an 18 month
/// window the result is Medium. Anything wider, or short of three comps, is Low.
pub fn classify_confidence(selection: &CompSelectionResult) -> Confidence {
    let count = selection.comp_count();
    if count < MIN_VIABLE_COMPS {
        return Confidence::Low;
    }

    let preferred = !selection.fallback_used
        && selection.location_filtered
        && selection.date_range_months <= HIGH_CONFIDENCE_MAX_MONTHS
        && selection.radius_miles <= HIGH_CONFIDENCE_MAX_MILES;

    if preferred && count >= HIGH_CONFIDENCE_COMPS {
        Confidence::High
    } else if selection.date_range_months <= MEDIUM_CONFIDENCE_MAX_MONTHS {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Uncapped recommendation band for a BMV percentage
pub fn recommendation_for(bmv_percentage: f64) -> Recommendation {
    match bmv_percentage {
        b if b >= 15.0 => Recommendation::Strong,
        b if b >= 8.0 => Recommendation::Moderate,
        b if b >= 3.0 => Recommendation::Weak,
        b if b >= 0.0 => Recommendation::Avoid,
        _ => Recommendation::Overpriced,
    }
}

/// Low confidence may never report Strong or Moderate
pub fn cap_for_confidence(recommendation: Recommendation, confidence: Confidence) -> Recommendation {
    match (confidence, recommendation) {
        (Confidence::Low, Recommendation::Strong | Recommendation::Moderate) => {
            Recommendation::Weak
        }
        _ => recommendation,
    }
}

/// Turn a comp selection into a result. The guide price only enters through
/// BMV%; EMV is computed from comps alone.
pub fn aggregate(subject: &SubjectProperty, selection: &CompSelectionResult) -> ValuationResult {
    let comp_prices = selection.prices();
    let confidence = classify_confidence(selection);

    let (estimated_market_value, bmv_percentage) =
        match median(&comp_prices).filter(|emv| *emv > 0.0) {
            Some(emv) => (emv, calculate_bmv_percentage(emv, subject.guide_price)),
            None => (0.0, None),
        };

    let recommendation = match bmv_percentage {
        Some(bmv) => cap_for_confidence(recommendation_for(bmv), confidence),
        None => Recommendation::Avoid,
    };

    if selection.outliers_removed > 0 {
        debug!(
            "EMV from {} of {} comps after outlier removal",
            comp_prices.len(),
            selection.initial_count
        );
    }

    ValuationResult {
        estimated_market_value,
        bmv_percentage,
        recommendation,
        confidence,
        comps_used: comp_prices.len(),
        comp_radius_miles: selection.radius_miles,
        comp_date_range_months: selection.date_range_months,
        valuation_statement: valuation_statement(
            estimated_market_value,
            bmv_percentage,
            selection,
            confidence,
        ),
        comp_prices,
        insufficient_evidence: !selection.is_sufficient(),
    }
}

fn price_position(bmv_percentage: f64) -> String {
    let rounded = (bmv_percentage * 10.0).round() / 10.0;
    if rounded > 0.0 {
        format!("{:.1}% below", rounded)
    } else if rounded < 0.0 {
        format!("{:.1}% above", rounded.abs())
    } else {
        "in line with".to_string()
    }
}

fn valuation_statement(
    emv: f64,
    bmv_percentage: Option<f64>,
    selection: &CompSelectionResult,
    confidence: Confidence,
) -> String {
    let area = if selection.location_filtered {
        format!(" within {:.1} miles", selection.radius_miles)
    } else {
        String::new()
    };
    let window = format!("the last {} months", selection.date_range_months);

    let bmv = match bmv_percentage {
        Some(bmv) => bmv,
        None => {
            return format!(
                "Insufficient evidence: no comparable completed sales were found{} in {}, \
                 so no market value has been estimated.",
                area, window
            )
        }
    };

    let count = selection.comp_count();
    let basis = format!(
        "{} comparable completed {}{} in {}",
        count,
        if count == 1 { "sale" } else { "sales" },
        area,
        window
    );
    let value = format_gbp(emv);
    let position = price_position(bmv);

    if !selection.is_sufficient() {
        return format!(
            "Insufficient evidence: only {} {} found, fewer than the {} needed for a reliable \
             estimate. The indicative value of {} is shown for reference and the guide price \
             is {} it. Confidence: Low (limited evidence).",
            basis,
            if count == 1 { "was" } else { "were" },
            MIN_VIABLE_COMPS,
            value,
            position
        );
    }

    match confidence {
        Confidence::Low => format!(
            "Limited evidence: indicative market value of {} based on {}. The guide price is {} \
             this figure. Confidence: Low.",
            value, basis, position
        ),
        Confidence::Medium | Confidence::High => format!(
            "Estimated market value of {} based on {}. The guide price is {} the estimated \
             market value. Confidence: {}.",
            value, basis, position, confidence
        ),
    }
}
