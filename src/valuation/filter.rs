//! Eligibility filter - tiered comparable-sale selection
//!
//! Hard filters (price, type, tenure) are applied once. Each tier then admits
//! candidates by age and distance, and the first tier with enough comps wins.

use crate::valuation::error::ValidationError;
use crate::valuation::outliers::remove_outliers;
use crate::valuation::tiers::{SearchTier, ValuationConfig};
use crate::valuation::types::{
    CompSelectionResult, ComparableSale, SubjectProperty, MIN_VIABLE_COMPS,
};
use crate::valuation::utils::haversine_miles;
use chrono::NaiveDate;
use tracing::debug;

/// A sale that passed the hard filters, with its distance precomputed
struct Candidate<'a> {
    sale: &'a ComparableSale,
    distance_miles: Option<f64>,
}

/// Same type and tenure as the subject, with a usable price
fn is_like_for_like(subject: &SubjectProperty, sale: &ComparableSale) -> bool {
    sale.price > 0 && sale.property_type == subject.property_type && sale.tenure == subject.tenure
}

fn admitted(
    candidates: &[Candidate<'_>],
    tier: &SearchTier,
    reference_date: NaiveDate,
) -> Vec<ComparableSale> {
    candidates
        .iter()
        .filter(|c| tier.admits(c.sale.sale_date, reference_date, c.distance_miles))
        .map(|c| c.sale.clone())
        .collect()
}

/// Select comps for `subject` from `sales` as of `reference_date`.
///
/// Fewer than three comps at the widest tier is not an error; the result
/// simply reports `is_sufficient() == false`.
pub fn select_comps(
    subject: &SubjectProperty,
    sales: &[ComparableSale],
    reference_date: NaiveDate,
    config: &ValuationConfig,
) -> Result<CompSelectionResult, ValidationError> {
    let centre = match subject.coordinates {
        Some(coordinates) => Some(coordinates),
        None if config.allow_location_free() => None,
        None => return Err(ValidationError::MissingLocation("coordinates")),
    };

    let candidates: Vec<Candidate<'_>> = sales
        .iter()
        .filter(|sale| is_like_for_like(subject, sale))
        // Sales after the reference date are not yet evidence
        .filter(|sale| sale.sale_date <= reference_date)
        .map(|sale| Candidate {
            sale,
            distance_miles: centre.map(|c| haversine_miles(c, sale.coordinates)),
        })
        .collect();

    debug!(
        "{} of {} sales match {} {} on hard filters",
        candidates.len(),
        sales.len(),
        subject.tenure,
        subject.property_type
    );

    let tiers = config.tiers();
    let (tier_index, comps) = tiers
        .iter()
        .enumerate()
        .map(|(idx, tier)| (idx, admitted(&candidates, tier, reference_date)))
        .inspect(|(idx, comps)| {
            debug!(
                "Tier {} ({} months, {} miles): {} comps",
                idx,
                tiers[*idx].date_months,
                tiers[*idx].radius_miles,
                comps.len()
            )
        })
        .find(|(_, comps)| comps.len() >= MIN_VIABLE_COMPS)
        .unwrap_or_else(|| {
            let last = tiers.len() - 1;
            (last, admitted(&candidates, &tiers[last], reference_date))
        });

    let tier = tiers[tier_index];
    let initial_count = comps.len();
    let outcome = remove_outliers(comps, config.iqr_multiplier());

    Ok(CompSelectionResult {
        comps: outcome.kept,
        radius_miles: tier.radius_miles,
        date_range_months: tier.date_months,
        tier_index,
        initial_count,
        outliers_removed: outcome.removed,
        fallback_used: tier_index > 0,
        location_filtered: centre.is_some(),
    })
}
