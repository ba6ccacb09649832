//! Price outlier removal using Tukey fences on the interquartile range

use crate::valuation::types::{ComparableSale, MIN_VIABLE_COMPS};
use std::collections::BTreeSet;
use tracing::debug;

/// Quartiles need at least this many prices to say anything useful
const MIN_SAMPLE_FOR_FENCES: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct OutlierOutcome {
    pub kept: Vec<ComparableSale>,
    pub removed: usize,
}

/// Linear-interpolated quantile of an ascending slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Lower and upper Tukey fences for a set of prices
pub fn price_fences(prices: &[i64], multiplier: f64) -> Option<(f64, f64)> {
    if prices.len() < MIN_SAMPLE_FOR_FENCES {
        return None;
    }

    let mut sorted: Vec<f64> = prices.iter().map(|&p| p as f64).collect();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;

    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Drop comps priced outside the fences, keeping insertion order.
///
/// Never trims a set of three or more below three: when too many comps fall
/// outside the fences, the least extreme of them are kept.
pub fn remove_outliers(comps: Vec<ComparableSale>, multiplier: f64) -> OutlierOutcome {
    let prices: Vec<i64> = comps.iter().map(|comp| comp.price).collect();

    let (low, high) = match price_fences(&prices, multiplier) {
        Some(fences) => fences,
        None => {
            return OutlierOutcome {
                kept: comps,
                removed: 0,
            }
        }
    };

    // (index, distance beyond the nearest fence)
    let mut flagged: Vec<(usize, f64)> = prices
        .iter()
        .enumerate()
        .filter_map(|(idx, &price)| {
            let price = price as f64;
            if price < low {
                Some((idx, low - price))
            } else if price > high {
                Some((idx, price - high))
            } else {
                None
            }
        })
        .collect();

    let removable = comps.len().saturating_sub(MIN_VIABLE_COMPS);
    if flagged.len() > removable {
        flagged.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        debug!(
            "Retaining {} of {} flagged outliers to keep {} comps",
            flagged.len() - removable,
            flagged.len(),
            MIN_VIABLE_COMPS
        );
        flagged.truncate(removable);
    }

    let dropped: BTreeSet<usize> = flagged.iter().map(|(idx, _)| *idx).collect();
    if !dropped.is_empty() {
        debug!(
            "Removed {} price outliers outside [{:.0}, {:.0}]",
            dropped.len(),
            low,
            high
        );
    }

    let kept = comps
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !dropped.contains(idx))
        .map(|(_, comp)| comp)
        .collect();

    OutlierOutcome {
        kept,
        removed: dropped.len(),
    }
}
