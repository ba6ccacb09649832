// Library module for testable functions

pub mod api;
pub mod config;
pub mod ingestion;
pub mod valuation;

/// Calculate below-market-value percentage
/// Formula: (emv - guide_price) / emv × 100
/// Positive means the guide price sits below the estimate, negative above.
pub fn calculate_bmv_percentage(emv: f64, guide_price: i64) -> Option<f64> {
    if !emv.is_finite() || emv <= 0.0 {
        return None;
    }
    Some((emv - guide_price as f64) / emv * 100.0)
}
