//! Raw row types for the price-paid ingestion pipeline
//! Pure data structures with no behavior

use serde::Deserialize;

/// One row of a price-paid CSV, already enriched with coordinates.
/// Everything is kept as text until `parse_row` validates it.
#[derive(Debug, Clone, Deserialize)]
pub struct PricePaidRow {
    pub transaction_id: String,
    pub price: String, // may carry "£" and thousands separators
    pub date_of_transfer: String,
    pub postcode: Option<String>,
    pub property_type: String, // D/S/T/F/M code or full name
    #[serde(default)]
    pub old_new: Option<String>,
    pub duration: String, // F/L code or full name
    #[serde(default)]
    pub paon: Option<String>,
    #[serde(default)]
    pub saon: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub record_status: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// Parse run statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseStats {
    pub parsed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ParseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parsed: {}, skipped: {}", self.parsed, self.skipped)
    }
}
