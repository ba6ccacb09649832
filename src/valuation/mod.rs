//! Comparable-sale valuation: eligibility filter, outlier removal and the
//! EMV / BMV% engine

pub mod batch;
pub mod engine;
pub mod error;
pub mod filter;
pub mod outliers;
pub mod source;
pub mod tiers;
pub mod types;
pub mod utils;
pub mod validate;

pub use engine::ValuationEngine;
pub use error::{SourceError, ValidationError, ValuationError};
pub use source::{SaleQuery, SaleRecordSource};
pub use tiers::{SearchTier, ValuationConfig};
pub use types::*;
