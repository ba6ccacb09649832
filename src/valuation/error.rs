//! Error types for the valuation pipeline
//!
//! Only structurally invalid input and supplier failures are errors. Thin or
//! missing evidence is encoded in the result's confidence instead.

use thiserror::Error;

/// Precondition failure on a subject or sale record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("guide price must be positive, got {0}")]
    InvalidGuidePrice(i64),

    #[error("sale {transaction_id} has non-positive price {price}")]
    InvalidSalePrice { transaction_id: String, price: i64 },

    #[error("sale record is missing a transaction id")]
    MissingTransactionId,

    #[error("sale {0} appears more than once")]
    DuplicateTransactionId(String),

    #[error("coordinates out of range: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("invalid UK postcode: {0:?}")]
    InvalidPostcode(String),

    #[error("subject has no {0} and location-free matching was not requested")]
    MissingLocation(&'static str),
}

/// Failure reported by an injected sale-record source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("sale record source unavailable: {0}")]
    Unavailable(String),

    #[error("sale record source returned malformed data: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("invalid valuation input: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
