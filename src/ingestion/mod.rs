//! Data ingestion module - price-paid sale records into comparable sales

pub mod parse;
pub mod source;
pub mod types;
pub mod utils;

pub use source::CsvSaleSource;
pub use types::*;
