//! In-memory sale-record source backed by a parsed price-paid CSV

use crate::ingestion::parse::parse_price_paid_file;
use crate::valuation::error::SourceError;
use crate::valuation::source::{SaleQuery, SaleRecordSource};
use crate::valuation::types::ComparableSale;
use crate::valuation::utils::{haversine_miles, within_months};
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct CsvSaleSource {
    sales: Vec<ComparableSale>,
}

impl CsvSaleSource {
    pub fn new(sales: Vec<ComparableSale>) -> Self {
        Self { sales }
    }

    /// Load and parse a price-paid CSV once; queries are answered from memory
    pub fn from_path(path: &Path) -> Result<Self> {
        let (sales, stats) = parse_price_paid_file(path)?;
        info!("Loaded {} sale records ({})", sales.len(), stats);
        Ok(Self::new(sales))
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn sales(&self) -> &[ComparableSale] {
        &self.sales
    }

    /// Inside the query's area: within the radius of its centre, or in the
    /// same postcode district when the query has no centre
    fn in_area(query: &SaleQuery, sale: &ComparableSale) -> bool {
        match (query.centre, &query.postcode_district) {
            (Some(centre), _) => haversine_miles(centre, sale.coordinates) <= query.radius_miles,
            (None, Some(district)) => sale.postcode_district().as_ref() == Some(district),
            (None, None) => true,
        }
    }
}

impl SaleRecordSource for CsvSaleSource {
    fn comparable_sales(&self, query: &SaleQuery) -> Result<Vec<ComparableSale>, SourceError> {
        let matches: Vec<ComparableSale> = self
            .sales
            .iter()
            .filter(|sale| sale.property_type == query.property_type && sale.tenure == query.tenure)
            .filter(|sale| {
                within_months(sale.sale_date, query.reference_date, query.date_range_months)
            })
            .filter(|sale| Self::in_area(query, sale))
            .cloned()
            .collect();

        debug!(
            "CSV source matched {} of {} records for {} {}",
            matches.len(),
            self.sales.len(),
            query.tenure,
            query.property_type
        );

        Ok(matches)
    }
}
