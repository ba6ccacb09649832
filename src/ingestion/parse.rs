//! Parse functions - transform price-paid CSV rows into ComparableSale structs

use crate::ingestion::types::{ParseStats, PricePaidRow};
use crate::ingestion::utils::{
    decode_property_type, decode_tenure, non_empty, normalise_transaction_id, parse_price,
    parse_transfer_date,
};
use crate::valuation::types::{ComparableSale, Coordinates, SaleAddress};
use crate::valuation::utils::normalise_postcode;
use crate::valuation::validate::validate_sale;
use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Only the first few bad rows are logged
const MAX_LOGGED_SKIPS: usize = 10;

/// Parse a headered price-paid CSV into comparable sales.
/// Rows that are not usable completed sales, or repeat an earlier
/// transaction id, are skipped and counted.
pub fn parse_price_paid<R: Read>(reader: R) -> Result<(Vec<ComparableSale>, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut sales = Vec::new();
    let mut stats = ParseStats::default();
    let mut seen = HashSet::new();

    for (idx, result) in reader.deserialize::<PricePaidRow>().enumerate() {
        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(parse_row)
            .and_then(|sale| {
                if seen.insert(sale.transaction_id.clone()) {
                    Ok(sale)
                } else {
                    Err(anyhow!("repeated transaction {}", sale.transaction_id))
                }
            });

        match parsed {
            Ok(sale) => {
                stats.parsed += 1;
                sales.push(sale);
            }
            Err(e) => {
                stats.skipped += 1;
                if stats.skipped <= MAX_LOGGED_SKIPS {
                    warn!("Skipping price-paid row {}: {}", idx, e);
                }
            }
        }
    }

    info!("Parsed price-paid CSV ({})", stats);

    Ok((sales, stats))
}

/// Parse a price-paid CSV file from disk
pub fn parse_price_paid_file(path: &Path) -> Result<(Vec<ComparableSale>, ParseStats)> {
    info!("Parsing price-paid CSV from {:?}", path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open sale records at {:?}", path))?;
    parse_price_paid(file)
}

fn parse_coordinate(raw: Option<&str>, name: &str) -> Result<f64> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("missing {}", name))?;
    let decimal =
        Decimal::from_str(raw).with_context(|| format!("invalid {} {:?}", name, raw))?;
    decimal
        .to_f64()
        .ok_or_else(|| anyhow!("{} {:?} out of range", name, raw))
}

fn parse_row(row: PricePaidRow) -> Result<ComparableSale> {
    // "D" marks a deleted record; anything else is a completed transfer
    if row
        .record_status
        .as_deref()
        .is_some_and(|status| status.trim().eq_ignore_ascii_case("D"))
    {
        bail!("record {} was deleted", row.transaction_id);
    }

    let transaction_id = normalise_transaction_id(&row.transaction_id)
        .ok_or_else(|| anyhow!("missing transaction id"))?;

    let price = parse_price(&row.price)
        .filter(|p| *p > 0)
        .ok_or_else(|| anyhow!("invalid price {:?}", row.price))?;

    let sale_date = parse_transfer_date(&row.date_of_transfer)
        .ok_or_else(|| anyhow!("invalid date {:?}", row.date_of_transfer))?;

    let property_type = decode_property_type(&row.property_type)
        .ok_or_else(|| anyhow!("unsupported property type {:?}", row.property_type))?;

    let tenure = decode_tenure(&row.duration)
        .ok_or_else(|| anyhow!("unsupported tenure {:?}", row.duration))?;

    let raw_postcode = row.postcode.as_deref().unwrap_or_default();
    let postcode = normalise_postcode(raw_postcode)
        .ok_or_else(|| anyhow!("invalid postcode {:?}", raw_postcode))?;

    let coordinates = Coordinates::new(
        parse_coordinate(row.latitude.as_deref(), "latitude")?,
        parse_coordinate(row.longitude.as_deref(), "longitude")?,
    );

    let new_build = row
        .old_new
        .as_deref()
        .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("Y"));

    let sale = ComparableSale {
        transaction_id,
        price,
        sale_date,
        property_type,
        tenure,
        postcode,
        coordinates,
        address: SaleAddress {
            paon: non_empty(row.paon),
            saon: non_empty(row.saon),
            street: non_empty(row.street),
            town: non_empty(row.town),
        },
        new_build,
    };

    validate_sale(&sale)?;

    Ok(sale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::types::{PropertyType, Tenure};
    use chrono::NaiveDate;
    use std::io::Write;

    const HEADER: &str = "transaction_id,price,date_of_transfer,postcode,property_type,old_new,duration,paon,saon,street,town,record_status,latitude,longitude";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_valid_row() {
        let data = csv_with(&[
            "{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9},\"£212,000\",2024-02-09 00:00,bs6 5ad,T,N,F,14,,Cotham Road,Bristol,A,51.4652,-2.5961",
        ]);

        let (sales, stats) = parse_price_paid(data.as_bytes()).unwrap();

        assert_eq!(stats, ParseStats { parsed: 1, skipped: 0 });
        let sale = &sales[0];
        assert_eq!(sale.transaction_id, "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9");
        assert_eq!(sale.price, 212_000);
        assert_eq!(sale.sale_date, NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
        assert_eq!(sale.property_type, PropertyType::Terraced);
        assert_eq!(sale.tenure, Tenure::Freehold);
        assert_eq!(sale.postcode, "BS6 5AD");
        assert_eq!(sale.address.paon.as_deref(), Some("14"));
        assert_eq!(sale.address.saon, None);
        assert!((sale.coordinates.latitude - 51.4652).abs() < 1e-9);
        assert!(!sale.new_build);
    }

    #[test]
    fn test_unusable_rows_are_skipped() {
        let data = csv_with(&[
            // deleted record
            "T1,250000,2024-01-01,BS6 5AD,T,N,F,,,,,D,51.46,-2.59",
            // other property type
            "T2,250000,2024-01-01,BS6 5AD,O,N,F,,,,,A,51.46,-2.59",
            // zero price
            "T3,0,2024-01-01,BS6 5AD,T,N,F,,,,,A,51.46,-2.59",
            // missing date
            "T4,250000,,BS6 5AD,T,N,F,,,,,A,51.46,-2.59",
            // unknown tenure
            "T5,250000,2024-01-01,BS6 5AD,T,N,U,,,,,A,51.46,-2.59",
            // latitude out of range
            "T6,250000,2024-01-01,BS6 5AD,T,N,F,,,,,A,151.46,-2.59",
            // missing coordinates
            "T7,250000,2024-01-01,BS6 5AD,T,N,F,,,,,A,,",
            // bad postcode
            "T8,250000,2024-01-01,BRISTOL,T,N,F,,,,,A,51.46,-2.59",
            // good
            "T9,250000,2024-01-01,BS6 5AD,F,Y,L,Flat 2,,,,A,51.46,-2.59",
        ]);

        let (sales, stats) = parse_price_paid(data.as_bytes()).unwrap();

        assert_eq!(stats, ParseStats { parsed: 1, skipped: 8 });
        assert_eq!(sales[0].transaction_id, "T9");
        assert_eq!(sales[0].property_type, PropertyType::Flat);
        assert_eq!(sales[0].tenure, Tenure::Leasehold);
        assert!(sales[0].new_build);
    }

    #[test]
    fn test_repeated_transaction_keeps_first() {
        let data = csv_with(&[
            "{0A1B2C3D-4E5F-6071-8293-A4B5C6D7E8F9},250000,2024-01-01,BS6 5AD,T,N,F,,,,,A,51.46,-2.59",
            "0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9,990000,2024-01-01,BS6 5AD,T,N,F,,,,,A,51.46,-2.59",
            "T2,260000,2024-01-01,BS6 5AD,T,N,F,,,,,A,51.46,-2.59",
        ]);

        let (sales, stats) = parse_price_paid(data.as_bytes()).unwrap();

        assert_eq!(stats, ParseStats { parsed: 2, skipped: 1 });
        assert_eq!(
            sales.iter().map(|s| s.price).collect::<Vec<_>>(),
            vec![250_000, 260_000]
        );
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            csv_with(&["T1,300000,15/03/2024,M14 5RG,S,N,F,,,,,A,53.4481,-2.2196"])
        )
        .unwrap();

        let (sales, stats) = parse_price_paid_file(file.path()).unwrap();
        assert_eq!(stats.parsed, 1);
        assert_eq!(sales[0].property_type, PropertyType::SemiDetached);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = parse_price_paid_file(Path::new("/definitely/not/here.csv"));
        assert!(result.is_err());
    }
}
