//! Code for reading a carbon price table from a CSV file.
use super::*;
use crate::units::MoneyPerCarbon;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A row of the price table
#[derive(PartialEq, Debug, Deserialize)]
struct PriceRaw {
    year: u32,
    price: f64,
}

fn read_price_table_from_iter<I>(iter: I) -> Result<BTreeMap<u32, MoneyPerCarbon>>
where
    I: Iterator<Item = PriceRaw>,
{
    let mut prices = BTreeMap::new();
    for raw in iter {
        ensure!(
            raw.price.is_finite(),
            "Invalid price for year {}: must be a finite number",
            raw.year
        );
        ensure!(
            prices.insert(raw.year, MoneyPerCarbon(raw.price)).is_none(),
            "Duplicate price for year {}",
            raw.year
        );
    }

    Ok(prices)
}

/// Read a table of carbon prices by year.
///
/// # Arguments
///
/// * `file_path` - Path to the price table
///
/// # Returns
///
/// Prices keyed by year. Coverage of the simulated years is checked when the price series is
/// built.
pub fn read_price_table(file_path: &Path) -> Result<BTreeMap<u32, MoneyPerCarbon>> {
    let prices_csv = read_csv(file_path)?;
    read_price_table_from_iter(prices_csv.into_iter()).with_context(|| input_err_msg(file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_price_table() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("price_table.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "year,price\n2001,21\n2000,20").unwrap();
        }

        let prices = read_price_table(&file_path).unwrap();
        assert_eq!(
            prices.into_iter().collect::<Vec<_>>(),
            [(2000, MoneyPerCarbon(20.0)), (2001, MoneyPerCarbon(21.0))]
        );
    }

    #[test]
    fn test_read_price_table_duplicate_year() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("price_table.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "year,price\n2000,20\n2000,21").unwrap();
        }

        assert!(read_price_table(&file_path).is_err());
    }
}
