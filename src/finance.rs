//! Carbon prices, discounting and net present value.
use crate::error::ModelError;
use crate::units::{Dimensionless, MoneyPerCarbon};
use anyhow::{Result, ensure};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// The price of carbon in every year of the analysis
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries(BTreeMap<u32, MoneyPerCarbon>);

impl PriceSeries {
    /// Create a price series from a table of prices.
    ///
    /// Fails with a validation error naming the first year in `years` without a price.
    pub fn from_table(
        table: BTreeMap<u32, MoneyPerCarbon>,
        years: RangeInclusive<u32>,
    ) -> Result<Self> {
        for year in years.clone() {
            ensure!(
                table.contains_key(&year),
                ModelError::Validation(format!(
                    "The price table does not include a price for {year}: prices are needed for \
                    every year from {} to {}",
                    years.start(),
                    years.end()
                ))
            );
        }

        Ok(Self(
            table
                .into_iter()
                .filter(|(year, _)| years.contains(year))
                .collect(),
        ))
    }

    /// Create a price series from a single price which grows at a fixed interest rate.
    ///
    /// The price in year `y` is `price * (1 + interest_rate)^(y - base_year)`, where the base year
    /// is the first year of `years`.
    ///
    /// # Arguments
    ///
    /// * `price` - The price in the base year
    /// * `interest_rate` - Annual growth in price as a fraction (e.g. 0.05 for 5%)
    /// * `years` - The years for which to calculate prices
    pub fn compounded(
        price: MoneyPerCarbon,
        interest_rate: Dimensionless,
        years: RangeInclusive<u32>,
    ) -> Self {
        let base_year = *years.start();
        Self(
            years
                .map(|year| {
                    let growth = (Dimensionless(1.0) + interest_rate).powi(elapsed(year, base_year));
                    (year, price * growth)
                })
                .collect(),
        )
    }

    /// Get the price for a given year, if there is one
    pub fn get(&self, year: u32) -> Option<MoneyPerCarbon> {
        self.0.get(&year).copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Years since the base year, as an exponent
#[allow(clippy::cast_possible_truncation)]
fn elapsed(year: u32, base_year: u32) -> i32 {
    (i64::from(year) - i64::from(base_year)) as i32
}

/// The factor by which a value in `year` is discounted back to `base_year`
pub fn discount_factor(discount_rate: Dimensionless, year: u32, base_year: u32) -> Dimensionless {
    Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).powi(elapsed(year, base_year))
}

/// Convert a percentage into a fraction
pub fn from_percent(value: f64) -> Dimensionless {
    Dimensionless(value / 100.0)
}

/// Everything needed to value carbon sequestration
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    /// The price of carbon in each year
    pub prices: PriceSeries,
    /// Annual discount rate as a fraction
    pub discount_rate: Dimensionless,
    /// The year to which values are discounted
    pub base_year: u32,
}

impl Valuation {
    /// Calculate the net present value of a series of annual net sequestration rasters.
    ///
    /// The value for each cell is the sum over years of `sequestration * price * discount`.
    /// NaN (nodata) cells stay NaN.
    ///
    /// # Arguments
    ///
    /// * `shape` - The shape of the rasters
    /// * `annual` - Net sequestration rasters keyed by year
    pub fn net_present_value<'a, I>(&self, shape: (usize, usize), annual: I) -> Result<Array2<f64>>
    where
        I: IntoIterator<Item = (u32, &'a Array2<f64>)>,
    {
        let mut npv = Array2::zeros(shape);
        for (year, sequestration) in annual {
            let price = self.prices.get(year).ok_or_else(|| {
                ModelError::Validation(format!("No carbon price is available for {year}"))
            })?;
            let discount = discount_factor(self.discount_rate, year, self.base_year);
            npv.scaled_add(price.value() * discount.value(), sequestration);
        }

        Ok(npv)
    }
}
