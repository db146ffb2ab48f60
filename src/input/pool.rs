//! Code for reading the initial and transient carbon pool tables from CSV files.
use super::*;
use crate::error::ModelError;
use crate::lulc::{LulcClassMap, LulcCode};
use crate::pool::{
    CarbonPoolTable, ClassCarbon, DisturbanceFactors, InitialStocks, TransientParameters,
};
use crate::units::{CarbonDensity, CarbonDensityPerYear, Dimensionless, Year};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const CARBON_POOL_INITIAL_FILE_NAME: &str = "carbon_pool_initial.csv";
const CARBON_POOL_TRANSIENT_FILE_NAME: &str = "carbon_pool_transient.csv";

/// A row of the initial carbon pool table
#[derive(PartialEq, Debug, Deserialize)]
struct InitialStocksRaw {
    code: LulcCode,
    #[serde(rename = "lulc-class", default)]
    name: Option<String>,
    biomass: f64,
    soil: f64,
    litter: f64,
}

/// A row of the transient carbon pool table
#[derive(PartialEq, Debug, Deserialize)]
struct TransientRaw {
    code: LulcCode,
    #[serde(rename = "lulc-class", default)]
    name: Option<String>,
    #[serde(rename = "biomass-half-life", default)]
    biomass_half_life: Option<f64>,
    #[serde(
        rename = "biomass-low-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    biomass_low_impact_disturb: Option<f64>,
    #[serde(
        rename = "biomass-med-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    biomass_med_impact_disturb: Option<f64>,
    #[serde(
        rename = "biomass-high-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    biomass_high_impact_disturb: Option<f64>,
    #[serde(rename = "biomass-yearly-accumulation")]
    biomass_yearly_accumulation: f64,
    #[serde(rename = "soil-half-life", default)]
    soil_half_life: Option<f64>,
    #[serde(
        rename = "soil-low-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    soil_low_impact_disturb: Option<f64>,
    #[serde(
        rename = "soil-med-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    soil_med_impact_disturb: Option<f64>,
    #[serde(
        rename = "soil-high-impact-disturb",
        default,
        deserialize_with = "deserialise_proportion"
    )]
    soil_high_impact_disturb: Option<f64>,
    #[serde(rename = "soil-yearly-accumulation")]
    soil_yearly_accumulation: f64,
}

/// Check that a stock value is a finite, non-negative number
fn check_stock(value: f64, column: &str, code: LulcCode) -> Result<CarbonDensity> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "Invalid {column} value for LULC code {code}: must be a finite number >= 0"
    );
    Ok(CarbonDensity(value))
}

/// Check a half-life, which may be infinite but not negative or NaN
fn check_half_life(value: Option<f64>, pool: &str, code: LulcCode) -> Result<Option<Year>> {
    let Some(value) = value else {
        return Ok(None);
    };
    ensure!(
        value >= 0.0,
        "Invalid {pool}-half-life for LULC code {code}: must be >= 0"
    );
    Ok(Some(Year(value)))
}

/// Check an accumulation rate is a finite, non-negative number
fn check_accumulation(value: f64, pool: &str, code: LulcCode) -> Result<CarbonDensityPerYear> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "Invalid {pool}-yearly-accumulation for LULC code {code}: must be a finite number >= 0"
    );
    Ok(CarbonDensityPerYear(value))
}

/// Check that a row refers to a known class and that its class name, if given, matches the lookup
fn check_row_class(
    lulc_classes: &LulcClassMap,
    code: LulcCode,
    name: Option<&str>,
) -> Result<()> {
    let class = lulc_classes.get_checked(code)?;
    if let Some(name) = name {
        ensure!(
            name.is_empty() || *class.id.0 == *name,
            ModelError::Data(format!(
                "LULC code {code} is named {name}, but is {} in the LULC lookup table",
                class.id
            ))
        );
    }

    Ok(())
}

/// Read initial stocks for every class from raw rows
fn read_initial_stocks_from_iter<I>(
    iter: I,
    lulc_classes: &LulcClassMap,
) -> Result<HashMap<LulcCode, InitialStocks>>
where
    I: Iterator<Item = InitialStocksRaw>,
{
    let mut map = HashMap::new();
    for raw in iter {
        check_row_class(lulc_classes, raw.code, raw.name.as_deref())?;
        let stocks = InitialStocks {
            biomass: check_stock(raw.biomass, "biomass", raw.code)?,
            soil: check_stock(raw.soil, "soil", raw.code)?,
            litter: check_stock(raw.litter, "litter", raw.code)?,
        };
        ensure!(
            map.insert(raw.code, stocks).is_none(),
            "Duplicate entry for LULC code {}",
            raw.code
        );
    }

    Ok(map)
}

impl TransientRaw {
    /// Convert the raw row into checked parameters for the biomass and soil pools
    fn into_parameters(self) -> Result<(TransientParameters, TransientParameters)> {
        let factors = |low: Option<f64>, medium: Option<f64>, high: Option<f64>| {
            DisturbanceFactors {
                low: low.map(Dimensionless),
                medium: medium.map(Dimensionless),
                high: high.map(Dimensionless),
            }
        };

        let biomass = TransientParameters {
            half_life: check_half_life(self.biomass_half_life, "biomass", self.code)?,
            disturbance: factors(
                self.biomass_low_impact_disturb,
                self.biomass_med_impact_disturb,
                self.biomass_high_impact_disturb,
            ),
            yearly_accumulation: check_accumulation(
                self.biomass_yearly_accumulation,
                "biomass",
                self.code,
            )?,
        };
        let soil = TransientParameters {
            half_life: check_half_life(self.soil_half_life, "soil", self.code)?,
            disturbance: factors(
                self.soil_low_impact_disturb,
                self.soil_med_impact_disturb,
                self.soil_high_impact_disturb,
            ),
            yearly_accumulation: check_accumulation(
                self.soil_yearly_accumulation,
                "soil",
                self.code,
            )?,
        };

        Ok((biomass, soil))
    }
}

/// Read transient parameters for every class from raw rows
fn read_transient_from_iter<I>(
    iter: I,
    lulc_classes: &LulcClassMap,
) -> Result<HashMap<LulcCode, (TransientParameters, TransientParameters)>>
where
    I: Iterator<Item = TransientRaw>,
{
    let mut map = HashMap::new();
    for raw in iter {
        check_row_class(lulc_classes, raw.code, raw.name.as_deref())?;
        let code = raw.code;
        ensure!(
            map.insert(code, raw.into_parameters()?).is_none(),
            "Duplicate entry for LULC code {code}"
        );
    }

    Ok(map)
}

/// Combine the two tables, checking that every class appears in both
fn combine_tables(
    lulc_classes: &LulcClassMap,
    mut initial: HashMap<LulcCode, InitialStocks>,
    mut transient: HashMap<LulcCode, (TransientParameters, TransientParameters)>,
) -> Result<CarbonPoolTable> {
    let mut map = IndexMap::new();
    for class in lulc_classes.iter() {
        let initial = initial.remove(&class.code).ok_or_else(|| {
            ModelError::Configuration(format!(
                "No initial carbon stocks given for LULC class {} (code {}) in {}",
                class.id, class.code, CARBON_POOL_INITIAL_FILE_NAME
            ))
        })?;
        let (biomass, soil) = transient.remove(&class.code).ok_or_else(|| {
            ModelError::Configuration(format!(
                "No transient carbon parameters given for LULC class {} (code {}) in {}",
                class.id, class.code, CARBON_POOL_TRANSIENT_FILE_NAME
            ))
        })?;
        map.insert(
            class.code,
            ClassCarbon {
                initial,
                biomass,
                soil,
            },
        );
    }

    Ok(CarbonPoolTable::new(map))
}

/// Read the initial and transient carbon pool tables from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `lulc_classes` - All LULC classes
///
/// # Returns
///
/// Carbon parameters for every LULC class, in the order of the LULC lookup table
pub fn read_carbon_pools(model_dir: &Path, lulc_classes: &LulcClassMap) -> Result<CarbonPoolTable> {
    let file_path = model_dir.join(CARBON_POOL_INITIAL_FILE_NAME);
    let initial_csv = read_csv(&file_path)?;
    let initial = read_initial_stocks_from_iter(initial_csv.into_iter(), lulc_classes)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(CARBON_POOL_TRANSIENT_FILE_NAME);
    let transient_csv = read_csv(&file_path)?;
    let transient = read_transient_from_iter(transient_csv.into_iter(), lulc_classes)
        .with_context(|| input_err_msg(&file_path))?;

    combine_tables(lulc_classes, initial, transient)
}
