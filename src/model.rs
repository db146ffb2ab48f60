//! The model definition: every input needed to run a simulation, loaded and checked.
use crate::finance::{PriceSeries, Valuation, from_percent};
use crate::input::{
    read_carbon_pools, read_lulc_classes, read_price_table, read_snapshots, read_transition_table,
};
use crate::lulc::LulcClassMap;
use crate::pool::CarbonPoolTable;
use crate::snapshot::SnapshotSeries;
use crate::transition::TransitionTable;
use crate::units::MoneyPerCarbon;
use crate::year::{Interval, intervals, valuation_years};
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::{EconomicParameters, ModelParameters, TransitionMap};

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// LULC classes, keyed by raster code
    pub lulc_classes: LulcClassMap,
    /// Transition type for each pair of classes
    pub transitions: TransitionTable,
    /// Carbon parameters for each class
    pub carbon_pools: CarbonPoolTable,
    /// The baseline and transition maps
    pub snapshots: SnapshotSeries,
    /// Prices and discounting, if economic analysis is enabled
    pub valuation: Option<Valuation>,
}

/// Build the valuation from the economic parameters
fn read_valuation(
    model_dir: &Path,
    parameters: &ModelParameters,
) -> Result<Option<Valuation>> {
    let Some(economics) = &parameters.economics else {
        return Ok(None);
    };

    let years = valuation_years(&parameters.transition_years(), parameters.analysis_year);
    let base_year = *years.start();
    let prices = if let Some(price_table) = &economics.price_table {
        let file_path = model_dir.join(price_table);
        let table = read_price_table(&file_path)?;
        PriceSeries::from_table(table, years)
            .with_context(|| format!("Invalid price table {}", file_path.display()))?
    } else {
        // Both are present: checked when the parameters were loaded
        let price = economics.price.unwrap_or_default();
        let interest_rate = economics.interest_rate.unwrap_or_default();
        PriceSeries::compounded(MoneyPerCarbon(price), from_percent(interest_rate), years)
    };

    Ok(Some(Valuation {
        prices,
        discount_rate: from_percent(economics.discount_rate),
        base_year,
    }))
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;
        let lulc_classes = read_lulc_classes(model_dir)?;
        let transitions = read_transition_table(model_dir, &lulc_classes)?;
        let carbon_pools = read_carbon_pools(model_dir, &lulc_classes)?;
        carbon_pools
            .check(&lulc_classes, &transitions)
            .context("Carbon pool parameters do not cover the transition matrix")?;
        let snapshots = read_snapshots(model_dir, &parameters, &lulc_classes)?;
        let valuation = read_valuation(model_dir, &parameters)?;
        if valuation.is_none() {
            info!("No [economics] section given: valuation will be skipped");
        }

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            parameters,
            lulc_classes,
            transitions,
            carbon_pools,
            snapshots,
            valuation,
        })
    }

    /// The interval over which each transition is in effect, in chronological order
    pub fn intervals(&self) -> Vec<Interval> {
        intervals(&self.snapshots.years(), self.parameters.analysis_year)
    }
}
