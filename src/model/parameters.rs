//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::error::ModelError;
use crate::input::{input_err_msg, read_toml};
use crate::year::check_transition_years;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// A LULC map and the year in which it takes effect
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct TransitionMap {
    /// The year of the map
    pub year: u32,
    /// Path to the map, relative to the model directory
    pub map: PathBuf,
}

/// Parameters for the economic analysis.
///
/// Prices either come from a table or are derived from a single price which grows at a fixed
/// interest rate.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct EconomicParameters {
    /// Annual discount rate, as a percentage
    pub discount_rate: f64,
    /// Price of carbon in the first transition year
    #[serde(default)]
    pub price: Option<f64>,
    /// Annual growth in the carbon price, as a percentage
    #[serde(default)]
    pub interest_rate: Option<f64>,
    /// Path to a table of carbon prices by year, relative to the model directory
    #[serde(default)]
    pub price_table: Option<PathBuf>,
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ModelParameters {
    /// Path to the LULC map in effect before the first transition
    pub baseline_map: PathBuf,
    /// Dated transition maps, in chronological order
    pub transitions: Vec<TransitionMap>,
    /// The year up to which the last transition is extrapolated
    #[serde(default)]
    pub analysis_year: Option<u32>,
    /// Suffix added to the names of output files
    #[serde(default)]
    pub results_suffix: Option<String>,
    /// Economic analysis parameters. If absent, no valuation is carried out.
    #[serde(default)]
    pub economics: Option<EconomicParameters>,
}

/// Check that the economic parameters give exactly one way of pricing carbon
fn check_economics(economics: &EconomicParameters) -> Result<()> {
    ensure!(
        economics.discount_rate.is_finite() && economics.discount_rate > -100.0,
        "discount_rate must be a finite percentage greater than -100"
    );

    match (
        &economics.price_table,
        economics.price,
        economics.interest_rate,
    ) {
        (Some(_), None, None) => {}
        (None, Some(price), Some(interest_rate)) => {
            ensure!(price.is_finite(), "price must be a finite number");
            ensure!(
                interest_rate.is_finite() && interest_rate > -100.0,
                "interest_rate must be a finite percentage greater than -100"
            );
        }
        (Some(_), _, _) => Err(ModelError::Configuration(
            "Either price_table or price and interest_rate must be given, not both".into(),
        ))?,
        (None, _, _) => Err(ModelError::Configuration(
            "Economic analysis requires either price_table or both price and interest_rate"
                .into(),
        ))?,
    }

    Ok(())
}

/// Check that the results suffix only contains characters which are safe in file names
fn check_results_suffix(suffix: &str) -> Result<()> {
    ensure!(
        suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
        "results_suffix may only contain letters, numbers, underscores and hyphens"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The year of each transition map
    pub fn transition_years(&self) -> Vec<u32> {
        self.transitions.iter().map(|t| t.year).collect()
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // transitions and analysis_year
        check_transition_years(&self.transition_years(), self.analysis_year)?;

        // results_suffix
        if let Some(suffix) = &self.results_suffix {
            check_results_suffix(suffix)?;
        }

        // economics
        if let Some(economics) = &self.economics {
            check_economics(economics).context("Invalid [economics] section")?;
        }

        Ok(())
    }
}
