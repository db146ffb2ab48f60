//! Common routines for handling input data.
use crate::model::Model;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

mod lulc;
pub use lulc::read_lulc_classes;
mod pool;
pub use pool::read_carbon_pools;
mod price;
pub use price::read_price_table;
mod snapshot;
pub use snapshot::read_snapshots;
mod transition;
pub use transition::{
    TRANSITION_MATRIX_CLASS_COLUMN, UNRESOLVED_DISTURBANCE, read_transition_table,
};

/// Read a series of type `T`s from a CSV file.
///
/// Whitespace around fields is trimmed.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The deserialised rows or an error if the file could not be read or is empty
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let rows = read_csv_internal(file_path)?;
    ensure!(
        !rows.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(rows)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    reader
        .deserialize()
        .map(|row| row.with_context(|| input_err_msg(file_path)))
        .try_collect()
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Deserialize::deserialize(deserialiser)?;
    if value.is_some_and(|value| !(0.0..=1.0).contains(&value)) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value)
}

/// Read a boolean flag written as `true`/`false` (any case) or `1`/`0`
pub fn deserialise_flag<'de, D>(deserialiser: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: String = Deserialize::deserialize(deserialiser)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(serde::de::Error::custom(format!(
            "Invalid boolean value: \"{value}\" (must be true or false)"
        ))),
    }
}

/// Indicates whether the elements of a slice are strictly increasing
pub fn is_sorted_and_unique<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// Load a model from the specified directory.
///
/// All lookup tables and rasters are read and cross-checked here, so that a model which loads
/// successfully can be simulated without any further input errors.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The loaded model or an error
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    Model::from_path(model_dir)
}
