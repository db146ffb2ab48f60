//! Common functionality for the blue carbon model.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod error;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod lulc;
pub mod model;
pub mod output;
pub mod pool;
pub mod preprocess;
pub mod raster;
pub mod settings;
pub mod simulation;
pub mod snapshot;
pub mod transition;
pub mod units;
pub mod year;

#[cfg(test)]
mod fixture;

/// Get the directory in which the program's config files live.
///
/// Falls back to the current directory on platforms where no config directory can be found.
pub fn get_bluecarbon_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        return PathBuf::from(".");
    };
    config_dir.push("bluecarbon");
    config_dir
}
