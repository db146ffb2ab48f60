//! The module responsible for writing output data to disk.
use crate::lulc::LulcClassMap;
use crate::pool::Pool;
use crate::raster::{GridGeometry, write_float_raster};
use crate::simulation::StockState;
use crate::simulation::aggregate::IntervalSummary;
use crate::simulation::classify::Classification;
use anyhow::{Context, Result, ensure};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "bluecarbon_results";

/// The file extension for raster outputs
const RASTER_EXTENSION: &str = "asc";

/// The output file name for total net sequestration
const TOTAL_NET_SEQUESTRATION_NAME: &str = "total_net_carbon_sequestration";

/// The output file name for net present value
const NET_PRESENT_VALUE_NAME: &str = "net_present_value";

/// The output file name for annual net sequestration
const ANNUAL_SEQUESTRATION_FILE_NAME: &str = "annual_sequestration.csv";

/// The output file name for the transitions observed in each transition year
const TRANSITIONS_FILE_NAME: &str = "debug_transitions.csv";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing directory is only reused if it is empty or `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory containing files will be written over
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to write over it."
        );
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Build an output file name, with the results suffix if there is one
pub fn output_file_name(stem: &str, suffix: Option<&str>, extension: &str) -> String {
    match suffix {
        Some(suffix) => format!("{stem}_{suffix}.{extension}"),
        None => format!("{stem}.{extension}"),
    }
}

/// Represents a row in the annual sequestration CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AnnualSequestrationRow {
    year: u32,
    net_sequestration: f64,
    valid_cells: usize,
}

impl AnnualSequestrationRow {
    /// Sum net sequestration over cells with data
    fn new(year: u32, net: &Array2<f64>) -> Self {
        let valid = net.iter().filter(|value| !value.is_nan());
        Self {
            year,
            net_sequestration: valid.clone().sum(),
            valid_cells: valid.count(),
        }
    }
}

/// Represents a row in the debug transitions CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TransitionRow {
    year: u32,
    from_class: String,
    to_class: String,
    transition: String,
    disturbed_biomass: Option<f64>,
    disturbed_soil: Option<f64>,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    transitions_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(TRANSITIONS_FILE_NAME);
        Ok(Self {
            transitions_writer: csv::Writer::from_path(file_path)?,
        })
    }

    /// Write the transitions observed in a transition year
    fn write_transitions(
        &mut self,
        year: u32,
        classification: &Classification,
        lulc_classes: &LulcClassMap,
    ) -> Result<()> {
        let class_name = |code| -> Result<String> {
            Ok(lulc_classes.get_checked(code)?.id.to_string())
        };

        for (from, to, transition) in classification.iter_observed() {
            let disturbed = |pool| {
                classification
                    .disturbed(pool)
                    .get(&(from, to))
                    .map(|stock| stock.value())
            };
            let row = TransitionRow {
                year,
                from_class: class_name(from)?,
                to_class: class_name(to)?,
                transition: transition.to_string(),
                disturbed_biomass: disturbed(Pool::Biomass),
                disturbed_soil: disturbed(Pool::Soil),
            };
            self.transitions_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.transitions_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    output_path: PathBuf,
    geometry: GridGeometry,
    suffix: Option<String>,
    annual_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `geometry` - The grid shared by all output rasters
    /// * `suffix` - Suffix added to raster file names
    /// * `save_debug_info` - Whether to include extra files for debugging model
    pub fn create(
        output_path: &Path,
        geometry: &GridGeometry,
        suffix: Option<&str>,
        save_debug_info: bool,
    ) -> Result<Self> {
        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            output_path: output_path.to_path_buf(),
            geometry: *geometry,
            suffix: suffix.map(String::from),
            annual_writer: csv::Writer::from_path(
                output_path.join(ANNUAL_SEQUESTRATION_FILE_NAME),
            )?,
            debug_writer,
        })
    }

    /// Write a raster with the given name, adding the suffix and extension
    fn write_raster(&self, stem: &str, data: &Array2<f64>) -> Result<()> {
        let file_name = output_file_name(stem, self.suffix.as_deref(), RASTER_EXTENSION);
        write_float_raster(&self.output_path.join(file_name), &self.geometry, data)
    }

    /// Write the total net sequestration raster
    pub fn write_total_net_sequestration(&self, data: &Array2<f64>) -> Result<()> {
        self.write_raster(TOTAL_NET_SEQUESTRATION_NAME, data)
    }

    /// Write the net present value raster
    pub fn write_net_present_value(&self, data: &Array2<f64>) -> Result<()> {
        self.write_raster(NET_PRESENT_VALUE_NAME, data)
    }

    /// Write net sequestration summed over the grid for each year
    pub fn write_annual_sequestration(&mut self, annual: &[(u32, Array2<f64>)]) -> Result<()> {
        for (year, net) in annual {
            self.annual_writer
                .serialize(AnnualSequestrationRow::new(*year, net))?;
        }

        Ok(())
    }

    /// Write accumulation, emissions and net sequestration rasters for an interval.
    ///
    /// Intervals covering no years are skipped.
    pub fn write_interval(&self, summary: &IntervalSummary) -> Result<()> {
        let interval = summary.interval;
        if interval.is_empty() {
            return Ok(());
        }

        let span = format!("between_{}_and_{}", interval.start, interval.end);
        self.write_raster(
            &format!("carbon_accumulation_{span}"),
            &summary.accumulation,
        )?;
        self.write_raster(&format!("carbon_emissions_{span}"), &summary.emissions)?;
        self.write_raster(
            &format!("net_carbon_sequestration_{span}"),
            &summary.net,
        )?;

        Ok(())
    }

    /// Write the total carbon stock in a year.
    ///
    /// With debug output enabled, the stock of each pool and the years since disturbance are
    /// written too.
    pub fn write_stocks(&self, state: &StockState) -> Result<()> {
        let year = state.year;
        self.write_raster(&format!("carbon_stock_at_{year}"), &state.total())?;

        if self.debug_writer.is_some() {
            for (name, data) in [
                ("biomass", &state.biomass),
                ("soil", &state.soil),
                ("litter", &state.litter),
            ] {
                self.write_raster(&format!("debug_{name}_stock_at_{year}"), data)?;
            }
            self.write_raster(
                &format!("debug_years_since_disturbance_at_{year}"),
                &state.years_since_disturbance,
            )?;
        }

        Ok(())
    }

    /// Write debug information about the transitions in a transition year
    pub fn write_debug_info(
        &mut self,
        year: u32,
        classification: &Classification,
        lulc_classes: &LulcClassMap,
    ) -> Result<()> {
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_transitions(year, classification, lulc_classes)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.annual_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
