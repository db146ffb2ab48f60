//! Code for reading the baseline and transition maps.
use crate::lulc::LulcClassMap;
use crate::model::ModelParameters;
use crate::raster::read_lulc_raster;
use crate::snapshot::{Snapshot, SnapshotSeries};
use anyhow::Result;
use itertools::Itertools;
use std::path::Path;

/// Read the baseline and transition maps listed in the model parameters.
///
/// Map paths are relative to the model directory. Every map must have the same grid and nodata
/// value and only contain codes from the LULC lookup table.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `parameters` - Model parameters
/// * `lulc_classes` - All LULC classes
pub fn read_snapshots(
    model_dir: &Path,
    parameters: &ModelParameters,
    lulc_classes: &LulcClassMap,
) -> Result<SnapshotSeries> {
    let baseline = read_lulc_raster(&model_dir.join(&parameters.baseline_map))?;
    let snapshots = parameters
        .transitions
        .iter()
        .map(|transition| -> Result<_> {
            Ok(Snapshot {
                year: transition.year,
                raster: read_lulc_raster(&model_dir.join(&transition.map))?,
            })
        })
        .try_collect()?;

    let series = SnapshotSeries::new(baseline, snapshots)?;
    series.check_codes(lulc_classes)?;

    Ok(series)
}
