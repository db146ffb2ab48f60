//! Drafting a transition matrix and carbon pool tables from a series of LULC maps.
//!
//! The draft matrix only records what can be inferred from the maps: a change into a habitat
//! class accumulates carbon and a change out of one disturbs it. The intensity of each disturbance
//! is left for the user to choose.
use crate::input::{
    TRANSITION_MATRIX_CLASS_COLUMN, UNRESOLVED_DISTURBANCE, read_lulc_classes, read_snapshots,
};
use crate::lulc::{LulcClass, LulcClassMap};
use crate::model::ModelParameters;
use crate::output::output_file_name;
use crate::pool::Pool;
use crate::snapshot::SnapshotSeries;
use crate::transition::{TransitionKey, TransitionType};
use anyhow::{Context, Result};
use log::info;
use ndarray::Zip;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use strum::IntoEnumIterator;

/// The stem of the output file name for the draft transition matrix
const TRANSITIONS_NAME: &str = "transitions";

/// The stem of the output file name for the initial carbon pool template
const INITIAL_TEMPLATE_NAME: &str = "carbon_pool_initial_template";

/// The stem of the output file name for the transient carbon pool template
const TRANSIENT_TEMPLATE_NAME: &str = "carbon_pool_transient_template";

/// Explanation of the labels, written after the matrix
const LEGEND: [(&str, &str); 4] = [
    ("NCC", "no carbon change"),
    ("accum", "accumulation"),
    (
        UNRESOLVED_DISTURBANCE,
        "disturbance: replace with low-impact-disturb, med-impact-disturb or high-impact-disturb",
    ),
    ("", "transition not observed"),
];

/// An entry in the draft transition matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftTransition {
    /// The transition type is known
    Known(TransitionType),
    /// A disturbance of unknown intensity
    Disturbance,
}

impl DraftTransition {
    /// The label written in the matrix
    fn label(self) -> String {
        match self {
            Self::Known(transition) => transition.to_string(),
            Self::Disturbance => UNRESOLVED_DISTURBANCE.to_string(),
        }
    }
}

/// Every (from, to) pair of class codes which occurs between consecutive maps.
///
/// Cells with no data in either map are skipped.
pub fn observed_transitions(snapshots: &SnapshotSeries) -> HashSet<TransitionKey> {
    let mut observed = HashSet::new();
    for (from, to) in snapshots.iter_transitions() {
        Zip::from(&from.codes)
            .and(&to.raster.codes)
            .for_each(|from, to| {
                if let (Some(from), Some(to)) = (from, to) {
                    observed.insert((*from, *to));
                }
            });
    }

    observed
}

/// Work out the draft entry for a pair of classes.
///
/// A change between two non-habitat classes never affects carbon. Otherwise only observed pairs
/// get an entry.
fn draft_entry(from: &LulcClass, to: &LulcClass, observed: bool) -> Option<DraftTransition> {
    if !from.is_habitat && !to.is_habitat {
        return Some(DraftTransition::Known(TransitionType::NoCarbonChange));
    }
    if !observed {
        return None;
    }

    Some(if to.is_habitat {
        DraftTransition::Known(TransitionType::Accumulation)
    } else {
        DraftTransition::Disturbance
    })
}

/// Draft a transition matrix from the pairs of classes observed in the maps
pub fn draft_transition_matrix(
    lulc_classes: &LulcClassMap,
    observed: &HashSet<TransitionKey>,
) -> HashMap<TransitionKey, DraftTransition> {
    let mut matrix = HashMap::new();
    for from in lulc_classes.iter() {
        for to in lulc_classes.iter() {
            let key = (from.code, to.code);
            if let Some(entry) = draft_entry(from, to, observed.contains(&key)) {
                matrix.insert(key, entry);
            }
        }
    }

    matrix
}

/// Write the draft matrix with rows and columns in lookup order, followed by a legend
fn write_transition_matrix(
    file_path: &Path,
    lulc_classes: &LulcClassMap,
    matrix: &HashMap<TransitionKey, DraftTransition>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(file_path)?;

    let mut header = vec![TRANSITION_MATRIX_CLASS_COLUMN.to_string()];
    header.extend(lulc_classes.iter().map(|class| class.id.to_string()));
    writer.write_record(&header)?;

    for from in lulc_classes.iter() {
        let mut row = vec![from.id.to_string()];
        row.extend(lulc_classes.iter().map(|to| {
            matrix
                .get(&(from.code, to.code))
                .map(|entry| entry.label())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer.write_record(vec![""; header.len()])?;
    writer.write_record(["", "legend"])?;
    for (label, description) in LEGEND {
        writer.write_record(["", label, description])?;
    }
    writer.flush()?;

    Ok(())
}

/// Write a table with one row per class and empty value columns
fn write_template(
    file_path: &Path,
    lulc_classes: &LulcClassMap,
    value_columns: &[String],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)?;

    let mut header = vec!["code".to_string(), "lulc-class".to_string()];
    header.extend_from_slice(value_columns);
    writer.write_record(&header)?;

    for class in lulc_classes.iter() {
        let mut row = vec![class.code.to_string(), class.id.to_string()];
        row.resize(header.len(), String::new());
        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(())
}

/// The value columns of the transient carbon pool table
fn transient_columns() -> Vec<String> {
    Pool::iter()
        .flat_map(|pool| {
            [
                "half-life",
                "low-impact-disturb",
                "med-impact-disturb",
                "high-impact-disturb",
                "yearly-accumulation",
            ]
            .map(|column| format!("{pool}-{column}"))
        })
        .collect()
}

/// Write a draft transition matrix and carbon pool templates for a series of maps.
///
/// # Arguments
///
/// * `lulc_classes` - All LULC classes
/// * `snapshots` - The baseline and transition maps
/// * `output_path` - Folder where files will be saved
/// * `suffix` - Suffix added to output file names
pub fn write_preprocessor_outputs(
    lulc_classes: &LulcClassMap,
    snapshots: &SnapshotSeries,
    output_path: &Path,
    suffix: Option<&str>,
) -> Result<()> {
    let observed = observed_transitions(snapshots);
    info!("Found {} distinct transitions in the maps", observed.len());
    let matrix = draft_transition_matrix(lulc_classes, &observed);

    let file_path = |stem| output_path.join(output_file_name(stem, suffix, "csv"));
    write_transition_matrix(&file_path(TRANSITIONS_NAME), lulc_classes, &matrix)?;
    let initial_columns = ["biomass", "soil", "litter"].map(String::from);
    write_template(&file_path(INITIAL_TEMPLATE_NAME), lulc_classes, &initial_columns)?;
    write_template(
        &file_path(TRANSIENT_TEMPLATE_NAME),
        lulc_classes,
        &transient_columns(),
    )?;

    Ok(())
}

/// Run the preprocessor on the maps listed in a model directory.
///
/// Only the model parameters, the LULC lookup table and the maps are read, so the transition
/// matrix and carbon pool tables need not exist yet.
pub fn preprocess(model_dir: &Path, output_path: &Path) -> Result<()> {
    let parameters = ModelParameters::from_path(model_dir)?;
    let lulc_classes = read_lulc_classes(model_dir)?;
    let snapshots = read_snapshots(model_dir, &parameters, &lulc_classes)?;

    write_preprocessor_outputs(
        &lulc_classes,
        &snapshots,
        output_path,
        parameters.results_suffix.as_deref(),
    )
    .context("Failed to write preprocessor outputs")
}
