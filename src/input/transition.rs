//! Code for reading the transition matrix from a CSV file.
//!
//! The matrix has one row per "from" class and one column per "to" class, with class names in the
//! first column and the header row. Each cell holds a transition type label or is left empty. The
//! matrix ends at the first row whose first field is empty; anything after it (e.g. a legend) is
//! ignored.
use super::*;
use crate::error::ModelError;
use crate::lulc::{LulcClassMap, LulcCode};
use crate::transition::{TransitionTable, TransitionType};
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

const TRANSITION_MATRIX_FILE_NAME: &str = "transitions.csv";

/// The header of the column containing "from" class names
pub const TRANSITION_MATRIX_CLASS_COLUMN: &str = "lulc-class";

/// Placeholder written by the preprocessor for transitions whose intensity must be chosen by the
/// user
pub const UNRESOLVED_DISTURBANCE: &str = "disturb";

/// Parse a single cell of the matrix.
///
/// Returns `None` for empty cells.
fn parse_cell(value: &str, from: &str, to: &str) -> Result<Option<TransitionType>> {
    if value.is_empty() {
        return Ok(None);
    }

    ensure!(
        value != UNRESOLVED_DISTURBANCE,
        ModelError::Configuration(format!(
            "The transition from {from} to {to} is marked \"{UNRESOLVED_DISTURBANCE}\": the \
            intensity must be one of low-impact-disturb, med-impact-disturb or \
            high-impact-disturb"
        ))
    );

    let transition = TransitionType::from_str(value)
        .with_context(|| format!("Invalid transition type for {from} to {to}: {value}"))?;
    Ok(Some(transition))
}

/// Read the transition table from CSV records
fn read_transition_table_from_reader<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
    lulc_classes: &LulcClassMap,
) -> Result<TransitionTable> {
    let header = reader.headers()?.clone();
    ensure!(
        header.get(0) == Some(TRANSITION_MATRIX_CLASS_COLUMN),
        "The first column must be named {TRANSITION_MATRIX_CLASS_COLUMN}"
    );
    let to_classes: Vec<(usize, &str, LulcCode)> = header
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| !name.is_empty())
        .map(|(i, name)| -> Result<_> { Ok((i, name, lulc_classes.code_for_name(name)?)) })
        .try_collect()?;

    let mut table = TransitionTable::new();
    let mut seen_rows = HashSet::new();
    for record in reader.records() {
        let record = record?;
        let from_name = record.get(0).unwrap_or_default();
        if from_name.is_empty() {
            break;
        }

        let from = lulc_classes.code_for_name(from_name)?;
        ensure!(
            seen_rows.insert(from),
            "Row for LULC class {from_name} appears more than once"
        );

        for (i, to_name, to) in &to_classes {
            let value = record.get(*i).unwrap_or_default();
            if let Some(transition) = parse_cell(value, from_name, to_name)? {
                table.insert(from, *to, transition);
            }
        }

        if record.iter().skip(header.len()).any(|value| !value.is_empty()) {
            bail!("Row for LULC class {from_name} has more values than there are columns");
        }
    }

    Ok(table)
}

/// Read the transition matrix from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `lulc_classes` - All LULC classes
///
/// # Returns
///
/// The table of transition types. Pairs left empty in the matrix are absent from the table.
pub fn read_transition_table(
    model_dir: &Path,
    lulc_classes: &LulcClassMap,
) -> Result<TransitionTable> {
    let file_path = model_dir.join(TRANSITION_MATRIX_FILE_NAME);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&file_path)
        .with_context(|| input_err_msg(&file_path))?;

    read_transition_table_from_reader(&mut reader, lulc_classes)
        .with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixture::{lulc_classes, transition_table};
    use rstest::rstest;

    fn read_str(contents: &str, lulc_classes: &LulcClassMap) -> Result<TransitionTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());
        read_transition_table_from_reader(&mut reader, lulc_classes)
    }

    #[rstest]
    fn test_read_transition_table(
        lulc_classes: LulcClassMap,
        transition_table: TransitionTable,
    ) {
        let contents = "lulc-class,n,x,y,z
n,NCC,accum,accum,accum
x,med-impact-disturb,accum,accum,accum
y,med-impact-disturb,accum,accum,accum
z,med-impact-disturb,accum,accum,accum
,,,,
,legend,,,
,NCC,no carbon change,,
";
        assert_eq!(read_str(contents, &lulc_classes).unwrap(), transition_table);
    }

    #[rstest]
    fn test_empty_cells_are_unmapped(lulc_classes: LulcClassMap) {
        let contents = "lulc-class,n,x\nn,NCC,\nx,,accum\n";
        let table = read_str(contents, &lulc_classes).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, 1), None);
        assert_eq!(table.get(1, 1), Some(TransitionType::Accumulation));
    }

    #[rstest]
    fn test_unresolved_disturbance(lulc_classes: LulcClassMap) {
        let contents = "lulc-class,n,x\nn,NCC,accum\nx,disturb,accum\n";
        let err = read_str(contents, &lulc_classes).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Configuration));
    }

    #[rstest]
    #[case("lulc-class,n,mangrove\nn,NCC,accum\n")] // unknown column
    #[case("lulc-class,n,x\nmangrove,NCC,accum\n")] // unknown row
    fn test_unknown_class_is_data_error(#[case] contents: &str, lulc_classes: LulcClassMap) {
        let err = read_str(contents, &lulc_classes).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Data));
    }

    #[rstest]
    #[case("lulc-class,n,x\nn,NCC,grow\n")] // bad label
    #[case("class,n,x\nn,NCC,accum\n")] // bad first column
    #[case("lulc-class,n,x\nn,NCC,accum\nn,NCC,accum\n")] // repeated row
    #[case("lulc-class,n,x\nn,NCC,accum,accum\n")] // too many values
    fn test_read_transition_table_invalid(#[case] contents: &str, lulc_classes: LulcClassMap) {
        assert!(read_str(contents, &lulc_classes).is_err());
    }
}
