//! Code for reading the LULC lookup table from a CSV file.
use super::*;
use crate::lulc::{LulcClass, LulcClassMap, LulcCode};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

const LULC_LOOKUP_FILE_NAME: &str = "lulc_lookup.csv";

/// A row of the LULC lookup table
#[derive(PartialEq, Debug, Deserialize)]
struct LulcClassRaw {
    #[serde(rename = "lulc-class")]
    name: String,
    code: LulcCode,
    #[serde(
        rename = "is_coastal_blue_carbon_habitat",
        deserialize_with = "deserialise_flag"
    )]
    is_habitat: bool,
}

/// Build the class map from raw rows, checking that codes and names are unique
fn read_lulc_classes_from_iter<I>(iter: I) -> Result<LulcClassMap>
where
    I: Iterator<Item = LulcClassRaw>,
{
    LulcClassMap::from_classes(iter.map(|raw| LulcClass {
        code: raw.code,
        id: raw.name.into(),
        is_habitat: raw.is_habitat,
    }))
}

/// Read the LULC lookup table from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The LULC classes in the order they appear in the file
pub fn read_lulc_classes(model_dir: &Path) -> Result<LulcClassMap> {
    let file_path = model_dir.join(LULC_LOOKUP_FILE_NAME);
    let classes_csv = read_csv(&file_path)?;
    read_lulc_classes_from_iter(classes_csv.into_iter()).with_context(|| input_err_msg(file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ModelError};
    use crate::fixture::lulc_classes;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_lookup_file(dir_path: &Path, contents: &str) {
        let mut file = File::create(dir_path.join(LULC_LOOKUP_FILE_NAME)).unwrap();
        write!(file, "{contents}").unwrap();
    }

    #[rstest]
    fn test_read_lulc_classes(lulc_classes: LulcClassMap) {
        let dir = tempdir().unwrap();
        create_lookup_file(
            dir.path(),
            "lulc-class,code,is_coastal_blue_carbon_habitat
n,0,False
x,1,True
y,2,true
z,3,TRUE
",
        );
        assert_eq!(read_lulc_classes(dir.path()).unwrap(), lulc_classes);
    }

    #[test]
    fn test_read_lulc_classes_unreadable_flag() {
        let dir = tempdir().unwrap();
        create_lookup_file(
            dir.path(),
            "lulc-class,code,is_coastal_blue_carbon_habitat\nn,0,\nx,1,True\n",
        );
        assert!(read_lulc_classes(dir.path()).is_err());
    }

    #[test]
    fn test_read_lulc_classes_duplicate_code() {
        let dir = tempdir().unwrap();
        create_lookup_file(
            dir.path(),
            "lulc-class,code,is_coastal_blue_carbon_habitat\nn,0,false\nx,0,true\n",
        );
        let err = read_lulc_classes(dir.path()).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Data));
    }
}
