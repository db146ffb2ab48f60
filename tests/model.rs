use bluecarbon::model::Model;
use bluecarbon::year::Interval;
use std::path::{Path, PathBuf};

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    Path::new(file!())
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join("simple")
}

/// An integration test which attempts to load the demo model
#[test]
fn test_model_from_path() {
    let model = Model::from_path(get_model_dir()).unwrap();
    assert_eq!(model.snapshots.years(), [2000, 2005]);
    assert_eq!(
        model.intervals(),
        [
            Interval {
                start: 2000,
                end: 2005
            },
            Interval {
                start: 2005,
                end: 2010
            }
        ]
    );
    assert!(model.valuation.is_some());
}
