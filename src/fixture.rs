//! Fixtures for tests
use crate::lulc::{LulcClass, LulcClassMap, LulcCode};
use crate::model::{Model, ModelParameters, TransitionMap};
use crate::pool::{
    CarbonPoolTable, ClassCarbon, DisturbanceFactors, InitialStocks, TransientParameters,
};
use crate::raster::{GridGeometry, LulcRaster};
use crate::snapshot::{Snapshot, SnapshotSeries};
use crate::transition::{TransitionTable, TransitionType};
use crate::units::{CarbonDensity, CarbonDensityPerYear, Dimensionless, Year};
use indexmap::indexmap;
use ndarray::{Array2, array};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Classes n (not habitat), x, y and z
#[fixture]
pub fn lulc_classes() -> LulcClassMap {
    let class = |code, name: &str, is_habitat| LulcClass {
        code,
        id: name.into(),
        is_habitat,
    };
    LulcClassMap::from_classes([
        class(0, "n", false),
        class(1, "x", true),
        class(2, "y", true),
        class(3, "z", true),
    ])
    .unwrap()
}

/// Becoming n disturbs a habitat class; becoming any habitat class accumulates
#[fixture]
pub fn transition_table() -> TransitionTable {
    let mut table = TransitionTable::new();
    table.insert(0, 0, TransitionType::NoCarbonChange);
    for to in 1..=3 {
        table.insert(0, to, TransitionType::Accumulation);
    }
    for from in 1..=3 {
        table.insert(from, 0, TransitionType::MedImpactDisturb);
        for to in 1..=3 {
            table.insert(from, to, TransitionType::Accumulation);
        }
    }

    table
}

/// Build the parameters for a class with only medium-impact disturbance factors
fn class_carbon(
    stock: f64,
    litter: f64,
    half_life: f64,
    factor: f64,
    accumulation: (f64, f64),
) -> ClassCarbon {
    let transient = |yearly_accumulation| TransientParameters {
        half_life: Some(Year(half_life)),
        disturbance: DisturbanceFactors {
            low: None,
            medium: Some(Dimensionless(factor)),
            high: None,
        },
        yearly_accumulation: CarbonDensityPerYear(yearly_accumulation),
    };

    ClassCarbon {
        initial: InitialStocks {
            biomass: CarbonDensity(stock),
            soil: CarbonDensity(stock),
            litter: CarbonDensity(litter),
        },
        biomass: transient(accumulation.0),
        soil: transient(accumulation.1),
    }
}

#[fixture]
pub fn carbon_pools() -> CarbonPoolTable {
    CarbonPoolTable::new(indexmap! {
        0 => class_carbon(0.0, 0.0, 0.0, 0.0, (0.0, 0.0)),
        1 => class_carbon(5.0, 0.5, 1.0, 0.5, (1.0, 1.1)),
        2 => class_carbon(10.0, 0.5, 1.0, 0.5, (2.0, 2.1)),
        3 => class_carbon(20.0, 0.5, 1.0, 0.5, (1.0, 1.1)),
    })
}

/// A LULC raster with unit cells at the origin
pub fn lulc_raster(codes: Array2<Option<LulcCode>>) -> LulcRaster {
    let (nrows, ncols) = codes.dim();
    LulcRaster {
        geometry: GridGeometry {
            ncols,
            nrows,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
        },
        nodata: Some(-9999.0),
        codes,
    }
}

/// Baseline of x, x in 2000 with one nodata cell, then y in 2005
#[fixture]
pub fn snapshots() -> SnapshotSeries {
    SnapshotSeries::new(
        lulc_raster(Array2::from_elem((2, 2), Some(1))),
        vec![
            Snapshot {
                year: 2000,
                raster: lulc_raster(array![[None, Some(1)], [Some(1), Some(1)]]),
            },
            Snapshot {
                year: 2005,
                raster: lulc_raster(Array2::from_elem((2, 2), Some(2))),
            },
        ],
    )
    .unwrap()
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        baseline_map: "baseline.asc".into(),
        transitions: vec![
            TransitionMap {
                year: 2000,
                map: "lulc_2000.asc".into(),
            },
            TransitionMap {
                year: 2005,
                map: "lulc_2005.asc".into(),
            },
        ],
        analysis_year: Some(2010),
        results_suffix: None,
        economics: None,
    }
}

/// The worked example, without economic analysis
#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    lulc_classes: LulcClassMap,
    transition_table: TransitionTable,
    carbon_pools: CarbonPoolTable,
    snapshots: SnapshotSeries,
) -> Model {
    Model {
        model_path: PathBuf::from("model"),
        parameters: model_parameters,
        lulc_classes,
        transitions: transition_table,
        carbon_pools,
        snapshots,
        valuation: None,
    }
}
