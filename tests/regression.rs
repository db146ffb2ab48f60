//! A regression test for the "simple" demo model.
use bluecarbon::cli::RunOpts;
use bluecarbon::cli::example::handle_example_run_command;
use bluecarbon::raster::read_float_raster;
use bluecarbon::settings::Settings;
use float_cmp::assert_approx_eq;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tempfile::tempdir;

const FLOAT_CMP_TOLERANCE: f64 = 1e-10;

/// Read a raster written by the model
fn read_output(output_dir: &Path, name: &str) -> ndarray::Array2<f64> {
    let (geometry, values) = read_float_raster(&output_dir.join(format!("{name}.asc"))).unwrap();
    assert_eq!(geometry.shape(), (2, 3));
    values
}

/// Sum the net sequestration column of the annual output
fn sum_annual_sequestration(output_dir: &Path) -> (usize, f64) {
    let file = File::open(output_dir.join("annual_sequestration.csv")).unwrap();
    let lines: Vec<String> = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .skip(1)
        .collect();
    let total = lines
        .iter()
        .map(|line| line.split(',').nth(1).unwrap().parse::<f64>().unwrap())
        .sum();
    (lines.len(), total)
}

#[test]
fn test_regression_simple() {
    unsafe { std::env::set_var("BLUECARBON_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path();
    let opts = RunOpts {
        output_dir: Some(output_dir.to_path_buf()),
        ..Default::default()
    };
    handle_example_run_command("simple", &opts, Some(Settings::default())).unwrap();

    // Nodata in the 2000 map
    let total = read_output(output_dir, "total_net_carbon_sequestration");
    assert!(total[[0, 0]].is_nan());

    // Saltmarsh then seagrass: 5 years at 2.1 a year then 5 years at 4.1 a year
    assert_approx_eq!(f64, total[[0, 1]], 31.0, epsilon = FLOAT_CMP_TOLERANCE);
    assert_approx_eq!(f64, total[[1, 1]], 31.0, epsilon = FLOAT_CMP_TOLERANCE);

    // Mangrove developed in 2005: half of the initial 20 in each pool decays with a half-life of
    // one year
    let emitted = 2.0 * 10.0 * (1.0 - 0.5_f64.powi(5));
    assert_approx_eq!(
        f64,
        total[[0, 2]],
        10.5 - emitted,
        epsilon = FLOAT_CMP_TOLERANCE
    );
    let emissions = read_output(output_dir, "carbon_emissions_between_2005_and_2010");
    assert_approx_eq!(f64, emissions[[0, 2]], emitted, epsilon = FLOAT_CMP_TOLERANCE);

    // Developed throughout
    assert_approx_eq!(f64, total[[1, 0]], 0.0, epsilon = FLOAT_CMP_TOLERANCE);

    // Mangrove throughout
    assert_approx_eq!(f64, total[[1, 2]], 21.0, epsilon = FLOAT_CMP_TOLERANCE);

    // Annual net sequestration adds up to the total
    let (num_years, annual_total) = sum_annual_sequestration(output_dir);
    assert_eq!(num_years, 10);
    let expected: f64 = total.iter().filter(|value| !value.is_nan()).sum();
    assert_approx_eq!(f64, annual_total, expected, epsilon = 1e-6);

    // Price of 2 in 2000 growing at 5%, discounted at 2% back to 2000
    let npv = read_output(output_dir, "net_present_value");
    assert!(npv[[0, 0]].is_nan());
    for (cell, expected) in [
        ([0, 1], 72.53796493375904),
        ([0, 2], -23.646768240382052),
        ([1, 0], 0.0),
        ([1, 1], 72.53796493375904),
        ([1, 2], 48.01806191107837),
    ] {
        assert_approx_eq!(f64, npv[cell], expected, epsilon = 1e-9);
    }

    // The same value worked out year by year from the annual sequestration of one cell
    let growth = 1.05_f64 / 1.02;
    let expected: f64 = (0..10)
        .map(|t| {
            let sequestration = if t < 5 { 2.1 } else { 4.1 };
            sequestration * 2.0 * growth.powi(t)
        })
        .sum();
    assert_approx_eq!(f64, npv[[0, 1]], expected, epsilon = 1e-9);
}
