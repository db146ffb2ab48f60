//! Functionality for running the carbon stock simulation.
use crate::model::Model;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::pool::{InitialStocks, Pool};
use crate::raster::mask_nodata;
use crate::units::CarbonDensity;
use crate::year::final_year;
use anyhow::{Context, Result};
use log::{debug, info};
use ndarray::Array2;
use std::path::Path;

pub mod aggregate;
use aggregate::{IntervalDeltas, IntervalSummary, aggregate};
pub mod classify;
use classify::{Classification, classify};
pub mod evolution;
use evolution::{advance_disturbance_clock, evolve, pool_rules, update_litter};

/// The carbon stocks of every cell in a given year
#[derive(Debug, Clone, PartialEq)]
pub struct StockState {
    /// The year
    pub year: u32,
    /// Biomass carbon
    pub biomass: Array2<f64>,
    /// Soil carbon
    pub soil: Array2<f64>,
    /// Litter carbon
    pub litter: Array2<f64>,
    /// Years since each cell was last disturbed
    pub years_since_disturbance: Array2<f64>,
}

impl StockState {
    /// Total carbon in all pools
    pub fn total(&self) -> Array2<f64> {
        &self.biomass + &self.soil + &self.litter
    }

    /// A copy of the state for the given year, with masked cells set to NaN
    fn snapshot(&self, year: u32, mask: &Array2<bool>) -> Self {
        let mut state = Self {
            year,
            ..self.clone()
        };
        for values in [
            &mut state.biomass,
            &mut state.soil,
            &mut state.litter,
            &mut state.years_since_disturbance,
        ] {
            mask_nodata(values, mask);
        }

        state
    }
}

/// Everything calculated by a simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResults {
    /// Accumulation, emissions and net sequestration for each interval
    pub intervals: Vec<IntervalSummary>,
    /// Net sequestration in each year
    pub annual: Vec<(u32, Array2<f64>)>,
    /// Net sequestration summed over the whole analysis
    pub total_net_sequestration: Array2<f64>,
    /// The discounted value of net sequestration, if economic analysis is enabled
    pub net_present_value: Option<Array2<f64>>,
    /// Stocks in each transition year and the final year
    pub stocks: Vec<StockState>,
    /// The classification of each transition, in chronological order
    pub classifications: Vec<Classification>,
}

/// Classify every transition in the model.
///
/// This is done before any stocks are evolved, so an unmapped pair of classes anywhere in the
/// series is reported before any work is done.
pub fn classify_all(model: &Model) -> Result<Vec<Classification>> {
    model
        .snapshots
        .iter_transitions()
        .map(|(from, to)| {
            classify(from, &to.raster, &model.transitions, &model.carbon_pools)
                .with_context(|| format!("Invalid transition in {}", to.year))
        })
        .collect()
}

/// Get the initial stock of every cell from the baseline map
fn initial_stock<F>(model: &Model, mask: &Array2<bool>, get: F) -> Result<Array2<f64>>
where
    F: Fn(&InitialStocks) -> CarbonDensity,
{
    let codes = &model.snapshots.baseline().codes;
    let mut stock = Array2::from_elem(codes.dim(), f64::NAN);
    for (value, code) in stock.iter_mut().zip(codes) {
        if let Some(code) = code {
            *value = get(&model.carbon_pools.get(*code)?.initial).value();
        }
    }
    mask_nodata(&mut stock, mask);

    Ok(stock)
}

/// Run the carbon stock simulation.
///
/// Each transition is held constant until the next one, with the last extrapolated to the
/// analysis year if there is one.
pub fn simulate(model: &Model) -> Result<SimulationResults> {
    let classifications = classify_all(model)?;
    let shape = model.snapshots.geometry().shape();
    let mask = model.snapshots.nodata_mask();

    let mut state = StockState {
        year: 0,
        biomass: initial_stock(model, &mask, |stocks| stocks.biomass)?,
        soil: initial_stock(model, &mask, |stocks| stocks.soil)?,
        litter: initial_stock(model, &mask, |stocks| stocks.litter)?,
        years_since_disturbance: Array2::zeros(shape),
    };

    let intervals = model.intervals();
    let mut deltas = Vec::with_capacity(intervals.len());
    let mut stocks = Vec::with_capacity(intervals.len() + 1);
    for (interval, classification) in intervals.iter().zip(&classifications) {
        info!(
            "Transition year {}: {} year(s) to simulate",
            interval.start,
            interval.len()
        );
        for (from, to, transition) in classification.iter_observed() {
            debug!("Transition from {from} to {to}: {transition}");
        }

        state.litter = update_litter(&state.litter, classification, &model.carbon_pools)?;
        stocks.push(state.snapshot(interval.start, &mask));

        let evolve_pool = |pool: Pool, start: &Array2<f64>| -> Result<_> {
            let rules = pool_rules(pool, classification, &model.carbon_pools)?;
            Ok(evolve(&rules, start, interval.len()))
        };
        let biomass = evolve_pool(Pool::Biomass, &state.biomass)?;
        let soil = evolve_pool(Pool::Soil, &state.soil)?;

        deltas.push(IntervalDeltas {
            interval: *interval,
            biomass: biomass.annual_deltas,
            soil: soil.annual_deltas,
        });
        state.biomass = biomass.end_stock;
        state.soil = soil.end_stock;
        state.years_since_disturbance = advance_disturbance_clock(
            &state.years_since_disturbance,
            &classification.transitions,
            interval.len(),
        );
    }

    let end_year = final_year(&model.snapshots.years(), model.parameters.analysis_year);
    if stocks.last().is_some_and(|last| last.year < end_year) {
        stocks.push(state.snapshot(end_year, &mask));
    }

    let totals = aggregate(&deltas, shape, &mask);
    let net_present_value = model
        .valuation
        .as_ref()
        .map(|valuation| {
            let mut npv = valuation.net_present_value(
                shape,
                totals.annual.iter().map(|(year, net)| (*year, net)),
            )?;
            mask_nodata(&mut npv, &mask);
            Ok::<_, anyhow::Error>(npv)
        })
        .transpose()?;

    Ok(SimulationResults {
        intervals: totals.intervals,
        annual: totals.annual,
        total_net_sequestration: totals.total,
        net_present_value,
        stocks,
        classifications,
    })
}

/// Run the simulation and write the results.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information to file
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    let results = simulate(model)?;
    write_metadata(output_path, model).context("Failed to save metadata")?;

    let geometry = model.snapshots.geometry();
    let suffix = model.parameters.results_suffix.as_deref();
    let mut writer = DataWriter::create(output_path, geometry, suffix, debug_model)?;
    writer.write_total_net_sequestration(&results.total_net_sequestration)?;
    if let Some(npv) = &results.net_present_value {
        writer.write_net_present_value(npv)?;
    }
    writer.write_annual_sequestration(&results.annual)?;
    for summary in &results.intervals {
        writer.write_interval(summary)?;
    }
    for state in &results.stocks {
        writer.write_stocks(state)?;
    }
    let years = model.snapshots.years();
    for (year, classification) in years.into_iter().zip(&results.classifications) {
        writer.write_debug_info(year, classification, &model.lulc_classes)?;
    }
    writer.flush()?;

    Ok(())
}
