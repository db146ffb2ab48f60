//! Advancing carbon stocks through the years of an interval.
//!
//! Every cell evolves independently according to a [`PoolRule`] chosen by the transition it
//! underwent at the start of the interval.
use super::classify::Classification;
use crate::pool::{CarbonPoolTable, Pool};
use crate::transition::{TransitionKey, TransitionType};
use crate::units::{CarbonDensity, CarbonDensityPerYear, Year};
use anyhow::Result;
use indexmap::IndexMap;
use ndarray::{Array2, Zip};

/// How the stock of one pool in one cell changes over an interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoolRule {
    /// The stock does not change
    Constant,
    /// The stock grows linearly
    Accumulate {
        /// Carbon gained each year
        rate: CarbonDensityPerYear,
    },
    /// Disturbed carbon is released with exponential decay
    Decay {
        /// The amount of carbon disturbed at the start of the interval
        disturbed: CarbonDensity,
        /// Years for half of the disturbed carbon to be released
        half_life: Year,
    },
}

impl PoolRule {
    /// The stock `elapsed` years after the start of the interval, given the starting stock
    pub fn stock_at(self, start: f64, elapsed: u32) -> f64 {
        let elapsed = f64::from(elapsed);
        match self {
            Self::Constant => start,
            Self::Accumulate { rate } => start + (rate * Year(elapsed)).value(),
            Self::Decay {
                disturbed,
                half_life,
            } => {
                let disturbed = disturbed.value();
                start - disturbed + disturbed * remaining_fraction(elapsed, half_life.value())
            }
        }
    }

    /// The change in stock during the year which ends `elapsed` years after the start
    pub fn annual_delta(self, start: f64, elapsed: u32) -> f64 {
        debug_assert!(elapsed > 0);
        self.stock_at(start, elapsed) - self.stock_at(start, elapsed - 1)
    }
}

/// The fraction of disturbed carbon not yet released after `elapsed` years.
///
/// A half-life of zero releases everything in the first year.
fn remaining_fraction(elapsed: f64, half_life: f64) -> f64 {
    if elapsed <= 0.0 {
        return 1.0;
    }

    0.5f64.powf(elapsed / half_life)
}

/// Work out the rule for one pool for each observed transition pair.
///
/// Accumulation uses the rate of the class being transitioned to. Disturbed carbon decays with
/// the half-life of the class being transitioned from.
fn rules_by_pair(
    pool: Pool,
    classification: &Classification,
    carbon_pools: &CarbonPoolTable,
) -> Result<IndexMap<TransitionKey, PoolRule>> {
    classification
        .iter_observed()
        .map(|(from, to, transition)| -> Result<_> {
            let rule = match transition {
                TransitionType::NoCarbonChange => PoolRule::Constant,
                TransitionType::Accumulation => PoolRule::Accumulate {
                    rate: carbon_pools.get(to)?.transient(pool).yearly_accumulation,
                },
                TransitionType::LowImpactDisturb
                | TransitionType::MedImpactDisturb
                | TransitionType::HighImpactDisturb => PoolRule::Decay {
                    disturbed: classification.disturbed(pool)[&(from, to)],
                    half_life: carbon_pools.half_life(pool, from)?,
                },
            };
            Ok(((from, to), rule))
        })
        .collect()
}

/// Get the rule for one pool in every cell.
///
/// Cells with no data in either map have no rule.
pub fn pool_rules(
    pool: Pool,
    classification: &Classification,
    carbon_pools: &CarbonPoolTable,
) -> Result<Array2<Option<PoolRule>>> {
    let rules = rules_by_pair(pool, classification, carbon_pools)?;
    Ok(classification
        .pairs
        .map(|pair| pair.map(|key| rules[&key])))
}

/// The result of evolving one pool over an interval
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEvolution {
    /// The stock at the end of the interval
    pub end_stock: Array2<f64>,
    /// The change in stock in each year of the interval
    pub annual_deltas: Vec<Array2<f64>>,
}

/// Evolve the stock of one pool over an interval.
///
/// Cells whose starting stock is NaN or which have no rule are NaN in every output.
///
/// # Arguments
///
/// * `rules` - The rule for each cell
/// * `start_stock` - The stock at the start of the interval
/// * `years` - The length of the interval
pub fn evolve(
    rules: &Array2<Option<PoolRule>>,
    start_stock: &Array2<f64>,
    years: u32,
) -> PoolEvolution {
    let apply = |f: &dyn Fn(PoolRule, f64) -> f64| {
        Zip::from(rules)
            .and(start_stock)
            .map_collect(|rule, &start| match rule {
                Some(rule) if !start.is_nan() => f(*rule, start),
                _ => f64::NAN,
            })
    };

    let annual_deltas = (1..=years)
        .map(|elapsed| apply(&|rule, start| rule.annual_delta(start, elapsed)))
        .collect();
    let end_stock = apply(&|rule, start| rule.stock_at(start, years));

    PoolEvolution {
        end_stock,
        annual_deltas,
    }
}

/// Update the number of years since each cell was last disturbed.
///
/// A disturbance resets the count, accumulation adds the length of the interval and no carbon
/// change leaves it as it is. Cells with no transition become NaN.
pub fn advance_disturbance_clock(
    years_since_disturbance: &Array2<f64>,
    transitions: &Array2<Option<TransitionType>>,
    years: u32,
) -> Array2<f64> {
    Zip::from(years_since_disturbance)
        .and(transitions)
        .map_collect(|&elapsed, transition| match transition {
            None => f64::NAN,
            Some(transition) if transition.is_disturbance() => 0.0,
            Some(TransitionType::Accumulation) => elapsed + f64::from(years),
            Some(_) => elapsed,
        })
}

/// The litter stock after a transition.
///
/// Litter takes the initial value of the new class wherever the class has changed and is
/// otherwise unchanged. Cells with no data in either map become NaN.
pub fn update_litter(
    litter: &Array2<f64>,
    classification: &Classification,
    carbon_pools: &CarbonPoolTable,
) -> Result<Array2<f64>> {
    let mut new_litter = litter.clone();
    for (value, pair) in new_litter.iter_mut().zip(classification.pairs.iter()) {
        match pair {
            None => *value = f64::NAN,
            Some((from, to)) if from != to => {
                *value = carbon_pools.get(*to)?.initial.litter.value();
            }
            Some(_) => {}
        }
    }

    Ok(new_litter)
}
