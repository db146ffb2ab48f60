//! Code for working with snapshot years and the intervals between them.
use crate::error::ModelError;
use crate::input::is_sorted_and_unique;
use anyhow::{Result, ensure};
use std::ops::{Range, RangeInclusive};

/// A span of years over which a single transition is in effect.
///
/// The transition happens at the start of `start`; the interval covers the years `start` up to
/// but not including `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// The year in which the transition takes place
    pub start: u32,
    /// The first year after the interval
    pub end: u32,
}

impl Interval {
    /// The number of years in the interval
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the interval covers no years
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// The years in the interval
    pub fn years(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Check that transition years are valid.
///
/// There must be at least one transition year, the years must be strictly increasing and the
/// analysis year, if given, cannot be earlier than the last transition year.
pub fn check_transition_years(years: &[u32], analysis_year: Option<u32>) -> Result<()> {
    let Some(&last) = years.last() else {
        return Err(
            ModelError::Validation("At least one transition map must be given".into()).into(),
        );
    };
    ensure!(
        is_sorted_and_unique(years),
        ModelError::Validation("Transition years must be in chronological order".into())
    );

    if let Some(analysis_year) = analysis_year {
        ensure!(
            analysis_year >= last,
            ModelError::Validation(format!(
                "Analysis year {analysis_year} must not be earlier than the last transition year \
                ({last})"
            ))
        );
    }

    Ok(())
}

/// Get the interval over which each transition is in effect.
///
/// Each transition lasts until the next transition year. The last one lasts until the analysis
/// year or, if there is none, covers no years at all.
///
/// # Arguments
///
/// * `years` - Transition years, already checked with [`check_transition_years`]
/// * `analysis_year` - The optional final year of the analysis
pub fn intervals(years: &[u32], analysis_year: Option<u32>) -> Vec<Interval> {
    years
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = years
                .get(i + 1)
                .copied()
                .unwrap_or(analysis_year.unwrap_or(start));
            Interval { start, end }
        })
        .collect()
}

/// The last year of the analysis: the analysis year if given, otherwise the last transition year
pub fn final_year(years: &[u32], analysis_year: Option<u32>) -> u32 {
    analysis_year
        .or_else(|| years.last().copied())
        .unwrap_or_default()
}

/// Every year for which a price is needed, from the first transition year to the final year
pub fn valuation_years(years: &[u32], analysis_year: Option<u32>) -> RangeInclusive<u32> {
    let first = years.first().copied().unwrap_or_default();
    first..=final_year(years, analysis_year)
}
