//! Summing pool changes into net sequestration.
use crate::raster::mask_nodata;
use crate::year::Interval;
use ndarray::{Array2, Zip};

/// The annual changes in biomass and soil carbon over one interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalDeltas {
    /// The interval
    pub interval: Interval,
    /// The change in biomass in each year of the interval
    pub biomass: Vec<Array2<f64>>,
    /// The change in soil carbon in each year of the interval
    pub soil: Vec<Array2<f64>>,
}

/// Accumulation, emissions and net sequestration over one interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSummary {
    /// The interval
    pub interval: Interval,
    /// Total carbon gained
    pub accumulation: Array2<f64>,
    /// Total carbon released, as a positive value
    pub emissions: Array2<f64>,
    /// Accumulation minus emissions
    pub net: Array2<f64>,
}

/// Net sequestration across the whole analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// One summary per interval, in chronological order
    pub intervals: Vec<IntervalSummary>,
    /// Net sequestration in each year
    pub annual: Vec<(u32, Array2<f64>)>,
    /// Net sequestration summed over every year
    pub total: Array2<f64>,
}

/// Sum the annual changes in each pool into per-interval, per-year and total sequestration.
///
/// Cells in `mask` are NaN in every output. An interval covering no years contributes nothing.
///
/// # Arguments
///
/// * `deltas` - The changes for each interval, in chronological order
/// * `shape` - The shape of the rasters
/// * `mask` - Cells which have no data in at least one map
pub fn aggregate(
    deltas: &[IntervalDeltas],
    shape: (usize, usize),
    mask: &Array2<bool>,
) -> Aggregate {
    let mut intervals = Vec::with_capacity(deltas.len());
    let mut annual = Vec::new();
    let mut total = Array2::zeros(shape);

    for interval_deltas in deltas {
        let mut accumulation = Array2::zeros(shape);
        let mut emissions = Array2::zeros(shape);
        let years = interval_deltas.interval.years();
        for ((year, biomass), soil) in years
            .zip(&interval_deltas.biomass)
            .zip(&interval_deltas.soil)
        {
            let mut net = biomass + soil;
            for pool_delta in [biomass, soil] {
                Zip::from(&mut accumulation)
                    .and(&mut emissions)
                    .and(pool_delta)
                    .for_each(|gained, released, &delta| {
                        if delta > 0.0 {
                            *gained += delta;
                        } else if delta < 0.0 {
                            *released -= delta;
                        }
                    });
            }

            mask_nodata(&mut net, mask);
            total += &net;
            annual.push((year, net));
        }

        let mut net = &accumulation - &emissions;
        mask_nodata(&mut accumulation, mask);
        mask_nodata(&mut emissions, mask);
        mask_nodata(&mut net, mask);
        intervals.push(IntervalSummary {
            interval: interval_deltas.interval,
            accumulation,
            emissions,
            net,
        });
    }

    mask_nodata(&mut total, mask);

    Aggregate {
        intervals,
        annual,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use ndarray::array;

    fn deltas(start: u32, end: u32, biomass: f64, soil: f64) -> IntervalDeltas {
        let len = usize::try_from(end - start).unwrap();
        IntervalDeltas {
            interval: Interval { start, end },
            biomass: vec![array![[biomass, biomass]]; len],
            soil: vec![array![[soil, soil]]; len],
        }
    }

    #[test]
    fn test_aggregate() {
        let mask = array![[false, true]];
        let result = aggregate(
            &[deltas(2000, 2002, 1.0, -0.5), deltas(2002, 2005, 2.0, 0.0)],
            (1, 2),
            &mask,
        );

        assert_eq!(
            result.annual.iter().map(|(year, _)| *year).collect::<Vec<_>>(),
            [2000, 2001, 2002, 2003, 2004]
        );
        assert_approx_eq!(f64, result.annual[0].1[[0, 0]], 0.5);
        assert_approx_eq!(f64, result.total[[0, 0]], 7.0);
        assert!(result.total[[0, 1]].is_nan());

        let first = &result.intervals[0];
        assert_approx_eq!(f64, first.accumulation[[0, 0]], 2.0);
        assert_approx_eq!(f64, first.emissions[[0, 0]], 1.0);
        assert_approx_eq!(f64, first.net[[0, 0]], 1.0);
        assert!(first.emissions[[0, 1]].is_nan());
    }

    #[test]
    fn test_aggregate_empty_interval() {
        let mask = array![[false, false]];
        let result = aggregate(
            &[deltas(2000, 2001, 1.0, 1.0), deltas(2001, 2001, 0.0, 0.0)],
            (1, 2),
            &mask,
        );

        assert_eq!(result.annual.len(), 1);
        assert_eq!(result.intervals.len(), 2);
        assert_eq!(result.intervals[1].net, array![[0.0, 0.0]]);
        assert_approx_eq!(f64, result.total[[0, 1]], 2.0);
    }
}
