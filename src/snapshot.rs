//! The ordered series of LULC maps which drives the simulation.
use crate::lulc::LulcClassMap;
use crate::raster::{GridGeometry, LulcRaster};
use crate::year::check_transition_years;
use anyhow::{Context, Result};
use ndarray::{Array2, Zip};

/// A LULC map observed in a particular year
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The year in which the map takes effect
    pub year: u32,
    /// Class codes for every cell
    pub raster: LulcRaster,
}

/// The baseline map followed by one or more dated transition maps
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSeries {
    baseline: LulcRaster,
    snapshots: Vec<Snapshot>,
}

impl SnapshotSeries {
    /// Create a new series, checking that the years are in order and the maps are aligned
    pub fn new(baseline: LulcRaster, snapshots: Vec<Snapshot>) -> Result<Self> {
        let years: Vec<_> = snapshots.iter().map(|s| s.year).collect();
        check_transition_years(&years, None)?;
        for snapshot in &snapshots {
            baseline
                .check_aligned(&snapshot.raster)
                .with_context(|| format!("Invalid map for year {}", snapshot.year))?;
        }

        Ok(Self {
            baseline,
            snapshots,
        })
    }

    /// The map in effect before the first transition
    pub fn baseline(&self) -> &LulcRaster {
        &self.baseline
    }

    /// The year of each transition map
    pub fn years(&self) -> Vec<u32> {
        self.snapshots.iter().map(|s| s.year).collect()
    }

    /// The grid shared by all maps
    pub fn geometry(&self) -> &GridGeometry {
        &self.baseline.geometry
    }

    /// Iterate over all maps, starting with the baseline
    pub fn iter_rasters(&self) -> impl Iterator<Item = &LulcRaster> {
        std::iter::once(&self.baseline).chain(self.snapshots.iter().map(|s| &s.raster))
    }

    /// Iterate over each transition as the previous map paired with the new snapshot
    pub fn iter_transitions(&self) -> impl Iterator<Item = (&LulcRaster, &Snapshot)> {
        self.iter_rasters().zip(self.snapshots.iter())
    }

    /// Cells which are nodata in any of the maps
    pub fn nodata_mask(&self) -> Array2<bool> {
        let mut mask = Array2::from_elem(self.geometry().shape(), false);
        for raster in self.iter_rasters() {
            Zip::from(&mut mask)
                .and(&raster.codes)
                .for_each(|masked, code| *masked |= code.is_none());
        }

        mask
    }

    /// Check that every map only contains defined LULC codes
    pub fn check_codes(&self, lulc_classes: &LulcClassMap) -> Result<()> {
        self.baseline
            .check_codes(lulc_classes)
            .context("Invalid baseline map")?;
        for snapshot in &self.snapshots {
            snapshot
                .raster
                .check_codes(lulc_classes)
                .with_context(|| format!("Invalid map for year {}", snapshot.year))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ModelError};
    use crate::fixture::{lulc_raster, snapshots};
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    fn test_iter_transitions(snapshots: SnapshotSeries) {
        let pairs: Vec<_> = snapshots
            .iter_transitions()
            .map(|(from, to)| (from.codes[[1, 1]], to.year, to.raster.codes[[1, 1]]))
            .collect();
        assert_eq!(pairs, [(Some(1), 2000, Some(1)), (Some(1), 2005, Some(2))]);
    }

    #[rstest]
    fn test_nodata_mask(snapshots: SnapshotSeries) {
        assert_eq!(
            snapshots.nodata_mask(),
            array![[true, false], [false, false]]
        );
    }

    #[test]
    fn test_out_of_order_years() {
        let err = SnapshotSeries::new(
            lulc_raster(array![[Some(1)]]),
            vec![
                Snapshot {
                    year: 2005,
                    raster: lulc_raster(array![[Some(1)]]),
                },
                Snapshot {
                    year: 2000,
                    raster: lulc_raster(array![[Some(1)]]),
                },
            ],
        )
        .unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_no_transitions() {
        let err = SnapshotSeries::new(lulc_raster(array![[Some(1)]]), vec![]).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Validation));
    }

    #[test]
    fn test_misaligned() {
        let err = SnapshotSeries::new(
            lulc_raster(array![[Some(1)]]),
            vec![Snapshot {
                year: 2000,
                raster: lulc_raster(array![[Some(1), Some(1)]]),
            }],
        )
        .unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Validation));
    }
}
