//! Classifying the transitions between consecutive LULC maps.
use crate::lulc::LulcCode;
use crate::pool::{CarbonPoolTable, Pool};
use crate::raster::LulcRaster;
use crate::transition::{TransitionKey, TransitionTable, TransitionType};
use crate::units::CarbonDensity;
use anyhow::Result;
use indexmap::IndexMap;
use indexmap::map::Entry;
use ndarray::{Array2, Zip};

/// The transitions between two LULC maps
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The (from, to) pair of class codes for each cell, or `None` where either map has no data
    pub pairs: Array2<Option<TransitionKey>>,
    /// The transition type for each cell, or `None` where either map has no data
    pub transitions: Array2<Option<TransitionType>>,
    /// The transition type of every pair observed in the maps, in order of first appearance
    pub observed: IndexMap<TransitionKey, TransitionType>,
    /// Biomass disturbed by each observed disturbance pair
    pub disturbed_biomass: IndexMap<TransitionKey, CarbonDensity>,
    /// Soil carbon disturbed by each observed disturbance pair
    pub disturbed_soil: IndexMap<TransitionKey, CarbonDensity>,
}

impl Classification {
    /// The amount of a pool disturbed by each observed disturbance pair
    pub fn disturbed(&self, pool: Pool) -> &IndexMap<TransitionKey, CarbonDensity> {
        match pool {
            Pool::Biomass => &self.disturbed_biomass,
            Pool::Soil => &self.disturbed_soil,
        }
    }

    /// Iterate over the observed pairs
    pub fn iter_observed(&self) -> impl Iterator<Item = (LulcCode, LulcCode, TransitionType)> + '_ {
        self.observed
            .iter()
            .map(|(&(from, to), &transition)| (from, to, transition))
    }
}

/// Classify the transition of every cell between two LULC maps.
///
/// Each distinct (from, to) pair is looked up once. Disturbed stocks are calculated for each
/// distinct disturbance pair.
///
/// # Arguments
///
/// * `from` - The earlier map
/// * `to` - The later map, which must be aligned with `from`
/// * `transitions` - The transition type of each pair of classes
/// * `carbon_pools` - Carbon parameters for each class
///
/// # Returns
///
/// The classification or a validation error if any observed pair has no transition type
pub fn classify(
    from: &LulcRaster,
    to: &LulcRaster,
    transitions: &TransitionTable,
    carbon_pools: &CarbonPoolTable,
) -> Result<Classification> {
    let pairs = Zip::from(&from.codes)
        .and(&to.codes)
        .map_collect(|from, to| from.zip(*to));

    let mut observed = IndexMap::new();
    for &(from_code, to_code) in pairs.iter().flatten() {
        if let Entry::Vacant(entry) = observed.entry((from_code, to_code)) {
            entry.insert(transitions.transition_type(from_code, to_code)?);
        }
    }

    let mut disturbed_biomass = IndexMap::new();
    let mut disturbed_soil = IndexMap::new();
    for (&(from_code, to_code), &transition) in &observed {
        if !transition.is_disturbance() {
            continue;
        }

        let disturbed = |pool| carbon_pools.disturbed_stock(pool, from_code, to_code, transition);
        disturbed_biomass.insert((from_code, to_code), disturbed(Pool::Biomass)?);
        disturbed_soil.insert((from_code, to_code), disturbed(Pool::Soil)?);
    }

    let transitions = pairs.map(|pair| pair.map(|key| observed[&key]));

    Ok(Classification {
        pairs,
        transitions,
        observed,
        disturbed_biomass,
        disturbed_soil,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ModelError};
    use crate::fixture::{carbon_pools, lulc_raster, transition_table};
    use float_cmp::assert_approx_eq;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    fn test_classify(transition_table: TransitionTable, carbon_pools: CarbonPoolTable) {
        let from = lulc_raster(array![[None, Some(1)], [Some(2), Some(0)]]);
        let to = lulc_raster(array![[Some(1), Some(2)], [Some(0), None]]);
        let classification = classify(&from, &to, &transition_table, &carbon_pools).unwrap();

        assert_eq!(
            classification.transitions,
            array![
                [None, Some(TransitionType::Accumulation)],
                [Some(TransitionType::MedImpactDisturb), None]
            ]
        );
        assert_eq!(classification.observed.len(), 2);

        // y (code 2) -> n (code 0): initial stock of y scaled by n's factor (0)
        assert_approx_eq!(
            f64,
            classification.disturbed(Pool::Biomass)[&(2, 0)].value(),
            0.0
        );
        assert!(!classification.disturbed_soil.contains_key(&(1, 2)));
    }

    #[rstest]
    fn test_classify_disturbed_stock(
        mut transition_table: TransitionTable,
        carbon_pools: CarbonPoolTable,
    ) {
        transition_table.insert(3, 1, TransitionType::MedImpactDisturb);
        let from = lulc_raster(array![[Some(3)]]);
        let to = lulc_raster(array![[Some(1)]]);
        let classification = classify(&from, &to, &transition_table, &carbon_pools).unwrap();

        // z has 20 in each pool and x has a factor of 0.5
        assert_approx_eq!(f64, classification.disturbed_biomass[&(3, 1)].value(), 10.0);
        assert_approx_eq!(f64, classification.disturbed_soil[&(3, 1)].value(), 10.0);
    }

    #[rstest]
    fn test_classify_unmapped_pair(carbon_pools: CarbonPoolTable) {
        let mut table = TransitionTable::new();
        table.insert(1, 1, TransitionType::Accumulation);
        let from = lulc_raster(array![[Some(1), Some(1)]]);
        let to = lulc_raster(array![[Some(1), Some(2)]]);

        let err = classify(&from, &to, &table, &carbon_pools).unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Validation));
    }

    #[rstest]
    fn test_classify_nodata_pairs_not_looked_up(carbon_pools: CarbonPoolTable) {
        // No entries at all, but every cell is nodata in one of the maps
        let table = TransitionTable::new();
        let from = lulc_raster(array![[None, Some(1)]]);
        let to = lulc_raster(array![[Some(1), None]]);

        let classification = classify(&from, &to, &table, &carbon_pools).unwrap();
        assert!(classification.observed.is_empty());
        assert_eq!(classification.transitions, array![[None, None]]);
    }
}
