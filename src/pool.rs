//! Carbon pools and the per-class parameters describing how they change.
use crate::error::ModelError;
use crate::lulc::{LulcClassMap, LulcCode};
use crate::transition::{TransitionTable, TransitionType};
use crate::units::{CarbonDensity, CarbonDensityPerYear, Dimensionless, Year};
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use strum::{Display, EnumIter};

/// A carbon pool whose stock changes over time in response to transitions.
///
/// Litter is not included: its stock is fixed for each class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Pool {
    /// Above- and below-ground biomass
    #[strum(serialize = "biomass")]
    Biomass,
    /// Soil carbon
    #[strum(serialize = "soil")]
    Soil,
}

/// Carbon stocks of a class in its stable state
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct InitialStocks {
    /// Biomass carbon
    pub biomass: CarbonDensity,
    /// Soil carbon
    pub soil: CarbonDensity,
    /// Litter carbon
    pub litter: CarbonDensity,
}

impl InitialStocks {
    /// Get the stock for one of the dynamic pools
    pub fn get(&self, pool: Pool) -> CarbonDensity {
        match pool {
            Pool::Biomass => self.biomass,
            Pool::Soil => self.soil,
        }
    }
}

/// Fraction of stock disturbed by each intensity of disturbance
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct DisturbanceFactors {
    /// Factor for low-impact disturbance
    pub low: Option<Dimensionless>,
    /// Factor for medium-impact disturbance
    pub medium: Option<Dimensionless>,
    /// Factor for high-impact disturbance
    pub high: Option<Dimensionless>,
}

impl DisturbanceFactors {
    /// Get the factor for the given transition type.
    ///
    /// Returns `None` for non-disturbance transitions or if no factor was given.
    pub fn get(&self, transition: TransitionType) -> Option<Dimensionless> {
        match transition {
            TransitionType::LowImpactDisturb => self.low,
            TransitionType::MedImpactDisturb => self.medium,
            TransitionType::HighImpactDisturb => self.high,
            TransitionType::NoCarbonChange | TransitionType::Accumulation => None,
        }
    }
}

/// Parameters governing how one pool of a class changes over time
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct TransientParameters {
    /// Years for disturbed carbon to decay by half
    pub half_life: Option<Year>,
    /// Fraction of stock disturbed, by intensity
    pub disturbance: DisturbanceFactors,
    /// Carbon gained each year while the class is accumulating
    pub yearly_accumulation: CarbonDensityPerYear,
}

/// All carbon parameters for a single LULC class
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ClassCarbon {
    /// Stocks in the stable state
    pub initial: InitialStocks,
    /// Biomass dynamics
    pub biomass: TransientParameters,
    /// Soil dynamics
    pub soil: TransientParameters,
}

impl ClassCarbon {
    /// Get the transient parameters for a pool
    pub fn transient(&self, pool: Pool) -> &TransientParameters {
        match pool {
            Pool::Biomass => &self.biomass,
            Pool::Soil => &self.soil,
        }
    }
}

/// Carbon parameters for every LULC class, keyed by code
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CarbonPoolTable(IndexMap<LulcCode, ClassCarbon>);

impl CarbonPoolTable {
    /// Create a new table from a map of class parameters
    pub fn new(map: IndexMap<LulcCode, ClassCarbon>) -> Self {
        Self(map)
    }

    /// Get the parameters for a class, failing with a data error if there are none
    pub fn get(&self, code: LulcCode) -> Result<&ClassCarbon> {
        self.0.get(&code).ok_or_else(|| {
            ModelError::Data(format!("No carbon pool parameters for LULC code {code}")).into()
        })
    }

    /// The amount of a pool's stock disturbed by a transition.
    ///
    /// This is the initial stock of the class being transitioned from, scaled by the disturbance
    /// factor of the class being transitioned to. It is zero for non-disturbance transitions.
    pub fn disturbed_stock(
        &self,
        pool: Pool,
        from: LulcCode,
        to: LulcCode,
        transition: TransitionType,
    ) -> Result<CarbonDensity> {
        if !transition.is_disturbance() {
            return Ok(CarbonDensity(0.0));
        }

        let initial = self.get(from)?.initial.get(pool);
        let factor = self.disturbance_factor(pool, to, transition)?;
        Ok(initial * factor)
    }

    /// Get the disturbance factor of a class, failing if it is undefined
    fn disturbance_factor(
        &self,
        pool: Pool,
        code: LulcCode,
        transition: TransitionType,
    ) -> Result<Dimensionless> {
        self.get(code)?
            .transient(pool)
            .disturbance
            .get(transition)
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "No {pool} disturbance factor for {transition} is given for LULC code {code}"
                ))
                .into()
            })
    }

    /// Get the half-life of the disturbed carbon of a class, failing if it is undefined
    pub fn half_life(&self, pool: Pool, code: LulcCode) -> Result<Year> {
        self.get(code)?.transient(pool).half_life.ok_or_else(|| {
            ModelError::Configuration(format!("No {pool} half-life is given for LULC code {code}"))
                .into()
        })
    }

    /// Check that every class has parameters and that the parameters needed by every
    /// disturbance in the transition table are present.
    pub fn check(&self, lulc_classes: &LulcClassMap, transitions: &TransitionTable) -> Result<()> {
        for class in lulc_classes.iter() {
            ensure!(
                self.0.contains_key(&class.code),
                ModelError::Configuration(format!(
                    "No carbon pool parameters are given for LULC class {} (code {})",
                    class.id, class.code
                ))
            );
        }

        for ((from, to), transition) in transitions.iter_disturbances() {
            for pool in [Pool::Biomass, Pool::Soil] {
                self.half_life(pool, from)?;
                self.disturbance_factor(pool, to, transition)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixture::{carbon_pools, lulc_classes, transition_table};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_disturbed_stock(carbon_pools: CarbonPoolTable) {
        // z (biomass 20) -> n is a medium-impact disturbance; factor comes from n (0)
        let stock = carbon_pools
            .disturbed_stock(Pool::Biomass, 3, 0, TransitionType::MedImpactDisturb)
            .unwrap();
        assert_approx_eq!(f64, stock.value(), 0.0);

        // y (soil 10) -> x with x's medium factor of 0.5
        let stock = carbon_pools
            .disturbed_stock(Pool::Soil, 2, 1, TransitionType::MedImpactDisturb)
            .unwrap();
        assert_approx_eq!(f64, stock.value(), 5.0);
    }

    #[rstest]
    fn test_disturbed_stock_non_disturbance(carbon_pools: CarbonPoolTable) {
        let stock = carbon_pools
            .disturbed_stock(Pool::Biomass, 1, 2, TransitionType::Accumulation)
            .unwrap();
        assert_eq!(stock, CarbonDensity(0.0));
    }

    #[rstest]
    fn test_missing_factor_is_configuration_error(carbon_pools: CarbonPoolTable) {
        // Only medium-impact factors are defined in the fixture
        let err = carbon_pools
            .disturbed_stock(Pool::Biomass, 1, 2, TransitionType::HighImpactDisturb)
            .unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Configuration));
    }

    #[rstest]
    fn test_check_ok(
        carbon_pools: CarbonPoolTable,
        lulc_classes: LulcClassMap,
        transition_table: TransitionTable,
    ) {
        carbon_pools.check(&lulc_classes, &transition_table).unwrap();
    }

    #[rstest]
    fn test_check_missing_half_life(
        mut carbon_pools: CarbonPoolTable,
        lulc_classes: LulcClassMap,
        transition_table: TransitionTable,
    ) {
        // x is disturbed when it becomes n, so it needs a half-life
        carbon_pools.0.get_mut(&1).unwrap().soil.half_life = None;
        let err = carbon_pools
            .check(&lulc_classes, &transition_table)
            .unwrap_err();
        assert_eq!(ModelError::kind_of(&err), Some(ErrorKind::Configuration));
    }

    #[rstest]
    fn test_check_missing_class(
        mut carbon_pools: CarbonPoolTable,
        lulc_classes: LulcClassMap,
        transition_table: TransitionTable,
    ) {
        carbon_pools.0.shift_remove(&2);
        assert!(carbon_pools.check(&lulc_classes, &transition_table).is_err());
    }
}
