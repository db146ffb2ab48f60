//! Transition types and the table relating pairs of LULC classes to them.
use crate::error::ModelError;
use crate::lulc::LulcCode;
use anyhow::Result;
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// The effect on carbon stocks of a pixel changing from one LULC class to another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum TransitionType {
    /// Carbon stocks do not change
    #[strum(serialize = "NCC")]
    NoCarbonChange,
    /// Biomass and soil carbon accumulate linearly
    #[strum(serialize = "accum")]
    Accumulation,
    /// A low-impact disturbance releases part of the stored carbon
    #[strum(serialize = "low-impact-disturb")]
    LowImpactDisturb,
    /// A medium-impact disturbance releases part of the stored carbon
    #[strum(serialize = "med-impact-disturb")]
    MedImpactDisturb,
    /// A high-impact disturbance releases part of the stored carbon
    #[strum(serialize = "high-impact-disturb")]
    HighImpactDisturb,
}

impl TransitionType {
    /// Whether this is one of the disturbance types
    pub fn is_disturbance(self) -> bool {
        matches!(
            self,
            Self::LowImpactDisturb | Self::MedImpactDisturb | Self::HighImpactDisturb
        )
    }
}

/// A pair of LULC codes: the class a pixel is changing from and the class it is changing to
pub type TransitionKey = (LulcCode, LulcCode);

/// Relates each (from, to) pair of LULC classes to a transition type.
///
/// Pairs which are not present have no defined transition; encountering one in the data is an
/// error.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct TransitionTable(HashMap<TransitionKey, TransitionType>);

impl TransitionTable {
    /// Create a new, empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transition type for a pair of classes, returning the previous value if any
    pub fn insert(
        &mut self,
        from: LulcCode,
        to: LulcCode,
        transition: TransitionType,
    ) -> Option<TransitionType> {
        self.0.insert((from, to), transition)
    }

    /// Get the transition type for a pair of classes, if defined
    pub fn get(&self, from: LulcCode, to: LulcCode) -> Option<TransitionType> {
        self.0.get(&(from, to)).copied()
    }

    /// Get the transition type for a pair of classes.
    ///
    /// # Returns
    ///
    /// The transition type or a validation error if the pair has no entry in the table.
    pub fn transition_type(&self, from: LulcCode, to: LulcCode) -> Result<TransitionType> {
        self.get(from, to).ok_or_else(|| {
            ModelError::Validation(format!(
                "No transition type is defined for the transition from LULC code {from} to \
                LULC code {to}"
            ))
            .into()
        })
    }

    /// Iterate over all defined pairs and their transition types
    pub fn iter(&self) -> impl Iterator<Item = (TransitionKey, TransitionType)> + '_ {
        self.0.iter().map(|(key, transition)| (*key, *transition))
    }

    /// Iterate over the pairs whose transition type is a disturbance
    pub fn iter_disturbances(&self) -> impl Iterator<Item = (TransitionKey, TransitionType)> + '_ {
        self.iter()
            .filter(|(_, transition)| transition.is_disturbance())
    }

    /// The number of defined pairs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
