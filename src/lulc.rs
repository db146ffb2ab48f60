//! Land use/land cover (LULC) classes and the lookup between raster codes and classes.
use crate::error::ModelError;
use crate::id::define_id_type;
use anyhow::{Result, ensure};
use indexmap::IndexMap;

define_id_type! {LulcClassID}

/// The integer value used for a LULC class in raster data
pub type LulcCode = i32;

/// A land use/land cover class
#[derive(PartialEq, Debug, Clone)]
pub struct LulcClass {
    /// The code used for this class in LULC rasters
    pub code: LulcCode,
    /// Name of the class (e.g. "mangrove")
    pub id: LulcClassID,
    /// Whether the class is a coastal blue carbon habitat
    pub is_habitat: bool,
}

/// All LULC classes in the model, in the order they were defined
#[derive(PartialEq, Debug, Clone, Default)]
pub struct LulcClassMap(IndexMap<LulcCode, LulcClass>);

impl LulcClassMap {
    /// Create a map from a collection of classes.
    ///
    /// Codes and class names must both be unique.
    pub fn from_classes<I>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = LulcClass>,
    {
        let mut map = IndexMap::new();
        for class in classes {
            ensure!(
                !map.values().any(|c: &LulcClass| c.id == class.id),
                ModelError::Data(format!("LULC class {} is defined more than once", class.id))
            );
            let code = class.code;
            ensure!(
                map.insert(code, class).is_none(),
                ModelError::Data(format!("LULC code {code} is defined more than once"))
            );
        }

        Ok(Self(map))
    }

    /// Get the class for the given code, if defined
    pub fn get(&self, code: LulcCode) -> Option<&LulcClass> {
        self.0.get(&code)
    }

    /// Get the class for the given code, failing with a data error if the code is not defined
    pub fn get_checked(&self, code: LulcCode) -> Result<&LulcClass> {
        self.0.get(&code).ok_or_else(|| {
            ModelError::Data(format!("LULC code {code} is not in the LULC lookup table")).into()
        })
    }

    /// Look up the code for a class by its name
    pub fn code_for_name(&self, name: &str) -> Result<LulcCode> {
        self.0
            .values()
            .find(|class| &*class.id.0 == name)
            .map(|class| class.code)
            .ok_or_else(|| {
                ModelError::Data(format!("LULC class {name} is not in the LULC lookup table"))
                    .into()
            })
    }

    /// Whether the given code has been defined
    pub fn contains_code(&self, code: LulcCode) -> bool {
        self.0.contains_key(&code)
    }

    /// Iterate over the classes in the order they were defined
    pub fn iter(&self) -> impl Iterator<Item = &LulcClass> {
        self.0.values()
    }

    /// The number of classes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no classes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
