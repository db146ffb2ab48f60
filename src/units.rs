//! This module defines various unit types and their conversions.
use serde::{Deserialize, Serialize};

macro_rules! unit_struct {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is neither infinite nor NaN
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    /// Create a new dimensionless value
    pub fn new(val: f64) -> Self {
        Self(val)
    }

    /// Returns the value as a f64.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Self(self.0.powi(rhs))
    }

    /// Raise to a floating-point power
    pub fn powf(self, rhs: f64) -> Self {
        Self(self.0.powf(rhs))
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

// Base quantities
unit_struct!(CarbonDensity, "Carbon stored per pixel (e.g. Mg C per hectare)");
unit_struct!(Money, "An amount of money");
unit_struct!(Year, "A length of time in years");

// Derived quantities
unit_struct!(
    CarbonDensityPerYear,
    "Carbon gained or lost per pixel per year"
);
unit_struct!(MoneyPerCarbon, "The price of one unit of carbon");

// Multiplication rules
impl_mul!(CarbonDensityPerYear, Year, CarbonDensity);
impl_mul!(MoneyPerCarbon, CarbonDensity, Money);
