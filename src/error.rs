//! Typed categories for failures detected while loading or checking a model.
//!
//! These errors are raised where a problem is detected and carried inside [`anyhow::Error`], so
//! that context (e.g. which input file was being read) can be layered on top as usual. Use
//! [`ModelError::find`] to recover the category from an error chain.
use thiserror::Error;

/// A failure in the model inputs, grouped by category
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Inputs are individually well formed but inconsistent with one another (e.g. an unmapped
    /// transition, years out of order or a gap in the price table)
    #[error("{0}")]
    Validation(String),
    /// A parameter required by the configured transitions is missing or unusable
    #[error("{0}")]
    Configuration(String),
    /// Input data refers to a land cover code or class which has not been defined
    #[error("{0}")]
    Data(String),
}

/// The category of a [`ModelError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ErrorKind {
    /// See [`ModelError::Validation`]
    Validation,
    /// See [`ModelError::Configuration`]
    Configuration,
    /// See [`ModelError::Data`]
    Data,
}

impl ModelError {
    /// The category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Data(_) => ErrorKind::Data,
        }
    }

    /// Find the first [`ModelError`] in the chain of `err`, if any
    pub fn find(err: &anyhow::Error) -> Option<&ModelError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ModelError>())
    }

    /// The category of the first [`ModelError`] in the chain of `err`, if any
    pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
        Self::find(err).map(ModelError::kind)
    }
}
