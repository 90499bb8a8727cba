//! About the errors raised while configuring, binding, and evaluating a potential.
//!
//! Errors fall into the categories the host engine has to distinguish:
//! configuration errors surface at construction, shape (structural) errors when the
//! potential is bound to a topology, and numerical errors during a step.

use std::path::Path;
use thiserror::Error;





/// Errors that can occur anywhere in the crate.
#[derive(Debug, Error)]
pub enum Error
{
    /// Bad configuration value (non-positive conversion factor, unknown potential name, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// The deployed model artifact is missing, unreadable, or malformed.
    #[error("failed to load the model '{path}': {detail}")]
    Load
    {
        path: String,
        detail: String,
    },

    /// The topology, positions, or box do not match what the model expects.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// The model produced a non-finite energy or force.
    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("there is some problem in {operation} the file '{path}': {source}")]
    Io
    {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An input file (configuration, structure, saved force) has an illegal format.
    #[error("failed to parse '{path}': {detail}")]
    Parse
    {
        path: String,
        detail: String,
    },
}





pub type Result<T> = std::result::Result<T, Error>;





impl Error
{
    pub fn load(path: impl AsRef<Path>, detail: impl Into<String>) -> Self
    {
        Error::Load
        {
            path: path.as_ref().display().to_string(),
            detail: detail.into(),
        }
    }

    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self
    {
        Error::Io
        {
            operation,
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, detail: impl Into<String>) -> Self
    {
        Error::Parse
        {
            path: path.as_ref().display().to_string(),
            detail: detail.into(),
        }
    }
}





/// Error message for a conversion factor or length that should be strictly positive and finite
pub fn error_non_positive(variable: &str, value: f64) -> String
{
    format!("'{}' must be a strictly positive finite number, got {}", variable, value)
}

/// Error message for an atom index outside of the topology
pub fn error_atom_index(index: usize, natom: usize) -> String
{
    format!("atom index {} is out of range for a topology of {} atoms", index, natom)
}

/// Error message for an array whose shape differs from the expected one
pub fn error_array_shape(variable: &str, expected: (usize, usize), found: (usize, usize)) -> String
{
    format!("'{}' should have shape {:?}, got {:?}", variable, expected, found)
}

/// Error message for a missing key in the metadata of a deployed model
pub fn error_missing_metadata(key: &str) -> String
{
    format!("the metadata key '{}' is missing", key)
}

/// Error message for non-finite values returned by the model
pub fn error_non_finite(quantity: &str, step_detail: &str) -> String
{
    format!("the model returned a non-finite {} ({})", quantity, step_detail)
}
