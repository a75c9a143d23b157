//! Error types for the sensor abstraction layer.

use thiserror::Error;

/// Errors that can occur when decoding environment data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A trace contained a character that is not a step code
    #[error("Unknown step code: {0:?}")]
    UnknownStepCode(char),
}
