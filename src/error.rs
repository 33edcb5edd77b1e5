//! Error types for the cache
//!
//! Cache operations never fail; only configuration parsing can.

use std::num::ParseIntError;

use thiserror::Error;

// == Config Error Enum ==
/// Error returned when cache configuration cannot be parsed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable holds a value that is not a valid duration
    #[error("Invalid value {value:?} for {var}: {source}")]
    InvalidValue {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
