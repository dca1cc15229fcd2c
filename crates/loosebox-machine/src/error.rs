//! Error types for loosebox-machine.

use crate::inspect::InspectError;
use thiserror::Error;

/// Result type alias for machine operations.
pub type Result<T> = std::result::Result<T, MachineError>;

/// Errors raised while loading or validating a machine spec.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Name template lacks the per-replica `%d` placeholder
    #[error("machine configuration not valid: name {0:?} should contain %d")]
    InvalidName(String),

    /// Spec document could not be parsed
    #[error("failed to parse machine spec: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur while querying a machine.
#[derive(Debug, Error)]
pub enum MachineError {
    /// The runtime query itself failed
    #[error("hostport: failed to inspect {target}: {source}")]
    Query {
        /// Container name or id the query was scoped to
        target: String,
        #[source]
        source: InspectError,
    },

    /// Inspection returned a line count other than one
    #[error("hostport: should only be one line, got {} lines: {lines:?}", .lines.len())]
    UnexpectedResultShape {
        /// Raw inspection output
        lines: Vec<String>,
    },

    /// Inspection output is not a port number
    #[error("hostport: failed to parse {value:?} as a port: {source}")]
    MalformedPortValue {
        /// Inspection output after quote stripping
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Spec failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),
}
