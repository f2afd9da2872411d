use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `ExtinctionError` and maps to other errors to
/// convert to an `ExtinctionError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ExtinctionError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// An input parameter lies outside the domain the model is defined on.
    Domain {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// The generating function or the solver produced a value outside `[0, 1]`
    /// (or a non-finite value). This indicates a modeling bug, not bad luck.
    NumericalAnomaly(String),
    InvalidGrid(String),
    /// A sweep was cancelled after `completed` grid points had been computed.
    Cancelled {
        completed: usize,
    },
    ExtinctionError(String),
}

impl ExtinctionError {
    #[must_use]
    pub fn domain(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        ExtinctionError::Domain {
            parameter,
            value,
            reason,
        }
    }
}

impl From<io::Error> for ExtinctionError {
    fn from(error: io::Error) -> Self {
        ExtinctionError::IoError(error)
    }
}

impl From<serde_json::Error> for ExtinctionError {
    fn from(error: serde_json::Error) -> Self {
        ExtinctionError::JsonError(error)
    }
}

impl From<csv::Error> for ExtinctionError {
    fn from(error: csv::Error) -> Self {
        ExtinctionError::CSVError(error)
    }
}

impl From<String> for ExtinctionError {
    fn from(error: String) -> Self {
        ExtinctionError::ExtinctionError(error)
    }
}

impl From<&str> for ExtinctionError {
    fn from(error: &str) -> Self {
        ExtinctionError::ExtinctionError(error.to_string())
    }
}

impl std::error::Error for ExtinctionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtinctionError::IoError(error) => Some(error),
            ExtinctionError::JsonError(error) => Some(error),
            ExtinctionError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for ExtinctionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExtinctionError::Domain {
                parameter,
                value,
                reason,
            } => write!(f, "value {value} provided for {parameter} {reason}"),
            ExtinctionError::NumericalAnomaly(message) => {
                write!(f, "numerical anomaly: {message}")
            }
            ExtinctionError::InvalidGrid(message) => write!(f, "invalid R0 grid: {message}"),
            ExtinctionError::Cancelled { completed } => {
                write!(f, "sweep cancelled after {completed} grid points")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
