//! Error type shared by the busbar crates.
//!
//! Topology mistakes (duplicate names, references to buses that do not exist)
//! are reported as [`BusbarError`] values and leave the network untouched.
//! Numerical breakdowns surface as [`BusbarError::Singular`]. A power flow that
//! runs out of iterations is *not* an error; see the solver result types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusbarError {
    /// I/O errors (reading a study configuration, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structural validation errors (no slack bus, islands, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A bus or device with this name is already registered
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    /// A device references a bus that was never added
    #[error("{device} '{name}' references unknown bus '{bus}'")]
    UnknownBus {
        device: &'static str,
        name: String,
        bus: String,
    },

    /// Lookup of a device that is not registered
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Non-invertible Ybus, Jacobian or impedance matrix
    #[error("Singular matrix: {0}")]
    Singular(String),

    /// Solver/algorithm errors other than singularity
    #[error("Solver error: {0}")]
    Solver(String),

    #[error("{0}")]
    Other(String),
}

pub type BusbarResult<T> = Result<T, BusbarError>;

impl From<anyhow::Error> for BusbarError {
    fn from(err: anyhow::Error) -> Self {
        BusbarError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for BusbarError {
    fn from(err: toml::de::Error) -> Self {
        BusbarError::Parse(err.to_string())
    }
}

impl From<String> for BusbarError {
    fn from(s: String) -> Self {
        BusbarError::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BusbarError::DuplicateName {
            kind: "bus",
            name: "bus1".into(),
        };
        assert_eq!(err.to_string(), "bus 'bus1' already exists");

        let err = BusbarError::UnknownBus {
            device: "line",
            name: "L1".into(),
            bus: "bus9".into(),
        };
        assert!(err.to_string().contains("unknown bus 'bus9'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BusbarError = io_err.into();
        assert!(matches!(err, BusbarError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> BusbarResult<()> {
            Err(BusbarError::Singular("zero pivot".into()))
        }

        fn outer() -> BusbarResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(BusbarError::Singular(_))));
    }
}
