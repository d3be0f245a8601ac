use super::backend::{FaerSolver, GaussSolver, LinearSystemBackend};
use crate::error::{BusbarError, BusbarResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Available dense linear-system backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Gauss,
    Faer,
}

impl std::str::FromStr for SolverKind {
    type Err = BusbarError;

    fn from_str(input: &str) -> BusbarResult<Self> {
        match input.to_ascii_lowercase().as_str() {
            "gauss" | "default" => Ok(SolverKind::Gauss),
            "faer" => Ok(SolverKind::Faer),
            other => Err(BusbarError::Config(format!(
                "unknown solver '{}'; supported values: gauss, faer",
                other
            ))),
        }
    }
}

impl SolverKind {
    pub fn build_solver(self) -> Arc<dyn LinearSystemBackend> {
        match self {
            SolverKind::Gauss => Arc::new(GaussSolver),
            SolverKind::Faer => Arc::new(FaerSolver),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["gauss", "faer"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Gauss => "gauss",
            SolverKind::Faer => "faer",
        }
    }
}
