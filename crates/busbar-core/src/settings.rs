//! System settings and study configuration.
//!
//! [`SystemSettings`] carries the MVA base and frequency. It is handed to
//! [`Network::new`](crate::Network::new) and every per-unit conversion reads
//! it from there; nothing in the workspace keeps a global copy.
//!
//! [`StudyConfig`] bundles the system settings with power-flow and fault
//! options and can be loaded from TOML. Every section and field is optional:
//!
//! ```toml
//! [system]
//! base_mva = 100.0
//!
//! [power_flow]
//! method = "fast_decoupled"
//! enforce_q_limits = true
//!
//! [fault]
//! buses = ["bus2"]
//! kinds = ["three_phase", "slg"]
//! impedance = { re = 0.0, im = 0.05 }
//! ```
//!
//! Unknown keys are rejected rather than ignored.

use std::path::Path;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{BusbarError, BusbarResult};
use crate::solver::SolverKind;
use crate::units::MegavoltAmperes;

/// Power base and frequency shared by every device of a network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemSettings {
    /// System MVA base for per-unit conversion
    pub base_mva: f64,
    /// Nominal frequency in Hz
    pub frequency_hz: f64,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            base_mva: 100.0,
            frequency_hz: 60.0,
        }
    }
}

impl SystemSettings {
    pub fn base(&self) -> MegavoltAmperes {
        MegavoltAmperes(self.base_mva)
    }

    pub fn angular_frequency(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.frequency_hz
    }

    pub fn validate(&self) -> BusbarResult<()> {
        if !(self.base_mva.is_finite() && self.base_mva > 0.0) {
            return Err(BusbarError::Config(format!(
                "base_mva must be positive, got {}",
                self.base_mva
            )));
        }
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(BusbarError::Config(format!(
                "frequency_hz must be positive, got {}",
                self.frequency_hz
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerFlowMethod {
    #[default]
    NewtonRaphson,
    FastDecoupled,
    Dc,
}

impl PowerFlowMethod {
    /// Iteration budget used when none is configured
    pub fn default_max_iterations(self) -> usize {
        match self {
            PowerFlowMethod::NewtonRaphson => 50,
            PowerFlowMethod::FastDecoupled => 75,
            PowerFlowMethod::Dc => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerFlowSettings {
    pub method: PowerFlowMethod,
    /// Largest per-unit mismatch accepted as converged
    pub tolerance: f64,
    /// Inner iteration cap; `None` picks the method default (50 NR, 75 FD)
    pub max_iterations: Option<usize>,
    /// Reclassify PV buses to PQ when a generator leaves its Q range
    pub enforce_q_limits: bool,
    /// Cap on reclassify-and-restart passes
    pub max_q_iterations: usize,
    /// Start from the voltages stored on the buses instead of a flat start
    pub warm_start: bool,
    pub linear_solver: SolverKind,
}

impl Default for PowerFlowSettings {
    fn default() -> Self {
        Self {
            method: PowerFlowMethod::default(),
            tolerance: 1e-3,
            max_iterations: None,
            enforce_q_limits: false,
            max_q_iterations: 10,
            warm_start: false,
            linear_solver: SolverKind::default(),
        }
    }
}

impl PowerFlowSettings {
    pub fn iteration_limit(&self) -> usize {
        self.max_iterations
            .unwrap_or_else(|| self.method.default_max_iterations())
    }

    pub fn with_method(mut self, method: PowerFlowMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = Some(max_iter);
        self
    }

    pub fn with_q_limit_enforcement(mut self, enable: bool) -> Self {
        self.enforce_q_limits = enable;
        self
    }

    pub fn with_warm_start(mut self, enable: bool) -> Self {
        self.warm_start = enable;
        self
    }

    pub fn with_linear_solver(mut self, solver: SolverKind) -> Self {
        self.linear_solver = solver;
        self
    }

    pub fn validate(&self) -> BusbarResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(BusbarError::Config(format!(
                "power flow tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.iteration_limit() == 0 {
            return Err(BusbarError::Config(
                "power flow iteration limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ThreePhase,
    #[serde(alias = "slg")]
    SingleLineToGround,
    #[serde(alias = "ll")]
    LineToLine,
    #[serde(alias = "dlg")]
    DoubleLineToGround,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FaultKind::ThreePhase => "three-phase",
            FaultKind::SingleLineToGround => "single-line-to-ground",
            FaultKind::LineToLine => "line-to-line",
            FaultKind::DoubleLineToGround => "double-line-to-ground",
        };
        f.write_str(label)
    }
}

/// Fault impedance in per-unit on the system base.
///
/// Written as `{ re, im }`; `r` and `x` are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultImpedance {
    #[serde(alias = "r")]
    pub re: f64,
    #[serde(alias = "x")]
    pub im: f64,
}

impl FaultImpedance {
    pub fn to_complex(self) -> Complex64 {
        Complex64::new(self.re, self.im)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultSettings {
    /// Buses to fault, by name
    pub buses: Vec<String>,
    pub kinds: Vec<FaultKind>,
    pub impedance: FaultImpedance,
    /// Magnitudes below this are reported as exactly zero
    pub snap_threshold: f64,
    pub linear_solver: SolverKind,
}

impl Default for FaultSettings {
    fn default() -> Self {
        Self {
            buses: Vec::new(),
            kinds: vec![FaultKind::ThreePhase],
            impedance: FaultImpedance::default(),
            snap_threshold: 1e-6,
            linear_solver: SolverKind::default(),
        }
    }
}

/// Everything a study run needs besides the network itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    pub system: SystemSettings,
    pub power_flow: PowerFlowSettings,
    pub fault: FaultSettings,
}

impl StudyConfig {
    pub fn from_toml_str(contents: &str) -> BusbarResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> BusbarResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded study config");
        Ok(config)
    }

    pub fn validate(&self) -> BusbarResult<()> {
        self.system.validate()?;
        self.power_flow.validate()?;
        if self.fault.snap_threshold < 0.0 {
            return Err(BusbarError::Config(
                "fault snap_threshold must not be negative".into(),
            ));
        }
        Ok(())
    }
}
