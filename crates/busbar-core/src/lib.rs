//! # busbar-core: network model and admittance assembly
//!
//! A [`Network`] owns buses and typed device registries; devices contribute
//! primitive admittance blocks through the [`Branch`](devices::Branch) trait,
//! and [`admittance`] superposes them into Ybus and the fault sequence
//! matrices. Solvers live in `busbar-algo`.
//!
//! ## Quick Start
//!
//! ```rust
//! use busbar_core::*;
//!
//! let mut network = Network::new("two-bus", SystemSettings::default());
//! network.add_bus("bus1", 138.0)?;
//! network.add_bus("bus2", 138.0)?;
//! network.add_line("L1", "bus1", "bus2", 0.01, 0.1, 0.02)?;
//! network.add_generator("G1", "bus1", 1.0, 0.0)?;
//! network.add_load("D2", "bus2", 40.0, 10.0)?;
//!
//! assert_eq!(network.bus("bus1").unwrap().bus_type, BusType::Slack);
//! let y_bus = network.ybus();
//! assert_eq!(y_bus.n_bus(), 2);
//! # Ok::<(), BusbarError>(())
//! ```

pub mod admittance;
pub mod devices;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod impedance;
pub mod network;
pub mod settings;
pub mod solver;
pub mod units;

pub use admittance::{build_ybus, AdmittanceMatrix, SequenceNetworks};
pub use devices::{
    Branch, Generator, Grounding, Line, Load, Primitive, Sequence, ShuntCompensator, ShuntKind,
    Transformer, TransformerConnection, Winding,
};
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{BusbarError, BusbarResult};
pub use impedance::ImpedanceMatrix;
pub use network::{Bus, BusId, BusType, Network};
pub use settings::{
    FaultImpedance, FaultKind, FaultSettings, PowerFlowMethod, PowerFlowSettings, StudyConfig,
    SystemSettings,
};
pub use solver::{FaerSolver, GaussSolver, LinearSystemBackend, SolverKind};
pub use units::{Degrees, Kilovolts, Megavars, MegavoltAmperes, Megawatts, PerUnit, Radians};
