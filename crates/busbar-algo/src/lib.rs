//! # busbar-algo: power flow and fault analysis
//!
//! Solvers operating on a [`busbar_core::Network`]:
//!
//! | Entry point | What it computes |
//! |-------------|------------------|
//! | [`PowerFlowSolver`] | Steady-state voltages by Newton-Raphson, Fast-Decoupled or DC |
//! | [`FaultAnalyzer`] | Three-phase, SLG, LL and DLG fault currents and voltages |
//! | [`run_study`] | Power flow followed by a configured fault set |
//!
//! Power-flow results are written back to the network, so a fault analysis
//! built afterwards starts from the solved prefault state.
//!
//! ## Example
//!
//! ```rust
//! use busbar_algo::{FaultAnalyzer, PowerFlowSolver};
//! use busbar_core::{FaultKind, GaussSolver, Network, SystemSettings};
//! use num_complex::Complex64;
//!
//! let mut network = Network::new("two-bus", SystemSettings::default());
//! network.add_bus("bus1", 138.0)?;
//! network.add_bus("bus2", 138.0)?;
//! network.add_line("L1", "bus1", "bus2", 0.01, 0.1, 0.02)?;
//! network
//!     .add_generator("G1", "bus1", 1.0, 0.0)?
//!     .with_reactances(0.15, 0.15, 0.05);
//! network.add_load("D2", "bus2", 40.0, 10.0)?;
//!
//! let solution = PowerFlowSolver::newton_raphson().solve(&mut network)?;
//! assert!(solution.converged);
//!
//! let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver)?;
//! let fault = analyzer.analyze("bus2", FaultKind::ThreePhase, Complex64::new(0.0, 0.0))?;
//! assert!(fault.total_current.magnitude > 1.0);
//! # Ok::<(), busbar_core::BusbarError>(())
//! ```

pub mod fault;
pub mod power_flow;
pub mod study;

pub use fault::{BusFaultVoltage, FaultAnalyzer, FaultResult, Phasor, SequenceComponents};
pub use power_flow::{
    apply_to_network, solve_dc, BranchFlow, BusClassification, BusSolution, DcBranchFlow,
    DcPowerFlowSolution, GeneratorSolution, PowerFlowSolution, PowerFlowSolver, UnknownLayout,
};
pub use study::{run_study, StudyReport};
