//! Dense linear-system backends.

mod backend;
mod complex;
mod registry;

pub use backend::{FaerSolver, GaussSolver, LinearSystemBackend};
pub use complex::invert_complex;
pub use registry::SolverKind;
