//! Bus impedance matrix (Zbus) as the inverse of an admittance matrix.

use num_complex::Complex64;
use serde::Serialize;

use crate::admittance::AdmittanceMatrix;
use crate::error::{BusbarError, BusbarResult};
use crate::graph_utils::floating_buses;
use crate::solver::{invert_complex, LinearSystemBackend};

/// Dense Zbus = Ybus⁻¹.
///
/// Buses with no admittance path to ground are marked open: the impedance
/// seen from them is infinite, and [`get`](Self::get) reports zero coupling
/// to and from them.
#[derive(Debug, Clone, Serialize)]
pub struct ImpedanceMatrix {
    n_bus: usize,
    data: Vec<Complex64>,
    open: Vec<bool>,
}

impl ImpedanceMatrix {
    /// Invert `y_bus` over its grounded buses with one factorization.
    pub fn from_admittance(
        y_bus: &AdmittanceMatrix,
        backend: &dyn LinearSystemBackend,
    ) -> BusbarResult<Self> {
        let n_bus = y_bus.n_bus();
        let open = floating_buses(y_bus);
        let grounded: Vec<usize> = (0..n_bus).filter(|&i| !open[i]).collect();

        let reduced: Vec<Vec<Complex64>> = grounded
            .iter()
            .map(|&i| grounded.iter().map(|&j| y_bus.get(i, j)).collect())
            .collect();

        let columns = invert_complex(backend, &reduced).map_err(|err| {
            BusbarError::Singular(format!("admittance matrix is not invertible: {err}"))
        })?;

        let mut data = vec![Complex64::new(0.0, 0.0); n_bus * n_bus];
        for (&j, column) in grounded.iter().zip(&columns) {
            for (&i, &z) in grounded.iter().zip(column) {
                data[i * n_bus + j] = z;
            }
        }

        if open.iter().any(|&o| o) {
            tracing::debug!(
                open = open.iter().filter(|&&o| o).count(),
                "impedance matrix has ungrounded buses"
            );
        }

        Ok(Self { n_bus, data, open })
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    /// Z[k, n]; zero when either bus is open.
    #[inline]
    pub fn get(&self, k: usize, n: usize) -> Complex64 {
        self.data[k * self.n_bus + n]
    }

    /// True when the bus has no path to ground (infinite self-impedance).
    pub fn is_open(&self, bus: usize) -> bool {
        self.open[bus]
    }
}
