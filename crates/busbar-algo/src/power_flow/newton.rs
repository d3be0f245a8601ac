//! Newton-Raphson iteration in polar form.
//!
//! With `φ_kn = ∠Y_kn` and `δ_kn = θ_k − θ_n − φ_kn`, the four Jacobian
//! blocks are
//!
//! ```text
//! J1 = ∂P/∂θ   k≠n:  V_k·|Y_kn|·V_n·sin δ_kn
//!              k=n: −V_k·Σ_{n≠k} |Y_kn|·V_n·sin δ_kn
//! J2 = ∂P/∂V   k≠n:  V_k·|Y_kn|·cos δ_kn
//!              k=n:  V_k·|Y_kk|·cos φ_kk + Σ_n |Y_kn|·V_n·cos δ_kn
//! J3 = ∂Q/∂θ   k≠n: −V_k·|Y_kn|·V_n·cos δ_kn
//!              k=n:  V_k·Σ_{n≠k} |Y_kn|·V_n·cos δ_kn
//! J4 = ∂Q/∂V   k≠n:  V_k·|Y_kn|·sin δ_kn
//!              k=n: −V_k·|Y_kk|·sin φ_kk + Σ_n |Y_kn|·V_n·sin δ_kn
//! ```
//!
//! Rows of J1/J2 belong to angle buses, rows of J3/J4 to magnitude buses;
//! columns follow the same split (see [`UnknownLayout`]).
//!
//! ## References
//!
//! - Tinney & Hart (1967): "Power Flow Solution by Newton's Method"
//!   IEEE Trans. PAS, 86(11), 1449-1460
//!   DOI: [10.1109/TPAS.1967.291823](https://doi.org/10.1109/TPAS.1967.291823)

use busbar_core::{AdmittanceMatrix, BusbarResult, LinearSystemBackend};

use super::{
    mismatch, solve_linear, BusClassification, InnerOutcome, PowerFlowCase, UnknownLayout,
    VoltageState,
};

/// |Y| and ∠Y, computed once per solve.
struct PolarAdmittance {
    n: usize,
    mag: Vec<f64>,
    ang: Vec<f64>,
}

impl PolarAdmittance {
    fn new(y_bus: &AdmittanceMatrix) -> Self {
        let n = y_bus.n_bus();
        let mut mag = Vec::with_capacity(n * n);
        let mut ang = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let y = y_bus.get(i, j);
                mag.push(y.norm());
                ang.push(y.arg());
            }
        }
        Self { n, mag, ang }
    }

    #[inline]
    fn mag(&self, k: usize, n: usize) -> f64 {
        self.mag[k * self.n + n]
    }

    #[inline]
    fn ang(&self, k: usize, n: usize) -> f64 {
        self.ang[k * self.n + n]
    }

    #[inline]
    fn delta(&self, state: &VoltageState, k: usize, n: usize) -> f64 {
        state.v_ang[k] - state.v_ang[n] - self.ang(k, n)
    }
}

/// ∂P_k/∂θ_n
fn dp_dtheta(y: &PolarAdmittance, s: &VoltageState, k: usize, n: usize) -> f64 {
    if k == n {
        let sum: f64 = (0..y.n)
            .filter(|&m| m != k)
            .map(|m| y.mag(k, m) * s.v_mag[m] * y.delta(s, k, m).sin())
            .sum();
        -s.v_mag[k] * sum
    } else {
        s.v_mag[k] * y.mag(k, n) * s.v_mag[n] * y.delta(s, k, n).sin()
    }
}

/// ∂P_k/∂V_n
fn dp_dv(y: &PolarAdmittance, s: &VoltageState, k: usize, n: usize) -> f64 {
    if k == n {
        let sum: f64 = (0..y.n)
            .map(|m| y.mag(k, m) * s.v_mag[m] * y.delta(s, k, m).cos())
            .sum();
        s.v_mag[k] * y.mag(k, k) * y.ang(k, k).cos() + sum
    } else {
        s.v_mag[k] * y.mag(k, n) * y.delta(s, k, n).cos()
    }
}

/// ∂Q_k/∂θ_n
fn dq_dtheta(y: &PolarAdmittance, s: &VoltageState, k: usize, n: usize) -> f64 {
    if k == n {
        let sum: f64 = (0..y.n)
            .filter(|&m| m != k)
            .map(|m| y.mag(k, m) * s.v_mag[m] * y.delta(s, k, m).cos())
            .sum();
        s.v_mag[k] * sum
    } else {
        -s.v_mag[k] * y.mag(k, n) * s.v_mag[n] * y.delta(s, k, n).cos()
    }
}

/// ∂Q_k/∂V_n
fn dq_dv(y: &PolarAdmittance, s: &VoltageState, k: usize, n: usize) -> f64 {
    if k == n {
        let sum: f64 = (0..y.n)
            .map(|m| y.mag(k, m) * s.v_mag[m] * y.delta(s, k, m).sin())
            .sum();
        -s.v_mag[k] * y.mag(k, k) * y.ang(k, k).sin() + sum
    } else {
        s.v_mag[k] * y.mag(k, n) * y.delta(s, k, n).sin()
    }
}

fn build_jacobian(y: &PolarAdmittance, state: &VoltageState, layout: &UnknownLayout) -> Vec<Vec<f64>> {
    let n_p = layout.angle.len();
    let n_vars = layout.n_vars();
    let mut jacobian = vec![vec![0.0; n_vars]; n_vars];

    // J1 and J2
    for (row, &k) in layout.angle.iter().enumerate() {
        for (col, &n) in layout.angle.iter().enumerate() {
            jacobian[row][col] = dp_dtheta(y, state, k, n);
        }
        for (col, &n) in layout.magnitude.iter().enumerate() {
            jacobian[row][n_p + col] = dp_dv(y, state, k, n);
        }
    }

    // J3 and J4
    for (row, &k) in layout.magnitude.iter().enumerate() {
        for (col, &n) in layout.angle.iter().enumerate() {
            jacobian[n_p + row][col] = dq_dtheta(y, state, k, n);
        }
        for (col, &n) in layout.magnitude.iter().enumerate() {
            jacobian[n_p + row][n_p + col] = dq_dv(y, state, k, n);
        }
    }

    jacobian
}

/// Iterate `J·Δx = Δy` until the largest mismatch drops below `tolerance`.
///
/// `state` holds the last iterate on return, converged or not.
pub(super) fn solve(
    case: &PowerFlowCase,
    classification: &BusClassification,
    q_spec: &[f64],
    state: &mut VoltageState,
    tolerance: f64,
    max_iterations: usize,
    backend: &dyn LinearSystemBackend,
) -> BusbarResult<InnerOutcome> {
    let layout = classification.layout();
    if layout.n_vars() == 0 {
        return Ok(InnerOutcome {
            converged: true,
            iterations: 0,
            max_mismatch: 0.0,
        });
    }

    let y = PolarAdmittance::new(&case.y_bus);
    let n_p = layout.angle.len();

    for iter in 0..max_iterations {
        let (delta_y, max_mismatch) = mismatch(case, q_spec, &layout, state);
        tracing::trace!(iteration = iter, max_mismatch, "newton-raphson step");
        if max_mismatch < tolerance {
            return Ok(InnerOutcome {
                converged: true,
                iterations: iter,
                max_mismatch,
            });
        }

        let jacobian = build_jacobian(&y, state, &layout);
        let delta_x = solve_linear(backend, &jacobian, &delta_y, "singular Jacobian")?;

        for (k, &i) in layout.angle.iter().enumerate() {
            state.v_ang[i] += delta_x[k];
        }
        for (k, &i) in layout.magnitude.iter().enumerate() {
            state.v_mag[i] += delta_x[n_p + k];
        }
    }

    let (_, max_mismatch) = mismatch(case, q_spec, &layout, state);
    Ok(InnerOutcome {
        converged: max_mismatch < tolerance,
        iterations: max_iterations,
        max_mismatch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power_flow::compute_injections;
    use busbar_core::{Network, SystemSettings};

    fn two_bus() -> Network {
        let mut network = Network::new("two-bus", SystemSettings::default());
        network.add_bus("bus1", 138.0).unwrap();
        network.add_bus("bus2", 138.0).unwrap();
        network.add_line("L1", "bus1", "bus2", 0.02, 0.1, 0.04).unwrap();
        network.add_generator("G1", "bus1", 1.0, 0.0).unwrap();
        network.add_load("D2", "bus2", 80.0, 30.0).unwrap();
        network
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let mut network = two_bus();
        let case = PowerFlowCase::from_network(&mut network);
        let classification = BusClassification::from_network(&network);
        let layout = classification.layout();
        let y = PolarAdmittance::new(&case.y_bus);
        let state = VoltageState {
            v_mag: vec![1.0, 0.95],
            v_ang: vec![0.0, -0.08],
        };
        let jacobian = build_jacobian(&y, &state, &layout);

        let h = 1e-7;
        let (p0, q0) = compute_injections(&case.y_bus, &state);

        let mut bumped = state.clone();
        bumped.v_ang[1] += h;
        let (p1, q1) = compute_injections(&case.y_bus, &bumped);
        assert!((jacobian[0][0] - (p1[1] - p0[1]) / h).abs() < 1e-5);
        assert!((jacobian[1][0] - (q1[1] - q0[1]) / h).abs() < 1e-5);

        let mut bumped = state.clone();
        bumped.v_mag[1] += h;
        let (p1, q1) = compute_injections(&case.y_bus, &bumped);
        assert!((jacobian[0][1] - (p1[1] - p0[1]) / h).abs() < 1e-5);
        assert!((jacobian[1][1] - (q1[1] - q0[1]) / h).abs() < 1e-5);
    }

    #[test]
    fn converges_quadratically_on_two_bus() {
        let mut network = two_bus();
        let case = PowerFlowCase::from_network(&mut network);
        let classification = BusClassification::from_network(&network);
        let mut state = case.flat_start(&classification);
        let outcome = solve(
            &case,
            &classification,
            &case.q_spec,
            &mut state,
            1e-10,
            20,
            &busbar_core::GaussSolver,
        )
        .unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations <= 6);
        assert!(state.v_mag[1] < 1.0);
        assert!(state.v_ang[1] < 0.0);
    }
}
