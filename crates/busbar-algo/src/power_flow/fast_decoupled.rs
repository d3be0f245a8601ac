//! Fast-Decoupled Power Flow (FDPF)
//!
//! Drops the P-V and Q-θ couplings of the Newton Jacobian and replaces the
//! remaining blocks with constant susceptance matrices:
//!
//! ```text
//!   ΔP / V = −B′ · Δθ      B′ = Im(Ybus) on the angle buses
//!   ΔQ / V = −B″ · ΔV      B″ = Im(Ybus) on the magnitude buses
//! ```
//!
//! Each iteration solves the θ half-step, recomputes the injections with the
//! new angles, then solves the V half-step. B′ and B″ are built once per
//! solve; convergence is linear, so the default iteration budget is larger
//! than Newton's.
//!
//! ## References
//!
//! - Stott & Alsac (1974): "Fast Decoupled Load Flow"
//!   IEEE Trans. PAS, 93(3), 859-869
//!   DOI: [10.1109/TPAS.1974.293985](https://doi.org/10.1109/TPAS.1974.293985)

use busbar_core::{AdmittanceMatrix, BusbarResult, LinearSystemBackend};

use super::{
    compute_injections, mismatch, solve_linear, BusClassification, InnerOutcome, PowerFlowCase,
    VoltageState,
};

/// `−Im(Ybus)` restricted to `buses` (rows and columns).
pub(crate) fn reduced_susceptance(y_bus: &AdmittanceMatrix, buses: &[usize]) -> Vec<Vec<f64>> {
    buses
        .iter()
        .map(|&i| buses.iter().map(|&j| -y_bus.b(i, j)).collect())
        .collect()
}

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

    let b_prime = reduced_susceptance(&case.y_bus, &layout.angle);
    let b_double_prime = reduced_susceptance(&case.y_bus, &layout.magnitude);

    for iter in 0..max_iterations {
        let (_, max_mismatch) = mismatch(case, q_spec, &layout, state);
        tracing::trace!(iteration = iter, max_mismatch, "fast-decoupled step");
        if max_mismatch < tolerance {
            return Ok(InnerOutcome {
                converged: true,
                iterations: iter,
                max_mismatch,
            });
        }

        // P-θ half-step
        let (p_calc, _) = compute_injections(&case.y_bus, state);
        let rhs: Vec<f64> = layout
            .angle
            .iter()
            .map(|&i| (case.p_spec[i] - p_calc[i]) / state.v_mag[i])
            .collect();
        let delta_theta = solve_linear(backend, &b_prime, &rhs, "singular B' matrix")?;
        for (k, &i) in layout.angle.iter().enumerate() {
            state.v_ang[i] += delta_theta[k];
        }

        // Q-V half-step
        if !layout.magnitude.is_empty() {
            let (_, q_calc) = compute_injections(&case.y_bus, state);
            let rhs: Vec<f64> = layout
                .magnitude
                .iter()
                .map(|&i| (q_spec[i] - q_calc[i]) / state.v_mag[i])
                .collect();
            let delta_v = solve_linear(backend, &b_double_prime, &rhs, "singular B'' matrix")?;
            for (k, &i) in layout.magnitude.iter().enumerate() {
                state.v_mag[i] += delta_v[k];
            }
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
    use busbar_core::{GaussSolver, Network, SystemSettings};

    #[test]
    fn b_matrices_follow_layout() {
        let mut network = Network::new("fd", SystemSettings::default());
        for name in ["bus1", "bus2", "bus3"] {
            network.add_bus(name, 115.0).unwrap();
        }
        network.add_line("L12", "bus1", "bus2", 0.0, 0.1, 0.0).unwrap();
        network.add_line("L23", "bus2", "bus3", 0.0, 0.2, 0.0).unwrap();
        network.add_generator("G1", "bus1", 1.0, 0.0).unwrap();
        network.add_generator("G3", "bus3", 1.0, 20.0).unwrap();

        let classification = BusClassification::from_network(&network);
        let layout = classification.layout();
        let y_bus = network.ybus();

        let b_prime = reduced_susceptance(y_bus, &layout.angle);
        assert_eq!(b_prime.len(), 2);
        assert!((b_prime[0][0] - 15.0).abs() < 1e-9);
        assert!((b_prime[0][1] + 5.0).abs() < 1e-9);
        assert!((b_prime[1][1] - 5.0).abs() < 1e-9);

        let b_double_prime = reduced_susceptance(y_bus, &layout.magnitude);
        assert_eq!(b_double_prime.len(), 1);
        assert!((b_double_prime[0][0] - 15.0).abs() < 1e-9);
    }

    #[test]
    fn converges_on_lightly_loaded_case() {
        let mut network = Network::new("fd", SystemSettings::default());
        network.add_bus("bus1", 115.0).unwrap();
        network.add_bus("bus2", 115.0).unwrap();
        network.add_line("L12", "bus1", "bus2", 0.01, 0.1, 0.0).unwrap();
        network.add_generator("G1", "bus1", 1.0, 0.0).unwrap();
        network.add_load("D2", "bus2", 40.0, 10.0).unwrap();

        let case = PowerFlowCase::from_network(&mut network);
        let classification = BusClassification::from_network(&network);
        let mut state = case.flat_start(&classification);
        let outcome = solve(
            &case,
            &classification,
            &case.q_spec,
            &mut state,
            1e-8,
            75,
            &GaussSolver,
        )
        .unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations > 1);
        assert!(state.v_mag[1] < 1.0);
    }
}
