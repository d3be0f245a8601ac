//! # Power flow
//!
//! Steady-state bus voltages from scheduled injections, by one of three
//! methods sharing the same bus bookkeeping:
//!
//! | Method            | Unknowns            | Linear systems per iteration | Default budget |
//! |-------------------|---------------------|------------------------------|----------------|
//! | Newton-Raphson    | θ (non-slack), V (PQ) | one, full Jacobian         | 50             |
//! | Fast-Decoupled    | θ (non-slack), V (PQ) | two, constant B′ and B″    | 75             |
//! | DC                | θ (non-slack)        | one, no iteration           | -              |
//!
//! ## Bus classification
//!
//! ```text
//! ┌──────────┬──────────────────┬──────────────────┐
//! │ BUS TYPE │ SPECIFIED        │ SOLVED FOR       │
//! ├──────────┼──────────────────┼──────────────────┤
//! │ Slack    │ |V|, θ = 0       │ P, Q             │
//! │ PV       │ P, |V|           │ Q, θ             │
//! │ PQ       │ P, Q             │ |V|, θ           │
//! └──────────┴──────────────────┴──────────────────┘
//! ```
//!
//! A [`BusClassification`] is an immutable snapshot of these types. The
//! [`UnknownLayout`] derived from it lists the buses owning an angle unknown
//! and the buses owning a magnitude unknown; every Jacobian block is indexed
//! through those two lists.
//!
//! ## Reactive-limit enforcement
//!
//! With `enforce_q_limits` on, each converged AC solve is followed by a check
//! of generator reactive output at PV buses:
//!
//! ```text
//!   Initialize ──► Iterate ──► Converged ──► VarLimitCheck ──► Done
//!       ▲             │                            │
//!       │             ▼                            │ worst violator → PQ,
//!       │     MaxIterationsExceeded                │ Q clamped to its limit
//!       └──────────────────────────────────────────┘ (new snapshot, flat start)
//! ```
//!
//! One bus is reclassified per pass. A reclassified bus never returns to PV,
//! so the loop is bounded by the number of PV buses and, additionally, by
//! `max_q_iterations`; running out of passes is reported as non-convergence.

mod dc;
mod fast_decoupled;
mod newton;
#[cfg(test)]
mod q_limits;

pub use dc::{solve_dc, DcBranchFlow, DcPowerFlowSolution};

use std::sync::Arc;

use busbar_core::{
    AdmittanceMatrix, BusId, BusType, BusbarError, BusbarResult, LinearSystemBackend, Megavars,
    Megawatts, Network, PerUnit, PowerFlowMethod, PowerFlowSettings, Primitive, Radians, Sequence,
};
use num_complex::Complex64;
use serde::Serialize;

// ============================================================================
// CLASSIFICATION AND UNKNOWN LAYOUT
// ============================================================================

/// Immutable per-solve snapshot of bus types, indexed by 0-based bus index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusClassification {
    types: Vec<BusType>,
}

impl BusClassification {
    pub fn from_network(network: &Network) -> Self {
        Self {
            types: network.buses().map(|bus| bus.bus_type).collect(),
        }
    }

    pub fn bus_type(&self, index: usize) -> BusType {
        self.types[index]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn pv_buses(&self) -> impl Iterator<Item = usize> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == BusType::PV)
            .map(|(i, _)| i)
    }

    pub fn slack_bus(&self) -> Option<usize> {
        self.types.iter().position(|t| *t == BusType::Slack)
    }

    /// New snapshot with one bus reassigned.
    pub fn reclassified(&self, index: usize, bus_type: BusType) -> Self {
        let mut types = self.types.clone();
        types[index] = bus_type;
        Self { types }
    }

    pub fn layout(&self) -> UnknownLayout {
        let mut angle = Vec::new();
        let mut magnitude = Vec::new();
        for (i, bus_type) in self.types.iter().enumerate() {
            if *bus_type != BusType::Slack {
                angle.push(i);
            }
            if *bus_type == BusType::PQ {
                magnitude.push(i);
            }
        }
        UnknownLayout { angle, magnitude }
    }
}

/// Which buses own an angle unknown and which own a magnitude unknown.
///
/// The state vector is `[θ(angle[0]), …, θ(angle[a-1]), V(magnitude[0]), …]`
/// and the mismatch vector `[ΔP(angle[..]), ΔQ(magnitude[..])]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayout {
    pub angle: Vec<usize>,
    pub magnitude: Vec<usize>,
}

impl UnknownLayout {
    pub fn n_vars(&self) -> usize {
        self.angle.len() + self.magnitude.len()
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

/// Bus voltages in polar form, indexed by 0-based bus index.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VoltageState {
    pub v_mag: Vec<f64>,
    pub v_ang: Vec<f64>,
}

/// Per-unit data one AC solve needs, collected from the network once.
#[derive(Debug, Clone)]
pub(crate) struct PowerFlowCase {
    pub y_bus: AdmittanceMatrix,
    pub p_spec: Vec<f64>,
    pub q_spec: Vec<f64>,
    /// Generator setpoint for slack/PV buses, 1.0 elsewhere
    pub v_setpoint: Vec<f64>,
    pub base_mva: f64,
}

impl PowerFlowCase {
    pub fn from_network(network: &mut Network) -> Self {
        network.refresh_injections();
        let base_mva = network.settings().base_mva;
        let y_bus = network.ybus().clone();
        let mut p_spec = Vec::with_capacity(y_bus.n_bus());
        let mut q_spec = Vec::with_capacity(y_bus.n_bus());
        let mut v_setpoint = Vec::with_capacity(y_bus.n_bus());
        for bus in network.buses() {
            p_spec.push(bus.scheduled_p.value() / base_mva);
            q_spec.push(bus.scheduled_q.value() / base_mva);
            let setpoint = match bus.bus_type {
                BusType::PQ => 1.0,
                _ => network
                    .voltage_setpoint(bus.id)
                    .unwrap_or_else(|| bus.voltage.value()),
            };
            v_setpoint.push(setpoint);
        }
        Self {
            y_bus,
            p_spec,
            q_spec,
            v_setpoint,
            base_mva,
        }
    }

    pub fn n_bus(&self) -> usize {
        self.y_bus.n_bus()
    }

    /// Angles zero, PQ magnitudes 1.0, controlled magnitudes at setpoint.
    pub fn flat_start(&self, classification: &BusClassification) -> VoltageState {
        let v_mag = (0..self.n_bus())
            .map(|i| match classification.bus_type(i) {
                BusType::PQ => 1.0,
                _ => self.v_setpoint[i],
            })
            .collect();
        VoltageState {
            v_mag,
            v_ang: vec![0.0; self.n_bus()],
        }
    }

    /// Voltages stored on the buses, with controlled magnitudes reset to
    /// their setpoints.
    pub fn warm_start(&self, network: &Network, classification: &BusClassification) -> VoltageState {
        let mut state = VoltageState {
            v_mag: network.buses().map(|bus| bus.voltage.value()).collect(),
            v_ang: network.buses().map(|bus| bus.angle.value()).collect(),
        };
        for i in 0..self.n_bus() {
            if classification.bus_type(i) != BusType::PQ {
                state.v_mag[i] = self.v_setpoint[i];
            }
            if !(state.v_mag[i].is_finite() && state.v_mag[i] > 0.0) {
                state.v_mag[i] = 1.0;
            }
        }
        if let Some(slack) = classification.slack_bus() {
            state.v_ang[slack] = 0.0;
        }
        state
    }
}

/// Calculated injections for every bus:
///
/// ```text
/// P_k = V_k · Σ_n V_n·|Y_kn|·cos(θ_k − θ_n − ∠Y_kn)
/// Q_k = V_k · Σ_n V_n·|Y_kn|·sin(θ_k − θ_n − ∠Y_kn)
/// ```
pub(crate) fn compute_injections(y_bus: &AdmittanceMatrix, state: &VoltageState) -> (Vec<f64>, Vec<f64>) {
    let n = y_bus.n_bus();
    let mut p = vec![0.0; n];
    let mut q = vec![0.0; n];
    for k in 0..n {
        for m in 0..n {
            let y = y_bus.get(k, m);
            if y.norm() == 0.0 {
                continue;
            }
            let angle = state.v_ang[k] - state.v_ang[m] - y.arg();
            let term = state.v_mag[k] * state.v_mag[m] * y.norm();
            p[k] += term * angle.cos();
            q[k] += term * angle.sin();
        }
    }
    (p, q)
}

/// `Δy = y_scheduled − f(x)` laid out per [`UnknownLayout`], and its max-abs.
pub(crate) fn mismatch(
    case: &PowerFlowCase,
    q_spec: &[f64],
    layout: &UnknownLayout,
    state: &VoltageState,
) -> (Vec<f64>, f64) {
    let (p_calc, q_calc) = compute_injections(&case.y_bus, state);
    let mut delta = Vec::with_capacity(layout.n_vars());
    for &i in &layout.angle {
        delta.push(case.p_spec[i] - p_calc[i]);
    }
    for &i in &layout.magnitude {
        delta.push(q_spec[i] - q_calc[i]);
    }
    let max = delta.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    (delta, max)
}

/// Outcome of one inner (fixed classification) solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InnerOutcome {
    pub converged: bool,
    pub iterations: usize,
    pub max_mismatch: f64,
}

pub(crate) fn solve_linear(
    backend: &dyn LinearSystemBackend,
    matrix: &[Vec<f64>],
    rhs: &[f64],
    what: &str,
) -> BusbarResult<Vec<f64>> {
    let solution = backend
        .solve(matrix, rhs)
        .map_err(|err| BusbarError::Singular(format!("{what}: {err}")))?;
    if solution.iter().any(|x| !x.is_finite()) {
        return Err(BusbarError::Singular(format!("{what}: non-finite solution")));
    }
    Ok(solution)
}

// ============================================================================
// SOLUTION TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BusSolution {
    pub id: BusId,
    pub name: String,
    /// Type used in the final pass (PV buses may have become PQ)
    pub bus_type: BusType,
    pub voltage_pu: f64,
    pub voltage_kv: f64,
    pub angle_rad: f64,
    pub angle_deg: f64,
    /// Net injection implied by the solved voltages
    pub p_injection_mw: f64,
    pub q_injection_mvar: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratorSolution {
    pub name: String,
    pub bus: BusId,
    pub p_mw: f64,
    pub q_mvar: f64,
    /// Held at a reactive limit after PV→PQ switching
    pub q_limited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchFlow {
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    pub p_from_mw: f64,
    pub q_from_mvar: f64,
    pub p_to_mw: f64,
    pub q_to_mvar: f64,
}

impl BranchFlow {
    pub fn loss_mw(&self) -> f64 {
        self.p_from_mw + self.p_to_mw
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerFlowSolution {
    pub method: PowerFlowMethod,
    pub converged: bool,
    /// Inner iterations summed over every VAR-limit pass
    pub iterations: usize,
    /// VAR-limit restarts performed
    pub q_limit_passes: usize,
    pub max_mismatch: f64,
    pub buses: Vec<BusSolution>,
    pub generators: Vec<GeneratorSolution>,
    pub branch_flows: Vec<BranchFlow>,
    pub losses_mw: f64,
}

impl PowerFlowSolution {
    pub fn bus(&self, name: &str) -> Option<&BusSolution> {
        self.buses.iter().find(|bus| bus.name == name)
    }

    pub fn generator(&self, name: &str) -> Option<&GeneratorSolution> {
        self.generators.iter().find(|gen| gen.name == name)
    }

    pub fn voltages(&self) -> Vec<f64> {
        self.buses.iter().map(|bus| bus.voltage_pu).collect()
    }

    pub fn angles(&self) -> Vec<f64> {
        self.buses.iter().map(|bus| bus.angle_rad).collect()
    }
}

// ============================================================================
// SOLVER ENTRY POINT
// ============================================================================

/// Power flow driver: picks the method, runs the VAR-limit loop and writes
/// results back into the network.
#[derive(Clone)]
pub struct PowerFlowSolver {
    settings: PowerFlowSettings,
    backend: Arc<dyn LinearSystemBackend>,
}

impl std::fmt::Debug for PowerFlowSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerFlowSolver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl Default for PowerFlowSolver {
    fn default() -> Self {
        Self::new(PowerFlowSettings::default())
    }
}

impl PowerFlowSolver {
    pub fn new(settings: PowerFlowSettings) -> Self {
        let backend = settings.linear_solver.build_solver();
        Self { settings, backend }
    }

    pub fn newton_raphson() -> Self {
        Self::new(PowerFlowSettings::default().with_method(PowerFlowMethod::NewtonRaphson))
    }

    pub fn fast_decoupled() -> Self {
        Self::new(PowerFlowSettings::default().with_method(PowerFlowMethod::FastDecoupled))
    }

    pub fn dc() -> Self {
        Self::new(PowerFlowSettings::default().with_method(PowerFlowMethod::Dc))
    }

    pub fn settings(&self) -> &PowerFlowSettings {
        &self.settings
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.settings.tolerance = tol;
        self
    }

    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.settings.max_iterations = Some(max_iter);
        self
    }

    pub fn with_q_limit_enforcement(mut self, enable: bool) -> Self {
        self.settings.enforce_q_limits = enable;
        self
    }

    pub fn with_warm_start(mut self, enable: bool) -> Self {
        self.settings.warm_start = enable;
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn LinearSystemBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Solve and write voltages, angles and generator outputs back into
    /// `network`.
    ///
    /// Structural problems (no slack, islands, ...) and singular matrices
    /// are errors. Running out of iterations is not: the last iterate is
    /// returned with `converged == false` and a warning is logged.
    pub fn solve(&self, network: &mut Network) -> BusbarResult<PowerFlowSolution> {
        self.settings.validate()?;
        network.ensure_solvable()?;

        tracing::info!(
            network = network.name(),
            method = ?self.settings.method,
            buses = network.bus_count(),
            "solving power flow"
        );

        let solution = match self.settings.method {
            PowerFlowMethod::Dc => {
                let dc = solve_dc(network, self.backend.as_ref())?;
                dc.into_power_flow_solution(network)
            }
            method => self.solve_ac(network, method)?,
        };

        apply_to_network(network, &solution);

        if solution.converged {
            tracing::info!(
                iterations = solution.iterations,
                max_mismatch = solution.max_mismatch,
                "power flow converged"
            );
        }
        Ok(solution)
    }

    fn solve_ac(
        &self,
        network: &mut Network,
        method: PowerFlowMethod,
    ) -> BusbarResult<PowerFlowSolution> {
        let case = PowerFlowCase::from_network(network);
        let mut classification = BusClassification::from_network(network);
        let mut q_spec = case.q_spec.clone();
        let mut state = if self.settings.warm_start {
            case.warm_start(network, &classification)
        } else {
            case.flat_start(&classification)
        };
        let limits = BusQLimits::from_network(network);

        let tolerance = self.settings.tolerance;
        let max_iterations = self.settings.iteration_limit();
        let mut total_iterations = 0;
        let mut passes = 0;
        let mut q_limited = vec![false; case.n_bus()];

        let (converged, max_mismatch) = loop {
            let outcome = match method {
                PowerFlowMethod::FastDecoupled => fast_decoupled::solve(
                    &case,
                    &classification,
                    &q_spec,
                    &mut state,
                    tolerance,
                    max_iterations,
                    self.backend.as_ref(),
                )?,
                _ => newton::solve(
                    &case,
                    &classification,
                    &q_spec,
                    &mut state,
                    tolerance,
                    max_iterations,
                    self.backend.as_ref(),
                )?,
            };
            total_iterations += outcome.iterations;

            if !outcome.converged {
                tracing::warn!(
                    ?method,
                    iterations = outcome.iterations,
                    max_mismatch = outcome.max_mismatch,
                    "power flow did not converge; returning last iterate"
                );
                break (false, outcome.max_mismatch);
            }

            if !self.settings.enforce_q_limits {
                break (true, outcome.max_mismatch);
            }

            let Some(violation) = limits.worst_violation(&case, &classification, &state) else {
                break (true, outcome.max_mismatch);
            };

            if passes >= self.settings.max_q_iterations {
                tracing::warn!(
                    passes,
                    bus = violation.bus + 1,
                    "reactive-limit enforcement exhausted its restart budget"
                );
                break (false, outcome.max_mismatch);
            }
            passes += 1;

            tracing::warn!(
                bus = violation.bus + 1,
                q_mvar = violation.q_mvar,
                limit_mvar = violation.limit_mvar,
                "generator reactive limit reached; switching PV bus to PQ"
            );
            classification = classification.reclassified(violation.bus, BusType::PQ);
            q_spec[violation.bus] = (violation.limit_mvar - limits.load_q[violation.bus]) / case.base_mva;
            q_limited[violation.bus] = true;
            state = case.flat_start(&classification);
        };

        Ok(build_solution(
            network,
            &case,
            &classification,
            &state,
            SolveSummary {
                method,
                converged,
                iterations: total_iterations,
                q_limit_passes: passes,
                max_mismatch,
            },
            &q_limited,
        ))
    }
}

// ============================================================================
// VAR LIMITS
// ============================================================================

/// Summed generator Q limits and load Q per bus (Mvar).
struct BusQLimits {
    q_min: Vec<f64>,
    q_max: Vec<f64>,
    load_q: Vec<f64>,
}

struct QViolation {
    bus: usize,
    q_mvar: f64,
    limit_mvar: f64,
}

impl BusQLimits {
    fn from_network(network: &Network) -> Self {
        let n = network.bus_count();
        let mut q_min = vec![0.0; n];
        let mut q_max = vec![0.0; n];
        let mut load_q = vec![0.0; n];
        for bus in network.buses() {
            let i = bus.id.index();
            let gens: Vec<_> = network.generators_at(bus.id).collect();
            if gens.is_empty() {
                q_min[i] = f64::NEG_INFINITY;
                q_max[i] = f64::INFINITY;
            } else {
                q_min[i] = gens.iter().map(|g| g.q_min.value()).sum();
                q_max[i] = gens.iter().map(|g| g.q_max.value()).sum();
            }
            load_q[i] = network
                .loads_at(bus.id)
                .map(|l| l.reactive_power.value())
                .sum();
        }
        Self {
            q_min,
            q_max,
            load_q,
        }
    }

    /// PV bus whose generator Q is furthest outside its range.
    fn worst_violation(
        &self,
        case: &PowerFlowCase,
        classification: &BusClassification,
        state: &VoltageState,
    ) -> Option<QViolation> {
        let (_, q_calc) = compute_injections(&case.y_bus, state);
        let mut worst: Option<(f64, QViolation)> = None;
        for i in classification.pv_buses() {
            let q_gen = q_calc[i] * case.base_mva + self.load_q[i];
            let (excess, limit) = if q_gen > self.q_max[i] {
                (q_gen - self.q_max[i], self.q_max[i])
            } else if q_gen < self.q_min[i] {
                (self.q_min[i] - q_gen, self.q_min[i])
            } else {
                continue;
            };
            if worst.as_ref().map_or(true, |(w, _)| excess > *w) {
                worst = Some((
                    excess,
                    QViolation {
                        bus: i,
                        q_mvar: q_gen,
                        limit_mvar: limit,
                    },
                ));
            }
        }
        worst.map(|(_, violation)| violation)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

struct SolveSummary {
    method: PowerFlowMethod,
    converged: bool,
    iterations: usize,
    q_limit_passes: usize,
    max_mismatch: f64,
}

fn build_solution(
    network: &Network,
    case: &PowerFlowCase,
    classification: &BusClassification,
    state: &VoltageState,
    summary: SolveSummary,
    q_limited: &[bool],
) -> PowerFlowSolution {
    let base = case.base_mva;
    let (p_calc, q_calc) = compute_injections(&case.y_bus, state);

    let buses: Vec<BusSolution> = network
        .buses()
        .map(|bus| {
            let i = bus.id.index();
            BusSolution {
                id: bus.id,
                name: bus.name.clone(),
                bus_type: classification.bus_type(i),
                voltage_pu: state.v_mag[i],
                voltage_kv: PerUnit(state.v_mag[i]).to_kilovolts(bus.base_kv).value(),
                angle_rad: state.v_ang[i],
                angle_deg: state.v_ang[i].to_degrees(),
                p_injection_mw: p_calc[i] * base,
                q_injection_mvar: q_calc[i] * base,
            }
        })
        .collect();

    let generators = generator_outputs(network, &p_calc, &q_calc, base, classification, q_limited);
    let branch_flows = branch_flows(network, state, base);
    let losses_mw = branch_flows.iter().map(BranchFlow::loss_mw).sum();

    PowerFlowSolution {
        method: summary.method,
        converged: summary.converged,
        iterations: summary.iterations,
        q_limit_passes: summary.q_limit_passes,
        max_mismatch: summary.max_mismatch,
        buses,
        generators,
        branch_flows,
        losses_mw,
    }
}

/// Generator outputs from bus injections. Scheduled P is kept at non-slack
/// buses; the slack's P and every bus's Q are split evenly between the
/// machines sharing the bus.
fn generator_outputs(
    network: &Network,
    p_calc: &[f64],
    q_calc: &[f64],
    base: f64,
    classification: &BusClassification,
    q_limited: &[bool],
) -> Vec<GeneratorSolution> {
    let mut outputs = Vec::new();
    for bus in network.buses() {
        let i = bus.id.index();
        let gens: Vec<_> = network.generators_at(bus.id).collect();
        if gens.is_empty() {
            continue;
        }
        let load_p: f64 = network.loads_at(bus.id).map(|l| l.active_power.value()).sum();
        let load_q: f64 = network
            .loads_at(bus.id)
            .map(|l| l.reactive_power.value())
            .sum();
        let share = gens.len() as f64;
        let p_total = p_calc[i] * base + load_p;
        let q_total = q_calc[i] * base + load_q;
        for gen in gens {
            let p_mw = if classification.bus_type(i) == BusType::Slack {
                p_total / share
            } else {
                gen.active_power.value()
            };
            outputs.push(GeneratorSolution {
                name: gen.name.clone(),
                bus: bus.id,
                p_mw,
                q_mvar: q_total / share,
                q_limited: q_limited[i],
            });
        }
    }
    outputs
}

/// Complex power entering each series branch at both ends.
fn branch_flows(network: &Network, state: &VoltageState, base: f64) -> Vec<BranchFlow> {
    let voltage = |bus: BusId| {
        let i = bus.index();
        Complex64::from_polar(state.v_mag[i], state.v_ang[i])
    };
    network
        .branches()
        .filter_map(|branch| {
            let Primitive::Series { from, to, block } =
                branch.primitive(Sequence::Positive, network.settings())
            else {
                return None;
            };
            let (v_f, v_t) = (voltage(from), voltage(to));
            let i_f = block[0][0] * v_f + block[0][1] * v_t;
            let i_t = block[1][0] * v_f + block[1][1] * v_t;
            let s_f = v_f * i_f.conj() * base;
            let s_t = v_t * i_t.conj() * base;
            Some(BranchFlow {
                name: branch.name().to_string(),
                from,
                to,
                p_from_mw: s_f.re,
                q_from_mvar: s_f.im,
                p_to_mw: s_t.re,
                q_to_mvar: s_t.im,
            })
        })
        .collect()
}

/// Store the solved state on buses and generators.
pub fn apply_to_network(network: &mut Network, solution: &PowerFlowSolution) {
    for result in &solution.buses {
        if let Some(bus) = network.bus_by_id_mut(result.id) {
            bus.voltage = PerUnit(result.voltage_pu);
            bus.angle = Radians(result.angle_rad);
            bus.calculated_p = Some(Megawatts(result.p_injection_mw));
            bus.calculated_q = Some(Megavars(result.q_injection_mvar));
        }
    }
    for result in &solution.generators {
        if let Some(gen) = network.generator_mut(&result.name) {
            gen.p_output = Some(Megawatts(result.p_mw));
            gen.q_output = Some(Megavars(result.q_mvar));
        }
    }
}
