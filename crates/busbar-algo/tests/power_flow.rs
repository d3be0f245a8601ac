//! Power flow against textbook cases and across solution methods.

mod common;

use busbar_algo::{PowerFlowSolver, PowerFlowSolution};
use busbar_core::{
    BusType, Network, PowerFlowMethod, PowerFlowSettings, ShuntKind, SolverKind, SystemSettings,
};
use common::{five_bus, init_tracing, three_bus};

fn newton(tol: f64) -> PowerFlowSolver {
    PowerFlowSolver::new(PowerFlowSettings::default().with_tolerance(tol))
}

fn max_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}

#[test]
fn five_bus_matches_textbook_solution() {
    init_tracing();
    let mut network = five_bus(1.05);
    let solution = newton(1e-8).solve(&mut network).unwrap();

    assert!(solution.converged);
    assert!(solution.iterations <= 50);

    let v = solution.voltages();
    assert!((v[0] - 1.0).abs() < 1e-12);
    assert!((v[1] - 0.834).abs() < 0.005, "V2 = {}", v[1]);
    assert!((v[2] - 1.05).abs() < 1e-12);
    assert!((v[3] - 1.019).abs() < 0.005, "V4 = {}", v[3]);
    assert!((v[4] - 0.974).abs() < 0.005, "V5 = {}", v[4]);

    let theta2 = solution.bus("bus2").unwrap().angle_deg;
    assert!((theta2 + 22.4).abs() < 0.5, "θ2 = {theta2}");

    let gen1 = solution.generator("Gen1").unwrap();
    assert!((gen1.p_mw - 395.6).abs() < 3.0, "P1 = {}", gen1.p_mw);
    let gen2 = solution.generator("Gen2").unwrap();
    assert!((gen2.p_mw - 520.0).abs() < 1e-9);
}

#[test]
fn five_bus_converges_with_unity_setpoints() {
    // both machines held at 1.0 p.u.; the load bus sags further than in the
    // textbook case
    let mut network = five_bus(1.0);
    let solution = PowerFlowSolver::newton_raphson().solve(&mut network).unwrap();

    assert!(solution.converged);
    assert!(solution.iterations <= 50);
    for bus in &solution.buses {
        assert!(
            bus.voltage_pu > 0.7 && bus.voltage_pu <= 1.05,
            "{} at {}",
            bus.name,
            bus.voltage_pu
        );
    }
    assert!(solution.bus("bus2").unwrap().voltage_pu < 0.9);
}

#[test]
fn solution_is_written_back_to_network() {
    let mut network = five_bus(1.05);
    let solution = newton(1e-6).solve(&mut network).unwrap();

    for result in &solution.buses {
        let bus = network.bus(&result.name).unwrap();
        assert_eq!(bus.voltage.value(), result.voltage_pu);
        assert_eq!(bus.angle.value(), result.angle_rad);
        assert!((bus.voltage_kv().value() - result.voltage_kv).abs() < 1e-9);
    }
    let gen1 = network.generator("Gen1").unwrap();
    assert_eq!(
        gen1.p_output.unwrap().value(),
        solution.generator("Gen1").unwrap().p_mw
    );
    // bus types in the network are never rewritten by a solve
    assert_eq!(network.bus("bus3").unwrap().bus_type, BusType::PV);
}

#[test]
fn newton_raphson_is_idempotent() {
    let mut network = five_bus(1.05);
    let tol = 1e-6;
    let first = newton(tol).solve(&mut network).unwrap();

    let second = newton(tol).solve(&mut network).unwrap();
    assert!(second.converged);
    assert!(max_difference(&first.voltages(), &second.voltages()) < tol);
    assert!(max_difference(&first.angles(), &second.angles()) < tol);

    let warm = newton(tol).with_warm_start(true).solve(&mut network).unwrap();
    assert!(warm.converged);
    assert!(warm.iterations <= 1, "warm start took {}", warm.iterations);
    assert!(max_difference(&first.voltages(), &warm.voltages()) < tol);
    assert!(max_difference(&first.angles(), &warm.angles()) < tol);
}

#[test]
fn newton_and_fast_decoupled_agree() {
    let tol = 1e-6;
    let mut network = three_bus();
    let nr = newton(tol).solve(&mut network).unwrap();

    let mut network = three_bus();
    let fd = PowerFlowSolver::new(
        PowerFlowSettings::default()
            .with_method(PowerFlowMethod::FastDecoupled)
            .with_tolerance(tol),
    )
    .solve(&mut network)
    .unwrap();

    assert!(nr.converged && fd.converged);
    assert!(fd.iterations > nr.iterations);
    assert!(max_difference(&nr.voltages(), &fd.voltages()) < 1e-3);
    assert!(max_difference(&nr.angles(), &fd.angles()) < 1e-3);
}

#[test]
fn fast_decoupled_solves_five_bus() {
    let mut network = five_bus(1.05);
    let fd = PowerFlowSolver::fast_decoupled()
        .with_tolerance(1e-5)
        .solve(&mut network)
        .unwrap();
    let mut network = five_bus(1.05);
    let nr = newton(1e-5).solve(&mut network).unwrap();

    assert!(fd.converged, "mismatch {}", fd.max_mismatch);
    assert!(max_difference(&nr.voltages(), &fd.voltages()) < 1e-3);
}

/// Lossless triangle with light loading.
fn light_triangle() -> Network {
    let mut network = Network::new("triangle", SystemSettings::default());
    for name in ["bus1", "bus2", "bus3"] {
        network.add_bus(name, 345.0).unwrap();
    }
    network.add_line("L12", "bus1", "bus2", 0.0, 0.1, 0.0).unwrap();
    network.add_line("L13", "bus1", "bus3", 0.0, 0.1, 0.0).unwrap();
    network.add_line("L23", "bus2", "bus3", 0.0, 0.1, 0.0).unwrap();
    network.add_generator("G1", "bus1", 1.0, 0.0).unwrap();
    network.add_load("D2", "bus2", 20.0, 0.0).unwrap();
    network.add_load("D3", "bus3", 30.0, 0.0).unwrap();
    network
}

#[test]
fn dc_angles_track_newton_on_light_load() {
    let mut network = light_triangle();
    let nr = newton(1e-10).solve(&mut network).unwrap();

    let mut network = light_triangle();
    let dc = PowerFlowSolver::dc().solve(&mut network).unwrap();

    assert_eq!(dc.method, PowerFlowMethod::Dc);
    assert!(dc.converged);
    for (exact, approx) in nr.angles().iter().zip(dc.angles()).skip(1) {
        assert!(*exact < 0.0);
        let relative = ((approx - exact) / exact).abs();
        assert!(relative < 0.05, "DC {approx} vs NR {exact}");
    }

    // all load is served from the slack over two branches
    let g1 = dc.generator("G1").unwrap();
    assert!((g1.p_mw - 50.0).abs() < 1e-9);
    assert!(dc.voltages().iter().all(|v| *v == 1.0));
}

fn solve_three_bus(network: &mut Network) -> PowerFlowSolution {
    newton(1e-8).solve(network).unwrap()
}

#[test]
fn shunt_compensation_moves_voltage_monotonically() {
    let mut network = three_bus();
    let base = solve_three_bus(&mut network).bus("bus3").unwrap().voltage_pu;

    network
        .add_shunt("C3", "bus3", 20.0, ShuntKind::Capacitor)
        .unwrap();
    let raised = solve_three_bus(&mut network).bus("bus3").unwrap().voltage_pu;
    assert!(raised > base, "{raised} <= {base}");

    network.remove_shunt("C3").unwrap();
    network
        .add_shunt("R3", "bus3", 20.0, ShuntKind::Reactor)
        .unwrap();
    let lowered = solve_three_bus(&mut network).bus("bus3").unwrap().voltage_pu;
    assert!(lowered < base, "{lowered} >= {base}");
}

#[test]
fn exhausted_iterations_return_last_iterate() {
    let mut network = five_bus(1.05);
    let solution = PowerFlowSolver::new(
        PowerFlowSettings::default()
            .with_tolerance(1e-12)
            .with_max_iterations(1),
    )
    .solve(&mut network)
    .unwrap();

    assert!(!solution.converged);
    assert_eq!(solution.iterations, 1);
    assert!(solution.max_mismatch > 1e-12);
    // the partial answer still lands on the network
    let v2 = network.bus("bus2").unwrap().voltage.value();
    assert_eq!(v2, solution.bus("bus2").unwrap().voltage_pu);
    assert_ne!(v2, 1.0);
}

#[test]
fn faer_backend_matches_gaussian_elimination() {
    let mut network = five_bus(1.05);
    let gauss = newton(1e-8).solve(&mut network).unwrap();

    let mut network = five_bus(1.05);
    let faer = PowerFlowSolver::new(
        PowerFlowSettings::default()
            .with_tolerance(1e-8)
            .with_linear_solver(SolverKind::Faer),
    )
    .solve(&mut network)
    .unwrap();

    assert!(faer.converged);
    assert!(max_difference(&gauss.voltages(), &faer.voltages()) < 1e-9);
    assert!(max_difference(&gauss.angles(), &faer.angles()) < 1e-9);
}

#[test]
fn island_without_slack_is_rejected() {
    let mut network = three_bus();
    network.add_bus("bus4", 230.0).unwrap();
    network.add_bus("bus5", 230.0).unwrap();
    network.add_line("L45", "bus4", "bus5", 0.01, 0.1, 0.0).unwrap();
    network.add_load("D5", "bus5", 10.0, 0.0).unwrap();

    let err = PowerFlowSolver::newton_raphson()
        .solve(&mut network)
        .unwrap_err();
    assert!(err.to_string().contains("island"), "{err}");
}

#[test]
fn solution_serialises_to_json() {
    let mut network = three_bus();
    let solution = newton(1e-6).solve(&mut network).unwrap();
    let json = serde_json::to_value(&solution).unwrap();
    assert_eq!(json["method"], "newton_raphson");
    assert_eq!(json["buses"].as_array().unwrap().len(), 3);
    assert_eq!(json["branch_flows"].as_array().unwrap().len(), 3);
}
