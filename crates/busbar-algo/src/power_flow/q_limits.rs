//! Reactive-limit enforcement tests (PV→PQ switching).

#[cfg(test)]
mod tests {
    use crate::power_flow::PowerFlowSolver;
    use busbar_core::{BusType, Network, PowerFlowMethod, PowerFlowSettings, SystemSettings};

    /// bus1 slack, bus2 PV whose machine can only supply 0..10 Mvar while
    /// the local load asks for 50 Mvar at 1.05 p.u.
    fn create_q_limit_test_network() -> Network {
        let mut network = Network::new("q-limit", SystemSettings::default());
        network.add_bus("Slack", 138.0).unwrap();
        network.add_bus("PV", 138.0).unwrap();
        network.add_line("Line1", "Slack", "PV", 0.01, 0.1, 0.0).unwrap();
        network
            .add_generator("Gen1", "Slack", 1.0, 0.0)
            .unwrap()
            .with_q_limits(-100.0, 100.0);
        network
            .add_generator("Gen2", "PV", 1.05, 50.0)
            .unwrap()
            .with_q_limits(0.0, 10.0);
        network.add_load("Load1", "PV", 40.0, 50.0).unwrap();
        network
    }

    fn solver(enforce: bool) -> PowerFlowSolver {
        PowerFlowSolver::new(
            PowerFlowSettings::default()
                .with_tolerance(1e-8)
                .with_q_limit_enforcement(enforce),
        )
    }

    #[test]
    fn test_q_limits_ignored_when_disabled() {
        let mut network = create_q_limit_test_network();
        let solution = solver(false).solve(&mut network).unwrap();

        assert!(solution.converged);
        assert_eq!(solution.q_limit_passes, 0);
        let gen2 = solution.generator("Gen2").unwrap();
        assert!(gen2.q_mvar > 10.0, "Q = {}", gen2.q_mvar);
        assert!((solution.bus("PV").unwrap().voltage_pu - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_q_limit_enforcement() {
        let mut network = create_q_limit_test_network();
        let solution = solver(true).solve(&mut network).unwrap();

        assert!(solution.converged);
        assert_eq!(solution.q_limit_passes, 1);

        let pv = solution.bus("PV").unwrap();
        assert_eq!(pv.bus_type, BusType::PQ);
        assert!(pv.voltage_pu < 1.05);

        let gen2 = solution.generator("Gen2").unwrap();
        assert!(gen2.q_limited);
        assert!((gen2.q_mvar - 10.0).abs() < 1e-4, "Q = {}", gen2.q_mvar);
        assert!((gen2.p_mw - 50.0).abs() < 1e-9);

        // the stored network keeps its configured classification
        assert_eq!(network.bus("PV").unwrap().bus_type, BusType::PV);
    }

    #[test]
    fn test_q_limit_enforcement_with_fast_decoupled() {
        let mut network = create_q_limit_test_network();
        let solution = PowerFlowSolver::new(
            PowerFlowSettings::default()
                .with_method(PowerFlowMethod::FastDecoupled)
                .with_tolerance(1e-8)
                .with_q_limit_enforcement(true),
        )
        .solve(&mut network)
        .unwrap();

        assert!(solution.converged);
        let gen2 = solution.generator("Gen2").unwrap();
        assert!((gen2.q_mvar - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_restart_budget_exhaustion_reports_non_convergence() {
        let mut network = create_q_limit_test_network();
        let mut settings = PowerFlowSettings::default()
            .with_tolerance(1e-8)
            .with_q_limit_enforcement(true);
        settings.max_q_iterations = 0;

        let solution = PowerFlowSolver::new(settings).solve(&mut network).unwrap();
        assert!(!solution.converged);
        assert_eq!(solution.q_limit_passes, 0);
        assert_eq!(solution.bus("PV").unwrap().bus_type, BusType::PV);
    }

    #[test]
    fn test_generator_within_limits_stays_pv() {
        let mut network = create_q_limit_test_network();
        network
            .generator_mut("Gen2")
            .unwrap()
            .with_q_limits(-200.0, 200.0);

        let solution = solver(true).solve(&mut network).unwrap();
        assert!(solution.converged);
        assert_eq!(solution.q_limit_passes, 0);
        assert_eq!(solution.bus("PV").unwrap().bus_type, BusType::PV);
        assert!(!solution.generator("Gen2").unwrap().q_limited);
    }
}
