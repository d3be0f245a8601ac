//! End-to-end study: power flow, then the configured faults on the solved
//! network.

use std::path::Path;

use anyhow::Context;
use busbar_core::{BusbarError, BusbarResult, Network, StudyConfig};
use serde::Serialize;

use crate::fault::{FaultAnalyzer, FaultResult};
use crate::power_flow::{PowerFlowSolution, PowerFlowSolver};

#[derive(Debug, Clone, Serialize)]
pub struct StudyReport {
    pub network: String,
    pub power_flow: PowerFlowSolution,
    pub faults: Vec<FaultResult>,
}

impl StudyReport {
    pub fn to_json(&self) -> BusbarResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| BusbarError::Other(format!("serialising study report: {err}")))
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serialising study report")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing study report to {}", path.display()))?;
        Ok(())
    }
}

/// Run the configured power flow and fault set against `network`.
///
/// The network's system settings must match `config.system`; per-unit
/// quantities are already stored on that base.
pub fn run_study(network: &mut Network, config: &StudyConfig) -> BusbarResult<StudyReport> {
    config.validate()?;
    if *network.settings() != config.system {
        return Err(BusbarError::Config(format!(
            "network '{}' uses {} MVA / {} Hz but the study is configured for {} MVA / {} Hz",
            network.name(),
            network.settings().base_mva,
            network.settings().frequency_hz,
            config.system.base_mva,
            config.system.frequency_hz
        )));
    }

    let span = tracing::info_span!("study", network = network.name());
    let _guard = span.enter();

    let power_flow = PowerFlowSolver::new(config.power_flow.clone()).solve(network)?;

    let faults = if config.fault.buses.is_empty() {
        Vec::new()
    } else {
        let backend = config.fault.linear_solver.build_solver();
        let analyzer = FaultAnalyzer::new(network, backend.as_ref())?
            .with_snap_threshold(config.fault.snap_threshold);
        analyzer.run(&config.fault)?
    };

    tracing::info!(
        converged = power_flow.converged,
        faults = faults.len(),
        "study complete"
    );

    Ok(StudyReport {
        network: network.name().to_string(),
        power_flow,
        faults,
    })
}
