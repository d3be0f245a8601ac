//! DC power flow.
//!
//! Flat magnitudes, small angle differences and no losses turn the active
//! power equations into one linear system:
//!
//! ```text
//!   P = −B · θ        B = Im(Ybus) without the slack row and column
//! ```
//!
//! The slack angle is fixed at zero. Branch flows follow from the angle
//! differences, and the slack injection is the sum of the flows leaving the
//! slack bus over every branch connected to it.

use busbar_core::{
    BusId, BusType, BusbarError, BusbarResult, LinearSystemBackend, Network, PowerFlowMethod,
    Primitive, Sequence,
};
use serde::Serialize;

use super::fast_decoupled::reduced_susceptance;
use super::{solve_linear, BranchFlow, BusSolution, GeneratorSolution, PowerFlowSolution};

#[derive(Debug, Clone, Serialize)]
pub struct DcBranchFlow {
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    /// Active power from `from` towards `to`
    pub p_mw: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DcPowerFlowSolution {
    pub slack: BusId,
    /// Bus angles in radians, indexed by 0-based bus index
    pub angles: Vec<f64>,
    pub branch_flows: Vec<DcBranchFlow>,
    /// Net injection at the slack bus
    pub slack_injection_mw: f64,
}

impl DcPowerFlowSolution {
    /// Angle in radians, `None` for an id outside this solution.
    pub fn angle(&self, bus: BusId) -> Option<f64> {
        bus.checked_index()
            .and_then(|i| self.angles.get(i))
            .copied()
    }

    pub fn flow(&self, name: &str) -> Option<&DcBranchFlow> {
        self.branch_flows.iter().find(|flow| flow.name == name)
    }

    /// Same answer in the shape shared with the AC methods.
    pub fn into_power_flow_solution(self, network: &Network) -> PowerFlowSolution {
        let mut injections: Vec<f64> = network.buses().map(|b| b.scheduled_p.value()).collect();
        if let Some(slot) = self
            .slack
            .checked_index()
            .and_then(|i| injections.get_mut(i))
        {
            *slot = self.slack_injection_mw;
        }

        let buses = network
            .buses()
            .map(|bus| {
                let i = bus.id.index();
                BusSolution {
                    id: bus.id,
                    name: bus.name.clone(),
                    bus_type: bus.bus_type,
                    voltage_pu: 1.0,
                    voltage_kv: bus.base_kv.value(),
                    angle_rad: self.angles[i],
                    angle_deg: self.angles[i].to_degrees(),
                    p_injection_mw: injections[i],
                    q_injection_mvar: 0.0,
                }
            })
            .collect();

        let slack_load: f64 = network
            .loads_at(self.slack)
            .map(|l| l.active_power.value())
            .sum();
        let slack_machines = network.generators_at(self.slack).count().max(1) as f64;
        let generators = network
            .generators()
            .map(|gen| GeneratorSolution {
                name: gen.name.clone(),
                bus: gen.bus,
                p_mw: if gen.bus == self.slack {
                    (self.slack_injection_mw + slack_load) / slack_machines
                } else {
                    gen.active_power.value()
                },
                q_mvar: 0.0,
                q_limited: false,
            })
            .collect();

        let branch_flows = self
            .branch_flows
            .into_iter()
            .map(|flow| BranchFlow {
                name: flow.name,
                from: flow.from,
                to: flow.to,
                p_from_mw: flow.p_mw,
                q_from_mvar: 0.0,
                p_to_mw: -flow.p_mw,
                q_to_mvar: 0.0,
            })
            .collect();

        PowerFlowSolution {
            method: PowerFlowMethod::Dc,
            converged: true,
            iterations: 1,
            q_limit_passes: 0,
            max_mismatch: 0.0,
            buses,
            generators,
            branch_flows,
            losses_mw: 0.0,
        }
    }
}

/// Solve the DC approximation. Needs exactly one slack bus.
pub fn solve_dc(
    network: &mut Network,
    backend: &dyn LinearSystemBackend,
) -> BusbarResult<DcPowerFlowSolution> {
    network.refresh_injections();
    let base_mva = network.settings().base_mva;
    let slack = network
        .buses()
        .find(|bus| bus.bus_type == BusType::Slack)
        .map(|bus| bus.id)
        .ok_or_else(|| BusbarError::Validation("DC power flow needs a slack bus".into()))?;

    let non_slack: Vec<usize> = network
        .buses()
        .map(|bus| bus.id.index())
        .filter(|&i| i != slack.index())
        .collect();
    let p_spec: Vec<f64> = network
        .buses()
        .map(|bus| bus.scheduled_p.value() / base_mva)
        .collect();

    let y_bus = network.ybus();
    let mut angles = vec![0.0; y_bus.n_bus()];
    if !non_slack.is_empty() {
        let b_reduced = reduced_susceptance(y_bus, &non_slack);
        let rhs: Vec<f64> = non_slack.iter().map(|&i| p_spec[i]).collect();
        let theta = solve_linear(backend, &b_reduced, &rhs, "singular susceptance matrix")?;
        for (k, &i) in non_slack.iter().enumerate() {
            angles[i] = theta[k];
        }
    }

    let branch_flows: Vec<DcBranchFlow> = network
        .branches()
        .filter_map(|branch| {
            let Primitive::Series { from, to, block } =
                branch.primitive(Sequence::Positive, network.settings())
            else {
                return None;
            };
            let b_ft = block[0][1].im;
            let p_mw = b_ft * (angles[from.index()] - angles[to.index()]) * base_mva;
            Some(DcBranchFlow {
                name: branch.name().to_string(),
                from,
                to,
                p_mw,
            })
        })
        .collect();

    let slack_injection_mw = branch_flows
        .iter()
        .map(|flow| {
            if flow.from == slack {
                flow.p_mw
            } else if flow.to == slack {
                -flow.p_mw
            } else {
                0.0
            }
        })
        .sum();

    tracing::debug!(slack = %slack, slack_injection_mw, "DC power flow solved");

    Ok(DcPowerFlowSolution {
        slack,
        angles,
        branch_flows,
        slack_injection_mw,
    })
}
