//! # Fault analysis
//!
//! Short-circuit currents and post-fault voltages from the solved network.
//!
//! The three sequence impedance matrices are built once from the sequence
//! admittance matrices (branches + generator sub-transient admittances +
//! constant-impedance loads) and reused for every fault:
//!
//! ```text
//!   Z_s = (Y_s)⁻¹          s ∈ {0, 1, 2}
//! ```
//!
//! ## Sequence currents at the faulted bus n
//!
//! | Fault  | I1                                        | I2                 | I0                 |
//! |--------|-------------------------------------------|--------------------|--------------------|
//! | 3φ     | V_f / (Z1 + Zf)                           | 0                  | 0                  |
//! | SLG    | V_f / (Z0 + Z1 + Z2 + 3Zf)                | I1                 | I1                 |
//! | LL     | V_f / (Z1 + Z2 + Zf)                      | −I1                | 0                  |
//! | DLG    | V_f / (Z1 + Z2·Zg/(Z2 + Zg))              | −I1·Zg/(Z2 + Zg)   | −I1·Z2/(Z2 + Zg)   |
//!
//! with `Zs = Zs[n,n]` and `Zg = Z0 + 3Zf`. Post-fault sequence voltages at
//! every bus k are `V_s(k) = E_s − Zs[k,n]·I_s`, where `E_1` is the prefault
//! voltage (the faulted bus's for unsymmetrical faults, each bus's own for
//! three-phase faults) and `E_0 = E_2 = 0`. Phase quantities follow from the
//! symmetrical-component transform in [`components`].
//!
//! A bus with no zero-sequence path to ground (behind a delta winding, or
//! only ungrounded machines) has infinite `Z0[n,n]`: SLG current is zero
//! there and a DLG fault carries no ground current, reducing to LL.

pub mod components;

pub use components::{Phasor, SequenceComponents};

use busbar_core::{
    BusId, BusbarError, BusbarResult, FaultKind, FaultSettings, ImpedanceMatrix,
    LinearSystemBackend, Network, Sequence, SequenceNetworks,
};
use num_complex::Complex64;
use serde::Serialize;

use components::{phase_phasors, rotation, snap};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Post-fault voltages at one bus.
#[derive(Debug, Clone, Serialize)]
pub struct BusFaultVoltage {
    pub bus: BusId,
    pub name: String,
    pub sequence: SequenceComponents,
    /// Phases a, b, c in p.u.
    pub phases: [Phasor; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct FaultResult {
    pub bus: BusId,
    pub bus_name: String,
    pub kind: FaultKind,
    pub fault_impedance: Complex64,
    pub sequence_currents: SequenceComponents,
    /// Phases a, b, c in p.u.
    pub phase_currents: [Phasor; 3],
    /// Current into the fault (3·I0 for grounded faults, phase b for LL)
    pub total_current: Phasor,
    /// Base current at the faulted bus, kA
    pub base_current_ka: f64,
    pub voltages: Vec<BusFaultVoltage>,
}

impl FaultResult {
    pub fn total_current_ka(&self) -> f64 {
        self.total_current.magnitude * self.base_current_ka
    }

    pub fn voltage(&self, bus: &str) -> Option<&BusFaultVoltage> {
        self.voltages.iter().find(|v| v.name == bus)
    }
}

#[derive(Debug, Clone)]
struct BusInfo {
    id: BusId,
    name: String,
    base_kv: f64,
}

/// Faults at any bus of one solved network.
#[derive(Debug, Clone)]
pub struct FaultAnalyzer {
    z0: ImpedanceMatrix,
    z1: ImpedanceMatrix,
    z2: ImpedanceMatrix,
    prefault: Vec<Complex64>,
    buses: Vec<BusInfo>,
    base_mva: f64,
    snap_threshold: f64,
}

impl FaultAnalyzer {
    /// Invert the three sequence networks of `network` and capture its
    /// bus voltages as the prefault state.
    pub fn new(network: &mut Network, backend: &dyn LinearSystemBackend) -> BusbarResult<Self> {
        if network.bus_count() == 0 {
            return Err(BusbarError::Validation("network has no buses".into()));
        }
        if network.buses().all(|bus| bus.calculated_p.is_none()) {
            tracing::warn!(
                network = network.name(),
                "no solved power flow; using stored bus voltages as prefault state"
            );
        }

        let networks = SequenceNetworks::build(network);
        let z0 = ImpedanceMatrix::from_admittance(networks.get(Sequence::Zero), backend)?;
        let z1 = ImpedanceMatrix::from_admittance(networks.get(Sequence::Positive), backend)?;
        let z2 = ImpedanceMatrix::from_admittance(networks.get(Sequence::Negative), backend)?;

        let prefault = network
            .buses()
            .map(|bus| Complex64::from_polar(bus.voltage.value(), bus.angle.value()))
            .collect();
        let buses = network
            .buses()
            .map(|bus| BusInfo {
                id: bus.id,
                name: bus.name.clone(),
                base_kv: bus.base_kv.value(),
            })
            .collect();

        tracing::debug!(buses = network.bus_count(), "fault impedance matrices ready");

        Ok(Self {
            z0,
            z1,
            z2,
            prefault,
            buses,
            base_mva: network.settings().base_mva,
            snap_threshold: 1e-6,
        })
    }

    pub fn with_snap_threshold(mut self, threshold: f64) -> Self {
        self.snap_threshold = threshold;
        self
    }

    pub fn impedance(&self, sequence: Sequence) -> &ImpedanceMatrix {
        match sequence {
            Sequence::Zero => &self.z0,
            Sequence::Positive => &self.z1,
            Sequence::Negative => &self.z2,
        }
    }

    /// Fault at the named bus through `zf` (p.u.).
    pub fn analyze(&self, bus: &str, kind: FaultKind, zf: Complex64) -> BusbarResult<FaultResult> {
        let id = self
            .buses
            .iter()
            .find(|info| info.name == bus)
            .map(|info| info.id)
            .ok_or_else(|| BusbarError::NotFound {
                kind: "bus",
                name: bus.to_string(),
            })?;
        self.analyze_at(id, kind, zf)
    }

    pub fn analyze_at(&self, bus: BusId, kind: FaultKind, zf: Complex64) -> BusbarResult<FaultResult> {
        let (n, info) = bus
            .checked_index()
            .and_then(|n| self.buses.get(n).map(|info| (n, info)))
            .ok_or_else(|| BusbarError::NotFound {
                kind: "bus",
                name: bus.to_string(),
            })?;

        let currents = self.sequence_currents(n, kind, zf);
        let currents = currents.snapped(self.snap_threshold);

        let phase_currents = phase_phasors(currents.to_phases(), self.snap_threshold);
        let total = match kind {
            FaultKind::ThreePhase => currents.positive,
            FaultKind::LineToLine => {
                let a = rotation();
                (a * a - a) * currents.positive
            }
            FaultKind::SingleLineToGround | FaultKind::DoubleLineToGround => 3.0 * currents.zero,
        };

        let voltages = self
            .buses
            .iter()
            .enumerate()
            .map(|(k, info)| {
                let source = match kind {
                    FaultKind::ThreePhase => self.prefault[k],
                    _ => self.prefault[n],
                };
                let sequence = SequenceComponents::new(
                    ZERO - self.z0.get(k, n) * currents.zero,
                    source - self.z1.get(k, n) * currents.positive,
                    ZERO - self.z2.get(k, n) * currents.negative,
                )
                .snapped(self.snap_threshold);
                BusFaultVoltage {
                    bus: info.id,
                    name: info.name.clone(),
                    sequence,
                    phases: phase_phasors(sequence.to_phases(), self.snap_threshold),
                }
            })
            .collect();

        let base_current_ka = self.base_mva / (3.0_f64.sqrt() * info.base_kv);
        let result = FaultResult {
            bus,
            bus_name: info.name.clone(),
            kind,
            fault_impedance: zf,
            sequence_currents: currents,
            phase_currents,
            total_current: components::Phasor::from_complex(snap(total, self.snap_threshold)),
            base_current_ka,
            voltages,
        };

        tracing::info!(
            bus = %info.name,
            %kind,
            current_pu = result.total_current.magnitude,
            current_ka = result.total_current_ka(),
            "fault analysed"
        );
        Ok(result)
    }

    /// Every configured kind at every configured bus.
    pub fn run(&self, settings: &FaultSettings) -> BusbarResult<Vec<FaultResult>> {
        let zf = settings.impedance.to_complex();
        let mut results = Vec::with_capacity(settings.buses.len() * settings.kinds.len());
        for bus in &settings.buses {
            for &kind in &settings.kinds {
                results.push(self.analyze(bus, kind, zf)?);
            }
        }
        Ok(results)
    }

    fn sequence_currents(&self, n: usize, kind: FaultKind, zf: Complex64) -> SequenceComponents {
        let v_f = self.prefault[n];
        let z0 = self.z0.get(n, n);
        let z1 = self.z1.get(n, n);
        let z2 = self.z2.get(n, n);
        let zero_open = self.z0.is_open(n);

        if self.z1.is_open(n) {
            tracing::warn!(bus = n + 1, "no positive-sequence source behind faulted bus");
            return SequenceComponents::new(ZERO, ZERO, ZERO);
        }

        match kind {
            FaultKind::ThreePhase => SequenceComponents::new(ZERO, v_f / (z1 + zf), ZERO),
            FaultKind::SingleLineToGround => {
                if zero_open {
                    tracing::debug!(bus = n + 1, "no zero-sequence path; SLG current is zero");
                    return SequenceComponents::new(ZERO, ZERO, ZERO);
                }
                let i = v_f / (z0 + z1 + z2 + 3.0 * zf);
                SequenceComponents::new(i, i, i)
            }
            FaultKind::LineToLine => {
                let i1 = v_f / (z1 + z2 + zf);
                SequenceComponents::new(ZERO, i1, -i1)
            }
            FaultKind::DoubleLineToGround => {
                if zero_open {
                    let i1 = v_f / (z1 + z2);
                    return SequenceComponents::new(ZERO, i1, -i1);
                }
                let zg = z0 + 3.0 * zf;
                let i1 = v_f / (z1 + z2 * zg / (z2 + zg));
                let i2 = -i1 * zg / (z2 + zg);
                let i0 = -i1 * z2 / (z2 + zg);
                SequenceComponents::new(i0, i1, i2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busbar_core::{GaussSolver, SystemSettings};

    fn machine_bus() -> Network {
        let mut network = Network::new("machine", SystemSettings::default());
        network.add_bus("bus1", 20.0).unwrap();
        network
            .add_generator("G1", "bus1", 1.0, 0.0)
            .unwrap()
            .with_reactances(0.2, 0.2, 0.05);
        network
    }

    #[test]
    fn slg_on_isolated_machine() {
        let mut network = machine_bus();
        let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver).unwrap();
        let result = analyzer
            .analyze("bus1", FaultKind::SingleLineToGround, ZERO)
            .unwrap();

        // I0 = 1 / j(0.05 + 0.2 + 0.2)
        let expected = 1.0 / 0.45;
        assert!((result.sequence_currents.zero.norm() - expected).abs() < 1e-9);
        assert!((result.total_current.magnitude - 3.0 * expected).abs() < 1e-9);
        // only phase a carries current
        assert!((result.phase_currents[0].magnitude - 3.0 * expected).abs() < 1e-9);
        assert_eq!(result.phase_currents[1].magnitude, 0.0);
        assert_eq!(result.phase_currents[2].magnitude, 0.0);
        // faulted phase collapses
        assert_eq!(result.voltage("bus1").unwrap().phases[0].magnitude, 0.0);
    }

    #[test]
    fn line_to_line_current() {
        let mut network = machine_bus();
        let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver).unwrap();
        let result = analyzer
            .analyze("bus1", FaultKind::LineToLine, ZERO)
            .unwrap();

        let i1 = 1.0 / 0.4;
        assert_eq!(result.sequence_currents.zero, ZERO);
        assert!((result.total_current.magnitude - 3.0_f64.sqrt() * i1).abs() < 1e-9);
        assert!((result.phase_currents[1].magnitude - result.phase_currents[2].magnitude).abs() < 1e-9);
        assert_eq!(result.phase_currents[0].magnitude, 0.0);
    }

    #[test]
    fn ungrounded_machine_blocks_ground_faults() {
        let mut network = machine_bus();
        network
            .generator_mut("G1")
            .unwrap()
            .with_grounding(busbar_core::Grounding::Ungrounded);
        let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver).unwrap();

        let slg = analyzer
            .analyze("bus1", FaultKind::SingleLineToGround, ZERO)
            .unwrap();
        assert_eq!(slg.total_current.magnitude, 0.0);

        let dlg = analyzer
            .analyze("bus1", FaultKind::DoubleLineToGround, ZERO)
            .unwrap();
        let ll = analyzer
            .analyze("bus1", FaultKind::LineToLine, ZERO)
            .unwrap();
        assert_eq!(dlg.sequence_currents.zero, ZERO);
        assert!((dlg.sequence_currents.positive - ll.sequence_currents.positive).norm() < 1e-12);
    }

    #[test]
    fn unknown_bus_is_reported() {
        let mut network = machine_bus();
        let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver).unwrap();
        let err = analyzer
            .analyze("bus9", FaultKind::ThreePhase, ZERO)
            .unwrap_err();
        assert!(matches!(err, BusbarError::NotFound { kind: "bus", .. }));
    }

    #[test]
    fn invalid_bus_ids_are_reported() {
        let mut network = machine_bus();
        let analyzer = FaultAnalyzer::new(&mut network, &GaussSolver).unwrap();
        for id in [BusId::new(0), BusId::new(2), BusId::new(usize::MAX)] {
            let err = analyzer
                .analyze_at(id, FaultKind::ThreePhase, ZERO)
                .unwrap_err();
            assert!(matches!(err, BusbarError::NotFound { kind: "bus", .. }));
        }
        assert!(analyzer
            .analyze_at(BusId::new(1), FaultKind::ThreePhase, ZERO)
            .is_ok());
    }
}
