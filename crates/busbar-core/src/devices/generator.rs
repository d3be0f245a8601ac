use num_complex::Complex64;
use serde::Serialize;

use super::{admittance_of, Sequence};
use crate::network::BusId;
use crate::settings::SystemSettings;
use crate::units::{Megavars, Megawatts};

/// Neutral grounding of a generator (zero-sequence path).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Grounding {
    Solid,
    /// Neutral impedance, per-unit on the machine base
    Impedance(Complex64),
    Ungrounded,
}

/// Synchronous generator.
///
/// The voltage setpoint and scheduled output drive the power flow. The
/// sub-transient reactances, machine base and grounding are only used to
/// build the fault sequence networks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generator {
    pub name: String,
    pub bus: BusId,
    pub voltage_setpoint: f64,
    pub active_power: Megawatts,
    /// x1, x2, x0 on the machine base
    pub reactances: Option<[f64; 3]>,
    /// Defaults to the system base
    pub machine_base_mva: Option<f64>,
    pub grounding: Grounding,
    pub q_min: Megavars,
    pub q_max: Megavars,
    /// Filled in by the power flow
    pub p_output: Option<Megawatts>,
    pub q_output: Option<Megavars>,
}

impl Generator {
    pub fn new(name: impl Into<String>, bus: BusId, voltage_setpoint: f64, p_mw: f64) -> Self {
        Self {
            name: name.into(),
            bus,
            voltage_setpoint,
            active_power: Megawatts(p_mw),
            reactances: None,
            machine_base_mva: None,
            grounding: Grounding::Solid,
            q_min: Megavars(f64::NEG_INFINITY),
            q_max: Megavars(f64::INFINITY),
            p_output: None,
            q_output: None,
        }
    }

    pub fn with_reactances(&mut self, x1: f64, x2: f64, x0: f64) -> &mut Self {
        self.reactances = Some([x1, x2, x0]);
        self
    }

    pub fn with_machine_base(&mut self, mva: f64) -> &mut Self {
        self.machine_base_mva = Some(mva);
        self
    }

    pub fn with_grounding(&mut self, grounding: Grounding) -> &mut Self {
        self.grounding = grounding;
        self
    }

    pub fn with_q_limits(&mut self, q_min_mvar: f64, q_max_mvar: f64) -> &mut Self {
        self.q_min = Megavars(q_min_mvar);
        self.q_max = Megavars(q_max_mvar);
        self
    }

    pub fn has_q_limits(&self) -> bool {
        self.q_min.is_finite() || self.q_max.is_finite()
    }

    fn base_ratio(&self, settings: &SystemSettings) -> f64 {
        self.machine_base_mva
            .map_or(1.0, |mbase| settings.base_mva / mbase)
    }

    /// Self-admittance the machine adds to a sequence network, on the system
    /// base. `None` when the machine has no reactance data or, for the zero
    /// sequence, an ungrounded neutral.
    pub fn sequence_admittance(
        &self,
        sequence: Sequence,
        settings: &SystemSettings,
    ) -> Option<Complex64> {
        let [x1, x2, x0] = self.reactances?;
        let z = match sequence {
            Sequence::Positive => Complex64::new(0.0, x1),
            Sequence::Negative => Complex64::new(0.0, x2),
            Sequence::Zero => match self.grounding {
                Grounding::Solid => Complex64::new(0.0, x0),
                Grounding::Impedance(zn) => Complex64::new(0.0, x0) + 3.0 * zn,
                Grounding::Ungrounded => return None,
            },
        };
        admittance_of(z * self.base_ratio(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_admittances_on_system_base() {
        let settings = SystemSettings::default();
        let mut gen = Generator::new("Gen2", BusId::new(7), 1.0, 200.0);
        assert!(gen.sequence_admittance(Sequence::Positive, &settings).is_none());

        gen.with_reactances(0.12, 0.14, 0.05)
            .with_machine_base(200.0)
            .with_grounding(Grounding::Impedance(Complex64::new(0.0, 0.1)));

        let y1 = gen.sequence_admittance(Sequence::Positive, &settings).unwrap();
        assert!((y1 - Complex64::new(0.0, -1.0 / 0.06)).norm() < 1e-9);

        let y0 = gen.sequence_admittance(Sequence::Zero, &settings).unwrap();
        assert!((y0 - Complex64::new(0.0, -1.0 / 0.175)).norm() < 1e-9);

        gen.with_grounding(Grounding::Ungrounded);
        assert!(gen.sequence_admittance(Sequence::Zero, &settings).is_none());
        assert!(gen.sequence_admittance(Sequence::Negative, &settings).is_some());
    }

    #[test]
    fn q_limits_default_unbounded() {
        let mut gen = Generator::new("G", BusId::new(1), 1.0, 0.0);
        assert!(!gen.has_q_limits());
        gen.with_q_limits(-20.0, 40.0);
        assert!(gen.has_q_limits());
    }
}
