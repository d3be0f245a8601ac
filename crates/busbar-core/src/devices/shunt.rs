use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{Branch, Primitive, Sequence};
use crate::network::BusId;
use crate::settings::SystemSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuntKind {
    Capacitor,
    Reactor,
}

/// Fixed shunt capacitor or reactor, rated in Mvar at 1.0 p.u. voltage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShuntCompensator {
    pub name: String,
    pub bus: BusId,
    pub rating_mvar: f64,
    pub kind: ShuntKind,
}

impl ShuntCompensator {
    pub fn new(name: impl Into<String>, bus: BusId, rating_mvar: f64, kind: ShuntKind) -> Self {
        Self {
            name: name.into(),
            bus,
            rating_mvar: rating_mvar.abs(),
            kind,
        }
    }

    /// Susceptance in per-unit; positive for capacitors.
    pub fn susceptance(&self, settings: &SystemSettings) -> f64 {
        let b = self.rating_mvar / settings.base_mva;
        match self.kind {
            ShuntKind::Capacitor => b,
            ShuntKind::Reactor => -b,
        }
    }
}

impl Branch for ShuntCompensator {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<BusId> {
        vec![self.bus]
    }

    fn primitive(&self, _sequence: Sequence, settings: &SystemSettings) -> Primitive {
        Primitive::Shunt {
            bus: self.bus,
            admittance: Complex64::new(0.0, self.susceptance(settings)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn susceptance_sign_follows_kind() {
        let settings = SystemSettings::default();
        let cap = ShuntCompensator::new("C1", BusId::new(2), 50.0, ShuntKind::Capacitor);
        let reactor = ShuntCompensator::new("R1", BusId::new(2), -50.0, ShuntKind::Reactor);
        assert!((cap.susceptance(&settings) - 0.5).abs() < 1e-12);
        assert!((reactor.susceptance(&settings) + 0.5).abs() < 1e-12);
        assert!(!cap.is_series());
    }
}
