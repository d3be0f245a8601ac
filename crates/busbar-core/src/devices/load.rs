use num_complex::Complex64;
use serde::Serialize;

use crate::network::BusId;
use crate::settings::SystemSettings;
use crate::units::{Megavars, Megawatts};

/// Constant-power load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub name: String,
    pub bus: BusId,
    pub active_power: Megawatts,
    pub reactive_power: Megavars,
}

impl Load {
    pub fn new(name: impl Into<String>, bus: BusId, p_mw: f64, q_mvar: f64) -> Self {
        Self {
            name: name.into(),
            bus,
            active_power: Megawatts(p_mw),
            reactive_power: Megavars(q_mvar),
        }
    }

    /// Per-unit complex demand on the system base.
    pub fn demand(&self, settings: &SystemSettings) -> Complex64 {
        Complex64::new(
            self.active_power.to_per_unit(settings.base()),
            self.reactive_power.to_per_unit(settings.base()),
        )
    }

    /// Constant-impedance equivalent at the given bus voltage magnitude:
    /// `y = conj(S) / |V|²`.
    pub fn equivalent_admittance(&self, voltage_pu: f64, settings: &SystemSettings) -> Complex64 {
        self.demand(settings).conj() / (voltage_pu * voltage_pu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_admittance_draws_scheduled_power() {
        let settings = SystemSettings::default();
        let load = Load::new("Load1", BusId::new(2), 800.0, 280.0);
        let v = 0.95;
        let y = load.equivalent_admittance(v, &settings);
        // S = V·conj(y·V) = |V|²·conj(y)
        let s = (v * v) * y.conj();
        assert!((s - Complex64::new(8.0, 2.8)).norm() < 1e-12);
    }
}
