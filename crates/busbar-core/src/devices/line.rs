use num_complex::Complex64;
use serde::Serialize;

use super::{admittance_of, Branch, Primitive, Sequence};
use crate::network::BusId;
use crate::settings::SystemSettings;

/// Zero-sequence π parameters, per-unit on the system base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZeroSequenceLine {
    pub r: f64,
    pub x: f64,
    pub b: f64,
}

/// Transmission line, π model, per-unit on the system base.
///
/// `b` is the total charging susceptance; half of it sits at each end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    pub r: f64,
    pub x: f64,
    pub b: f64,
    /// Falls back to the positive-sequence values when unset
    pub zero_sequence: Option<ZeroSequenceLine>,
}

impl Line {
    pub fn new(name: impl Into<String>, from: BusId, to: BusId, r: f64, x: f64, b: f64) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            r,
            x,
            b,
            zero_sequence: None,
        }
    }

    pub fn with_zero_sequence(&mut self, r0: f64, x0: f64, b0: f64) -> &mut Self {
        self.zero_sequence = Some(ZeroSequenceLine {
            r: r0,
            x: x0,
            b: b0,
        });
        self
    }

    pub fn impedance(&self) -> Complex64 {
        Complex64::new(self.r, self.x)
    }

    fn parameters(&self, sequence: Sequence) -> (Complex64, f64) {
        match (sequence, self.zero_sequence) {
            (Sequence::Zero, Some(zero)) => (Complex64::new(zero.r, zero.x), zero.b),
            _ => (self.impedance(), self.b),
        }
    }
}

impl Branch for Line {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<BusId> {
        vec![self.from, self.to]
    }

    fn primitive(&self, sequence: Sequence, _settings: &SystemSettings) -> Primitive {
        let (z, b) = self.parameters(sequence);
        let half_charging = Complex64::new(0.0, b / 2.0);
        match admittance_of(z) {
            Some(y) => Primitive::series(self.from, self.to, y, half_charging),
            None => Primitive::Open,
        }
    }
}
