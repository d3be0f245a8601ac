use std::str::FromStr;

use num_complex::Complex64;
use serde::Serialize;

use super::{admittance_of, Branch, Primitive, Sequence};
use crate::error::BusbarError;
use crate::network::BusId;
use crate::settings::SystemSettings;

/// Winding connection on one side of a two-winding transformer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Winding {
    Delta,
    /// Ungrounded wye
    Wye,
    /// Wye grounded through `neutral` (per-unit on the transformer base)
    GroundedWye { neutral: Complex64 },
}

impl Winding {
    pub fn solidly_grounded() -> Self {
        Winding::GroundedWye {
            neutral: Complex64::new(0.0, 0.0),
        }
    }

    fn neutral(&self) -> Option<Complex64> {
        match *self {
            Winding::GroundedWye { neutral } => Some(neutral),
            _ => None,
        }
    }
}

impl FromStr for Winding {
    type Err = BusbarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "delta" => Ok(Winding::Delta),
            "y" | "wye" => Ok(Winding::Wye),
            "yg" | "yn" | "grounded-wye" => Ok(Winding::solidly_grounded()),
            other => Err(BusbarError::Parse(format!("unknown winding '{other}'"))),
        }
    }
}

/// Connection of the from-side and to-side windings, e.g. `"D-Yg"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransformerConnection {
    pub from: Winding,
    pub to: Winding,
}

impl Default for TransformerConnection {
    fn default() -> Self {
        Self {
            from: Winding::solidly_grounded(),
            to: Winding::solidly_grounded(),
        }
    }
}

impl FromStr for TransformerConnection {
    type Err = BusbarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| BusbarError::Parse(format!("expected '<from>-<to>', got '{s}'")))?;
        Ok(Self {
            from: from.parse()?,
            to: to.parse()?,
        })
    }
}

/// Two-winding transformer specified by rating, percent impedance and X/R.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transformer {
    pub name: String,
    pub from: BusId,
    pub to: BusId,
    pub rating_mva: f64,
    pub impedance_percent: f64,
    pub x_over_r: f64,
    pub connection: TransformerConnection,
    /// Zero-sequence leakage impedance on the transformer base; defaults to
    /// the positive-sequence value
    pub zero_sequence_impedance: Option<Complex64>,
}

impl Transformer {
    pub fn new(
        name: impl Into<String>,
        from: BusId,
        to: BusId,
        rating_mva: f64,
        impedance_percent: f64,
        x_over_r: f64,
    ) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            rating_mva,
            impedance_percent,
            x_over_r,
            connection: TransformerConnection::default(),
            zero_sequence_impedance: None,
        }
    }

    pub fn with_connection(&mut self, connection: TransformerConnection) -> &mut Self {
        self.connection = connection;
        self
    }

    pub fn with_zero_sequence_impedance(&mut self, z0: Complex64) -> &mut Self {
        self.zero_sequence_impedance = Some(z0);
        self
    }

    /// Leakage impedance on the transformer's own base.
    pub fn rated_impedance(&self) -> Complex64 {
        let theta = self.x_over_r.atan();
        let magnitude = self.impedance_percent / 100.0;
        Complex64::new(magnitude * theta.cos(), magnitude * theta.sin())
    }

    fn to_system_base(&self, z: Complex64, settings: &SystemSettings) -> Complex64 {
        z * (settings.base_mva / self.rating_mva)
    }

    /// Leakage impedance on the system base.
    pub fn impedance(&self, settings: &SystemSettings) -> Complex64 {
        self.to_system_base(self.rated_impedance(), settings)
    }

    fn zero_sequence_primitive(&self, settings: &SystemSettings) -> Primitive {
        let z0 = self
            .zero_sequence_impedance
            .unwrap_or_else(|| self.rated_impedance());
        let TransformerConnection { from, to } = self.connection;
        let zero = Complex64::new(0.0, 0.0);

        let (path, bus) = match (from.neutral(), to.neutral(), from, to) {
            (Some(zn1), Some(zn2), _, _) => (z0 + 3.0 * zn1 + 3.0 * zn2, None),
            (Some(zn1), None, _, Winding::Delta) => (z0 + 3.0 * zn1, Some(self.from)),
            (None, Some(zn2), Winding::Delta, _) => (z0 + 3.0 * zn2, Some(self.to)),
            _ => return Primitive::Open,
        };

        let Some(y) = admittance_of(self.to_system_base(path, settings)) else {
            return Primitive::Open;
        };
        match bus {
            None => Primitive::series(self.from, self.to, y, zero),
            Some(bus) => Primitive::Shunt { bus, admittance: y },
        }
    }
}

impl Branch for Transformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn terminals(&self) -> Vec<BusId> {
        vec![self.from, self.to]
    }

    fn primitive(&self, sequence: Sequence, settings: &SystemSettings) -> Primitive {
        match sequence {
            Sequence::Zero => self.zero_sequence_primitive(settings),
            Sequence::Positive | Sequence::Negative => match admittance_of(self.impedance(settings)) {
                Some(y) => Primitive::series(self.from, self.to, y, Complex64::new(0.0, 0.0)),
                None => Primitive::Open,
            },
        }
    }
}
