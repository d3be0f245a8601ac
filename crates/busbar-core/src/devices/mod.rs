//! Device models and their primitive admittance contributions.
//!
//! Branch-type devices (lines, transformers, shunt compensators) implement
//! [`Branch`], which is all the admittance assembly needs to know about them.
//! Injection devices (generators, loads) carry scheduled power and the
//! fault-study self-admittances.

mod generator;
mod line;
mod load;
mod shunt;
mod transformer;

pub use generator::{Generator, Grounding};
pub use line::{Line, ZeroSequenceLine};
pub use load::Load;
pub use shunt::{ShuntCompensator, ShuntKind};
pub use transformer::{Transformer, TransformerConnection, Winding};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::network::BusId;
use crate::settings::SystemSettings;

/// Symmetrical-component sequence an admittance is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequence {
    Zero,
    Positive,
    Negative,
}

/// A device's admittance contribution before superposition (its Yprim).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// 2×2 block stamped at rows/columns {from, to}
    Series {
        from: BusId,
        to: BusId,
        block: [[Complex64; 2]; 2],
    },
    /// 1×1 admittance to ground at one bus
    Shunt { bus: BusId, admittance: Complex64 },
    /// No path in this sequence (e.g. zero sequence through a delta winding)
    Open,
}

impl Primitive {
    /// Standard symmetric series block `[[y + y_sh, −y], [−y, y + y_sh]]`.
    pub fn series(from: BusId, to: BusId, series: Complex64, shunt_each_end: Complex64) -> Self {
        Primitive::Series {
            from,
            to,
            block: [
                [series + shunt_each_end, -series],
                [-series, series + shunt_each_end],
            ],
        }
    }
}

/// Anything that stamps into the bus admittance matrix.
pub trait Branch {
    fn name(&self) -> &str;

    /// Buses the device is connected to (one for shunts, two otherwise).
    fn terminals(&self) -> Vec<BusId>;

    fn primitive(&self, sequence: Sequence, settings: &SystemSettings) -> Primitive;

    /// True when the device joins two buses in the positive sequence
    fn is_series(&self) -> bool {
        self.terminals().len() == 2
    }
}

/// Reciprocal of an impedance, `None` for a (numerically) zero impedance.
pub(crate) fn admittance_of(z: Complex64) -> Option<Complex64> {
    if z.norm() < 1e-12 {
        None
    } else {
        Some(z.inv())
    }
}
