//! Symmetrical components.
//!
//! ```text
//!   a = 1∠120° = −1/2 + j√3/2
//!
//!   ┌ Va ┐   ┌ 1  1   1  ┐ ┌ V0 ┐
//!   │ Vb │ = │ 1  a²  a  │ │ V1 │
//!   └ Vc ┘   └ 1  a   a² ┘ └ V2 ┘
//! ```

use num_complex::Complex64;
use serde::Serialize;

/// The 120° rotation operator.
pub fn rotation() -> Complex64 {
    Complex64::new(-0.5, 3.0_f64.sqrt() / 2.0)
}

/// Zero, positive and negative sequence quantities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SequenceComponents {
    pub zero: Complex64,
    pub positive: Complex64,
    pub negative: Complex64,
}

impl SequenceComponents {
    pub fn new(zero: Complex64, positive: Complex64, negative: Complex64) -> Self {
        Self {
            zero,
            positive,
            negative,
        }
    }

    /// `A · [x0, x1, x2]ᵀ` as phase a, b, c.
    pub fn to_phases(self) -> [Complex64; 3] {
        let a = rotation();
        let a2 = a * a;
        [
            self.zero + self.positive + self.negative,
            self.zero + a2 * self.positive + a * self.negative,
            self.zero + a * self.positive + a2 * self.negative,
        ]
    }

    pub fn snapped(self, threshold: f64) -> Self {
        Self {
            zero: snap(self.zero, threshold),
            positive: snap(self.positive, threshold),
            negative: snap(self.negative, threshold),
        }
    }
}

/// Zero for anything smaller than `threshold` in magnitude.
pub fn snap(value: Complex64, threshold: f64) -> Complex64 {
    if value.norm() < threshold {
        Complex64::new(0.0, 0.0)
    } else {
        value
    }
}

/// Magnitude and angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Phasor {
    pub magnitude: f64,
    pub angle_deg: f64,
}

impl Phasor {
    pub fn from_complex(value: Complex64) -> Self {
        if value.norm() == 0.0 {
            return Self {
                magnitude: 0.0,
                angle_deg: 0.0,
            };
        }
        Self {
            magnitude: value.norm(),
            angle_deg: value.arg().to_degrees(),
        }
    }

    pub fn to_complex(self) -> Complex64 {
        Complex64::from_polar(self.magnitude, self.angle_deg.to_radians())
    }
}

/// Snap each phase and convert to polar form.
pub fn phase_phasors(phases: [Complex64; 3], threshold: f64) -> [Phasor; 3] {
    phases.map(|value| Phasor::from_complex(snap(value, threshold)))
}
