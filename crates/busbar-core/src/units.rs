//! Newtype wrappers for the engineering quantities that cross the public API.
//!
//! Device ratings and scheduled injections are entered in MW / Mvar / MVA and
//! kV, while everything inside the admittance and solver code works in
//! per-unit on the system base. Keeping the engineering-unit side typed stops
//! a Mvar value from being added to a MW value, or degrees from being fed to
//! a trig function expecting radians.
//!
//! ```
//! use busbar_core::units::{Degrees, Megawatts};
//!
//! let p = Megawatts(520.0) - Megawatts(80.0);
//! assert_eq!(p.value(), 440.0);
//!
//! let angle = Degrees(180.0).to_radians();
//! assert!((angle.value() - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $type {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Power
// =============================================================================

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Reactive power in megavolt-amperes reactive (Mvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megavars(pub f64);

impl_unit_ops!(Megavars, "Mvar");

/// Apparent power in megavolt-amperes (MVA). Used for system and device bases.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);

impl_unit_ops!(MegavoltAmperes, "MVA");

impl Megawatts {
    /// Per-unit value on the given MVA base
    #[inline]
    pub fn to_per_unit(self, base: MegavoltAmperes) -> f64 {
        self.0 / base.0
    }

    #[inline]
    pub fn from_per_unit(value: f64, base: MegavoltAmperes) -> Self {
        Self(value * base.0)
    }

    /// S = √(P² + Q²)
    #[inline]
    pub fn apparent_power(self, q: Megavars) -> MegavoltAmperes {
        MegavoltAmperes(self.0.hypot(q.0))
    }
}

impl Megavars {
    #[inline]
    pub fn to_per_unit(self, base: MegavoltAmperes) -> f64 {
        self.0 / base.0
    }

    #[inline]
    pub fn from_per_unit(value: f64, base: MegavoltAmperes) -> Self {
        Self(value * base.0)
    }
}

// =============================================================================
// Voltage
// =============================================================================

/// Voltage magnitude in per-unit of the bus base voltage
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

impl_unit_ops!(PerUnit, "pu");

/// Line-to-line voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl PerUnit {
    pub const ONE: Self = Self(1.0);

    #[inline]
    pub fn to_kilovolts(self, base_kv: Kilovolts) -> Kilovolts {
        Kilovolts(self.0 * base_kv.0)
    }
}

impl Kilovolts {
    #[inline]
    pub fn to_per_unit(self, base_kv: Kilovolts) -> PerUnit {
        if base_kv.0.abs() < 1e-12 {
            PerUnit(0.0)
        } else {
            PerUnit(self.0 / base_kv.0)
        }
    }

    /// Base impedance in ohms, Z_base = kV² / MVA
    #[inline]
    pub fn base_impedance(self, base: MegavoltAmperes) -> f64 {
        self.0 * self.0 / base.0
    }
}

// =============================================================================
// Angles
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl_unit_ops!(Radians, "rad");

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl_unit_ops!(Degrees, "°");

impl Radians {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}
