//! # Bus admittance (Ybus) assembly
//!
//! The admittance matrix relates nodal current injections to bus voltages,
//! **I = Y · V**. It is built by superposition: every device contributes a
//! small primitive block (its Yprim) that is added into the rows and columns
//! of the buses it touches.
//!
//! ```text
//!   series device between i and j          shunt device at i
//!
//!   Y[i,i] += y11    Y[i,j] += y12          Y[i,i] += y
//!   Y[j,i] += y21    Y[j,j] += y22
//! ```
//!
//! For a π-model line `y11 = y22 = y + jB/2` and `y12 = y21 = −y`, so
//! off-diagonal entries are the negative of the admittance directly between
//! the buses and each diagonal is the sum of everything incident to the bus.
//!
//! ## Sequence networks
//!
//! Fault studies need three matrices, one per symmetrical component. Branch
//! devices supply a primitive per sequence (a delta winding opens the zero
//! sequence, for example). On top of the branch part, generators add their
//! sub-transient self-admittance (`1/jX0` with `3·Zn` for the zero sequence,
//! `1/jX1`, `1/jX2`) and loads add their constant-impedance equivalent to the
//! positive and negative sequences only.
//!
//! The branch-only matrices depend purely on topology and are cached on the
//! [`Network`] behind a dirty flag; [`SequenceNetworks::build`] layers the
//! machine and load terms on top using the currently stored bus voltages.
//!
//! ## References
//!
//! - **Grainger & Stevenson**: "Power System Analysis", Chapters 8 and 11-12
//! - **Glover, Sarma & Overbye**: "Power System Analysis and Design",
//!   Section 6.4 (Ybus) and Chapter 8 (sequence networks)

use num_complex::Complex64;
use serde::Serialize;

use crate::devices::{Branch, Primitive, Sequence};
use crate::network::{BusId, Network};
use crate::settings::SystemSettings;

// ============================================================================
// DENSE ADMITTANCE MATRIX
// ============================================================================

/// Dense complex N×N matrix stored row-major, indexed by 0-based bus index.
///
/// Power-system matrices are sparse, but the networks this crate targets are
/// small enough that dense storage keeps the solvers simple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmittanceMatrix {
    n_bus: usize,
    data: Vec<Complex64>,
}

impl AdmittanceMatrix {
    pub fn zeros(n_bus: usize) -> Self {
        Self {
            n_bus,
            data: vec![Complex64::new(0.0, 0.0); n_bus * n_bus],
        }
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.n_bus + j]
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: Complex64) {
        self.data[i * self.n_bus + j] += value;
    }

    /// Susceptance B_ij
    #[inline]
    pub fn b(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).im
    }

    /// Add a primitive block at its bus indices.
    ///
    /// # Panics
    ///
    /// If the primitive references a bus outside `1..=n_bus`. The network
    /// rejects such devices at registration, so reaching this is a bug.
    pub fn stamp(&mut self, primitive: &Primitive) {
        match *primitive {
            Primitive::Series { from, to, block } => {
                let (i, j) = (self.checked_index(from), self.checked_index(to));
                self.add(i, i, block[0][0]);
                self.add(i, j, block[0][1]);
                self.add(j, i, block[1][0]);
                self.add(j, j, block[1][1]);
            }
            Primitive::Shunt { bus, admittance } => {
                let i = self.checked_index(bus);
                self.add(i, i, admittance);
            }
            Primitive::Open => {}
        }
    }

    fn checked_index(&self, bus: BusId) -> usize {
        assert!(
            bus.value() >= 1 && bus.value() <= self.n_bus,
            "device stamped at bus index {} outside 1..={}",
            bus.value(),
            self.n_bus
        );
        bus.index()
    }

    pub fn row_sum(&self, i: usize) -> Complex64 {
        (0..self.n_bus).map(|j| self.get(i, j)).sum()
    }

    pub fn is_symmetric(&self, tol: f64) -> bool {
        (0..self.n_bus).all(|i| {
            (i + 1..self.n_bus).all(|j| (self.get(i, j) - self.get(j, i)).norm() <= tol)
        })
    }
}

/// Assemble a matrix from branch devices for one sequence.
pub fn build_sequence_matrix<'a>(
    n_bus: usize,
    branches: impl IntoIterator<Item = &'a dyn Branch>,
    sequence: Sequence,
    settings: &SystemSettings,
) -> AdmittanceMatrix {
    let mut y_bus = AdmittanceMatrix::zeros(n_bus);
    for branch in branches {
        y_bus.stamp(&branch.primitive(sequence, settings));
    }
    y_bus
}

/// Positive-sequence Ybus from branch devices.
pub fn build_ybus<'a>(
    n_bus: usize,
    branches: impl IntoIterator<Item = &'a dyn Branch>,
    settings: &SystemSettings,
) -> AdmittanceMatrix {
    build_sequence_matrix(n_bus, branches, Sequence::Positive, settings)
}

// ============================================================================
// CACHE
// ============================================================================

/// Branch-only matrices per sequence, rebuilt lazily after topology changes.
#[derive(Debug, Clone, Default)]
pub(crate) struct AdmittanceCache {
    zero: Option<AdmittanceMatrix>,
    positive: Option<AdmittanceMatrix>,
    negative: Option<AdmittanceMatrix>,
}

impl AdmittanceCache {
    pub(crate) fn invalidate(&mut self) {
        if self.is_empty() {
            return;
        }
        tracing::debug!("admittance cache invalidated");
        *self = Self::default();
    }

    fn is_empty(&self) -> bool {
        self.zero.is_none() && self.positive.is_none() && self.negative.is_none()
    }

    pub(crate) fn slot(&mut self, sequence: Sequence) -> &mut Option<AdmittanceMatrix> {
        match sequence {
            Sequence::Zero => &mut self.zero,
            Sequence::Positive => &mut self.positive,
            Sequence::Negative => &mut self.negative,
        }
    }
}

// ============================================================================
// FAULT SEQUENCE NETWORKS
// ============================================================================

/// Zero, positive and negative sequence admittance matrices for fault studies.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceNetworks {
    pub zero: AdmittanceMatrix,
    pub positive: AdmittanceMatrix,
    pub negative: AdmittanceMatrix,
}

impl SequenceNetworks {
    /// Branch matrices plus generator and load self-admittances.
    ///
    /// Load equivalents use the voltage magnitudes currently stored on the
    /// buses, so this should run after a power flow.
    pub fn build(network: &mut Network) -> Self {
        let mut zero = network.sequence_branch_matrix(Sequence::Zero).clone();
        let mut positive = network.sequence_branch_matrix(Sequence::Positive).clone();
        let mut negative = network.sequence_branch_matrix(Sequence::Negative).clone();
        let settings = *network.settings();

        for generator in network.generators() {
            let i = generator.bus.index();
            if generator.reactances.is_none() {
                tracing::warn!(
                    generator = %generator.name,
                    "generator has no sequence reactances; left out of fault networks"
                );
                continue;
            }
            for (sequence, matrix) in [
                (Sequence::Zero, &mut zero),
                (Sequence::Positive, &mut positive),
                (Sequence::Negative, &mut negative),
            ] {
                if let Some(y) = generator.sequence_admittance(sequence, &settings) {
                    matrix.add(i, i, y);
                }
            }
        }

        for load in network.loads() {
            let i = load.bus.index();
            let voltage = network
                .bus_by_id(load.bus)
                .map_or(1.0, |bus| bus.voltage.value());
            let y = load.equivalent_admittance(voltage, &settings);
            positive.add(i, i, y);
            negative.add(i, i, y);
        }

        Self {
            zero,
            positive,
            negative,
        }
    }

    pub fn get(&self, sequence: Sequence) -> &AdmittanceMatrix {
        match sequence {
            Sequence::Zero => &self.zero,
            Sequence::Positive => &self.positive,
            Sequence::Negative => &self.negative,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Line, ShuntCompensator, ShuntKind};

    fn triangle() -> Vec<Line> {
        vec![
            Line::new("L12", BusId::new(1), BusId::new(2), 0.01, 0.1, 0.0),
            Line::new("L23", BusId::new(2), BusId::new(3), 0.02, 0.2, 0.0),
            Line::new("L13", BusId::new(1), BusId::new(3), 0.015, 0.12, 0.0),
        ]
    }

    #[test]
    fn stamp_is_symmetric_with_zero_row_sums() {
        let lines = triangle();
        let settings = SystemSettings::default();
        let y_bus = build_ybus(3, lines.iter().map(|l| l as &dyn Branch), &settings);

        assert!(y_bus.is_symmetric(1e-12));
        for i in 0..3 {
            assert!(y_bus.row_sum(i).norm() < 1e-10);
        }
        let y12 = Complex64::new(0.01, 0.1).inv();
        assert!((y_bus.get(0, 1) + y12).norm() < 1e-12);
    }

    #[test]
    fn shunt_only_touches_diagonal() {
        let settings = SystemSettings::default();
        let shunt = ShuntCompensator::new("C2", BusId::new(2), 25.0, ShuntKind::Capacitor);
        let mut branches: Vec<&dyn Branch> = Vec::new();
        let lines = triangle();
        for line in &lines {
            branches.push(line);
        }
        let without = build_ybus(3, branches.clone(), &settings);
        branches.push(&shunt);
        let with = build_ybus(3, branches, &settings);

        for i in 0..3 {
            for j in 0..3 {
                let delta = with.get(i, j) - without.get(i, j);
                if i == 1 && j == 1 {
                    assert!((delta - Complex64::new(0.0, 0.25)).norm() < 1e-12);
                } else {
                    assert!(delta.norm() < 1e-12);
                }
            }
        }
        assert!((with.row_sum(1) - Complex64::new(0.0, 0.25)).norm() < 1e-10);
    }

    #[test]
    #[should_panic(expected = "outside 1..=2")]
    fn stamping_unknown_bus_panics() {
        let mut y_bus = AdmittanceMatrix::zeros(2);
        y_bus.stamp(&Primitive::Shunt {
            bus: BusId::new(3),
            admittance: Complex64::new(0.0, 1.0),
        });
    }
}
