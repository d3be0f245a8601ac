//! Buses and device registries.
//!
//! Every device kind lives in its own insertion-ordered map keyed by name.
//! Buses receive 1-based [`BusId`]s in insertion order; those ids are also
//! the row/column of the bus in every admittance matrix (minus one).
//! Registration errors (duplicate names, unknown buses) leave the network
//! exactly as it was.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::admittance::{build_sequence_matrix, AdmittanceCache, AdmittanceMatrix};
use crate::devices::{
    Branch, Generator, Line, Load, Sequence, ShuntCompensator, ShuntKind, Transformer,
};
use crate::diagnostics::Diagnostics;
use crate::error::{BusbarError, BusbarResult};
use crate::graph_utils::find_islands;
use crate::settings::SystemSettings;
use crate::units::{Kilovolts, Megavars, Megawatts, PerUnit, Radians};

/// 1-based bus number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusId(usize);

impl BusId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        BusId(value)
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0
    }

    /// 0-based matrix row/column of an id issued by a [`Network`].
    #[inline]
    pub const fn index(self) -> usize {
        self.0 - 1
    }

    /// 0-based index, or `None` for the invalid id 0.
    #[inline]
    pub const fn checked_index(self) -> Option<usize> {
        self.0.checked_sub(1)
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        BusId(index + 1)
    }
}

impl std::fmt::Display for BusId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Power-flow bus classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusType {
    /// Fixed |V| and θ = 0; absorbs the system imbalance
    Slack,
    /// Fixed P and |V|
    PV,
    /// Fixed P and Q
    PQ,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    pub base_kv: Kilovolts,
    pub bus_type: BusType,
    /// Solved (or setpoint) voltage magnitude
    pub voltage: PerUnit,
    pub angle: Radians,
    /// Net scheduled injection: generation minus load
    pub scheduled_p: Megawatts,
    pub scheduled_q: Megavars,
    /// Injection implied by the last solved voltages
    pub calculated_p: Option<Megawatts>,
    pub calculated_q: Option<Megavars>,
}

impl Bus {
    fn new(id: BusId, name: String, base_kv: f64) -> Self {
        Self {
            id,
            name,
            base_kv: Kilovolts(base_kv),
            bus_type: BusType::PQ,
            voltage: PerUnit::ONE,
            angle: Radians::ZERO,
            scheduled_p: Megawatts(0.0),
            scheduled_q: Megavars(0.0),
            calculated_p: None,
            calculated_q: None,
        }
    }

    pub fn voltage_kv(&self) -> Kilovolts {
        self.voltage.to_kilovolts(self.base_kv)
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    settings: SystemSettings,
    buses: IndexMap<String, Bus>,
    lines: IndexMap<String, Line>,
    transformers: IndexMap<String, Transformer>,
    shunts: IndexMap<String, ShuntCompensator>,
    generators: IndexMap<String, Generator>,
    loads: IndexMap<String, Load>,
    admittance: AdmittanceCache,
}

fn duplicate<T>(kind: &'static str, name: &str) -> BusbarResult<T> {
    tracing::warn!(kind, name, "duplicate registration ignored");
    Err(BusbarError::DuplicateName {
        kind,
        name: name.to_string(),
    })
}

impl Network {
    pub fn new(name: impl Into<String>, settings: SystemSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            buses: IndexMap::new(),
            lines: IndexMap::new(),
            transformers: IndexMap::new(),
            shunts: IndexMap::new(),
            generators: IndexMap::new(),
            loads: IndexMap::new(),
            admittance: AdmittanceCache::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Buses
    // ------------------------------------------------------------------

    pub fn add_bus(&mut self, name: impl Into<String>, base_kv: f64) -> BusbarResult<BusId> {
        let name = name.into();
        if self.buses.contains_key(&name) {
            return duplicate("bus", &name);
        }
        let id = BusId::from_index(self.buses.len());
        self.buses.insert(name.clone(), Bus::new(id, name, base_kv));
        self.admittance.invalidate();
        Ok(id)
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    /// Buses in index order
    pub fn buses(&self) -> impl Iterator<Item = &Bus> {
        self.buses.values()
    }

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses.get(name)
    }

    pub fn bus_mut(&mut self, name: &str) -> Option<&mut Bus> {
        self.buses.get_mut(name)
    }

    pub fn bus_by_id(&self, id: BusId) -> Option<&Bus> {
        id.checked_index()
            .and_then(|index| self.buses.get_index(index))
            .map(|(_, bus)| bus)
    }

    pub fn bus_by_id_mut(&mut self, id: BusId) -> Option<&mut Bus> {
        id.checked_index()
            .and_then(|index| self.buses.get_index_mut(index))
            .map(|(_, bus)| bus)
    }

    fn resolve(&self, device: &'static str, name: &str, bus: &str) -> BusbarResult<BusId> {
        self.buses
            .get(bus)
            .map(|b| b.id)
            .ok_or_else(|| BusbarError::UnknownBus {
                device,
                name: name.to_string(),
                bus: bus.to_string(),
            })
    }

    pub fn set_bus_type(&mut self, name: &str, bus_type: BusType) -> BusbarResult<()> {
        let bus = self.buses.get_mut(name).ok_or_else(|| BusbarError::NotFound {
            kind: "bus",
            name: name.to_string(),
        })?;
        bus.bus_type = bus_type;
        Ok(())
    }

    pub fn slack_buses(&self) -> impl Iterator<Item = &Bus> {
        self.buses
            .values()
            .filter(|bus| bus.bus_type == BusType::Slack)
    }

    // ------------------------------------------------------------------
    // Branch devices
    // ------------------------------------------------------------------

    /// Line with per-unit parameters on the system base; `b` is the total
    /// charging susceptance.
    pub fn add_line(
        &mut self,
        name: impl Into<String>,
        from: &str,
        to: &str,
        r: f64,
        x: f64,
        b: f64,
    ) -> BusbarResult<&mut Line> {
        let name = name.into();
        if self.lines.contains_key(&name) {
            return duplicate("line", &name);
        }
        let from = self.resolve("line", &name, from)?;
        let to = self.resolve("line", &name, to)?;
        self.admittance.invalidate();
        let line = Line::new(name.clone(), from, to, r, x, b);
        Ok(self.lines.entry(name).or_insert(line))
    }

    /// Line from lumped physical parameters: series resistance (Ω), series
    /// inductance (H) and total shunt capacitance (F), converted with the
    /// system frequency and the from-bus base voltage.
    pub fn add_line_lumped(
        &mut self,
        name: impl Into<String>,
        from: &str,
        to: &str,
        r_ohm: f64,
        inductance_h: f64,
        capacitance_f: f64,
    ) -> BusbarResult<&mut Line> {
        let name = name.into();
        let from_bus = self.resolve("line", &name, from)?;
        let base_kv = self
            .bus_by_id(from_bus)
            .map(|bus| bus.base_kv)
            .ok_or_else(|| BusbarError::Validation(format!("bus '{from}' vanished")))?;
        let z_base = base_kv.base_impedance(self.settings.base());
        if !(z_base.is_finite() && z_base > 0.0) {
            return Err(BusbarError::Validation(format!(
                "line '{name}' needs a positive base voltage at bus '{from}'"
            )));
        }
        let omega = self.settings.angular_frequency();
        self.add_line(
            name,
            from,
            to,
            r_ohm / z_base,
            omega * inductance_h / z_base,
            omega * capacitance_f * z_base,
        )
    }

    /// Transformer from its MVA rating, percent impedance and X/R ratio.
    pub fn add_transformer(
        &mut self,
        name: impl Into<String>,
        from: &str,
        to: &str,
        rating_mva: f64,
        impedance_percent: f64,
        x_over_r: f64,
    ) -> BusbarResult<&mut Transformer> {
        let name = name.into();
        if self.transformers.contains_key(&name) {
            return duplicate("transformer", &name);
        }
        if !(rating_mva > 0.0) {
            return Err(BusbarError::Validation(format!(
                "transformer '{name}' needs a positive rating, got {rating_mva} MVA"
            )));
        }
        let from = self.resolve("transformer", &name, from)?;
        let to = self.resolve("transformer", &name, to)?;
        self.admittance.invalidate();
        let transformer = Transformer::new(
            name.clone(),
            from,
            to,
            rating_mva,
            impedance_percent,
            x_over_r,
        );
        Ok(self.transformers.entry(name).or_insert(transformer))
    }

    pub fn add_shunt(
        &mut self,
        name: impl Into<String>,
        bus: &str,
        rating_mvar: f64,
        kind: ShuntKind,
    ) -> BusbarResult<&ShuntCompensator> {
        let name = name.into();
        if self.shunts.contains_key(&name) {
            return duplicate("shunt", &name);
        }
        let bus = self.resolve("shunt", &name, bus)?;
        self.admittance.invalidate();
        let shunt = ShuntCompensator::new(name.clone(), bus, rating_mvar, kind);
        Ok(self.shunts.entry(name).or_insert(shunt))
    }

    pub fn remove_line(&mut self, name: &str) -> BusbarResult<Line> {
        let line = self.lines.shift_remove(name).ok_or_else(|| BusbarError::NotFound {
            kind: "line",
            name: name.to_string(),
        })?;
        self.admittance.invalidate();
        Ok(line)
    }

    pub fn remove_transformer(&mut self, name: &str) -> BusbarResult<Transformer> {
        let transformer =
            self.transformers
                .shift_remove(name)
                .ok_or_else(|| BusbarError::NotFound {
                    kind: "transformer",
                    name: name.to_string(),
                })?;
        self.admittance.invalidate();
        Ok(transformer)
    }

    pub fn remove_shunt(&mut self, name: &str) -> BusbarResult<ShuntCompensator> {
        let shunt = self.shunts.shift_remove(name).ok_or_else(|| BusbarError::NotFound {
            kind: "shunt",
            name: name.to_string(),
        })?;
        self.admittance.invalidate();
        Ok(shunt)
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.get(name)
    }

    pub fn transformers(&self) -> impl Iterator<Item = &Transformer> {
        self.transformers.values()
    }

    pub fn transformer(&self, name: &str) -> Option<&Transformer> {
        self.transformers.get(name)
    }

    pub fn shunts(&self) -> impl Iterator<Item = &ShuntCompensator> {
        self.shunts.values()
    }

    /// Every device that stamps into the admittance matrices.
    pub fn branches(&self) -> impl Iterator<Item = &dyn Branch> {
        self.lines
            .values()
            .map(|l| l as &dyn Branch)
            .chain(self.transformers.values().map(|t| t as &dyn Branch))
            .chain(self.shunts.values().map(|s| s as &dyn Branch))
    }

    // ------------------------------------------------------------------
    // Injection devices
    // ------------------------------------------------------------------

    /// Register a generator.
    ///
    /// The first generator of a network without a slack bus makes its bus the
    /// slack; later generators turn PQ buses into PV buses. Use
    /// [`set_bus_type`](Self::set_bus_type) to override.
    pub fn add_generator(
        &mut self,
        name: impl Into<String>,
        bus: &str,
        voltage_setpoint: f64,
        p_mw: f64,
    ) -> BusbarResult<&mut Generator> {
        let name = name.into();
        if self.generators.contains_key(&name) {
            return duplicate("generator", &name);
        }
        let bus_id = self.resolve("generator", &name, bus)?;
        let has_slack = self.slack_buses().next().is_some();
        // the first machine at a bus owns its voltage setpoint
        let first_at_bus = self.generators_at(bus_id).next().is_none();
        if let Some(bus) = self.bus_by_id_mut(bus_id) {
            if !has_slack {
                bus.bus_type = BusType::Slack;
            } else if bus.bus_type == BusType::PQ {
                bus.bus_type = BusType::PV;
            }
            if first_at_bus {
                bus.voltage = PerUnit(voltage_setpoint);
            }
        }

        let generator = Generator::new(name.clone(), bus_id, voltage_setpoint, p_mw);
        self.generators.insert(name.clone(), generator);
        self.refresh_injections();
        self.generators
            .get_mut(&name)
            .ok_or_else(|| BusbarError::Other(format!("generator '{name}' vanished")))
    }

    pub fn add_load(
        &mut self,
        name: impl Into<String>,
        bus: &str,
        p_mw: f64,
        q_mvar: f64,
    ) -> BusbarResult<&Load> {
        let name = name.into();
        if self.loads.contains_key(&name) {
            return duplicate("load", &name);
        }
        let bus = self.resolve("load", &name, bus)?;
        self.loads
            .insert(name.clone(), Load::new(name.clone(), bus, p_mw, q_mvar));
        self.refresh_injections();
        self.loads
            .get(&name)
            .ok_or_else(|| BusbarError::Other(format!("load '{name}' vanished")))
    }

    /// Remove a generator; a PV or slack bus left without machines reverts
    /// to PQ.
    pub fn remove_generator(&mut self, name: &str) -> BusbarResult<Generator> {
        let generator = self
            .generators
            .shift_remove(name)
            .ok_or_else(|| BusbarError::NotFound {
                kind: "generator",
                name: name.to_string(),
            })?;
        if self.generators_at(generator.bus).next().is_none() {
            if let Some(bus) = self.bus_by_id_mut(generator.bus) {
                if bus.bus_type == BusType::Slack {
                    tracing::warn!(bus = %bus.name, "slack generator removed; bus is now PQ");
                }
                bus.bus_type = BusType::PQ;
            }
        }
        self.refresh_injections();
        Ok(generator)
    }

    pub fn remove_load(&mut self, name: &str) -> BusbarResult<Load> {
        let load = self.loads.shift_remove(name).ok_or_else(|| BusbarError::NotFound {
            kind: "load",
            name: name.to_string(),
        })?;
        self.refresh_injections();
        Ok(load)
    }

    pub fn generators(&self) -> impl Iterator<Item = &Generator> {
        self.generators.values()
    }

    pub fn generator(&self, name: &str) -> Option<&Generator> {
        self.generators.get(name)
    }

    pub fn generator_mut(&mut self, name: &str) -> Option<&mut Generator> {
        self.generators.get_mut(name)
    }

    pub fn generators_at(&self, bus: BusId) -> impl Iterator<Item = &Generator> {
        self.generators.values().filter(move |g| g.bus == bus)
    }

    pub fn loads(&self) -> impl Iterator<Item = &Load> {
        self.loads.values()
    }

    pub fn load(&self, name: &str) -> Option<&Load> {
        self.loads.get(name)
    }

    pub fn loads_at(&self, bus: BusId) -> impl Iterator<Item = &Load> {
        self.loads.values().filter(move |l| l.bus == bus)
    }

    /// Voltage setpoint of the first generator on the bus.
    pub fn voltage_setpoint(&self, bus: BusId) -> Option<f64> {
        self.generators_at(bus).next().map(|g| g.voltage_setpoint)
    }

    /// Recompute every bus's net scheduled injection from its generators and
    /// loads. Called after registration changes and before every solve.
    pub fn refresh_injections(&mut self) {
        let mut totals = vec![(Megawatts(0.0), Megavars(0.0)); self.buses.len()];
        for generator in self.generators.values() {
            totals[generator.bus.index()].0 += generator.active_power;
        }
        for load in self.loads.values() {
            let entry = &mut totals[load.bus.index()];
            entry.0 -= load.active_power;
            entry.1 -= load.reactive_power;
        }
        for (bus, (p, q)) in self.buses.values_mut().zip(totals) {
            bus.scheduled_p = p;
            bus.scheduled_q = q;
        }
    }

    // ------------------------------------------------------------------
    // Admittance
    // ------------------------------------------------------------------

    /// Positive-sequence Ybus, rebuilt only after topology changes.
    pub fn ybus(&mut self) -> &AdmittanceMatrix {
        self.sequence_branch_matrix(Sequence::Positive)
    }

    /// Branch-only admittance matrix for one sequence (cached).
    pub fn sequence_branch_matrix(&mut self, sequence: Sequence) -> &AdmittanceMatrix {
        let n_bus = self.buses.len();
        let settings = self.settings;
        let Self {
            lines,
            transformers,
            shunts,
            admittance,
            ..
        } = self;
        admittance.slot(sequence).get_or_insert_with(|| {
            tracing::debug!(?sequence, n_bus, "assembling admittance matrix");
            let branches = lines
                .values()
                .map(|l| l as &dyn Branch)
                .chain(transformers.values().map(|t| t as &dyn Branch))
                .chain(shunts.values().map(|s| s as &dyn Branch));
            build_sequence_matrix(n_bus, branches, sequence, &settings)
        })
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Structural checks run before any solve.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();

        if self.buses.is_empty() {
            diag.add_error("topology", "network has no buses");
            return diag;
        }

        let slacks: Vec<&Bus> = self.slack_buses().collect();
        match slacks.len() {
            0 => diag.add_error("slack", "network has no slack bus"),
            1 => {}
            _ => {
                for bus in &slacks[1..] {
                    diag.add_error_with_entity("slack", "more than one slack bus", &bus.name);
                }
            }
        }

        for bus in self.buses.values() {
            if bus.bus_type != BusType::PQ && self.generators_at(bus.id).next().is_none() {
                diag.add_warning_with_entity(
                    "slack",
                    "voltage-controlled bus without a generator",
                    &bus.name,
                );
            }
        }

        let analysis = find_islands(self);
        if analysis.islands.len() > 1 {
            for island in &analysis.islands {
                let has_slack = island.buses.iter().any(|id| {
                    self.bus_by_id(*id)
                        .is_some_and(|bus| bus.bus_type == BusType::Slack)
                });
                if !has_slack {
                    let names: Vec<&str> = island
                        .buses
                        .iter()
                        .filter_map(|id| self.bus_by_id(*id))
                        .map(|bus| bus.name.as_str())
                        .collect();
                    diag.add_error_with_entity(
                        "topology",
                        "electrical island without a slack bus",
                        &names.join(", "),
                    );
                }
            }
        }

        for bus in self.buses.values() {
            let connected = self.lines.values().any(|l| l.from == bus.id || l.to == bus.id)
                || self
                    .transformers
                    .values()
                    .any(|t| t.from == bus.id || t.to == bus.id);
            if !connected && self.buses.len() > 1 {
                diag.add_warning_with_entity("topology", "bus has no series branch", &bus.name);
            }
        }

        diag
    }

    /// [`validate`](Self::validate), turned into an error when it found any.
    pub fn ensure_solvable(&self) -> BusbarResult<()> {
        let diag = self.validate();
        if diag.has_errors() {
            let messages: Vec<String> = diag.errors().map(|issue| issue.to_string()).collect();
            return Err(BusbarError::Validation(messages.join("; ")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn two_bus() -> Network {
        let mut network = Network::new("two-bus", SystemSettings::default());
        network.add_bus("bus1", 138.0).unwrap();
        network.add_bus("bus2", 138.0).unwrap();
        network.add_line("L1", "bus1", "bus2", 0.01, 0.1, 0.02).unwrap();
        network.add_generator("G1", "bus1", 1.02, 0.0).unwrap();
        network.add_load("D2", "bus2", 50.0, 20.0).unwrap();
        network
    }

    #[test]
    fn bus_ids_follow_insertion_order() {
        let network = two_bus();
        let ids: Vec<usize> = network.buses().map(|b| b.id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(network.bus_by_id(BusId::new(2)).unwrap().name, "bus2");
        assert!(network.bus_by_id(BusId::new(0)).is_none());
        assert!(network.bus_by_id(BusId::new(3)).is_none());
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let mut network = two_bus();
        let before = network.ybus().clone();

        let err = network.add_bus("bus2", 69.0).unwrap_err();
        assert!(matches!(err, BusbarError::DuplicateName { kind: "bus", .. }));
        assert_eq!(network.bus_count(), 2);
        assert_eq!(network.bus("bus2").unwrap().base_kv, Kilovolts(138.0));

        let err = network.add_line("L1", "bus1", "bus2", 1.0, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, BusbarError::DuplicateName { kind: "line", .. }));
        assert_eq!(network.line("L1").unwrap().x, 0.1);
        assert_eq!(network.ybus(), &before);
    }

    #[test]
    fn unknown_bus_is_rejected() {
        let mut network = two_bus();
        let err = network.add_load("D9", "bus9", 10.0, 0.0).unwrap_err();
        assert!(matches!(err, BusbarError::UnknownBus { .. }));
        assert!(network.load("D9").is_none());
        assert_eq!(network.bus("bus2").unwrap().scheduled_p, Megawatts(-50.0));
    }

    #[test]
    fn generators_classify_buses() {
        let mut network = two_bus();
        assert_eq!(network.bus("bus1").unwrap().bus_type, BusType::Slack);
        assert_eq!(network.bus("bus1").unwrap().voltage, PerUnit(1.02));

        network.add_generator("G2", "bus2", 1.01, 30.0).unwrap();
        let bus2 = network.bus("bus2").unwrap();
        assert_eq!(bus2.bus_type, BusType::PV);
        assert_eq!(bus2.scheduled_p, Megawatts(-20.0));
        assert_eq!(bus2.scheduled_q, Megavars(-20.0));

        network.remove_generator("G2").unwrap();
        assert_eq!(network.bus("bus2").unwrap().bus_type, BusType::PQ);
        assert_eq!(network.bus("bus2").unwrap().scheduled_p, Megawatts(-50.0));
    }

    #[test]
    fn first_generator_sets_bus_voltage() {
        let mut network = two_bus();
        network.add_generator("G1b", "bus1", 0.98, 10.0).unwrap();

        let bus1 = network.bus("bus1").unwrap();
        assert_eq!(bus1.voltage, PerUnit(1.02));
        assert_eq!(network.voltage_setpoint(bus1.id), Some(1.02));
    }

    #[test]
    fn topology_change_invalidates_ybus() {
        let mut network = two_bus();
        let before = network.ybus().get(1, 1);
        network
            .add_shunt("C2", "bus2", 10.0, ShuntKind::Capacitor)
            .unwrap();
        let after = network.ybus().get(1, 1);
        assert!((after - before - Complex64::new(0.0, 0.1)).norm() < 1e-12);

        network.remove_shunt("C2").unwrap();
        assert!((network.ybus().get(1, 1) - before).norm() < 1e-12);
    }

    #[test]
    fn lumped_line_uses_frequency_and_base() {
        let mut network = Network::new("lumped", SystemSettings::default());
        network.add_bus("a", 230.0).unwrap();
        network.add_bus("b", 230.0).unwrap();
        let line = network
            .add_line_lumped("L", "a", "b", 5.29, 0.1403, 1.0e-6)
            .unwrap();
        let z_base = 230.0 * 230.0 / 100.0;
        let omega = 2.0 * std::f64::consts::PI * 60.0;
        assert!((line.r - 5.29 / z_base).abs() < 1e-12);
        assert!((line.x - omega * 0.1403 / z_base).abs() < 1e-12);
        assert!((line.b - omega * 1.0e-6 * z_base).abs() < 1e-12);
    }

    #[test]
    fn validation_reports_slack_and_islands() {
        let mut network = two_bus();
        assert!(!network.validate().has_errors());

        network.add_bus("bus3", 138.0).unwrap();
        network.add_bus("bus4", 138.0).unwrap();
        network.add_line("L34", "bus3", "bus4", 0.01, 0.1, 0.0).unwrap();
        let diag = network.validate();
        assert_eq!(diag.issues_by_category("topology").count(), 1);
        assert!(network.ensure_solvable().is_err());

        network.set_bus_type("bus3", BusType::Slack).unwrap();
        let diag = network.validate();
        assert!(diag.issues_by_category("slack").any(|i| i.message.contains("more than one")));
    }
}
