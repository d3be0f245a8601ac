#![allow(dead_code)]

use busbar_core::{Network, SystemSettings};

/// Route solver logs to the test harness; `RUST_LOG=busbar_algo=debug`
/// shows iteration traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Five-bus system of Glover/Sarma/Overbye Example 6.9.
///
/// Buses 1 and 3 are generator buses at 15 kV, stepped up to the 345 kV
/// network through T1 (400 MVA) and T2 (800 MVA). `gen3_voltage` is the
/// setpoint of the PV machine at bus 3 (1.05 in the textbook).
pub fn five_bus(gen3_voltage: f64) -> Network {
    let mut network = Network::new("example-6.9", SystemSettings::default());
    for (name, kv) in [
        ("bus1", 15.0),
        ("bus2", 345.0),
        ("bus3", 15.0),
        ("bus4", 345.0),
        ("bus5", 345.0),
    ] {
        network.add_bus(name, kv).unwrap();
    }
    network
        .add_transformer("T1", "bus1", "bus5", 400.0, 8.02, 13.333)
        .unwrap();
    network
        .add_transformer("T2", "bus3", "bus4", 800.0, 8.02, 13.333)
        .unwrap();
    network.add_line("L1", "bus2", "bus4", 0.009, 0.1, 1.72).unwrap();
    network.add_line("L2", "bus2", "bus5", 0.0045, 0.05, 0.88).unwrap();
    network.add_line("L3", "bus5", "bus4", 0.00225, 0.025, 0.44).unwrap();

    network
        .add_generator("Gen1", "bus1", 1.0, 0.0)
        .unwrap()
        .with_reactances(0.045, 0.045, 0.0125)
        .with_machine_base(400.0);
    network
        .add_generator("Gen2", "bus3", gen3_voltage, 520.0)
        .unwrap()
        .with_reactances(0.0225, 0.0225, 0.005)
        .with_machine_base(800.0);

    network.add_load("Load1", "bus2", 800.0, 280.0).unwrap();
    network.add_load("Load2", "bus3", 80.0, 40.0).unwrap();
    network
}

/// Three buses meshed with moderate loading; used where a well-conditioned
/// case is needed.
pub fn three_bus() -> Network {
    let mut network = Network::new("three-bus", SystemSettings::default());
    for name in ["bus1", "bus2", "bus3"] {
        network.add_bus(name, 230.0).unwrap();
    }
    network.add_line("L12", "bus1", "bus2", 0.02, 0.06, 0.06).unwrap();
    network.add_line("L13", "bus1", "bus3", 0.08, 0.24, 0.05).unwrap();
    network.add_line("L23", "bus2", "bus3", 0.06, 0.18, 0.04).unwrap();
    network.add_generator("G1", "bus1", 1.06, 0.0).unwrap();
    network.add_generator("G2", "bus2", 1.03, 40.0).unwrap();
    network.add_load("D2", "bus2", 20.0, 10.0).unwrap();
    network.add_load("D3", "bus3", 45.0, 15.0).unwrap();
    network
}
