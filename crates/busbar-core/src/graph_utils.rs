use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::VecDeque;

use crate::admittance::AdmittanceMatrix;
use crate::network::{BusId, Network};

/// Entries smaller than this are treated as structurally absent.
const COUPLING_EPS: f64 = 1e-12;

/// One electrically connected group of buses.
#[derive(Debug, Clone)]
pub struct Island {
    pub island_id: usize,
    pub buses: Vec<BusId>,
}

#[derive(Debug, Clone)]
pub struct IslandAnalysis {
    pub islands: Vec<Island>,
    /// Island id per bus, indexed by 0-based bus index
    pub assignments: Vec<usize>,
}

/// Bus graph with one edge per series branch (lines and transformers).
pub fn topology_graph(network: &Network) -> UnGraph<BusId, ()> {
    let mut graph = UnGraph::with_capacity(network.bus_count(), 0);
    for bus in network.buses() {
        graph.add_node(bus.id);
    }
    let edges = network
        .lines()
        .map(|l| (l.from, l.to))
        .chain(network.transformers().map(|t| (t.from, t.to)));
    for (from, to) in edges {
        graph.add_edge(NodeIndex::new(from.index()), NodeIndex::new(to.index()), ());
    }
    graph
}

/// Graph of nonzero off-diagonal couplings in an admittance matrix.
fn coupling_graph(matrix: &AdmittanceMatrix) -> UnGraph<usize, ()> {
    let n = matrix.n_bus();
    let mut graph = UnGraph::with_capacity(n, 0);
    for i in 0..n {
        graph.add_node(i);
    }
    for i in 0..n {
        for j in i + 1..n {
            if matrix.get(i, j).norm() > COUPLING_EPS || matrix.get(j, i).norm() > COUPLING_EPS {
                graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
            }
        }
    }
    graph
}

/// Label connected components breadth-first.
fn components<N>(graph: &UnGraph<N, ()>) -> Vec<Vec<NodeIndex>> {
    let mut visited = vec![false; graph.node_count()];
    let mut groups = Vec::new();
    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        visited[start.index()] = true;
        while let Some(node) = queue.pop_front() {
            members.push(node);
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort();
        groups.push(members);
    }
    groups
}

/// Electrical islands of the positive-sequence topology.
pub fn find_islands(network: &Network) -> IslandAnalysis {
    let graph = topology_graph(network);
    let mut assignments = vec![0; graph.node_count()];
    let islands = components(&graph)
        .into_iter()
        .enumerate()
        .map(|(island_id, members)| {
            for node in &members {
                assignments[node.index()] = island_id;
            }
            Island {
                island_id,
                buses: members.iter().map(|node| graph[*node]).collect(),
            }
        })
        .collect();
    IslandAnalysis {
        islands,
        assignments,
    }
}

/// Flags buses that have no admittance path to ground in `matrix`.
///
/// A connected group whose rows all sum to zero (no shunt element anywhere)
/// makes the matrix singular. In a zero-sequence network this is the normal
/// state of buses behind a delta winding with no grounded source, and the
/// impedance seen from them is infinite.
pub fn floating_buses(matrix: &AdmittanceMatrix) -> Vec<bool> {
    let graph = coupling_graph(matrix);
    let mut floating = vec![false; matrix.n_bus()];
    for members in components(&graph) {
        let grounded = members
            .iter()
            .any(|node| matrix.row_sum(node.index()).norm() > 1e-9);
        if !grounded {
            for node in members {
                floating[node.index()] = true;
            }
        }
    }
    floating
}
