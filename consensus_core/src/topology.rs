//! Network topology generation.
//!
//! Produces the undirected graph that decides which agents observe each
//! other. Three generators are provided: Erdős–Rényi, cycle and complete.

use crate::config::TopologyKind;
use crate::error::SimError;
use rand::Rng;
use std::collections::VecDeque;
use tracing::warn;

/// Edge probability used when the requested topology is not recognised.
pub const FALLBACK_CONNECTION_PROBABILITY: f64 = 0.3;

/// Undirected graph over nodes `0..n` without self-loops or parallel edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    /// Adjacency list: node -> neighbours in ascending order
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// Creates a graph of `n` isolated nodes.
    pub fn empty(n: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); n],
        }
    }

    /// Creates a graph from an explicit edge list.
    ///
    /// Self-loops and repeated edges are dropped. Endpoints must be `< n`.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, SimError> {
        let mut graph = Self::empty(n);
        for &(from, to) in edges {
            if from >= n || to >= n {
                return Err(SimError::InvalidEdge { from, to, nodes: n });
            }
            graph.add_edge(from, to);
        }
        Ok(graph)
    }

    /// Connects `a` and `b` in both directions.
    fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        Self::insert_sorted(&mut self.adjacency[a], b);
        Self::insert_sorted(&mut self.adjacency[b], a);
    }

    fn insert_sorted(list: &mut Vec<usize>, node: usize) {
        if let Err(pos) = list.binary_search(&node) {
            list.insert(pos, node);
        }
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Returns the neighbours of a node, ascending.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Returns the degree of a node.
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    /// Returns true if `a` and `b` share an edge.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Iterates each undirected edge once as `(low, high)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(a, neighbors)| {
            neighbors
                .iter()
                .copied()
                .filter(move |&b| b > a)
                .map(move |b| (a, b))
        })
    }

    /// Breadth-first hop distances from `source`; `None` marks unreachable nodes.
    fn distances_from(&self, source: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.node_count()];
        let mut queue = VecDeque::new();
        dist[source] = Some(0);
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            let next = dist[node].map_or(0, |d| d + 1);
            for &neighbor in self.neighbors(node) {
                if dist[neighbor].is_none() {
                    dist[neighbor] = Some(next);
                    queue.push_back(neighbor);
                }
            }
        }

        dist
    }

    /// Returns true if every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        if self.node_count() == 0 {
            return true;
        }
        self.distances_from(0).iter().all(Option::is_some)
    }

    /// Longest shortest-path distance between any two nodes.
    ///
    /// Returns `None` for a disconnected graph.
    pub fn diameter(&self) -> Option<usize> {
        let mut diameter = 0;
        for source in 0..self.node_count() {
            for d in self.distances_from(source) {
                diameter = diameter.max(d?);
            }
        }
        Some(diameter)
    }
}

/// Builds graphs for a [`TopologyKind`].
pub struct TopologyBuilder;

impl TopologyBuilder {
    /// Builds a graph of `n` nodes.
    ///
    /// `connection_probability` is only read for [`TopologyKind::Random`].
    /// An unrecognised kind is not an error: it logs a warning and falls back
    /// to a random graph with [`FALLBACK_CONNECTION_PROBABILITY`].
    pub fn build<R: Rng + ?Sized>(
        kind: &TopologyKind,
        n: usize,
        connection_probability: f64,
        rng: &mut R,
    ) -> Graph {
        match kind {
            TopologyKind::Random => erdos_renyi(n, connection_probability, rng),
            TopologyKind::Ring => ring(n),
            TopologyKind::FullyConnected => complete(n),
            TopologyKind::Unrecognized(name) => {
                warn!(
                    "Unknown topology {}, defaulting to random (p={})",
                    name, FALLBACK_CONNECTION_PROBABILITY
                );
                erdos_renyi(n, FALLBACK_CONNECTION_PROBABILITY, rng)
            }
        }
    }
}

/// G(n, p): each of the n(n-1)/2 possible edges is included independently.
pub fn erdos_renyi<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Graph {
    let p = p.clamp(0.0, 1.0);
    let mut graph = Graph::empty(n);
    for a in 0..n {
        for b in (a + 1)..n {
            if rng.gen_bool(p) {
                graph.add_edge(a, b);
            }
        }
    }
    graph
}

/// Cycle connecting node `i` to `i + 1 mod n`.
pub fn ring(n: usize) -> Graph {
    let mut graph = Graph::empty(n);
    if n < 2 {
        return graph;
    }
    for i in 0..n {
        graph.add_edge(i, (i + 1) % n);
    }
    graph
}

/// Complete graph on `n` nodes.
pub fn complete(n: usize) -> Graph {
    let mut graph = Graph::empty(n);
    for a in 0..n {
        for b in (a + 1)..n {
            graph.add_edge(a, b);
        }
    }
    graph
}
