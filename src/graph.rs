//! Migratory corridor graph and bottleneck scoring.
//!
//! The reference corridor is a static table of habitat nodes and
//! species-tagged directed edges. Species subgraphs keep every node so that
//! isolated habitats still get a (zero) bottleneck score.

use std::collections::{BTreeMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

pub const NODES: [&str; 6] = ["Camargue", "Kerkini", "Tuna", "Gediz", "Tuz", "EastMed"];

pub const EDGES: [(&str, &str, &str); 6] = [
    ("Camargue", "Kerkini", "Flamingo"),
    ("Kerkini", "Gediz", "Flamingo"),
    ("Gediz", "Tuz", "Flamingo"),
    ("Tuna", "Kerkini", "Pelican"),
    ("Kerkini", "Gediz", "Pelican"),
    ("Gediz", "EastMed", "Pelican"),
];

/// Approximate (lat, lon) of each habitat node.
const LOCATIONS: [(&str, f64, f64); 6] = [
    ("Camargue", 43.52, 4.42),
    ("Kerkini", 41.21, 23.10),
    ("Tuna", 45.20, 29.60),
    ("Gediz", 38.52, 26.95),
    ("Tuz", 38.73, 33.33),
    ("EastMed", 34.90, 35.20),
];

pub type BottleneckScores = BTreeMap<String, f64>;

#[derive(Debug, Clone, Default)]
pub struct CorridorGraph {
    inner: DiGraph<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorridorEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub species: &'a str,
}

impl CorridorGraph {
    /// Build a graph from explicit node and edge tables. Edges whose
    /// endpoints are not in `nodes` or whose species tag is empty are skipped.
    pub fn from_tables(nodes: &[&str], edges: &[(&str, &str, &str)]) -> CorridorGraph {
        let mut inner = DiGraph::new();
        let mut index: BTreeMap<&str, NodeIndex> = BTreeMap::new();

        for &name in nodes {
            if !index.contains_key(name) {
                index.insert(name, inner.add_node(name.to_string()));
            }
        }

        for &(source, target, species) in edges {
            if species.is_empty() {
                tracing::warn!(source, target, "skipping corridor edge without species tag");
                continue;
            }
            match (index.get(source), index.get(target)) {
                (Some(&a), Some(&b)) => {
                    inner.add_edge(a, b, species.to_string());
                }
                _ => tracing::warn!(source, target, "skipping corridor edge with unknown endpoint"),
            }
        }

        CorridorGraph { inner }
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.inner.node_weights().map(String::as_str)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes().any(|n| n == name)
    }

    pub fn edges(&self) -> impl Iterator<Item = CorridorEdge<'_>> {
        self.inner.edge_references().map(|e| CorridorEdge {
            source: self.inner[e.source()].as_str(),
            target: self.inner[e.target()].as_str(),
            species: e.weight().as_str(),
        })
    }

    /// Distinct species tags in edge order.
    pub fn species(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for edge in self.inner.edge_weights() {
            if !seen.contains(&edge.as_str()) {
                seen.push(edge.as_str());
            }
        }
        seen
    }
}

pub fn build_corridor_graph() -> CorridorGraph {
    CorridorGraph::from_tables(&NODES, &EDGES)
}

/// All nodes of `graph`, only edges tagged exactly `species`.
pub fn subgraph_for_species(graph: &CorridorGraph, species: &str) -> CorridorGraph {
    let mut inner = DiGraph::with_capacity(graph.node_count(), graph.edge_count());

    // Nodes are re-added in index order, so indices carry over unchanged.
    for name in graph.inner.node_weights() {
        inner.add_node(name.clone());
    }
    for edge in graph.inner.edge_references() {
        if edge.weight() == species {
            inner.add_edge(edge.source(), edge.target(), edge.weight().clone());
        }
    }

    CorridorGraph { inner }
}

/// Directed betweenness centrality (Brandes), normalised by `(n-1)(n-2)`.
///
/// Parallel edges are collapsed so they count as a single path. Every node
/// is present in the result.
pub fn bottleneck_scores(graph: &CorridorGraph) -> BottleneckScores {
    let g = &graph.inner;
    let n = g.node_count();

    let adjacency: Vec<Vec<usize>> = g
        .node_indices()
        .map(|v| {
            let mut out: Vec<usize> = g
                .neighbors_directed(v, Direction::Outgoing)
                .map(|w| w.index())
                .collect();
            out.sort_unstable();
            out.dedup();
            out
        })
        .collect();

    let mut betweenness = vec![0.0_f64; n];

    for source in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut num_paths = vec![0.0_f64; n];
        let mut distance = vec![-1_i64; n];
        num_paths[source] = 1.0;
        distance[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if distance[w] < 0 {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    num_paths[w] += num_paths[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut dependency = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                dependency[v] += (num_paths[v] / num_paths[w]) * (1.0 + dependency[w]);
            }
            if w != source {
                betweenness[w] += dependency[w];
            }
        }
    }

    let scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        1.0
    };

    g.node_indices()
        .map(|v| (g[v].clone(), betweenness[v.index()] * scale))
        .collect()
}

pub fn node_location(name: &str) -> Option<(f64, f64)> {
    LOCATIONS
        .iter()
        .find(|(node, _, _)| *node == name)
        .map(|&(_, lat, lon)| (lat, lon))
}
