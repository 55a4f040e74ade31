//! Explainable drought risk scoring for migratory-bird corridor nodes.
//!
//! Pipeline per evaluation: build the corridor graph, filter it to one
//! species, score bottlenecks, pick the drought signals for the month and
//! region, then combine hazard, exposure and sensitivity into a 0-100 risk.

pub mod config;
pub mod graph;
pub mod models;
pub mod report;
pub mod risk;
pub mod signals;

pub use graph::{bottleneck_scores, build_corridor_graph, subgraph_for_species, CorridorGraph};
pub use models::{Cdi, DroughtSignals, RiskLevel, RiskResult, Weights};
pub use risk::compute_risk;
pub use signals::{load_drought_table, pick_signals, DroughtTable, SignalError};
