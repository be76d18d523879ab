//! # Reco Bayes
//!
//! Discrete Bayesian networks with exact junction-tree inference.
//!
//! The crate is organized into a single `engine` module tree:
//!
//! - **errors**: Error types for model construction and inference failures
//! - **descriptor**: The decoded form of one serialized network
//! - **network**: Nodes, outcomes, parent arcs, and conditional probability
//!   tables with a fixed stride convention
//! - **potential**: Flat discrete tables over clique scopes
//! - **junction_tree**: One-shot compilation of a network into a clique tree
//! - **inference**: Evidence absorption, two-phase message passing, and
//!   marginal queries

#![forbid(unsafe_code)]

pub mod engine;

pub use engine::descriptor::{NetworkDescriptor, NodeDescriptor};
pub use engine::errors::BayesError;
pub use engine::inference::JunctionTreeInference;
pub use engine::junction_tree::{JunctionTree, TreeStats};
pub use engine::network::{BayesNet, BayesNode, NodeId};
