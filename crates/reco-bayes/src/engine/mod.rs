//! The inference engine for discrete Bayesian networks.
//!
//! This module provides:
//! - **errors**: Error types for construction and inference failures
//! - **descriptor**: Decoded network descriptions handed in by deserializers
//! - **network**: The discrete factor model (nodes, outcomes, CPTs)
//! - **potential**: Flat multi-dimensional tables over clique scopes
//! - **junction_tree**: Moralization, triangulation, and clique-tree assembly
//! - **inference**: Evidence handling and two-phase belief propagation

pub mod descriptor;
pub mod errors;
pub mod inference;
pub mod junction_tree;
pub mod network;
pub mod potential;
