//! # Reco Calls
//!
//! A per-type call-recommendation facade over discrete Bayesian networks.
//!
//! Each [`CallRecommendationNet`] wraps one pre-trained network for one
//! receiver type. Callers push observations about a variable (enclosing
//! method, definition site, already-seen calls) and pull ranked
//! recommendations of which methods to call next, how the variable was
//! likely defined, and which usage patterns it belongs to.
//!
//! Modules:
//! - **constants**: Node identifiers and sentinel states recognized inside
//!   call networks
//! - **kind**: The closed set of definition-site kinds
//! - **names**: Fully-qualified type and method names with rebasing
//! - **recommendation**: Ranked results plus filter/comparator helpers
//! - **net**: The facade itself
//! - **usage**: Replaying a whole observed usage in one call

#![forbid(unsafe_code)]

pub mod constants;
pub mod kind;
pub mod names;
pub mod net;
pub mod recommendation;
pub mod usage;

pub use kind::DefinitionKind;
pub use names::{MethodName, TypeName};
pub use net::CallRecommendationNet;
pub use recommendation::{by_relevance, min_relevance, Recommendation};
pub use usage::{recommend_for_usage, ObjectUsage};
