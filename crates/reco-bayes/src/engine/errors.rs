//! Error types for network construction and inference.

use thiserror::Error;

/// Errors raised while building networks, compiling junction trees, or
/// absorbing evidence.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes. All public APIs return
/// `Result<T, BayesError>` to avoid panics in library code.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BayesError {
    /// Structural defect in a network: a missing required node, a node with
    /// fewer than two outcomes, a malformed CPT, a duplicate label, or a
    /// cycle in the parent graph.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// An evidence label that is not among the target node's outcomes.
    #[error("unknown outcome: {0}")]
    UnknownOutcome(String),

    /// Propagation produced an all-zero potential (contradictory evidence).
    #[error("inconsistent evidence: {0}")]
    Inconsistent(String),

    /// A lookup by identifier failed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal invariant violation (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
