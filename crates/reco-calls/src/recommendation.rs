//! Ranked recommendations and ranking helpers.

use std::cmp::Ordering;
use std::fmt;

/// A ranked proposal with a relevance in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<T> {
    proposal: T,
    relevance: f64,
}

impl<T> Recommendation<T> {
    /// Pairs a proposal with its relevance.
    ///
    /// # Panics
    ///
    /// Panics if `relevance` is outside `[0, 1]`.
    pub fn new(proposal: T, relevance: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&relevance),
            "relevance {relevance} must be in [0, 1]"
        );
        Self {
            proposal,
            relevance,
        }
    }

    /// The proposed value.
    pub fn proposal(&self) -> &T {
        &self.proposal
    }

    /// Consumes the recommendation, returning the proposal.
    pub fn into_proposal(self) -> T {
        self.proposal
    }

    /// Probability that the proposal applies, given the current evidence.
    pub fn relevance(&self) -> f64 {
        self.relevance
    }
}

impl<T: fmt::Display> fmt::Display for Recommendation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4})", self.proposal, self.relevance)
    }
}

/// Predicate keeping recommendations at or above `min` relevance.
pub fn min_relevance<T>(min: f64) -> impl Fn(&Recommendation<T>) -> bool {
    move |recommendation| recommendation.relevance >= min
}

/// Comparator ordering by descending relevance.
///
/// Ties fall back to the proposal's display form so the resulting order is a
/// deterministic strict weak ordering.
pub fn by_relevance<T: fmt::Display>(
) -> impl FnMut(&Recommendation<T>, &Recommendation<T>) -> Ordering {
    |left, right| {
        right
            .relevance
            .total_cmp(&left.relevance)
            .then_with(|| left.proposal.to_string().cmp(&right.proposal.to_string()))
    }
}

/// Applies a caller-supplied filter and comparator, then truncates.
pub(crate) fn filter_sort_truncate<T>(
    mut recommendations: Vec<Recommendation<T>>,
    filter: impl Fn(&Recommendation<T>) -> bool,
    mut comparator: impl FnMut(&Recommendation<T>, &Recommendation<T>) -> Ordering,
    max_length: usize,
) -> Vec<Recommendation<T>> {
    recommendations.retain(|recommendation| filter(recommendation));
    recommendations.sort_by(|left, right| comparator(left, right));
    recommendations.truncate(max_length);
    recommendations
}
