//! Replaying a whole observed usage against a recommendation net.

use std::collections::BTreeSet;

use crate::constants::UNKNOWN_METHOD;
use crate::kind::DefinitionKind;
use crate::names::MethodName;
use crate::net::CallRecommendationNet;
use crate::recommendation::{by_relevance, min_relevance, Recommendation};

/// Relevance floor of the default call query.
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.1;

/// Maximum number of calls returned by the default query.
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;

/// Everything observed about one variable at a completion site.
#[derive(Debug, Clone, Default)]
pub struct ObjectUsage {
    /// The method enclosing the completion site.
    pub enclosing_method: Option<MethodName>,
    /// How the variable was defined.
    pub kind: Option<DefinitionKind>,
    /// The method that defined the variable.
    pub definition: Option<MethodName>,
    /// Methods already called on the variable.
    pub calls: BTreeSet<MethodName>,
}

/// Resets `net`, applies every observation of `usage`, and runs the default
/// call query.
///
/// A definition equal to the unknown-method sentinel is treated as absent,
/// matching how recorded usages encode "definition not resolved".
pub fn recommend_for_usage(
    net: &mut CallRecommendationNet,
    usage: &ObjectUsage,
) -> Vec<Recommendation<MethodName>> {
    net.reset();
    net.set_observed_enclosing_method(usage.enclosing_method.as_ref());
    net.set_observed_kind(usage.kind);
    if let Some(definition) = &usage.definition {
        if definition.identifier() != UNKNOWN_METHOD {
            net.set_observed_definition(Some(definition));
        }
    }
    net.set_observed_calls(&usage.calls);
    net.recommended_calls(
        min_relevance(DEFAULT_MIN_RELEVANCE),
        by_relevance(),
        DEFAULT_MAX_RECOMMENDATIONS,
    )
}
