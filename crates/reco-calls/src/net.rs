//! The per-type call-recommendation facade.
//!
//! Expected network structure:
//! - every node has at least two states, the first conventionally a dummy
//!   state named [`crate::constants::DUMMY_STATE`];
//! - four singleton nodes addressed by the identifiers in
//!   [`crate::constants`]: the context node (outcomes are enclosing-method
//!   identifiers), the call-group node (outcomes are pattern labels), the
//!   definition node (outcomes are defining-method identifiers), and the
//!   kind node (outcomes from [`crate::kind::DefinitionKind`]);
//! - every remaining node is a per-method node whose identifier is a
//!   fully-qualified method name and whose outcomes include the true/false
//!   states.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use reco_bayes::{BayesError, BayesNet, JunctionTreeInference, NetworkDescriptor, NodeId};

use crate::constants::{
    CALL_GROUPS_NODE, CONTEXT_NODE, DEFINITION_KIND_NODE, DEFINITION_NODE, DUMMY_METHOD,
    FALSE_STATE, NO_METHOD, NULL_METHOD, TRUE_STATE, UNKNOWN_METHOD,
};
use crate::kind::DefinitionKind;
use crate::names::{MethodName, TypeName};
use crate::recommendation::{filter_sort_truncate, Recommendation};

/// Definition outcomes at or below this belief are never recommended.
const DEFINITION_BELIEF_FLOOR: f64 = 0.05;

/// A recommendation session for one receiver type.
///
/// Owns the network and its inference state. Observations accumulate as
/// evidence until [`CallRecommendationNet::reset`]; recommendation queries
/// trigger any pending propagation and are otherwise read-only.
#[derive(Debug, Clone)]
pub struct CallRecommendationNet {
    receiver_type: TypeName,
    net: Arc<BayesNet>,
    inference: JunctionTreeInference,
    context_node: NodeId,
    call_group_node: NodeId,
    definition_node: NodeId,
    kind_node: NodeId,
    call_nodes: BTreeMap<MethodName, NodeId>,
}

impl CallRecommendationNet {
    /// Builds a facade around one decoded network.
    ///
    /// Fails with [`BayesError::InvalidModel`] when any of the four singleton
    /// nodes is missing, a per-method node lacks the true/false states, or
    /// the network itself is malformed. Construction either fully succeeds
    /// or leaves nothing behind.
    pub fn new(
        receiver_type: TypeName,
        descriptor: &NetworkDescriptor,
    ) -> Result<Self, BayesError> {
        let net = Arc::new(BayesNet::from_descriptor(descriptor)?);

        let context_node = require_singleton(&net, CONTEXT_NODE)?;
        let call_group_node = require_singleton(&net, CALL_GROUPS_NODE)?;
        let definition_node = require_singleton(&net, DEFINITION_NODE)?;
        let kind_node = require_singleton(&net, DEFINITION_KIND_NODE)?;
        let singletons = [context_node, call_group_node, definition_node, kind_node];

        let mut call_nodes = BTreeMap::new();
        for id in net.node_ids() {
            if singletons.contains(&id) {
                continue;
            }
            let node = net.node(id);
            for state in [TRUE_STATE, FALSE_STATE] {
                if node.outcome_index(state).is_none() {
                    return Err(BayesError::InvalidModel(format!(
                        "method node '{}' lacks a '{state}' outcome",
                        node.identifier()
                    )));
                }
            }
            call_nodes.insert(MethodName::new(node.identifier()), id);
        }

        let inference = JunctionTreeInference::compile(Arc::clone(&net))?;
        Ok(Self {
            receiver_type,
            net,
            inference,
            context_node,
            call_group_node,
            definition_node,
            kind_node,
            call_nodes,
        })
    }

    /// The type this net makes recommendations for.
    pub fn receiver_type(&self) -> &TypeName {
        &self.receiver_type
    }

    /// Clears all observations, putting the network back in its prior state.
    ///
    /// The compiled junction tree and potentials are kept.
    pub fn reset(&mut self) {
        self.inference.clear_evidence();
    }

    /// Whether the accumulated observations are satisfiable under the model.
    pub fn is_consistent(&mut self) -> bool {
        self.inference.is_consistent()
    }

    // ---- observations -----------------------------------------------------

    /// Observes the method enclosing the completion site.
    ///
    /// `None` is substituted with the unknown-method sentinel. Returns
    /// whether the resulting identifier is among the context node's
    /// outcomes; nothing is recorded otherwise.
    pub fn set_observed_enclosing_method(&mut self, method: Option<&MethodName>) -> bool {
        let identifier = method.map_or(UNKNOWN_METHOD, MethodName::identifier);
        self.observe_singleton(self.context_node, identifier)
    }

    /// Observes how the variable was defined.
    ///
    /// `None` is substituted with the dummy-method sentinel. Returns whether
    /// the identifier is among the definition node's outcomes.
    pub fn set_observed_definition(&mut self, definition: Option<&MethodName>) -> bool {
        let identifier = definition.map_or(DUMMY_METHOD, MethodName::identifier);
        self.observe_singleton(self.definition_node, identifier)
    }

    /// Observes the definition-site kind.
    ///
    /// `None` is substituted with [`DefinitionKind::Unknown`]. Returns
    /// whether the kind's label is among the kind node's outcomes.
    pub fn set_observed_kind(&mut self, kind: Option<DefinitionKind>) -> bool {
        let label = kind.unwrap_or(DefinitionKind::Unknown).label();
        self.observe_singleton(self.kind_node, label)
    }

    /// Observes an abstract usage pattern by label.
    ///
    /// Does nothing and returns `false` when the label is unknown.
    pub fn set_observed_pattern(&mut self, pattern: &str) -> bool {
        self.observe_singleton(self.call_group_node, pattern)
    }

    /// Flags one method as called.
    ///
    /// The name must already be rebased onto this net's receiver type;
    /// [`CallRecommendationNet::set_observed_calls`] does that for whole
    /// sets. Returns whether a matching per-method node exists.
    pub fn set_observed_call(&mut self, method: &MethodName) -> bool {
        self.set_called(method, TRUE_STATE)
    }

    /// Flags a set of methods as called, keeping earlier observations.
    ///
    /// Every member is rebased onto the receiver type first. Afterwards the
    /// no-method sentinel is pinned to false, encoding that the observed
    /// call set is exhaustive. Returns `true` only when every method (and
    /// the sentinel) had a matching node.
    pub fn set_observed_calls(&mut self, methods: &BTreeSet<MethodName>) -> bool {
        let mut all_known = true;
        for method in methods {
            let rebased = method.rebase(&self.receiver_type);
            all_known &= self.set_observed_call(&rebased);
        }
        let no_method = MethodName::new(NO_METHOD).rebase(&self.receiver_type);
        all_known &= self.set_called(&no_method, FALSE_STATE);
        all_known
    }

    /// Pins a per-method node to an explicit true/false state.
    ///
    /// A later call for the same method overwrites the earlier state.
    /// Returns whether a matching node with that state exists.
    pub fn set_called(&mut self, method: &MethodName, state: &str) -> bool {
        let Some(&node) = self.call_nodes.get(method) else {
            return false;
        };
        match self.net.node(node).outcome_index(state) {
            Some(outcome) => {
                self.inference.set_outcome(node, outcome);
                true
            }
            None => false,
        }
    }

    fn observe_singleton(&mut self, node: NodeId, label: &str) -> bool {
        match self.net.node(node).outcome_index(label) {
            Some(outcome) => {
                self.inference.set_outcome(node, outcome);
                true
            }
            None => false,
        }
    }

    // ---- observation read-back --------------------------------------------

    /// The currently observed enclosing method, if any.
    pub fn observed_enclosing_method(&self) -> Option<MethodName> {
        self.inference
            .evidence_outcome(self.context_node)
            .map(MethodName::new)
    }

    /// The currently observed defining method, if any.
    pub fn observed_definition(&self) -> Option<MethodName> {
        self.inference
            .evidence_outcome(self.definition_node)
            .map(MethodName::new)
    }

    /// The currently observed definition kind, if any.
    pub fn observed_kind(&self) -> Option<DefinitionKind> {
        self.inference
            .evidence_outcome(self.kind_node)
            .and_then(DefinitionKind::from_label)
    }

    /// All methods currently flagged as called, excluding the null sentinel.
    pub fn observed_calls(&self) -> BTreeSet<MethodName> {
        self.call_nodes
            .iter()
            .filter(|(method, &node)| {
                self.inference.evidence_outcome(node) == Some(TRUE_STATE)
                    && method.identifier() != NULL_METHOD
            })
            .map(|(method, _)| method.clone())
            .collect()
    }

    // ---- introspection ----------------------------------------------------

    /// All callable methods this net knows about.
    pub fn known_calls(&self) -> BTreeSet<MethodName> {
        self.call_nodes.keys().cloned().collect()
    }

    /// All enclosing methods this net can observe.
    pub fn known_enclosing_methods(&self) -> BTreeSet<MethodName> {
        self.net
            .node(self.context_node)
            .outcomes()
            .iter()
            .map(|outcome| MethodName::new(outcome))
            .collect()
    }

    /// All pattern labels this net can observe.
    pub fn known_patterns(&self) -> BTreeSet<String> {
        self.net
            .node(self.call_group_node)
            .outcomes()
            .iter()
            .map(|outcome| outcome.to_string())
            .collect()
    }

    // ---- recommendations --------------------------------------------------

    /// Ranked methods to call next.
    ///
    /// Every per-method node not already pinned as evidence contributes its
    /// true-state belief, so already-observed calls are excluded by
    /// construction. The caller's filter and comparator shape the result,
    /// which is truncated to `max_length`.
    pub fn recommended_calls<F, C>(
        &mut self,
        filter: F,
        comparator: C,
        max_length: usize,
    ) -> Vec<Recommendation<MethodName>>
    where
        F: Fn(&Recommendation<MethodName>) -> bool,
        C: FnMut(&Recommendation<MethodName>, &Recommendation<MethodName>) -> Ordering,
    {
        let mut candidates = Vec::new();
        for (method, &node) in &self.call_nodes {
            if self.inference.evidence().contains_key(&node) {
                continue;
            }
            let Some(true_index) = self.net.node(node).outcome_index(TRUE_STATE) else {
                continue;
            };
            let beliefs = self.inference.beliefs(node);
            candidates.push(Recommendation::new(method.clone(), beliefs[true_index]));
        }
        filter_sort_truncate(candidates, filter, comparator, max_length)
    }

    /// Ranked ways the variable was likely defined.
    ///
    /// Outcomes with belief at or below the internal floor are skipped, as
    /// are the no-method and unknown-method sentinels.
    pub fn recommended_definitions<F, C>(
        &mut self,
        filter: F,
        comparator: C,
        max_length: usize,
    ) -> Vec<Recommendation<MethodName>>
    where
        F: Fn(&Recommendation<MethodName>) -> bool,
        C: FnMut(&Recommendation<MethodName>, &Recommendation<MethodName>) -> Ordering,
    {
        let beliefs = self.inference.beliefs(self.definition_node);
        let node = self.net.node(self.definition_node);
        let mut candidates = Vec::new();
        for (index, outcome) in node.outcomes().iter().enumerate() {
            if beliefs[index] <= DEFINITION_BELIEF_FLOOR {
                continue;
            }
            if outcome.as_ref() == NO_METHOD || outcome.as_ref() == UNKNOWN_METHOD {
                continue;
            }
            candidates.push(Recommendation::new(MethodName::new(outcome), beliefs[index]));
        }
        filter_sort_truncate(candidates, filter, comparator, max_length)
    }

    /// Ranked usage patterns, one entry per call-group outcome.
    pub fn recommended_patterns<F, C>(
        &mut self,
        filter: F,
        comparator: C,
        max_length: usize,
    ) -> Vec<Recommendation<String>>
    where
        F: Fn(&Recommendation<String>) -> bool,
        C: FnMut(&Recommendation<String>, &Recommendation<String>) -> Ordering,
    {
        let beliefs = self.inference.beliefs(self.call_group_node);
        let node = self.net.node(self.call_group_node);
        let candidates = node
            .outcomes()
            .iter()
            .enumerate()
            .map(|(index, outcome)| Recommendation::new(outcome.to_string(), beliefs[index]))
            .collect();
        filter_sort_truncate(candidates, filter, comparator, max_length)
    }
}

fn require_singleton(net: &Arc<BayesNet>, identifier: &str) -> Result<NodeId, BayesError> {
    net.node_by_identifier(identifier).ok_or_else(|| {
        BayesError::InvalidModel(format!("network is missing required node '{identifier}'"))
    })
}
