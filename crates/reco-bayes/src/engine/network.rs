//! The discrete factor model: nodes, outcomes, parent arcs, and CPTs.
//!
//! A [`BayesNet`] is a directed acyclic graph over discrete nodes. Each node
//! carries an ordered outcome list and a flat conditional probability table
//! whose layout is fixed by the stride convention of [`BayesNet::cpt_index`]:
//! the node's own outcome varies fastest, followed by the declared parents in
//! order. All downstream code assumes this layout and never reorders parents.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::descriptor::NetworkDescriptor;
use crate::engine::errors::BayesError;

/// Tolerance when checking that a CPT row sums to one.
///
/// Rows off by more than this are still accepted and renormalized silently;
/// rows with no mass at all are kept as-is so degenerate models stay
/// representable.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Mass below which a CPT row is treated as all-zero rather than normalized.
const ROW_MASS_FLOOR: f64 = 1e-12;

/// Inline capacity for parent lists.
const INLINE_PARENTS: usize = 4;

/// Inline capacity for CPT family stride lists (owning node plus parents).
const INLINE_FAMILY: usize = 8;

/// Per-member CPT strides for a family of outcome cardinalities, owning node
/// first, then parents in declared order.
///
/// This is the single implementation of the CPT layout: with the returned
/// strides, `index = Σ outcome_i * stride_i` expands to
/// `self_idx + |self| * (p0_idx + |p0| * (p1_idx + ...))` — the owning
/// outcome varies fastest, then the parents in order. Both
/// [`BayesNet::cpt_index`] and the clique-table CPT broadcast go through it.
pub(crate) fn cpt_strides(cardinalities: &[usize]) -> SmallVec<[usize; INLINE_FAMILY]> {
    let mut strides = SmallVec::with_capacity(cardinalities.len());
    let mut stride = 1usize;
    for &cardinality in cardinalities {
        strides.push(stride);
        stride *= cardinality;
    }
    strides
}

/// A unique identifier for a node within one network.
///
/// NodeId implements Ord/PartialOrd for stable, deterministic iteration.
/// Uses u32 internally for efficient storage and indexing.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the id as a plain index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single discrete node: ordered outcomes, parent arcs, and a CPT.
#[derive(Debug, Clone)]
pub struct BayesNode {
    identifier: Arc<str>,
    outcomes: Vec<Arc<str>>,
    outcome_index: FxHashMap<Arc<str>, usize>,
    parents: SmallVec<[NodeId; INLINE_PARENTS]>,
    cpt: Vec<f64>,
}

impl BayesNode {
    fn new(identifier: Arc<str>) -> Self {
        Self {
            identifier,
            outcomes: Vec::new(),
            outcome_index: FxHashMap::default(),
            parents: SmallVec::new(),
            cpt: Vec::new(),
        }
    }

    /// The node's identifier, unique within its network.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Ordered outcome labels.
    pub fn outcomes(&self) -> &[Arc<str>] {
        &self.outcomes
    }

    /// Number of outcomes.
    pub fn outcome_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Position of `label` among the outcomes, if present.
    pub fn outcome_index(&self, label: &str) -> Option<usize> {
        self.outcome_index.get(label).copied()
    }

    /// Declared parents, in CPT stride order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Read-only view of the flat CPT.
    pub fn probabilities(&self) -> &[f64] {
        &self.cpt
    }
}

/// A directed acyclic graph of discrete nodes, addressable by identifier.
#[derive(Debug, Clone, Default)]
pub struct BayesNet {
    nodes: Vec<BayesNode>,
    by_identifier: FxHashMap<Arc<str>, NodeId>,
}

impl BayesNet {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a network from a decoded description.
    ///
    /// Mirrors the three construction passes of the wire format: all nodes
    /// and outcomes first, then parent arcs (which may refer forward), then
    /// probabilities. The result is validated before it is returned, so no
    /// partially initialized network ever escapes.
    pub fn from_descriptor(descriptor: &NetworkDescriptor) -> Result<Self, BayesError> {
        let mut net = BayesNet::new();

        let mut ids = Vec::with_capacity(descriptor.nodes.len());
        for node in &descriptor.nodes {
            let id = net.add_node(&node.identifier)?;
            for outcome in &node.outcomes {
                net.add_outcome(id, outcome)?;
            }
            ids.push(id);
        }

        for (node, &id) in descriptor.nodes.iter().zip(&ids) {
            let mut parents = SmallVec::<[NodeId; INLINE_PARENTS]>::new();
            for parent in &node.parents {
                let parent_id = net.node_by_identifier(parent).ok_or_else(|| {
                    BayesError::InvalidModel(format!(
                        "node '{}' references undeclared parent '{}'",
                        node.identifier, parent
                    ))
                })?;
                parents.push(parent_id);
            }
            net.set_parents(id, &parents)?;
        }

        for (node, &id) in descriptor.nodes.iter().zip(&ids) {
            net.set_probabilities(id, node.probabilities.clone())?;
        }

        net.validate()?;
        Ok(net)
    }

    /// Adds a node with the given identifier and no outcomes yet.
    pub fn add_node(&mut self, identifier: &str) -> Result<NodeId, BayesError> {
        if self.by_identifier.contains_key(identifier) {
            return Err(BayesError::InvalidModel(format!(
                "duplicate node identifier '{identifier}'"
            )));
        }
        let interned: Arc<str> = Arc::from(identifier);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(BayesNode::new(Arc::clone(&interned)));
        self.by_identifier.insert(interned, id);
        Ok(id)
    }

    /// Appends an outcome label to `node`, preserving insertion order.
    pub fn add_outcome(&mut self, node: NodeId, label: &str) -> Result<(), BayesError> {
        let entry = &mut self.nodes[node.index()];
        if !entry.cpt.is_empty() {
            return Err(BayesError::InvalidModel(format!(
                "node '{}': outcomes are fixed once probabilities are set",
                entry.identifier
            )));
        }
        if entry.outcome_index.contains_key(label) {
            return Err(BayesError::InvalidModel(format!(
                "node '{}': duplicate outcome label '{label}'",
                entry.identifier
            )));
        }
        let interned: Arc<str> = Arc::from(label);
        let position = entry.outcomes.len();
        entry.outcomes.push(Arc::clone(&interned));
        entry.outcome_index.insert(interned, position);
        Ok(())
    }

    /// Fixes the parent list of `node`, and thereby its CPT strides.
    ///
    /// Must be called before [`BayesNet::set_probabilities`].
    pub fn set_parents(&mut self, node: NodeId, parents: &[NodeId]) -> Result<(), BayesError> {
        for (position, parent) in parents.iter().enumerate() {
            if parent.index() >= self.nodes.len() {
                return Err(BayesError::InvalidModel(format!(
                    "parent id {parent:?} is out of range"
                )));
            }
            if parents[..position].contains(parent) {
                return Err(BayesError::InvalidModel(format!(
                    "node '{}': duplicate parent '{}'",
                    self.nodes[node.index()].identifier,
                    self.nodes[parent.index()].identifier
                )));
            }
        }
        let entry = &mut self.nodes[node.index()];
        if !entry.cpt.is_empty() {
            return Err(BayesError::InvalidModel(format!(
                "node '{}': parents are fixed once probabilities are set",
                entry.identifier
            )));
        }
        entry.parents = SmallVec::from_slice(parents);
        Ok(())
    }

    /// Installs the flat CPT of `node`.
    ///
    /// The array length must equal the product of all parent cardinalities
    /// times the node's own outcome count. Rows (slices over the node's
    /// outcomes for a fixed parent assignment) are renormalized silently when
    /// their mass deviates from one; rows without mass are kept as zeros.
    pub fn set_probabilities(
        &mut self,
        node: NodeId,
        mut probabilities: Vec<f64>,
    ) -> Result<(), BayesError> {
        let own_count = self.nodes[node.index()].outcome_count();
        if own_count < 2 {
            return Err(BayesError::InvalidModel(format!(
                "node '{}' needs at least two outcomes before probabilities",
                self.nodes[node.index()].identifier
            )));
        }
        let expected = self.expected_cpt_len(node);
        if probabilities.len() != expected {
            return Err(BayesError::InvalidModel(format!(
                "node '{}': CPT length {} does not match expected {}",
                self.nodes[node.index()].identifier,
                probabilities.len(),
                expected
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(BayesError::InvalidModel(format!(
                "node '{}': CPT entries must be finite and nonnegative",
                self.nodes[node.index()].identifier
            )));
        }
        for row in probabilities.chunks_mut(own_count) {
            let mass: f64 = row.iter().sum();
            if mass > ROW_MASS_FLOOR {
                for value in row {
                    *value /= mass;
                }
            }
        }
        self.nodes[node.index()].cpt = probabilities;
        Ok(())
    }

    /// Flat CPT index for the given own-outcome and parent-outcome indices.
    ///
    /// The layout is `self_idx + |self| * (p0_idx + |p0| * (p1_idx + ...))`:
    /// the node's own outcome varies fastest, then the declared parents in
    /// order. Shares its stride computation with the inference-time CPT
    /// broadcast, so the two can never disagree on the layout.
    pub fn cpt_index(&self, node: NodeId, self_outcome: usize, parent_outcomes: &[usize]) -> usize {
        let entry = &self.nodes[node.index()];
        debug_assert_eq!(parent_outcomes.len(), entry.parents.len());
        let cardinalities: SmallVec<[usize; INLINE_FAMILY]> =
            std::iter::once(entry.outcome_count())
                .chain(
                    entry
                        .parents
                        .iter()
                        .map(|parent| self.nodes[parent.index()].outcome_count()),
                )
                .collect();
        let strides = cpt_strides(&cardinalities);
        let mut index = self_outcome * strides[0];
        for (&outcome, &stride) in parent_outcomes.iter().zip(&strides[1..]) {
            index += outcome * stride;
        }
        index
    }

    /// Expected CPT length for `node` given its current outcomes and parents.
    pub fn expected_cpt_len(&self, node: NodeId) -> usize {
        let entry = &self.nodes[node.index()];
        entry
            .parents
            .iter()
            .map(|parent| self.nodes[parent.index()].outcome_count())
            .product::<usize>()
            * entry.outcome_count()
    }

    /// The node behind an id minted by this network.
    pub fn node(&self, id: NodeId) -> &BayesNode {
        &self.nodes[id.index()]
    }

    /// Looks a node up by identifier.
    pub fn node_by_identifier(&self, identifier: &str) -> Option<NodeId> {
        self.by_identifier.get(identifier).copied()
    }

    /// Looks a node up by identifier, failing with [`BayesError::NotFound`].
    pub fn require_node(&self, identifier: &str) -> Result<NodeId, BayesError> {
        self.node_by_identifier(identifier)
            .ok_or_else(|| BayesError::NotFound(format!("no node with identifier '{identifier}'")))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node ids in declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &BayesNode> {
        self.nodes.iter()
    }

    /// A parent-before-child ordering of all nodes.
    ///
    /// Fails with [`BayesError::InvalidModel`] when the parent graph has a
    /// cycle. Ties are broken by lower node index so the ordering is
    /// deterministic.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, BayesError> {
        let count = self.nodes.len();
        let mut in_degree = vec![0usize; count];
        let mut children: Vec<SmallVec<[usize; INLINE_PARENTS]>> = vec![SmallVec::new(); count];
        for (child, node) in self.nodes.iter().enumerate() {
            in_degree[child] = node.parents.len();
            for parent in &node.parents {
                children[parent.index()].push(child);
            }
        }

        let mut ready: std::collections::BTreeSet<usize> = (0..count)
            .filter(|&index| in_degree[index] == 0)
            .collect();
        let mut order = Vec::with_capacity(count);
        while let Some(next) = ready.pop_first() {
            order.push(NodeId(next as u32));
            for &child in &children[next] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.insert(child);
                }
            }
        }
        if order.len() != count {
            return Err(BayesError::InvalidModel(
                "parent graph contains a cycle".into(),
            ));
        }
        Ok(order)
    }

    /// Checks the whole network for structural soundness.
    ///
    /// Every node must have at least two outcomes and a CPT of the expected
    /// length, and the parent graph must be acyclic.
    pub fn validate(&self) -> Result<(), BayesError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.outcome_count() < 2 {
                return Err(BayesError::InvalidModel(format!(
                    "node '{}' has {} outcomes, need at least 2",
                    node.identifier,
                    node.outcome_count()
                )));
            }
            let expected = self.expected_cpt_len(NodeId(index as u32));
            if node.cpt.len() != expected {
                return Err(BayesError::InvalidModel(format!(
                    "node '{}': CPT length {} does not match expected {}",
                    node.identifier,
                    node.cpt.len(),
                    expected
                )));
            }
        }
        self.topological_order()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::descriptor::NodeDescriptor;

    fn two_node_net() -> (BayesNet, NodeId, NodeId) {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        let b = net.add_node("b").unwrap();
        for label in ["t", "f"] {
            net.add_outcome(a, label).unwrap();
            net.add_outcome(b, label).unwrap();
        }
        net.set_parents(b, &[a]).unwrap();
        net.set_probabilities(a, vec![0.3, 0.7]).unwrap();
        net.set_probabilities(b, vec![0.9, 0.1, 0.2, 0.8]).unwrap();
        (net, a, b)
    }

    #[test]
    fn cpt_index_follows_stride_convention() {
        let (net, _, b) = two_node_net();
        // index = self + |self| * parent
        assert_eq!(net.cpt_index(b, 0, &[0]), 0);
        assert_eq!(net.cpt_index(b, 1, &[0]), 1);
        assert_eq!(net.cpt_index(b, 0, &[1]), 2);
        assert_eq!(net.cpt_index(b, 1, &[1]), 3);
    }

    #[test]
    fn cpt_index_with_two_parents() {
        let mut net = BayesNet::new();
        let p0 = net.add_node("p0").unwrap();
        let p1 = net.add_node("p1").unwrap();
        let c = net.add_node("c").unwrap();
        for node in [p0, p1, c] {
            net.add_outcome(node, "t").unwrap();
            net.add_outcome(node, "f").unwrap();
        }
        net.add_outcome(p1, "m").unwrap();
        net.set_parents(c, &[p0, p1]).unwrap();
        // index = self + 2 * (p0 + 2 * p1)
        assert_eq!(net.cpt_index(c, 1, &[0, 0]), 1);
        assert_eq!(net.cpt_index(c, 0, &[1, 0]), 2);
        assert_eq!(net.cpt_index(c, 0, &[0, 1]), 4);
        assert_eq!(net.cpt_index(c, 1, &[1, 2]), 11);
    }

    #[test]
    fn duplicate_outcome_is_rejected() {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        net.add_outcome(a, "t").unwrap();
        let err = net.add_outcome(a, "t").unwrap_err();
        assert!(matches!(err, BayesError::InvalidModel(_)));
    }

    #[test]
    fn duplicate_identifier_is_rejected() {
        let mut net = BayesNet::new();
        net.add_node("a").unwrap();
        assert!(matches!(
            net.add_node("a"),
            Err(BayesError::InvalidModel(_))
        ));
    }

    #[test]
    fn cpt_length_is_validated() {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        net.add_outcome(a, "t").unwrap();
        net.add_outcome(a, "f").unwrap();
        assert!(matches!(
            net.set_probabilities(a, vec![0.5, 0.25, 0.25]),
            Err(BayesError::InvalidModel(_))
        ));
    }

    #[test]
    fn parents_are_frozen_by_probabilities() {
        let (mut net, a, b) = two_node_net();
        assert!(matches!(
            net.set_parents(b, &[a]),
            Err(BayesError::InvalidModel(_))
        ));
    }

    #[test]
    fn rows_are_renormalized_silently() {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        net.add_outcome(a, "t").unwrap();
        net.add_outcome(a, "f").unwrap();
        net.set_probabilities(a, vec![0.5, 1.5]).unwrap();
        assert_eq!(net.node(a).probabilities(), &[0.25, 0.75]);
    }

    #[test]
    fn zero_mass_rows_are_kept() {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        let b = net.add_node("b").unwrap();
        for node in [a, b] {
            net.add_outcome(node, "t").unwrap();
            net.add_outcome(node, "f").unwrap();
        }
        net.set_parents(b, &[a]).unwrap();
        net.set_probabilities(b, vec![0.5, 0.5, 0.0, 0.0]).unwrap();
        assert_eq!(net.node(b).probabilities(), &[0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn cycle_is_detected() {
        let mut net = BayesNet::new();
        let a = net.add_node("a").unwrap();
        let b = net.add_node("b").unwrap();
        for node in [a, b] {
            net.add_outcome(node, "t").unwrap();
            net.add_outcome(node, "f").unwrap();
        }
        net.set_parents(a, &[b]).unwrap();
        net.set_parents(b, &[a]).unwrap();
        assert!(matches!(
            net.topological_order(),
            Err(BayesError::InvalidModel(_))
        ));
    }

    #[test]
    fn descriptor_with_undeclared_parent_fails() {
        let descriptor = NetworkDescriptor {
            nodes: vec![NodeDescriptor {
                identifier: "a".into(),
                outcomes: vec!["t".into(), "f".into()],
                parents: vec!["ghost".into()],
                probabilities: vec![0.5, 0.5],
            }],
        };
        assert!(matches!(
            BayesNet::from_descriptor(&descriptor),
            Err(BayesError::InvalidModel(_))
        ));
    }

    #[test]
    fn descriptor_forward_parent_references_work() {
        let descriptor = NetworkDescriptor {
            nodes: vec![
                NodeDescriptor {
                    identifier: "child".into(),
                    outcomes: vec!["t".into(), "f".into()],
                    parents: vec!["root".into()],
                    probabilities: vec![0.9, 0.1, 0.2, 0.8],
                },
                NodeDescriptor {
                    identifier: "root".into(),
                    outcomes: vec!["t".into(), "f".into()],
                    parents: vec![],
                    probabilities: vec![0.3, 0.7],
                },
            ],
        };
        let net = BayesNet::from_descriptor(&descriptor).unwrap();
        let child = net.require_node("child").unwrap();
        let root = net.require_node("root").unwrap();
        assert_eq!(net.node(child).parents(), &[root]);
    }
}
