//! Exact inference over a compiled junction tree.
//!
//! A [`JunctionTreeInference`] session owns the working clique potentials and
//! the current evidence map; the immutable network structure is shared behind
//! an `Arc` so several sessions over the same model stay cheap. Propagation
//! is lazy: any evidence change marks the session dirty, and the next query
//! re-initializes the potentials from the CPT products, absorbs the evidence
//! by zeroing, and runs one collect and one distribute pass.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::errors::BayesError;
use crate::engine::junction_tree::JunctionTree;
use crate::engine::network::{BayesNet, NodeId};
use crate::engine::potential::{Potential, ScopeDims, MIN_MASS};

/// One directed message slot of the propagation schedule.
///
/// The schedule lists every tree edge in breadth-first order from the root
/// clique; the collect phase walks it in reverse (leaves first), the
/// distribute phase forward.
#[derive(Debug, Clone, Copy)]
struct Message {
    child: usize,
    parent: usize,
    edge: usize,
}

/// An exact inference session over one discrete network.
#[derive(Debug, Clone)]
pub struct JunctionTreeInference {
    net: Arc<BayesNet>,
    tree: JunctionTree,
    initial: Vec<Potential>,
    potentials: Vec<Potential>,
    separators: Vec<Potential>,
    schedule: Vec<Message>,
    evidence: FxHashMap<NodeId, usize>,
    dirty: bool,
    consistent: bool,
}

impl JunctionTreeInference {
    /// Compiles the junction tree of `net` and initializes the clique
    /// potentials from the CPTs.
    ///
    /// Each potential starts at one; every node's CPT is multiplied into its
    /// home clique, broadcasting over the clique dimensions outside the
    /// node's family.
    pub fn compile(net: Arc<BayesNet>) -> Result<Self, BayesError> {
        net.validate()?;
        let tree = JunctionTree::build(&net)?;

        let mut initial = Vec::with_capacity(tree.clique_count());
        for clique in tree.cliques() {
            let dims: ScopeDims = clique
                .iter()
                .map(|node| net.node(*node).outcome_count())
                .collect();
            initial.push(Potential::ones(clique.clone(), dims));
        }
        for id in net.node_ids() {
            let node = net.node(id);
            let mut family: SmallVec<[(NodeId, usize); 8]> = SmallVec::new();
            family.push((id, node.outcome_count()));
            for parent in node.parents() {
                family.push((*parent, net.node(*parent).outcome_count()));
            }
            initial[tree.home_clique(id)].multiply_cpt(&family, node.probabilities());
        }

        let separators = tree
            .edges()
            .iter()
            .map(|edge| {
                let dims: ScopeDims = edge
                    .separator
                    .iter()
                    .map(|node| net.node(*node).outcome_count())
                    .collect();
                Potential::ones(edge.separator.clone(), dims)
            })
            .collect();

        let schedule = build_schedule(&tree);
        let potentials = initial.clone();
        Ok(Self {
            net,
            tree,
            initial,
            potentials,
            separators,
            schedule,
            evidence: FxHashMap::default(),
            dirty: true,
            consistent: true,
        })
    }

    /// The shared network this session infers over.
    pub fn network(&self) -> &Arc<BayesNet> {
        &self.net
    }

    /// The compiled junction tree.
    pub fn tree(&self) -> &JunctionTree {
        &self.tree
    }

    /// Pins `node` to the outcome named `label`.
    ///
    /// Fails with [`BayesError::UnknownOutcome`] when the label is not among
    /// the node's outcomes; nothing is mutated in that case. Pinning a node
    /// that already carries evidence overwrites the previous outcome.
    pub fn add_evidence(&mut self, node: NodeId, label: &str) -> Result<(), BayesError> {
        let entry = self.net.node(node);
        let outcome = entry.outcome_index(label).ok_or_else(|| {
            BayesError::UnknownOutcome(format!(
                "node '{}' has no outcome '{label}'",
                entry.identifier()
            ))
        })?;
        self.set_outcome(node, outcome);
        Ok(())
    }

    /// Pins `node` to an outcome by index.
    ///
    /// The index must come from the node's own outcome list.
    pub fn set_outcome(&mut self, node: NodeId, outcome: usize) {
        debug_assert!(outcome < self.net.node(node).outcome_count());
        self.evidence.insert(node, outcome);
        self.dirty = true;
    }

    /// Atomically replaces the whole evidence map.
    pub fn set_evidence(&mut self, evidence: FxHashMap<NodeId, usize>) {
        self.evidence = evidence;
        self.dirty = true;
    }

    /// Removes all evidence; the compiled tree and potentials remain.
    pub fn clear_evidence(&mut self) {
        self.evidence.clear();
        self.dirty = true;
    }

    /// Read-only view of the current evidence.
    pub fn evidence(&self) -> &FxHashMap<NodeId, usize> {
        &self.evidence
    }

    /// The evidence outcome label currently pinned on `node`, if any.
    pub fn evidence_outcome(&self, node: NodeId) -> Option<&str> {
        self.evidence
            .get(&node)
            .map(|&outcome| self.net.node(node).outcomes()[outcome].as_ref())
    }

    /// Whether the current evidence is satisfiable under the model.
    ///
    /// Runs any pending propagation. A contradictory evidence set leaves
    /// every belief query all-zero until the evidence changes.
    pub fn is_consistent(&mut self) -> bool {
        self.refresh();
        self.consistent
    }

    /// The marginal distribution of `node` under the current evidence.
    ///
    /// The returned vector is normalized to unit mass, except under
    /// contradictory evidence where it is entirely zero. Outcomes that
    /// disagree with pinned evidence always carry belief zero.
    pub fn beliefs(&mut self, node: NodeId) -> Vec<f64> {
        self.refresh();
        if !self.consistent {
            return vec![0.0; self.net.node(node).outcome_count()];
        }
        self.node_marginal(self.tree.home_clique(node), node)
    }

    /// Like [`JunctionTreeInference::beliefs`], but surfaces contradictions
    /// as [`BayesError::Inconsistent`] instead of an all-zero vector.
    pub fn beliefs_checked(&mut self, node: NodeId) -> Result<Vec<f64>, BayesError> {
        self.refresh();
        if !self.consistent {
            return Err(BayesError::Inconsistent(
                "evidence has zero probability under the model".into(),
            ));
        }
        Ok(self.node_marginal(self.tree.home_clique(node), node))
    }

    /// The marginal of `node` computed from one specific clique.
    ///
    /// Returns `None` when the clique does not contain the node. After full
    /// propagation every containing clique yields the same distribution; this
    /// is exposed for diagnostics and tests.
    pub fn clique_marginal(&mut self, clique: usize, node: NodeId) -> Option<Vec<f64>> {
        self.refresh();
        if clique >= self.tree.clique_count() || !self.tree.clique(clique).contains(&node) {
            return None;
        }
        if !self.consistent {
            return Some(vec![0.0; self.net.node(node).outcome_count()]);
        }
        Some(self.node_marginal(clique, node))
    }

    fn node_marginal(&self, clique: usize, node: NodeId) -> Vec<f64> {
        let mut marginal = self.potentials[clique].marginalize(&[node]);
        marginal.normalize();
        marginal.values().to_vec()
    }

    fn refresh(&mut self) {
        if self.dirty {
            self.propagate();
        }
    }

    /// Full two-phase propagation from a fresh CPT initialization.
    fn propagate(&mut self) {
        self.potentials.clone_from(&self.initial);
        for separator in &mut self.separators {
            separator.reset_ones();
        }

        let mut pinned: Vec<(NodeId, usize)> = self
            .evidence
            .iter()
            .map(|(&node, &outcome)| (node, outcome))
            .collect();
        pinned.sort_unstable();
        for (node, outcome) in pinned {
            for &clique in self.tree.membership(node) {
                self.potentials[clique].observe(node, outcome);
            }
        }

        for index in (0..self.schedule.len()).rev() {
            let message = self.schedule[index];
            self.pass(message.child, message.parent, message.edge);
        }
        for index in 0..self.schedule.len() {
            let message = self.schedule[index];
            self.pass(message.parent, message.child, message.edge);
        }

        self.consistent = self
            .potentials
            .iter()
            .all(|potential| potential.sum() > MIN_MASS);
        self.dirty = false;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "propagated {} cliques with {} evidence nodes, consistent={}",
            self.potentials.len(),
            self.evidence.len(),
            self.consistent
        );
    }

    /// Sends one message across a tree edge.
    ///
    /// The message is the sender marginalized onto the separator; the
    /// receiver is multiplied by the message divided by what previously
    /// crossed this separator. Messages with no mass are left unnormalized
    /// so contradictions keep propagating as zeros.
    fn pass(&mut self, from: usize, to: usize, edge: usize) {
        let mut message = self.potentials[from].marginalize(&self.tree.edges()[edge].separator);
        message.normalize();
        let mut update = message.clone();
        update.divide_assign(&self.separators[edge]);
        self.potentials[to].multiply_assign(&update);
        self.separators[edge] = message;
    }
}

/// Breadth-first message schedule rooted at clique zero.
fn build_schedule(tree: &JunctionTree) -> Vec<Message> {
    let count = tree.clique_count();
    let mut schedule = Vec::with_capacity(count.saturating_sub(1));
    if count == 0 {
        return schedule;
    }
    let mut visited = vec![false; count];
    let mut queue = std::collections::VecDeque::from([0usize]);
    visited[0] = true;
    while let Some(parent) = queue.pop_front() {
        for &(child, edge) in tree.neighbors(parent) {
            if !visited[child] {
                visited[child] = true;
                schedule.push(Message {
                    child,
                    parent,
                    edge,
                });
                queue.push_back(child);
            }
        }
    }
    schedule
}
