//! One-shot compilation of a network into a junction tree.
//!
//! Pipeline: moralize the DAG, triangulate along a min-fill elimination
//! ordering, keep the maximal candidate cliques, connect them with a
//! maximum-weight spanning tree over separator sizes, and map every node
//! family onto a home clique. All tie-breaks are explicit (lower node index,
//! smaller clique-id pair), so identical networks compile to identical trees.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::engine::errors::BayesError;
use crate::engine::network::{BayesNet, NodeId};

/// Inline capacity for clique node lists.
const INLINE_CLIQUE: usize = 8;

/// Inline capacity for per-node clique membership lists.
const INLINE_MEMBERSHIP: usize = 4;

/// Sorted node ids of one clique or separator.
pub type CliqueNodes = SmallVec<[NodeId; INLINE_CLIQUE]>;

/// An undirected tree edge between two cliques.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEdge {
    /// Lower endpoint clique index.
    pub a: usize,
    /// Higher endpoint clique index.
    pub b: usize,
    /// Intersection of the endpoint cliques, ascending.
    pub separator: CliqueNodes,
}

/// Shape summary of a compiled junction tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of maximal cliques.
    pub clique_count: usize,
    /// Node count of the largest clique.
    pub largest_clique: usize,
    /// Joint outcome count of the largest clique table.
    pub largest_table: usize,
    /// Fill-in edges added during triangulation.
    pub fill_in_edges: usize,
}

/// A junction tree over the cliques of a triangulated moral graph.
///
/// Cliques are addressed by index into a flat clique array; edges carry their
/// separator once. The tree satisfies the running intersection property by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionTree {
    cliques: Vec<CliqueNodes>,
    edges: Vec<TreeEdge>,
    neighbors: Vec<SmallVec<[(usize, usize); INLINE_MEMBERSHIP]>>,
    membership: Vec<SmallVec<[usize; INLINE_MEMBERSHIP]>>,
    home: Vec<usize>,
    stats: TreeStats,
}

impl JunctionTree {
    /// Compiles the junction tree of `net`.
    ///
    /// Fails with [`BayesError::InvalidModel`] when the parent graph has a
    /// cycle; no partial tree is ever exposed.
    pub fn build(net: &BayesNet) -> Result<Self, BayesError> {
        net.topological_order()?;
        let count = net.node_count();

        let moral = moralize(net);
        let (candidates, fill_in_edges) = triangulate(&moral);
        let cliques = keep_maximal(candidates);
        let edges = spanning_tree(&cliques);

        let mut neighbors: Vec<SmallVec<[(usize, usize); INLINE_MEMBERSHIP]>> =
            vec![SmallVec::new(); cliques.len()];
        for (index, edge) in edges.iter().enumerate() {
            neighbors[edge.a].push((edge.b, index));
            neighbors[edge.b].push((edge.a, index));
        }
        for adjacent in &mut neighbors {
            adjacent.sort_unstable();
        }

        let mut membership: Vec<SmallVec<[usize; INLINE_MEMBERSHIP]>> =
            vec![SmallVec::new(); count];
        for (index, clique) in cliques.iter().enumerate() {
            for node in clique {
                membership[node.index()].push(index);
            }
        }

        let mut home = Vec::with_capacity(count);
        for id in net.node_ids() {
            let mut family: CliqueNodes = SmallVec::from_slice(net.node(id).parents());
            family.push(id);
            family.sort_unstable();
            let clique = membership[id.index()]
                .iter()
                .copied()
                .find(|&candidate| is_subset(&family, &cliques[candidate]))
                .ok_or_else(|| {
                    BayesError::Internal(format!(
                        "no clique contains the family of node '{}'",
                        net.node(id).identifier()
                    ))
                })?;
            home.push(clique);
        }

        let stats = TreeStats {
            clique_count: cliques.len(),
            largest_clique: cliques.iter().map(|clique| clique.len()).max().unwrap_or(0),
            largest_table: cliques
                .iter()
                .map(|clique| {
                    clique
                        .iter()
                        .map(|node| net.node(*node).outcome_count())
                        .product()
                })
                .max()
                .unwrap_or(0),
            fill_in_edges,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "compiled junction tree: {} cliques, largest {} nodes / {} entries, {} fill-in edges",
            stats.clique_count,
            stats.largest_clique,
            stats.largest_table,
            stats.fill_in_edges
        );

        Ok(Self {
            cliques,
            edges,
            neighbors,
            membership,
            home,
            stats,
        })
    }

    /// Number of cliques.
    pub fn clique_count(&self) -> usize {
        self.cliques.len()
    }

    /// All cliques, each a sorted node list.
    pub fn cliques(&self) -> &[CliqueNodes] {
        &self.cliques
    }

    /// The sorted node list of one clique.
    pub fn clique(&self, index: usize) -> &[NodeId] {
        &self.cliques[index]
    }

    /// All tree edges with their separators.
    pub fn edges(&self) -> &[TreeEdge] {
        &self.edges
    }

    /// Neighbors of a clique as `(clique, edge)` index pairs, ascending.
    pub fn neighbors(&self, clique: usize) -> &[(usize, usize)] {
        &self.neighbors[clique]
    }

    /// Indices of all cliques containing `node`, ascending.
    pub fn membership(&self, node: NodeId) -> &[usize] {
        &self.membership[node.index()]
    }

    /// The clique holding `node`'s family (the node plus its parents).
    pub fn home_clique(&self, node: NodeId) -> usize {
        self.home[node.index()]
    }

    /// Shape summary of the tree.
    pub fn stats(&self) -> TreeStats {
        self.stats
    }
}

/// Undirected moral graph: parent-child arcs plus edges between all pairs of
/// common parents.
fn moralize(net: &BayesNet) -> Vec<BTreeSet<usize>> {
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); net.node_count()];
    for id in net.node_ids() {
        let child = id.index();
        let parents = net.node(id).parents();
        for parent in parents {
            adjacency[child].insert(parent.index());
            adjacency[parent.index()].insert(child);
        }
        for (position, left) in parents.iter().enumerate() {
            for right in &parents[position + 1..] {
                adjacency[left.index()].insert(right.index());
                adjacency[right.index()].insert(left.index());
            }
        }
    }
    adjacency
}

/// Min-fill elimination over the moral graph.
///
/// Returns one candidate clique per eliminated node (the node plus its
/// remaining neighbors) and the number of fill-in edges added. Ties on the
/// fill count are broken by the lower node index.
fn triangulate(moral: &[BTreeSet<usize>]) -> (Vec<CliqueNodes>, usize) {
    let count = moral.len();
    let mut work = moral.to_vec();
    let mut remaining: BTreeSet<usize> = (0..count).collect();
    let mut candidates = Vec::with_capacity(count);
    let mut fill_in_edges = 0usize;

    while !remaining.is_empty() {
        let mut best = usize::MAX;
        let mut best_fill = usize::MAX;
        for &candidate in &remaining {
            let fill = fill_count(&work, candidate);
            if fill < best_fill {
                best_fill = fill;
                best = candidate;
            }
        }

        let neighbors: Vec<usize> = work[best].iter().copied().collect();
        let mut clique: CliqueNodes = neighbors.iter().map(|&n| NodeId(n as u32)).collect();
        clique.push(NodeId(best as u32));
        clique.sort_unstable();
        candidates.push(clique);

        for (position, &left) in neighbors.iter().enumerate() {
            for &right in &neighbors[position + 1..] {
                if work[left].insert(right) {
                    work[right].insert(left);
                    fill_in_edges += 1;
                }
            }
        }
        for &neighbor in &neighbors {
            work[neighbor].remove(&best);
        }
        work[best].clear();
        remaining.remove(&best);
    }

    (candidates, fill_in_edges)
}

/// Number of missing edges among the neighbors of `node`.
fn fill_count(work: &[BTreeSet<usize>], node: usize) -> usize {
    let neighbors: Vec<usize> = work[node].iter().copied().collect();
    let mut missing = 0usize;
    for (position, &left) in neighbors.iter().enumerate() {
        for &right in &neighbors[position + 1..] {
            if !work[left].contains(&right) {
                missing += 1;
            }
        }
    }
    missing
}

/// Drops every candidate clique that is contained in another candidate.
///
/// Equal sets keep their first occurrence, so the surviving clique order is
/// a deterministic function of the elimination ordering.
fn keep_maximal(candidates: Vec<CliqueNodes>) -> Vec<CliqueNodes> {
    let mut kept = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let dominated = candidates.iter().enumerate().any(|(other_index, other)| {
            if other_index == index {
                return false;
            }
            is_subset(candidate, other)
                && (candidate.len() < other.len() || other_index < index)
        });
        if !dominated {
            kept.push(candidate.clone());
        }
    }
    kept
}

/// Maximum-weight spanning tree over the cliques, weight = separator size.
///
/// Ties prefer the smaller clique-id pair; zero-weight edges are allowed so
/// disconnected networks still compile to a single tree.
fn spanning_tree(cliques: &[CliqueNodes]) -> Vec<TreeEdge> {
    let mut candidates = Vec::new();
    for a in 0..cliques.len() {
        for b in a + 1..cliques.len() {
            let weight = intersection(&cliques[a], &cliques[b]).len();
            candidates.push((weight, a, b));
        }
    }
    candidates.sort_unstable_by(|x, y| y.0.cmp(&x.0).then(x.1.cmp(&y.1)).then(x.2.cmp(&y.2)));

    let mut find = UnionFind::new(cliques.len());
    let mut edges = Vec::with_capacity(cliques.len().saturating_sub(1));
    for (_, a, b) in candidates {
        if edges.len() + 1 == cliques.len() {
            break;
        }
        if find.union(a, b) {
            edges.push(TreeEdge {
                a,
                b,
                separator: intersection(&cliques[a], &cliques[b]),
            });
        }
    }
    edges
}

/// Intersection of two sorted node lists, ascending.
fn intersection(left: &[NodeId], right: &[NodeId]) -> CliqueNodes {
    let mut result = CliqueNodes::new();
    let mut i = 0;
    let mut j = 0;
    while i < left.len() && j < right.len() {
        match left[i].cmp(&right[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                result.push(left[i]);
                i += 1;
                j += 1;
            }
        }
    }
    result
}

/// Whether sorted `inner` is contained in sorted `outer`.
fn is_subset(inner: &[NodeId], outer: &[NodeId]) -> bool {
    let mut j = 0;
    for node in inner {
        while j < outer.len() && outer[j] < *node {
            j += 1;
        }
        if j == outer.len() || outer[j] != *node {
            return false;
        }
        j += 1;
    }
    true
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, left: usize, right: usize) -> bool {
        let left_root = self.find(left);
        let right_root = self.find(right);
        if left_root == right_root {
            return false;
        }
        self.parent[right_root] = left_root;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::network::BayesNet;

    fn binary_node(net: &mut BayesNet, identifier: &str) -> NodeId {
        let id = net.add_node(identifier).unwrap();
        net.add_outcome(id, "t").unwrap();
        net.add_outcome(id, "f").unwrap();
        id
    }

    fn diamond() -> BayesNet {
        // a -> b, a -> c, b -> d, c -> d
        let mut net = BayesNet::new();
        let a = binary_node(&mut net, "a");
        let b = binary_node(&mut net, "b");
        let c = binary_node(&mut net, "c");
        let d = binary_node(&mut net, "d");
        net.set_parents(b, &[a]).unwrap();
        net.set_parents(c, &[a]).unwrap();
        net.set_parents(d, &[b, c]).unwrap();
        net.set_probabilities(a, vec![0.5, 0.5]).unwrap();
        net.set_probabilities(b, vec![0.7, 0.3, 0.4, 0.6]).unwrap();
        net.set_probabilities(c, vec![0.2, 0.8, 0.9, 0.1]).unwrap();
        net.set_probabilities(d, vec![0.1, 0.9, 0.3, 0.7, 0.6, 0.4, 0.8, 0.2])
            .unwrap();
        net
    }

    fn ids(raw: &[u32]) -> CliqueNodes {
        raw.iter().map(|&id| NodeId(id)).collect()
    }

    #[test]
    fn diamond_compiles_to_two_cliques() {
        let net = diamond();
        let tree = JunctionTree::build(&net).unwrap();
        assert_eq!(tree.cliques(), &[ids(&[0, 1, 2]), ids(&[1, 2, 3])]);
        assert_eq!(tree.edges().len(), 1);
        assert_eq!(tree.edges()[0].separator, ids(&[1, 2]));
    }

    #[test]
    fn chain_compiles_to_pairwise_cliques() {
        let mut net = BayesNet::new();
        let a = binary_node(&mut net, "a");
        let b = binary_node(&mut net, "b");
        let c = binary_node(&mut net, "c");
        net.set_parents(b, &[a]).unwrap();
        net.set_parents(c, &[b]).unwrap();
        net.set_probabilities(a, vec![0.5, 0.5]).unwrap();
        net.set_probabilities(b, vec![0.7, 0.3, 0.4, 0.6]).unwrap();
        net.set_probabilities(c, vec![0.2, 0.8, 0.9, 0.1]).unwrap();

        let tree = JunctionTree::build(&net).unwrap();
        assert_eq!(tree.cliques(), &[ids(&[0, 1]), ids(&[1, 2])]);
        assert_eq!(tree.edges()[0].separator, ids(&[1]));
    }

    #[test]
    fn home_cliques_contain_families() {
        let net = diamond();
        let tree = JunctionTree::build(&net).unwrap();
        for id in net.node_ids() {
            let clique = tree.clique(tree.home_clique(id));
            assert!(clique.contains(&id));
            for parent in net.node(id).parents() {
                assert!(clique.contains(parent));
            }
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let first = JunctionTree::build(&diamond()).unwrap();
        let second = JunctionTree::build(&diamond()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn disconnected_components_are_joined_by_empty_separators() {
        let mut net = BayesNet::new();
        let a = binary_node(&mut net, "a");
        let b = binary_node(&mut net, "b");
        net.set_probabilities(a, vec![0.5, 0.5]).unwrap();
        net.set_probabilities(b, vec![0.3, 0.7]).unwrap();

        let tree = JunctionTree::build(&net).unwrap();
        assert_eq!(tree.clique_count(), 2);
        assert_eq!(tree.edges().len(), 1);
        assert!(tree.edges()[0].separator.is_empty());
    }

    #[test]
    fn running_intersection_holds_on_the_diamond() {
        let net = diamond();
        let tree = JunctionTree::build(&net).unwrap();
        // Every node's cliques must form a connected subtree; with two
        // cliques that reduces to: shared nodes sit in the separator.
        for id in net.node_ids() {
            let members = tree.membership(id);
            if members.len() == 2 {
                assert!(tree.edges()[0].separator.contains(&id));
            }
        }
    }
}
