//! Flat discrete tables over clique scopes.
//!
//! A [`Potential`] is a non-normalized distribution over the joint outcome
//! space of a sorted set of nodes, stored flat with fixed per-node strides
//! (first scope position varies fastest). All table walks use a mixed-radix
//! odometer so cross-scope index mapping stays O(scope) per step without
//! division.

use smallvec::SmallVec;

use crate::engine::network::{cpt_strides, NodeId};

/// Inline capacity for clique scopes.
const INLINE_SCOPE: usize = 8;

/// Mass below which a table is treated as all-zero rather than normalized.
///
/// Contradictory evidence produces exact zeros; this floor only guards the
/// division itself against denormal noise.
pub const MIN_MASS: f64 = 1e-12;

/// Node scope of a potential or separator, ascending by id.
pub type Scope = SmallVec<[NodeId; INLINE_SCOPE]>;

/// Per-scope outcome cardinalities.
pub type ScopeDims = SmallVec<[usize; INLINE_SCOPE]>;

/// A flat table over the joint outcomes of a sorted node scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Potential {
    nodes: Scope,
    dims: ScopeDims,
    values: Vec<f64>,
}

impl Potential {
    /// Creates a table of ones over the given scope.
    ///
    /// `nodes` must be strictly ascending; `dims` holds the matching outcome
    /// counts.
    pub fn ones(nodes: Scope, dims: ScopeDims) -> Self {
        debug_assert_eq!(nodes.len(), dims.len());
        debug_assert!(nodes.windows(2).all(|pair| pair[0] < pair[1]));
        let len = dims.iter().product();
        Self {
            nodes,
            dims,
            values: vec![1.0; len],
        }
    }

    /// The sorted node scope.
    pub fn scope(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Outcome cardinalities, parallel to [`Potential::scope`].
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Read-only view of the flat values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Position of `node` within the scope.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    /// Total mass of the table.
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Resets every entry to one.
    pub fn reset_ones(&mut self) {
        self.values.fill(1.0);
    }

    /// Scales the table to unit mass and returns the mass that was present.
    ///
    /// Tables with mass at or below [`MIN_MASS`] are left untouched so zeros
    /// keep propagating instead of being inflated into noise.
    pub fn normalize(&mut self) -> f64 {
        let mass = self.sum();
        if mass > MIN_MASS {
            for value in &mut self.values {
                *value /= mass;
            }
        }
        mass
    }

    /// Zeroes every entry whose assignment disagrees with `node = outcome`.
    pub fn observe(&mut self, node: NodeId, outcome: usize) {
        let Some(position) = self.position_of(node) else {
            return;
        };
        let mut mapped_strides: ScopeDims = SmallVec::from_elem(0, self.dims.len());
        mapped_strides[position] = 1;
        let dims = self.dims.clone();
        Self::traverse(&dims, &mapped_strides, |flat, digit| {
            if digit != outcome {
                self.values[flat] = 0.0;
            }
        });
    }

    /// Multiplies `other` into this table, broadcasting over the dimensions
    /// of scope nodes absent from `other`.
    ///
    /// `other`'s scope must be a subset of this table's scope.
    pub fn multiply_assign(&mut self, other: &Potential) {
        let mapped_strides = self.strides_into(other);
        let dims = self.dims.clone();
        Self::traverse(&dims, &mapped_strides, |flat, mapped| {
            self.values[flat] *= other.values[mapped];
        });
    }

    /// Divides this table by `other` elementwise under broadcasting, with the
    /// message-passing convention that a zero denominator yields zero.
    pub fn divide_assign(&mut self, other: &Potential) {
        let mapped_strides = self.strides_into(other);
        let dims = self.dims.clone();
        Self::traverse(&dims, &mapped_strides, |flat, mapped| {
            let denominator = other.values[mapped];
            self.values[flat] = if denominator == 0.0 {
                0.0
            } else {
                self.values[flat] / denominator
            };
        });
    }

    /// Sums this table down to the given sub-scope.
    ///
    /// `keep` must be an ascending subset of the scope.
    pub fn marginalize(&self, keep: &[NodeId]) -> Potential {
        let mut kept_dims: ScopeDims = SmallVec::new();
        for node in keep {
            let position = self
                .position_of(*node)
                .expect("marginalization target must be inside the scope");
            kept_dims.push(self.dims[position]);
        }
        let len = kept_dims.iter().product();
        let mut result = Potential {
            nodes: SmallVec::from_slice(keep),
            dims: kept_dims,
            values: vec![0.0; len],
        };

        let mapped_strides = self.strides_into(&result);
        Self::traverse(&self.dims, &mapped_strides, |flat, mapped| {
            result.values[mapped] += self.values[flat];
        });
        result
    }

    /// Multiplies a CPT into this table.
    ///
    /// `family` lists the CPT's nodes with their cardinalities: the owning
    /// node first, then its parents in declared order. The CPT layout comes
    /// from the network's shared stride computation (own outcome fastest,
    /// then parents in order); every family member must be inside this
    /// table's scope.
    pub fn multiply_cpt(&mut self, family: &[(NodeId, usize)], cpt: &[f64]) {
        let cardinalities: ScopeDims = family.iter().map(|&(_, cardinality)| cardinality).collect();
        let strides = cpt_strides(&cardinalities);
        let mut mapped_strides: ScopeDims = SmallVec::from_elem(0, self.dims.len());
        for (&(node, _), &stride) in family.iter().zip(&strides) {
            let position = self
                .position_of(node)
                .expect("CPT family must be inside the clique scope");
            mapped_strides[position] = stride;
        }
        debug_assert_eq!(cardinalities.iter().product::<usize>(), cpt.len());
        let dims = self.dims.clone();
        Self::traverse(&dims, &mapped_strides, |flat, mapped| {
            self.values[flat] *= cpt[mapped];
        });
    }

    /// Strides mapping each scope position of `self` into `other`'s flat
    /// layout; positions absent from `other` get stride zero (broadcast).
    fn strides_into(&self, other: &Potential) -> ScopeDims {
        let mut other_strides: ScopeDims = SmallVec::with_capacity(other.dims.len());
        let mut stride = 1usize;
        for &dim in &other.dims {
            other_strides.push(stride);
            stride *= dim;
        }
        self.nodes
            .iter()
            .map(|node| {
                other
                    .position_of(*node)
                    .map(|position| other_strides[position])
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Walks every flat index of a table with the given dims, tracking the
    /// index mapped through `mapped_strides` with an odometer (no division).
    fn traverse(dims: &[usize], mapped_strides: &[usize], mut visit: impl FnMut(usize, usize)) {
        let len: usize = dims.iter().product();
        let mut digits: ScopeDims = SmallVec::from_elem(0, dims.len());
        let mut mapped = 0usize;
        for flat in 0..len {
            visit(flat, mapped);
            for axis in 0..dims.len() {
                digits[axis] += 1;
                mapped += mapped_strides[axis];
                if digits[axis] < dims[axis] {
                    break;
                }
                mapped -= dims[axis] * mapped_strides[axis];
                digits[axis] = 0;
            }
        }
    }
}
