//! Decoded network descriptions.
//!
//! A [`NetworkDescriptor`] is the already-decoded form of one serialized
//! network: an ordered collection of node descriptors carrying identifiers,
//! outcome labels, parent references, and flat probability arrays. Producing
//! it from bytes is the deserializer's job; this crate only consumes it.

/// Description of a single node of a decoded network.
///
/// `parents` refer to other nodes of the same network by identifier and may
/// point at nodes declared later in the collection; the only structural
/// constraint is that the resulting parent graph is acyclic.
///
/// `probabilities` is laid out with the stride convention of
/// [`crate::engine::network::BayesNet::cpt_index`]: for a fixed parent
/// assignment, the values over this node's outcomes are contiguous.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDescriptor {
    /// Identifier, unique within the network.
    pub identifier: String,
    /// Ordered outcome labels; the first is conventionally a dummy state.
    pub outcomes: Vec<String>,
    /// Ordered parent identifiers; order fixes the CPT strides.
    pub parents: Vec<String>,
    /// Flat conditional probability table.
    pub probabilities: Vec<f64>,
}

/// Description of a whole decoded network.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkDescriptor {
    /// Node descriptors in declaration order.
    pub nodes: Vec<NodeDescriptor>,
}
