//! Error types for tree construction and traversal.

use crate::tree::NodeId;

/// Errors reported by the traversal engine.
///
/// Every variant is a caller-contract violation detected before or during
/// shape and kind validation. The computations themselves are deterministic
/// and never fail transiently, so nothing here is worth retrying and no
/// partial result is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A weight or condition array's leading dimension does not match the
    /// node or leaf count of the tree it is used with.
    #[error("shape mismatch: {what} has leading dimension {actual}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Two arrays passed to one call disagree on the per-node item shape.
    #[error("shape mismatch: item shapes {left:?} and {right:?} disagree")]
    TrailingShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// A name that does not denote a supported accumulator kind.
    #[error("unknown accumulator kind: {0:?}")]
    UnknownAccumulator(String),

    /// `argmin`/`argmax` have no defined result over an empty child set.
    #[error("empty reduction: node {node} has no children")]
    EmptyReduction { node: NodeId },

    /// The parent array handed to [`Tree::from_parents`](crate::tree::Tree::from_parents)
    /// violates a structural invariant.
    #[error("malformed tree: {0}")]
    MalformedTree(#[from] MalformedTree),
}

/// Structural violations detected when building a tree from a parent array.
///
/// These are only raised at construction time. Traversals assume every
/// [`Tree`](crate::tree::Tree) they are handed is valid and never re-check
/// the topology.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTree {
    #[error("parent array is empty")]
    Empty,

    #[error("node {node} has parent {parent}, out of bounds for {num_nodes} nodes")]
    ParentOutOfBounds {
        node: NodeId,
        parent: NodeId,
        num_nodes: usize,
    },

    #[error("node {node} has parent {parent}; ids must strictly increase towards the root")]
    NotTopological { node: NodeId, parent: NodeId },

    #[error("last node has parent {parent}; the last node must be the root, its own parent")]
    LastNodeNotRoot { parent: NodeId },

    #[error("node {node} has no children but lies outside the leaf prefix 0..{num_leaves}")]
    LeafOutsidePrefix { node: NodeId, num_leaves: usize },
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
