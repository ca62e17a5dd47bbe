//! canopy: a tree aggregation engine for hierarchical data analysis.
//!
//! This crate computes derived weight arrays over rooted trees (component
//! trees, dendrograms, partition hierarchies) by combining values along
//! parent/child edges with pluggable associative operators. Attribute
//! computation, filtering by subtree statistics and saliency propagation all
//! reduce to the traversals provided here.
//!
//! # Key Types
//!
//! - [`Tree`] - Immutable topology built from a topologically ordered parent array
//! - [`Sum`], [`Mean`], [`Min`], ... - Accumulator types implementing [`Accumulate`]
//! - [`AccumulatorKind`] - The closed set of accumulator names, for runtime dispatch
//! - [`ValuedTree`] - A freshly computed node-weight array tagged with its tree
//!
//! # Traversals
//!
//! Upward reductions ([`accumulate_parallel`], [`accumulate_sequential`], the
//! `accumulate_and_*_sequential` family) compute a node's value from its
//! children; downward propagations ([`propagate_parallel`],
//! [`propagate_sequential`], [`propagate_sequential_and_accumulate`]) push
//! values from ancestors towards the leaves. Node weights are `ndarray`
//! arrays whose leading axis indexes nodes; any trailing shape is supported.
//!
//! # Example
//!
//! ```
//! use canopy::{accumulate_sequential, Sum, Tree};
//! use ndarray::{ArrayD, IxDyn};
//!
//! // Leaves {0, 1, 2}; node 3 groups leaves 0 and 1; node 4 is the root.
//! let tree = Tree::from_parents(vec![3, 3, 4, 4, 4])?;
//! let leaf_data = ArrayD::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0])?;
//!
//! let result = accumulate_sequential(&tree, leaf_data.view(), Sum)?;
//! assert_eq!(result.weights().as_slice().unwrap(), &[1.0, 2.0, 3.0, 3.0, 6.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export the array and comparison crates downstream code builds inputs with.
pub use approx;
pub use ndarray;

pub mod accumulate;
pub mod element;
pub mod error;
pub mod testing;
pub mod traverse;
pub mod tree;
pub mod utils;
pub mod weights;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use accumulate::{
    Accumulate, AccumulatorKind, ArgMax, ArgMin, Counting, First, Last, Max, Mean, Min, Product,
    Sum,
};
pub use element::Element;
pub use error::{Error, MalformedTree, Result};
pub use traverse::{
    accumulate_and_add_sequential, accumulate_and_combine_sequential,
    accumulate_and_combine_sequential_dyn, accumulate_and_max_sequential,
    accumulate_and_min_sequential, accumulate_and_multiply_sequential, accumulate_parallel,
    accumulate_parallel_dyn, accumulate_sequential, accumulate_sequential_dyn, propagate_parallel,
    propagate_sequential, propagate_sequential_and_accumulate,
    propagate_sequential_and_accumulate_dyn, reconstruct_leaf_data, CombineOp,
};
pub use tree::{NodeId, Tree};
pub use utils::{run_with_threads, Parallelism};
pub use weights::ValuedTree;
