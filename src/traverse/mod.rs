//! The traversal engine: upward reductions and downward propagations.
//!
//! Every operation takes a [`Tree`] plus one or more weight array views,
//! validates the shape contracts up front, and returns a freshly allocated
//! node-indexed result paired with the tree (a [`ValuedTree`]). Inputs are
//! never mutated.
//!
//! # Traversal Orders
//!
//! The topological numbering of the tree (children before parents) turns the
//! order-constrained traversals into plain linear scans: ascending node ids
//! for leaves-to-root, descending for root-to-leaves. The two `*_parallel`
//! operations have no cross-node dependencies at all - each node's result
//! reads only the inputs - and run on the rayon pool once the workload is
//! large enough to pay for it.

mod dispatch;

pub use dispatch::{
    accumulate_and_combine_sequential_dyn, accumulate_parallel_dyn, accumulate_sequential_dyn,
    propagate_sequential_and_accumulate_dyn,
};

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use num_traits::Zero;

use crate::accumulate::{Accumulate, AccumulateInto, OutputOf};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::tree::{NodeId, Tree};
use crate::utils::Parallelism;
use crate::weights::{self, ValuedTree};

/// Componentwise binary operator combining a node's own weight with the
/// reduction of its children, for the `accumulate_and_*_sequential` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CombineOp {
    Add,
    Multiply,
    Min,
    Max,
}

impl CombineOp {
    #[inline]
    pub fn apply<T: Element>(self, lhs: T, rhs: T) -> T {
        match self {
            CombineOp::Add => lhs + rhs,
            CombineOp::Multiply => lhs * rhs,
            CombineOp::Min => {
                if rhs < lhs {
                    rhs
                } else {
                    lhs
                }
            }
            CombineOp::Max => {
                if rhs > lhs {
                    rhs
                } else {
                    lhs
                }
            }
        }
    }
}

/// Scalar component count below which the parallel operations stay on one
/// thread; forking the pool costs more than the scan for small trees.
const MIN_PARALLEL_WORK: usize = 4096;

#[inline]
fn parallelism_for(work: usize) -> Parallelism {
    if work < MIN_PARALLEL_WORK {
        Parallelism::Sequential
    } else {
        Parallelism::from_threads(0)
    }
}

/// Assemble a node-indexed output array from flat row-major data.
fn into_node_array<O>(data: Vec<O>, num_nodes: usize, item_shape: &[usize]) -> ArrayD<O> {
    let mut shape = Vec::with_capacity(1 + item_shape.len());
    shape.push(num_nodes);
    shape.extend_from_slice(item_shape);
    ArrayD::from_shape_vec(IxDyn(&shape), data).expect("data length matches the computed shape")
}

// =============================================================================
// Upward Reductions
// =============================================================================

/// For each node, reduce the weights of its direct children:
/// `out(i) = reduce({ W(c) : c in children(i) })`.
///
/// Leaves have no children and receive the accumulator's identity value.
/// Every node depends only on the input array, so the nodes are processed
/// independently, in parallel for large trees.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] if `node_weights` is not node-indexed.
/// - [`Error::EmptyReduction`] for `argmin`/`argmax`, which have no identity:
///   the leaves' empty child sets make this reduction undefined.
pub fn accumulate_parallel<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, A::Output>>
where
    T: Element,
    A: Accumulate<T>,
{
    weights::check_node_indexed(tree, &node_weights, "node weights")?;
    let item_shape = node_weights.shape()[1..].to_vec();
    let item = weights::item_size(node_weights.shape());
    let n = tree.num_nodes();

    let w = node_weights.as_standard_layout();
    let w = w.as_slice().expect("standard layout array is contiguous");

    let mut out = vec![<A::Output as Zero>::zero(); n * item];
    parallelism_for(n * item).maybe_par_bridge_try_for_each(
        out.chunks_mut(item.max(1)).enumerate(),
        |(i, out_row)| {
            let children = tree.children(i as NodeId);
            for (k, slot) in out_row.iter_mut().enumerate() {
                let reduced = acc.reduce(children.iter().map(|&c| w[c as usize * item + k]));
                *slot = reduced.ok_or(Error::EmptyReduction { node: i as NodeId })?;
            }
            Ok::<(), Error>(())
        },
    )?;

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// Reduce node values from the leaves up to the root:
/// leaves copy `leaf_data`, and every internal node reduces the
/// already-computed outputs of its children.
///
/// A single ascending scan over node ids respects the children-before-parent
/// dependency. With `sum` and a leaf array of ones this computes subtree
/// areas; with `min`/`max` it computes subtree extrema.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `leaf_data` is not leaf-indexed.
pub fn accumulate_sequential<'t, T, A>(
    tree: &'t Tree,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    weights::check_leaf_indexed(tree, &leaf_data, "leaf data")?;
    let item_shape = leaf_data.shape()[1..].to_vec();
    let item = weights::item_size(leaf_data.shape());
    let n = tree.num_nodes();

    let ld = leaf_data.as_standard_layout();
    let ld = ld.as_slice().expect("standard layout array is contiguous");

    let mut out: Vec<OutputOf<A, T>> = vec![<OutputOf<A, T> as Zero>::zero(); n * item];
    for i in tree.leaves() {
        let base = i as usize * item;
        for k in 0..item {
            out[base + k] = acc.lift(ld[base + k]);
        }
    }
    for i in tree.internal_nodes() {
        let base = i as usize * item;
        for k in 0..item {
            let reduced = acc
                .reduce(tree.children(i).iter().map(|&c| out[c as usize * item + k]))
                .ok_or(Error::EmptyReduction { node: i })?;
            out[base + k] = reduced;
        }
    }

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// Reduce child outputs up the tree and combine each internal node's own
/// weight into the result with `combine`:
/// leaves copy `leaf_data`, internal nodes compute
/// `out(i) = combine(W(i), reduce({ out(c) : c in children(i) }))`.
///
/// The elementwise `combine` operator is independent of the reduction
/// accumulator used over the children.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] / [`Error::TrailingShapeMismatch`] if
/// `node_weights` is not node-indexed, `leaf_data` is not leaf-indexed, or
/// their item shapes disagree.
pub fn accumulate_and_combine_sequential<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
    combine: CombineOp,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    weights::check_node_indexed(tree, &node_weights, "node weights")?;
    weights::check_leaf_indexed(tree, &leaf_data, "leaf data")?;
    weights::check_same_items(&node_weights, &leaf_data)?;
    let item_shape = node_weights.shape()[1..].to_vec();
    let item = weights::item_size(node_weights.shape());
    let n = tree.num_nodes();

    let w = node_weights.as_standard_layout();
    let w = w.as_slice().expect("standard layout array is contiguous");
    let ld = leaf_data.as_standard_layout();
    let ld = ld.as_slice().expect("standard layout array is contiguous");

    let mut out: Vec<OutputOf<A, T>> = vec![<OutputOf<A, T> as Zero>::zero(); n * item];
    for i in tree.leaves() {
        let base = i as usize * item;
        for k in 0..item {
            out[base + k] = acc.lift(ld[base + k]);
        }
    }
    for i in tree.internal_nodes() {
        let base = i as usize * item;
        for k in 0..item {
            let reduced = acc
                .reduce(tree.children(i).iter().map(|&c| out[c as usize * item + k]))
                .ok_or(Error::EmptyReduction { node: i })?;
            out[base + k] = combine.apply(acc.lift(w[base + k]), reduced);
        }
    }

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// [`accumulate_and_combine_sequential`] with elementwise addition.
pub fn accumulate_and_add_sequential<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    accumulate_and_combine_sequential(tree, node_weights, leaf_data, acc, CombineOp::Add)
}

/// [`accumulate_and_combine_sequential`] with elementwise multiplication.
pub fn accumulate_and_multiply_sequential<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    accumulate_and_combine_sequential(tree, node_weights, leaf_data, acc, CombineOp::Multiply)
}

/// [`accumulate_and_combine_sequential`] with elementwise minimum.
pub fn accumulate_and_min_sequential<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    accumulate_and_combine_sequential(tree, node_weights, leaf_data, acc, CombineOp::Min)
}

/// [`accumulate_and_combine_sequential`] with elementwise maximum.
pub fn accumulate_and_max_sequential<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    accumulate_and_combine_sequential(tree, node_weights, leaf_data, acc, CombineOp::Max)
}

// =============================================================================
// Downward Propagations
// =============================================================================

/// Conditionally push values from the root towards the leaves:
/// the root keeps `W(root)`, and every other node, visited parents-first,
/// takes `out(parent(i))` where `condition` holds and keeps `W(i)` elsewhere.
///
/// The inherited value comes from the already-updated ancestor chain, so a
/// run of condition-true nodes all receive the value of their nearest
/// condition-false (or root) ancestor. Compare [`propagate_parallel`], which
/// reads the original parent weights instead.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `node_weights` is not node-indexed or
/// `condition` does not cover every node.
pub fn propagate_sequential<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    condition: &[bool],
) -> Result<ValuedTree<'t, T>>
where
    T: Element,
{
    weights::check_node_indexed(tree, &node_weights, "node weights")?;
    weights::check_condition(tree, condition)?;
    let item_shape = node_weights.shape()[1..].to_vec();
    let item = weights::item_size(node_weights.shape());
    let n = tree.num_nodes();

    let w = node_weights.as_standard_layout();
    let w = w.as_slice().expect("standard layout array is contiguous");

    // The root row of the copy is already final; the descending scan only
    // ever reads rows it has finished.
    let mut out = w.to_vec();
    for i in (0..n - 1).rev() {
        if condition[i] {
            let parent = tree.parent(i as NodeId) as usize;
            let (lower, upper) = out.split_at_mut(parent * item);
            lower[i * item..(i + 1) * item].copy_from_slice(&upper[..item]);
        }
    }

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// Push values from the root towards the leaves, combining each node's own
/// weight with its parent's already-computed result:
/// the root keeps `W(root)`, and every other node, visited parents-first,
/// computes `out(i) = reduce({ W(i), out(parent(i)) })`.
///
/// Unlike [`propagate_sequential`] this is an unconditional combine, not a
/// copy-or-keep choice. With `min` and altitude weights it computes the
/// running minimum along every root path.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `node_weights` is not node-indexed.
pub fn propagate_sequential_and_accumulate<'t, T, A>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    acc: A,
) -> Result<ValuedTree<'t, OutputOf<A, T>>>
where
    T: Element,
    A: AccumulateInto<T>,
{
    weights::check_node_indexed(tree, &node_weights, "node weights")?;
    let item_shape = node_weights.shape()[1..].to_vec();
    let item = weights::item_size(node_weights.shape());
    let n = tree.num_nodes();

    let w = node_weights.as_standard_layout();
    let w = w.as_slice().expect("standard layout array is contiguous");

    let mut out: Vec<OutputOf<A, T>> = vec![<OutputOf<A, T> as Zero>::zero(); n * item];
    let root_base = (n - 1) * item;
    for k in 0..item {
        out[root_base + k] = acc.lift(w[root_base + k]);
    }
    for i in (0..n - 1).rev() {
        let parent_base = tree.parent(i as NodeId) as usize * item;
        let base = i * item;
        for k in 0..item {
            let own = acc.lift(w[base + k]);
            let inherited = out[parent_base + k];
            out[base + k] = acc
                .reduce([own, inherited])
                .expect("reduction over two values is never empty");
        }
    }

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// For each node where `condition` holds, take the parent's *original*
/// weight; elsewhere keep the node's own weight. The root is unaffected
/// since it is its own parent. A missing condition means true everywhere:
/// every node takes its parent's value.
///
/// Every node reads only the input array, never another node's result, so
/// the nodes are processed independently, in parallel for large trees. This
/// single-step lookup is what distinguishes it from the flooding
/// [`propagate_sequential`].
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `node_weights` is not node-indexed or a
/// supplied `condition` does not cover every node.
pub fn propagate_parallel<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    condition: Option<&[bool]>,
) -> Result<ValuedTree<'t, T>>
where
    T: Element,
{
    weights::check_node_indexed(tree, &node_weights, "node weights")?;
    if let Some(condition) = condition {
        weights::check_condition(tree, condition)?;
    }
    let item_shape = node_weights.shape()[1..].to_vec();
    let item = weights::item_size(node_weights.shape());
    let n = tree.num_nodes();

    let w = node_weights.as_standard_layout();
    let w = w.as_slice().expect("standard layout array is contiguous");

    let mut out = vec![T::zero(); n * item];
    parallelism_for(n * item).maybe_par_bridge_for_each(
        out.chunks_mut(item.max(1)).enumerate(),
        |(i, out_row)| {
            let take_parent = condition.map_or(true, |c| c[i]);
            let src = if take_parent {
                tree.parent(i as NodeId) as usize
            } else {
                i
            };
            out_row.copy_from_slice(&w[src * item..src * item + item]);
        },
    );

    Ok(ValuedTree::new_unchecked(
        tree,
        into_node_array(out, n, &item_shape),
    ))
}

/// Read a filtered hierarchy back onto its leaves: propagate each deleted
/// node's nearest surviving ancestor value downwards, then extract the leaf
/// rows. Returns a leaf-indexed array.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `node_weights` is not node-indexed or
/// `deleted` does not cover every node.
pub fn reconstruct_leaf_data<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    deleted: &[bool],
) -> Result<ArrayD<T>>
where
    T: Element,
{
    let propagated = propagate_sequential(tree, node_weights, deleted)?;
    Ok(propagated.leaf_weights().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::{Max, Min, Sum};
    use ndarray::IxDyn;

    fn example_tree() -> Tree {
        Tree::from_parents(vec![3, 3, 4, 4, 4]).unwrap()
    }

    fn nodes(values: Vec<f64>) -> ArrayD<f64> {
        let len = values.len();
        ArrayD::from_shape_vec(IxDyn(&[len]), values).unwrap()
    }

    #[test]
    fn parallel_reduction_over_children() {
        let tree = example_tree();
        let w = nodes(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let out = accumulate_parallel(&tree, w.view(), Sum).unwrap();
        // Leaves get the identity; node 3 sums leaves {0, 1}; the root sums
        // nodes {2, 3}.
        assert_eq!(out.weights().as_slice().unwrap(), &[0.0, 0.0, 0.0, 3.0, 7.0]);
    }

    #[test]
    fn sequential_reduction_from_leaves() {
        let tree = example_tree();
        let leaf = nodes(vec![1.0, 2.0, 3.0]);

        let out = accumulate_sequential(&tree, leaf.view(), Sum).unwrap();
        assert_eq!(out.weights().as_slice().unwrap(), &[1.0, 2.0, 3.0, 3.0, 6.0]);
    }

    #[test]
    fn combine_variants_apply_elementwise_operator() {
        let tree = example_tree();
        let w = nodes(vec![0.0, 0.0, 0.0, 10.0, 100.0]);
        let leaf = nodes(vec![1.0, 2.0, 3.0]);

        let add = accumulate_and_add_sequential(&tree, w.view(), leaf.view(), Sum).unwrap();
        assert_eq!(
            add.weights().as_slice().unwrap(),
            &[1.0, 2.0, 3.0, 13.0, 116.0]
        );

        let min = accumulate_and_min_sequential(&tree, w.view(), leaf.view(), Min).unwrap();
        // Node 3: min(10, min(1, 2)) = 1; root: min(100, min(3, 1)) = 1.
        assert_eq!(min.weights().as_slice().unwrap(), &[1.0, 2.0, 3.0, 1.0, 1.0]);

        let max = accumulate_and_max_sequential(&tree, w.view(), leaf.view(), Max).unwrap();
        assert_eq!(
            max.weights().as_slice().unwrap(),
            &[1.0, 2.0, 3.0, 10.0, 100.0]
        );
    }

    #[test]
    fn propagation_uses_updated_ancestors() {
        let tree = example_tree();
        let w = nodes(vec![1.0, 2.0, 3.0, 10.0, 100.0]);
        let condition = [true, false, false, true, false];

        let out = propagate_sequential(&tree, w.view(), &condition).unwrap();
        // Node 3 inherits the root value; leaf 0 then inherits the updated
        // node 3, not its original weight.
        assert_eq!(
            out.weights().as_slice().unwrap(),
            &[100.0, 2.0, 3.0, 100.0, 100.0]
        );
    }

    #[test]
    fn parallel_propagation_reads_original_weights() {
        let tree = example_tree();
        let w = nodes(vec![1.0, 2.0, 3.0, 10.0, 100.0]);
        let condition = [true, false, false, true, false];

        let out = propagate_parallel(&tree, w.view(), Some(&condition)).unwrap();
        // Leaf 0 takes the *original* weight of node 3.
        assert_eq!(
            out.weights().as_slice().unwrap(),
            &[10.0, 2.0, 3.0, 100.0, 100.0]
        );
    }

    #[test]
    fn single_node_tree_keeps_its_value() {
        let tree = Tree::from_parents(vec![0]).unwrap();
        let w = nodes(vec![7.0]);
        let leaf = nodes(vec![7.0]);

        let seq = accumulate_sequential(&tree, leaf.view(), Sum).unwrap();
        assert_eq!(seq.weights().as_slice().unwrap(), &[7.0]);

        let prop = propagate_parallel(&tree, w.view(), None).unwrap();
        assert_eq!(prop.weights().as_slice().unwrap(), &[7.0]);

        let flood = propagate_sequential(&tree, w.view(), &[true]).unwrap();
        assert_eq!(flood.weights().as_slice().unwrap(), &[7.0]);
    }
}
