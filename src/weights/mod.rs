//! Node-weight array adapter.
//!
//! Node weights are `ndarray` dynamic-dimension arrays whose leading axis
//! indexes tree nodes (or leaves, for the leaf-initialization inputs of the
//! sequential reductions). Any trailing shape is supported: scalar weights
//! are 1-d arrays, vector or tensor weights add trailing axes. This module
//! validates the leading-dimension and trailing-shape contracts and provides
//! [`ValuedTree`], the pairing of a freshly computed weight array with the
//! tree it was computed over.

use ndarray::{ArrayD, ArrayViewD, Slice};

use crate::error::{Error, Result};
use crate::tree::Tree;

/// Semantic axis constants for tree-indexed arrays.
pub mod axis {
    use ndarray::Axis;

    /// Leading axis: one row per tree node (or per leaf for leaf-indexed data).
    pub const NODES: Axis = Axis(0);
}

/// Check that an array is node-indexed: leading dimension equals the node count.
pub fn check_node_indexed<T>(tree: &Tree, weights: &ArrayViewD<'_, T>, what: &'static str) -> Result<()> {
    check_leading(weights, tree.num_nodes(), what)
}

/// Check that an array is leaf-indexed: leading dimension equals the leaf count.
pub fn check_leaf_indexed<T>(tree: &Tree, weights: &ArrayViewD<'_, T>, what: &'static str) -> Result<()> {
    check_leading(weights, tree.num_leaves(), what)
}

/// Check that two arrays agree on their per-node item shape.
pub fn check_same_items<T, U>(a: &ArrayViewD<'_, T>, b: &ArrayViewD<'_, U>) -> Result<()> {
    let left = item_shape_of(a.shape());
    let right = item_shape_of(b.shape());
    if left != right {
        return Err(Error::TrailingShapeMismatch {
            left: left.to_vec(),
            right: right.to_vec(),
        });
    }
    Ok(())
}

/// Check that a boolean condition covers every node of the tree.
pub fn check_condition(tree: &Tree, condition: &[bool]) -> Result<()> {
    if condition.len() != tree.num_nodes() {
        return Err(Error::ShapeMismatch {
            what: "condition",
            expected: tree.num_nodes(),
            actual: condition.len(),
        });
    }
    Ok(())
}

fn check_leading<T>(view: &ArrayViewD<'_, T>, expected: usize, what: &'static str) -> Result<()> {
    let actual = view.shape().first().copied().unwrap_or(0);
    if actual != expected {
        return Err(Error::ShapeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Trailing (per-node) shape of an array shape; empty for scalar weights.
#[inline]
pub(crate) fn item_shape_of(shape: &[usize]) -> &[usize] {
    shape.get(1..).unwrap_or(&[])
}

/// Number of scalar components per node row; 1 for scalar weights.
#[inline]
pub(crate) fn item_size(shape: &[usize]) -> usize {
    item_shape_of(shape).iter().product()
}

// =============================================================================
// ValuedTree
// =============================================================================

/// A node-indexed weight array paired with the tree it was computed over.
///
/// Every traversal returns one of these. The pairing is a tag, not
/// ownership: the tree is borrowed, the weights are owned, and no
/// back-pointer is ever installed. Downstream code that needs to map
/// leaf-indexed results back onto the vertices of a separate graph reads the
/// tag through [`tree`](ValuedTree::tree).
#[derive(Debug, Clone)]
pub struct ValuedTree<'t, T> {
    tree: &'t Tree,
    weights: ArrayD<T>,
}

impl<'t, T> ValuedTree<'t, T> {
    /// Pair an existing node-indexed array with a tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the array's leading dimension does
    /// not equal the tree's node count.
    pub fn new(tree: &'t Tree, weights: ArrayD<T>) -> Result<Self> {
        check_node_indexed(tree, &weights.view(), "node weights")?;
        Ok(Self { tree, weights })
    }

    /// Pairing for engine-produced arrays, which are correctly shaped by
    /// construction.
    pub(crate) fn new_unchecked(tree: &'t Tree, weights: ArrayD<T>) -> Self {
        debug_assert_eq!(weights.shape().first(), Some(&tree.num_nodes()));
        Self { tree, weights }
    }

    /// The tree these weights were computed over.
    #[inline]
    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    /// The node-indexed weight array.
    #[inline]
    pub fn weights(&self) -> &ArrayD<T> {
        &self.weights
    }

    /// View of the weight array.
    #[inline]
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.weights.view()
    }

    /// Rows of the leaf nodes only.
    #[inline]
    pub fn leaf_weights(&self) -> ArrayViewD<'_, T> {
        self.weights
            .slice_axis(axis::NODES, Slice::from(0..self.tree.num_leaves()))
    }

    /// Per-node item shape; empty for scalar weights.
    #[inline]
    pub fn item_shape(&self) -> &[usize] {
        item_shape_of(self.weights.shape())
    }

    /// Give up the pairing and keep the weights.
    #[inline]
    pub fn into_weights(self) -> ArrayD<T> {
        self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn example_tree() -> Tree {
        Tree::from_parents(vec![3, 3, 4, 4, 4]).unwrap()
    }

    #[test]
    fn node_indexed_accepts_matching_length() {
        let tree = example_tree();
        let w = ArrayD::from_shape_vec(IxDyn(&[5]), vec![0.0; 5]).unwrap();
        assert!(check_node_indexed(&tree, &w.view(), "node weights").is_ok());
    }

    #[test]
    fn leaf_indexed_rejects_wrong_length() {
        let tree = example_tree();
        let w = ArrayD::from_shape_vec(IxDyn(&[2]), vec![0.0; 2]).unwrap();
        let err = check_leaf_indexed(&tree, &w.view(), "leaf data").unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                what: "leaf data",
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn item_shapes_must_agree() {
        let a = ArrayD::from_shape_vec(IxDyn(&[5, 2]), vec![0.0; 10]).unwrap();
        let b = ArrayD::from_shape_vec(IxDyn(&[3, 3]), vec![0.0; 9]).unwrap();
        let err = check_same_items(&a.view(), &b.view()).unwrap_err();
        assert_eq!(
            err,
            Error::TrailingShapeMismatch {
                left: vec![2],
                right: vec![3]
            }
        );
    }

    #[test]
    fn item_size_of_scalar_rows_is_one() {
        assert_eq!(item_size(&[7]), 1);
        assert_eq!(item_size(&[7, 3]), 3);
        assert_eq!(item_size(&[7, 2, 4]), 8);
    }

    #[test]
    fn valued_tree_exposes_tag_and_leaf_rows() {
        let tree = example_tree();
        let w = ArrayD::from_shape_vec(IxDyn(&[5]), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let valued = ValuedTree::new(&tree, w).unwrap();

        assert_eq!(valued.tree().num_nodes(), 5);
        assert_eq!(valued.item_shape(), &[] as &[usize]);
        assert_eq!(
            valued.leaf_weights().as_slice().unwrap(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn valued_tree_rejects_wrong_leading_dimension() {
        let tree = example_tree();
        let w = ArrayD::from_shape_vec(IxDyn(&[4]), vec![0.0; 4]).unwrap();
        assert!(matches!(
            ValuedTree::new(&tree, w),
            Err(Error::ShapeMismatch { expected: 5, actual: 4, .. })
        ));
    }
}
