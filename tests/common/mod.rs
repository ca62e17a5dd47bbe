//! Shared fixtures for integration tests.

#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};

pub use canopy::testing::{
    assert_slices_approx_eq, comb_tree, random_binary_tree, three_leaf_tree, DEFAULT_TOLERANCE,
};

/// Build a 1-d (scalar per node) weight array.
pub fn scalar_weights(values: Vec<f64>) -> ArrayD<f64> {
    let len = values.len();
    ArrayD::from_shape_vec(IxDyn(&[len]), values).expect("shape matches data")
}

/// Build a 2-d weight array with `dim` components per node row.
pub fn vector_weights(rows: usize, dim: usize, values: Vec<f64>) -> ArrayD<f64> {
    ArrayD::from_shape_vec(IxDyn(&[rows, dim]), values).expect("shape matches data")
}
