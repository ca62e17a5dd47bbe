//! Testing utilities: assertion helpers and synthetic tree fixtures.
//!
//! Used by both the unit tests and the integration suite:
//!
//! ```ignore
//! use canopy::testing::{assert_slices_approx_eq, comb_tree};
//! ```

use approx::AbsDiffEq;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::tree::{NodeId, Tree};

/// Default tolerance for floating point comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

// =============================================================================
// Assertions
// =============================================================================

/// Assert that two f64 slices are elementwise approximately equal.
///
/// # Panics
///
/// Panics with the first differing index if lengths or values disagree.
pub fn assert_slices_approx_eq(actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "slice lengths differ: {} vs {}",
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            a.abs_diff_eq(e, epsilon),
            "values differ at index {i}: {a} vs {e}"
        );
    }
}

// =============================================================================
// Tree Fixtures
// =============================================================================

/// The worked three-leaf example: leaves `{0, 1, 2}`, node 3 groups leaves
/// 0 and 1, root 4 groups node 3 with leaf 2.
pub fn three_leaf_tree() -> Tree {
    Tree::from_parents(vec![3, 3, 4, 4, 4]).expect("fixture tree is well formed")
}

/// A left-comb binary tree over `num_leaves` leaves: each internal node
/// merges the next leaf into the running group, like a fully unbalanced
/// dendrogram.
///
/// # Panics
///
/// Panics if `num_leaves < 2`.
pub fn comb_tree(num_leaves: usize) -> Tree {
    assert!(num_leaves >= 2, "a comb tree needs at least two leaves");
    let num_nodes = 2 * num_leaves - 1;
    let mut parents = vec![0 as NodeId; num_nodes];
    parents[0] = num_leaves as NodeId;
    for leaf in 1..num_leaves {
        parents[leaf] = (num_leaves + leaf - 1) as NodeId;
    }
    for internal in num_leaves..num_nodes - 1 {
        parents[internal] = (internal + 1) as NodeId;
    }
    parents[num_nodes - 1] = (num_nodes - 1) as NodeId;
    Tree::from_parents(parents).expect("comb tree is well formed")
}

/// A random binary tree over `num_leaves` leaves, built by repeatedly
/// merging two random active subtrees under a fresh internal node - the
/// shape a hierarchical clustering of shuffled data produces. Deterministic
/// for a given seed.
///
/// # Panics
///
/// Panics if `num_leaves < 2`.
pub fn random_binary_tree(num_leaves: usize, seed: u64) -> Tree {
    assert!(num_leaves >= 2, "a binary tree needs at least two leaves");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let num_nodes = 2 * num_leaves - 1;
    let mut parents: Vec<NodeId> = (0..num_nodes as NodeId).collect();
    let mut active: Vec<NodeId> = (0..num_leaves as NodeId).collect();
    let mut next = num_leaves as NodeId;
    while active.len() > 1 {
        let a = active.swap_remove(rng.gen_range(0..active.len()));
        let b = active.swap_remove(rng.gen_range(0..active.len()));
        parents[a as usize] = next;
        parents[b as usize] = next;
        active.push(next);
        next += 1;
    }
    Tree::from_parents(parents).expect("merge construction yields a valid tree")
}
