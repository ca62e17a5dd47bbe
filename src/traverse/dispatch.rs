//! Runtime-kind dispatch onto the typed traversals.
//!
//! These variants take an [`AccumulatorKind`] instead of an operator type,
//! for callers that pick the reduction at runtime (configuration files,
//! bindings, CLIs). They are defined over float element types, where every
//! kind's output is representable in the input type; integer inputs that
//! need `mean`/`product` promotion go through the typed layer instead.

use ndarray::ArrayViewD;

use crate::accumulate::{
    AccumulatorKind, ArgMax, ArgMin, Counting, First, Last, Max, Mean, Min, Product, Sum,
};
use crate::element::FloatElement;
use crate::error::Result;
use crate::tree::Tree;
use crate::weights::ValuedTree;

use super::{
    accumulate_and_combine_sequential, accumulate_parallel, accumulate_sequential,
    propagate_sequential_and_accumulate, CombineOp,
};

/// [`accumulate_parallel`] with the accumulator chosen at runtime.
pub fn accumulate_parallel_dyn<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    kind: AccumulatorKind,
) -> Result<ValuedTree<'t, T>>
where
    T: FloatElement,
{
    match kind {
        AccumulatorKind::Sum => accumulate_parallel(tree, node_weights, Sum),
        AccumulatorKind::Mean => accumulate_parallel(tree, node_weights, Mean),
        AccumulatorKind::Min => accumulate_parallel(tree, node_weights, Min),
        AccumulatorKind::Max => accumulate_parallel(tree, node_weights, Max),
        AccumulatorKind::Product => accumulate_parallel(tree, node_weights, Product),
        AccumulatorKind::Counting => accumulate_parallel(tree, node_weights, Counting),
        AccumulatorKind::First => accumulate_parallel(tree, node_weights, First),
        AccumulatorKind::Last => accumulate_parallel(tree, node_weights, Last),
        AccumulatorKind::ArgMin => accumulate_parallel(tree, node_weights, ArgMin),
        AccumulatorKind::ArgMax => accumulate_parallel(tree, node_weights, ArgMax),
    }
}

/// [`accumulate_sequential`] with the accumulator chosen at runtime.
pub fn accumulate_sequential_dyn<'t, T>(
    tree: &'t Tree,
    leaf_data: ArrayViewD<'_, T>,
    kind: AccumulatorKind,
) -> Result<ValuedTree<'t, T>>
where
    T: FloatElement,
{
    match kind {
        AccumulatorKind::Sum => accumulate_sequential(tree, leaf_data, Sum),
        AccumulatorKind::Mean => accumulate_sequential(tree, leaf_data, Mean),
        AccumulatorKind::Min => accumulate_sequential(tree, leaf_data, Min),
        AccumulatorKind::Max => accumulate_sequential(tree, leaf_data, Max),
        AccumulatorKind::Product => accumulate_sequential(tree, leaf_data, Product),
        AccumulatorKind::Counting => accumulate_sequential(tree, leaf_data, Counting),
        AccumulatorKind::First => accumulate_sequential(tree, leaf_data, First),
        AccumulatorKind::Last => accumulate_sequential(tree, leaf_data, Last),
        AccumulatorKind::ArgMin => accumulate_sequential(tree, leaf_data, ArgMin),
        AccumulatorKind::ArgMax => accumulate_sequential(tree, leaf_data, ArgMax),
    }
}

/// [`propagate_sequential_and_accumulate`] with the accumulator chosen at
/// runtime.
pub fn propagate_sequential_and_accumulate_dyn<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    kind: AccumulatorKind,
) -> Result<ValuedTree<'t, T>>
where
    T: FloatElement,
{
    match kind {
        AccumulatorKind::Sum => propagate_sequential_and_accumulate(tree, node_weights, Sum),
        AccumulatorKind::Mean => propagate_sequential_and_accumulate(tree, node_weights, Mean),
        AccumulatorKind::Min => propagate_sequential_and_accumulate(tree, node_weights, Min),
        AccumulatorKind::Max => propagate_sequential_and_accumulate(tree, node_weights, Max),
        AccumulatorKind::Product => {
            propagate_sequential_and_accumulate(tree, node_weights, Product)
        }
        AccumulatorKind::Counting => {
            propagate_sequential_and_accumulate(tree, node_weights, Counting)
        }
        AccumulatorKind::First => propagate_sequential_and_accumulate(tree, node_weights, First),
        AccumulatorKind::Last => propagate_sequential_and_accumulate(tree, node_weights, Last),
        AccumulatorKind::ArgMin => propagate_sequential_and_accumulate(tree, node_weights, ArgMin),
        AccumulatorKind::ArgMax => propagate_sequential_and_accumulate(tree, node_weights, ArgMax),
    }
}

/// [`accumulate_and_combine_sequential`] with the accumulator chosen at
/// runtime.
pub fn accumulate_and_combine_sequential_dyn<'t, T>(
    tree: &'t Tree,
    node_weights: ArrayViewD<'_, T>,
    leaf_data: ArrayViewD<'_, T>,
    kind: AccumulatorKind,
    combine: CombineOp,
) -> Result<ValuedTree<'t, T>>
where
    T: FloatElement,
{
    match kind {
        AccumulatorKind::Sum => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Sum, combine)
        }
        AccumulatorKind::Mean => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Mean, combine)
        }
        AccumulatorKind::Min => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Min, combine)
        }
        AccumulatorKind::Max => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Max, combine)
        }
        AccumulatorKind::Product => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Product, combine)
        }
        AccumulatorKind::Counting => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Counting, combine)
        }
        AccumulatorKind::First => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, First, combine)
        }
        AccumulatorKind::Last => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, Last, combine)
        }
        AccumulatorKind::ArgMin => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, ArgMin, combine)
        }
        AccumulatorKind::ArgMax => {
            accumulate_and_combine_sequential(tree, node_weights, leaf_data, ArgMax, combine)
        }
    }
}
