//! Numeric element types for node-weight arrays.

use std::fmt;

use num_traits::{Bounded, Float, FromPrimitive, One, Zero};

/// Scalar component type of a node-weight array.
///
/// The accumulators operate componentwise on values of a type implementing
/// this trait. The supplied `num_traits` bounds provide the identity elements
/// (`zero`/`one` for sum and product, `min_value`/`max_value` for max and
/// min) and the casts used by `counting` and the arg kinds.
///
/// # Numeric Promotion
///
/// [`Promoted`](Element::Promoted) is the result type of the averaging
/// reductions (`mean`, `product`): floats promote to themselves, integers to
/// `f64`. Every other accumulator kind preserves the element type.
pub trait Element:
    Copy + PartialOrd + Zero + One + Bounded + FromPrimitive + Send + Sync + fmt::Debug + 'static
{
    /// Floating-point type that `mean` and `product` results are computed in.
    type Promoted: Element + Float;

    /// Widen a value into the promoted domain.
    fn promote(self) -> Self::Promoted;

    /// Cast a count or child position into the element domain, saturating at
    /// the type's maximum.
    #[inline]
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::max_value)
    }
}

impl Element for f32 {
    type Promoted = f32;

    #[inline]
    fn promote(self) -> f32 {
        self
    }
}

impl Element for f64 {
    type Promoted = f64;

    #[inline]
    fn promote(self) -> f64 {
        self
    }
}

macro_rules! impl_integer_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                type Promoted = f64;

                #[inline]
                fn promote(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_integer_element!(u8, u32, u64, i32, i64);

/// Float element types, for which every accumulator kind produces the input
/// element type. The runtime-dispatch traversal variants are defined over
/// these.
pub trait FloatElement: Element<Promoted = Self> + Float {}

impl<T: Element<Promoted = T> + Float> FloatElement for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_promote_to_f64() {
        assert_eq!(3i32.promote(), 3.0f64);
        assert_eq!(250u8.promote(), 250.0f64);
    }

    #[test]
    fn floats_promote_to_themselves() {
        assert_eq!(1.5f32.promote(), 1.5f32);
        assert_eq!(1.5f64.promote(), 1.5f64);
    }

    #[test]
    fn from_count_saturates() {
        assert_eq!(u8::from_count(7), 7);
        assert_eq!(u8::from_count(1000), u8::MAX);
        assert_eq!(f64::from_count(1000), 1000.0);
    }
}
