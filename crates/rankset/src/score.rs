//! Score capabilities: how scores are ordered and summed.
//!
//! The set never inspects score values itself; every comparison goes
//! through a [`ScoreHandler`], so a score can be anything from a plain
//! integer to a composite struct (vip level, then level, say) as long as
//! the handler gives it a total order. `sum` exists solely for
//! `increment_by` and may be unsupported.

use std::cmp::Ordering;
use std::ops::Add;

use ordered_float::OrderedFloat;

use crate::error::SumUnsupported;

/// Total order plus optional addition over a score type.
///
/// Implementations must be consistent: `cmp` is a total order, and `sum`
/// returns a fresh value (scores are treated as immutable while indexed).
/// Two scores that compare `Equal` are interchangeable for ordering, even
/// if they are distinguishable values.
pub trait ScoreHandler<S> {
    /// Compares two scores.
    fn cmp(&self, a: &S, b: &S) -> Ordering;

    /// Computes `current + increment` as a fresh score.
    ///
    /// Returns [`SumUnsupported`] when the score type has no meaningful
    /// addition; callers propagate the error and leave state untouched.
    fn sum(&self, current: &S, increment: &S) -> Result<S, SumUnsupported>;
}

/// Handler for scores with an intrinsic order and addition (`i64`, `u32`, …).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<S> ScoreHandler<S> for NaturalOrder
where
    S: Ord + Clone + Add<Output = S>,
{
    fn cmp(&self, a: &S, b: &S) -> Ordering {
        a.cmp(b)
    }

    fn sum(&self, current: &S, increment: &S) -> Result<S, SumUnsupported> {
        Ok(current.clone() + increment.clone())
    }
}

/// Handler for `f64` scores, ordered via [`OrderedFloat`].
///
/// NaN sorts greater than every other value instead of poisoning
/// comparisons, so the list order stays total whatever the caller feeds in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatOrder;

impl ScoreHandler<f64> for FloatOrder {
    fn cmp(&self, a: &f64, b: &f64) -> Ordering {
        OrderedFloat(*a).cmp(&OrderedFloat(*b))
    }

    fn sum(&self, current: &f64, increment: &f64) -> Result<f64, SumUnsupported> {
        Ok(current + increment)
    }
}

/// Adapter that reverses the order of an inner handler.
///
/// Highest score ranks first. `sum` is forwarded unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Descending<H>(pub H);

impl<S, H> ScoreHandler<S> for Descending<H>
where
    H: ScoreHandler<S>,
{
    fn cmp(&self, a: &S, b: &S) -> Ordering {
        self.0.cmp(b, a)
    }

    fn sum(&self, current: &S, increment: &S) -> Result<S, SumUnsupported> {
        self.0.sum(current, increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_compares_and_sums() {
        let h = NaturalOrder;
        assert_eq!(ScoreHandler::<i64>::cmp(&h, &1, &2), Ordering::Less);
        assert_eq!(ScoreHandler::<i64>::cmp(&h, &2, &2), Ordering::Equal);
        assert_eq!(h.sum(&40, &2), Ok(42));
    }

    #[test]
    fn float_order_totalizes_nan() {
        let h = FloatOrder;
        assert_eq!(h.cmp(&1.0, &2.0), Ordering::Less);
        assert_eq!(h.cmp(&f64::NAN, &f64::INFINITY), Ordering::Greater);
        assert_eq!(h.cmp(&f64::NEG_INFINITY, &0.0), Ordering::Less);
        assert_eq!(h.sum(&1.5, &2.25), Ok(3.75));
    }

    #[test]
    fn descending_reverses() {
        let h = Descending(NaturalOrder);
        assert_eq!(ScoreHandler::<i64>::cmp(&h, &1, &2), Ordering::Greater);
        assert_eq!(ScoreHandler::<i64>::cmp(&h, &2, &1), Ordering::Less);
        // sum is untouched by the reversal
        assert_eq!(h.sum(&40, &2), Ok(42));
    }
}
