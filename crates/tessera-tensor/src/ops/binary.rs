//! Binary elementwise kernels
//!
//! Float kernels follow IEEE semantics. Integer kernels widen to `i64`,
//! compute, then clamp to the narrow range; division by zero yields 0.

use num_traits::Float;

use super::{ArithOp, Scalar, ScalarPosition};
use crate::broadcast;
use crate::error::Result;
use crate::shape::Shape;

/// Narrow signed integer with a saturating store from `i64`
pub trait SaturatingInt: Copy + Send + Sync + Into<i64> {
    /// Smallest representable value
    const LOWER: i64;
    /// Largest representable value
    const UPPER: i64;

    /// Clamps and narrows
    fn saturate(value: i64) -> Self;

    /// Rounds, clamps and narrows; NaN maps to zero
    fn saturate_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::saturate(0);
        }
        Self::saturate(value.round().clamp(Self::LOWER as f64, Self::UPPER as f64) as i64)
    }
}

impl SaturatingInt for i8 {
    const LOWER: i64 = i8::MIN as i64;
    const UPPER: i64 = i8::MAX as i64;

    fn saturate(value: i64) -> Self {
        value.clamp(Self::LOWER, Self::UPPER) as i8
    }
}

impl SaturatingInt for i32 {
    const LOWER: i64 = i32::MIN as i64;
    const UPPER: i64 = i32::MAX as i64;

    fn saturate(value: i64) -> Self {
        value.clamp(Self::LOWER, Self::UPPER) as i32
    }
}

/// Elementwise arithmetic with broadcasting
pub struct Elementwise;

impl Elementwise {
    /// Float operands, native arithmetic
    pub fn float<T: Float>(
        a: &[T],
        a_shape: &Shape,
        b: &[T],
        b_shape: &Shape,
        op: ArithOp,
    ) -> Result<(Vec<T>, Shape)> {
        broadcast::zip_broadcast(a, a_shape, b, b_shape, |x, y| op.apply_float(x, y))
    }

    /// Integer operands, widen then saturate
    pub fn saturating<T: SaturatingInt>(
        a: &[T],
        a_shape: &Shape,
        b: &[T],
        b_shape: &Shape,
        op: ArithOp,
    ) -> Result<(Vec<T>, Shape)> {
        broadcast::zip_broadcast(a, a_shape, b, b_shape, |x, y| {
            T::saturate(op.apply_int(x.into(), y.into()))
        })
    }

    /// Float tensor with a scalar converted to the tensor's precision
    pub fn float_scalar<T: Float>(a: &[T], op: ArithOp, scalar: T, position: ScalarPosition) -> Vec<T> {
        a.iter()
            .map(|&x| {
                let (l, r) = position.order(x, scalar);
                op.apply_float(l, r)
            })
            .collect()
    }

    /// Integer tensor with a scalar
    ///
    /// Integer scalars stay in `i64`; float scalars compute in `f64` and round.
    pub fn saturating_scalar<T: SaturatingInt>(
        a: &[T],
        op: ArithOp,
        scalar: Scalar,
        position: ScalarPosition,
    ) -> Vec<T> {
        match scalar {
            Scalar::Int(s) => a
                .iter()
                .map(|&x| {
                    let (l, r) = position.order(x.into(), s as i64);
                    T::saturate(op.apply_int(l, r))
                })
                .collect(),
            Scalar::Float(_) | Scalar::Double(_) => {
                let s = scalar.as_f64();
                a.iter()
                    .map(|&x| {
                        let widened: i64 = x.into();
                        let (l, r) = position.order(widened as f64, s);
                        T::saturate_f64(op.apply_int_f64(l, r))
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::from_slice(dims).unwrap()
    }

    #[test]
    fn test_saturating_add_clamps() {
        let s = shape(&[3]);
        let (out, _) =
            Elementwise::saturating(&[100i8, -100, 5], &s, &[100, -100, 5], &s, ArithOp::Add).unwrap();
        assert_eq!(out, vec![127, -128, 10]);
    }

    #[test]
    fn test_saturating_div_by_zero() {
        let s = shape(&[2]);
        let (out, _) = Elementwise::saturating(&[9i32, -9], &s, &[0, 2], &s, ArithOp::Div).unwrap();
        assert_eq!(out, vec![0, -4]);
    }

    #[test]
    fn test_float_broadcast() {
        let (out, out_shape) =
            Elementwise::float(&[1.0f32, 2.0], &shape(&[2, 1]), &[10.0, 20.0, 30.0], &shape(&[3]), ArithOp::Mul)
                .unwrap();
        assert_eq!(out_shape.dims(), &[2, 3]);
        assert_eq!(out, vec![10.0, 20.0, 30.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_scalar_positions() {
        let out = Elementwise::float_scalar(&[2.0f32, 4.0], ArithOp::Sub, 1.0, ScalarPosition::Lhs);
        assert_eq!(out, vec![-1.0, -3.0]);

        let out = Elementwise::saturating_scalar(&[10i8, -10], ArithOp::Mul, Scalar::Int(20), ScalarPosition::Rhs);
        assert_eq!(out, vec![127, -128]);

        let out = Elementwise::saturating_scalar(&[3i32, 0], ArithOp::Div, Scalar::Double(6.0), ScalarPosition::Lhs);
        assert_eq!(out, vec![2, 0]);

        let out = Elementwise::saturating_scalar(&[5i8], ArithOp::Mul, Scalar::Float(0.5), ScalarPosition::Rhs);
        assert_eq!(out, vec![3]);
    }
}
