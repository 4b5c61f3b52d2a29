//! Native 8-bit integer backend
//!
//! Arithmetic widens, computes and clamps to [-128, 127]. Matmul accumulates
//! in `i64`. Sigmoid, tanh and softmax divide codes by 127 into the
//! normalized domain, apply the float function and scale back.

use super::ComputeBackend;
use crate::error::Result;
use crate::ops::{Activation, ArithOp, Elementwise, Gemm, MatMulDims, SaturatingInt, Scalar, ScalarPosition, Softmax};
use crate::precision::{Int8, Precision};
use crate::shape::Shape;
use crate::storage::{DenseData, TensorData};
use crate::validation::TensorValidator;

/// Normalization scale for activations on 8-bit codes
pub const INT8_ACTIVATION_SCALE: f64 = 127.0;

/// Saturating 8-bit kernels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int8Backend;

impl Int8Backend {
    /// Creates the backend
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for Int8Backend {
    type Precision = Int8;

    fn name(&self) -> &'static str {
        "int8"
    }

    fn matmul(&self, a: &DenseData<i8>, b: &DenseData<i8>) -> Result<DenseData<i8>> {
        let (m, k, n) = TensorValidator::validate_matmul_shapes(a.shape(), b.shape())?;
        let out = Gemm::compute(a.values(), b.values(), MatMulDims::new(m, k, n), i64::from, i8::saturate);
        DenseData::new(out, Shape::matrix(m, n)?)
    }

    fn scale(&self, a: &DenseData<i8>, factor: f64) -> Result<DenseData<i8>> {
        let out = a.values().iter().map(|&v| Int8::from_f64(v as f64 * factor)).collect();
        DenseData::new(out, a.shape().clone())
    }

    fn dot(&self, a: &DenseData<i8>, b: &DenseData<i8>) -> Result<f64> {
        TensorValidator::validate_same_shape(a.shape(), b.shape(), "dot")?;
        let sum: i64 = a.values()
            .iter()
            .zip(b.values())
            .map(|(&x, &y)| x as i64 * y as i64)
            .sum();
        Ok(sum as f64)
    }

    fn binary(&self, a: &DenseData<i8>, b: &DenseData<i8>, op: ArithOp) -> Result<DenseData<i8>> {
        TensorValidator::validate_binary_op_shapes(a.shape(), b.shape(), op.name())?;
        let (out, shape) = Elementwise::saturating(a.values(), a.shape(), b.values(), b.shape(), op)?;
        DenseData::new(out, shape)
    }

    fn scalar_op(
        &self,
        a: &DenseData<i8>,
        op: ArithOp,
        scalar: Scalar,
        position: ScalarPosition,
    ) -> Result<DenseData<i8>> {
        DenseData::new(Elementwise::saturating_scalar(a.values(), op, scalar, position), a.shape().clone())
    }

    fn activation(&self, a: &DenseData<i8>, activation: Activation) -> Result<DenseData<i8>> {
        let out = match activation {
            Activation::Relu => a.values().iter().map(|&v| v.max(0)).collect(),
            _ => activation.map_rescaled(a.values(), INT8_ACTIVATION_SCALE, Int8::to_f64, Int8::from_f64),
        };
        DenseData::new(out, a.shape().clone())
    }

    fn softmax(&self, a: &DenseData<i8>, dim: usize) -> Result<DenseData<i8>> {
        let out = Softmax::apply_rescaled(
            a.values(),
            a.shape(),
            dim,
            INT8_ACTIVATION_SCALE,
            Int8::to_f64,
            Int8::from_f64,
        )?;
        DenseData::new(out, a.shape().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(values: Vec<i8>, dims: &[usize]) -> DenseData<i8> {
        DenseData::new(values, Shape::from_slice(dims).unwrap()).unwrap()
    }

    #[test]
    fn test_matmul_saturates_on_store() {
        let backend = Int8Backend::new();
        let a = data(vec![100, 100, 1, 2], &[2, 2]);
        let b = data(vec![100, 1, 100, 1], &[2, 2]);
        let c = backend.matmul(&a, &b).unwrap();
        // row 0: 20000 -> 127, 200 -> 127; row 1: 300 -> 127, 3
        assert_eq!(c.values(), &[127, 127, 127, 3]);
    }

    #[test]
    fn test_elementwise_saturation_and_div_zero() {
        let backend = Int8Backend::new();
        let a = data(vec![120, -120, 7], &[3]);
        let b = data(vec![10, 10, 0], &[3]);
        assert_eq!(backend.add(&a, &b).unwrap().values(), &[127, -110, 7]);
        assert_eq!(backend.sub(&a, &b).unwrap().values(), &[110, -128, 7]);
        assert_eq!(backend.div(&a, &b).unwrap().values(), &[12, -12, 0]);
    }

    #[test]
    fn test_scale_rounds_and_clamps() {
        let backend = Int8Backend::new();
        let a = data(vec![3, 100, -100], &[3]);
        assert_eq!(backend.scale(&a, 1.5).unwrap().values(), &[5, 127, -128]);
    }

    #[test]
    fn test_rescaled_activations() {
        let backend = Int8Backend::new();
        let a = data(vec![-127, 0, 127], &[3]);
        assert_eq!(backend.relu(&a).unwrap().values(), &[0, 0, 127]);
        // tanh(+-1) * 127 = +-96.7
        assert_eq!(backend.tanh(&a).unwrap().values(), &[-97, 0, 97]);

        let probs = backend.softmax(&data(vec![0, 0], &[2]), 0).unwrap();
        assert_eq!(probs.values(), &[64, 64]);
    }
}
