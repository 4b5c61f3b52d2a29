//! Native single precision backend

use super::ComputeBackend;
use crate::error::Result;
use crate::ops::{Activation, ArithOp, BatchedMatMul, Elementwise, Gemm, MatMulDims, Scalar, ScalarPosition, Softmax};
use crate::precision::Fp32;
use crate::shape::Shape;
use crate::storage::{DenseData, TensorData};
use crate::validation::{MatMul4dKind, TensorValidator};

/// IEEE float kernels; never saturates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fp32Backend;

impl Fp32Backend {
    /// Creates the backend
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for Fp32Backend {
    type Precision = Fp32;

    fn name(&self) -> &'static str {
        "fp32"
    }

    fn matmul(&self, a: &DenseData<f32>, b: &DenseData<f32>) -> Result<DenseData<f32>> {
        let (m, k, n) = TensorValidator::validate_matmul_shapes(a.shape(), b.shape())?;
        let out = Gemm::compute_f32(a.values(), b.values(), MatMulDims::new(m, k, n));
        DenseData::new(out, Shape::matrix(m, n)?)
    }

    fn matmul4d(&self, a: &DenseData<f32>, b: &DenseData<f32>) -> Result<DenseData<f32>> {
        match TensorValidator::validate_matmul4d_shapes(a.shape(), b.shape())? {
            MatMul4dKind::Batched { batch, channels, m, k, n } => {
                let out = BatchedMatMul::compute_f32(a.values(), b.values(), batch * channels, MatMulDims::new(m, k, n));
                DenseData::new(out, Shape::new(vec![batch, channels, m, n])?)
            }
            MatMul4dKind::ChannelMix { batch, channels_in, channels_out, spatial } => {
                let out = BatchedMatMul::channel_mix_f32(a.values(), b.values(), batch, channels_in, channels_out, spatial);
                let dims = a.shape().dims();
                DenseData::new(out, Shape::new(vec![batch, channels_out, dims[2], dims[3]])?)
            }
        }
    }

    fn scale(&self, a: &DenseData<f32>, factor: f64) -> Result<DenseData<f32>> {
        let factor = factor as f32;
        let out = a.values().iter().map(|&v| v * factor).collect();
        DenseData::new(out, a.shape().clone())
    }

    fn dot(&self, a: &DenseData<f32>, b: &DenseData<f32>) -> Result<f64> {
        TensorValidator::validate_same_shape(a.shape(), b.shape(), "dot")?;
        Ok(a.values()
            .iter()
            .zip(b.values())
            .map(|(&x, &y)| x as f64 * y as f64)
            .sum())
    }

    fn binary(&self, a: &DenseData<f32>, b: &DenseData<f32>, op: ArithOp) -> Result<DenseData<f32>> {
        TensorValidator::validate_binary_op_shapes(a.shape(), b.shape(), op.name())?;
        let (out, shape) = Elementwise::float(a.values(), a.shape(), b.values(), b.shape(), op)?;
        DenseData::new(out, shape)
    }

    fn scalar_op(
        &self,
        a: &DenseData<f32>,
        op: ArithOp,
        scalar: Scalar,
        position: ScalarPosition,
    ) -> Result<DenseData<f32>> {
        let out = Elementwise::float_scalar(a.values(), op, scalar.as_f64() as f32, position);
        DenseData::new(out, a.shape().clone())
    }

    fn activation(&self, a: &DenseData<f32>, activation: Activation) -> Result<DenseData<f32>> {
        DenseData::new(activation.map(a.values()), a.shape().clone())
    }

    fn softmax(&self, a: &DenseData<f32>, dim: usize) -> Result<DenseData<f32>> {
        DenseData::new(Softmax::apply(a.values(), a.shape(), dim)?, a.shape().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(values: Vec<f32>, dims: &[usize]) -> DenseData<f32> {
        DenseData::new(values, Shape::from_slice(dims).unwrap()).unwrap()
    }

    #[test]
    fn test_matmul() {
        let backend = Fp32Backend::new();
        let a = data(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = data(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]);
        let c = backend.matmul(&a, &b).unwrap();
        assert_eq!(c.values(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul4d_batched_shape() {
        let backend = Fp32Backend::new();
        let a = data(vec![1.0; 2 * 3 * 4 * 5], &[2, 3, 4, 5]);
        let b = data(vec![1.0; 2 * 3 * 5 * 2], &[2, 3, 5, 2]);
        let c = backend.matmul4d(&a, &b).unwrap();
        assert_eq!(c.shape().dims(), &[2, 3, 4, 2]);
        assert!(c.values().iter().all(|&v| v == 5.0));
    }

    #[test]
    fn test_matmul4d_channel_mix() {
        let backend = Fp32Backend::new();
        // [1, 2, 1, 2] input, identity-like [2, 3] weights
        let a = data(vec![1.0, 2.0, 3.0, 4.0], &[1, 2, 1, 2]);
        let w = data(vec![1.0, 0.0, 1.0, 0.0, 1.0, 1.0], &[2, 3]);
        let c = backend.matmul4d(&a, &w).unwrap();
        assert_eq!(c.shape().dims(), &[1, 3, 1, 2]);
        assert_eq!(c.values(), &[1.0, 2.0, 3.0, 4.0, 4.0, 6.0]);
    }

    #[test]
    fn test_matmul4d_rejects_rank_3() {
        let backend = Fp32Backend::new();
        let a = data(vec![1.0; 8], &[2, 2, 2]);
        let b = data(vec![1.0; 4], &[2, 2]);
        assert!(backend.matmul4d(&a, &b).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_float_division_is_ieee() {
        let backend = Fp32Backend::new();
        let a = data(vec![1.0, 0.0], &[2]);
        let b = data(vec![0.0, 0.0], &[2]);
        let c = backend.div(&a, &b).unwrap();
        assert!(c.values()[0].is_infinite());
        assert!(c.values()[1].is_nan());
    }

    #[test]
    fn test_dot_requires_equal_shapes() {
        let backend = Fp32Backend::new();
        let a = data(vec![1.0, 2.0, 3.0], &[3]);
        let b = data(vec![4.0, 5.0, 6.0], &[3]);
        assert_eq!(backend.dot(&a, &b).unwrap(), 32.0);

        let c = data(vec![1.0; 3], &[3, 1]);
        assert!(backend.dot(&a, &c).is_err());
    }
}
