//! Native 32-bit integer backend

use super::ComputeBackend;
use crate::error::Result;
use crate::ops::{Activation, ArithOp, Elementwise, Gemm, MatMulDims, Scalar, ScalarPosition, Softmax};
use crate::precision::{Int32, Precision};
use crate::shape::Shape;
use crate::storage::{DenseData, TensorData};
use crate::validation::TensorValidator;

/// Saturating 32-bit kernels
///
/// Arithmetic widens to `i64` and clamps; matmul accumulates in `i128`.
/// Activations convert to `f64`, apply, round and clamp without rescaling,
/// so sigmoid and softmax collapse to 0 or 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int32Backend;

impl Int32Backend {
    /// Creates the backend
    pub fn new() -> Self {
        Self
    }
}

fn store_i128(acc: i128) -> i32 {
    acc.clamp(i32::MIN as i128, i32::MAX as i128) as i32
}

impl ComputeBackend for Int32Backend {
    type Precision = Int32;

    fn name(&self) -> &'static str {
        "int32"
    }

    fn matmul(&self, a: &DenseData<i32>, b: &DenseData<i32>) -> Result<DenseData<i32>> {
        let (m, k, n) = TensorValidator::validate_matmul_shapes(a.shape(), b.shape())?;
        let out = Gemm::compute(a.values(), b.values(), MatMulDims::new(m, k, n), i128::from, store_i128);
        DenseData::new(out, Shape::matrix(m, n)?)
    }

    fn scale(&self, a: &DenseData<i32>, factor: f64) -> Result<DenseData<i32>> {
        let out = a.values().iter().map(|&v| Int32::from_f64(v as f64 * factor)).collect();
        DenseData::new(out, a.shape().clone())
    }

    fn dot(&self, a: &DenseData<i32>, b: &DenseData<i32>) -> Result<f64> {
        TensorValidator::validate_same_shape(a.shape(), b.shape(), "dot")?;
        let sum: i128 = a.values()
            .iter()
            .zip(b.values())
            .map(|(&x, &y)| x as i128 * y as i128)
            .sum();
        Ok(sum as f64)
    }

    fn binary(&self, a: &DenseData<i32>, b: &DenseData<i32>, op: ArithOp) -> Result<DenseData<i32>> {
        TensorValidator::validate_binary_op_shapes(a.shape(), b.shape(), op.name())?;
        let (out, shape) = Elementwise::saturating(a.values(), a.shape(), b.values(), b.shape(), op)?;
        DenseData::new(out, shape)
    }

    fn scalar_op(
        &self,
        a: &DenseData<i32>,
        op: ArithOp,
        scalar: Scalar,
        position: ScalarPosition,
    ) -> Result<DenseData<i32>> {
        DenseData::new(Elementwise::saturating_scalar(a.values(), op, scalar, position), a.shape().clone())
    }

    fn activation(&self, a: &DenseData<i32>, activation: Activation) -> Result<DenseData<i32>> {
        let out = match activation {
            Activation::Relu => a.values().iter().map(|&v| v.max(0)).collect(),
            _ => activation.map_rescaled(a.values(), 1.0, Int32::to_f64, Int32::from_f64),
        };
        DenseData::new(out, a.shape().clone())
    }

    fn softmax(&self, a: &DenseData<i32>, dim: usize) -> Result<DenseData<i32>> {
        let out = Softmax::apply_rescaled(a.values(), a.shape(), dim, 1.0, Int32::to_f64, Int32::from_f64)?;
        DenseData::new(out, a.shape().clone())
    }
}
