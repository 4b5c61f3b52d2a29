//! Dtype-agnostic backend computing through `f64`
//!
//! Matmul, scale and dot are written once against the [`Precision`] hooks:
//! every operand is widened to `f64`, the kernel runs in double precision and
//! results are narrowed back with the precision's clamping rule.

use std::marker::PhantomData;

use tracing::trace;

use super::{ComputeBackend, StorageOf};
use crate::error::Result;
use crate::ops::{Gemm, MatMulDims};
use crate::precision::{Fp16, Int4, Precision, Ternary};
use crate::shape::Shape;
use crate::storage::TensorData;
use crate::validation::TensorValidator;

/// Backend for any precision, via double precision conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericBackend<P> {
    _precision: PhantomData<P>,
}

impl<P: Precision> GenericBackend<P> {
    /// Creates the backend
    pub fn new() -> Self {
        Self {
            _precision: PhantomData,
        }
    }

    fn widen(data: &P::Storage) -> Vec<f64> {
        data.to_vec().into_iter().map(P::to_f64).collect()
    }
}

/// Half precision tensors
pub type Fp16Backend = GenericBackend<Fp16>;
/// Packed 4-bit tensors
pub type Int4Backend = GenericBackend<Int4>;
/// Packed ternary tensors
pub type TernaryBackend = GenericBackend<Ternary>;

impl<P: Precision> ComputeBackend for GenericBackend<P> {
    type Precision = P;

    fn name(&self) -> &'static str {
        P::DTYPE.name()
    }

    fn matmul(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        let (m, k, n) = TensorValidator::validate_matmul_shapes(a.shape(), b.shape())?;
        let dtype = P::DTYPE;
        trace!(%dtype, m, k, n, "generic matmul through f64");

        let out = Gemm::compute_f64(&Self::widen(a), &Self::widen(b), MatMulDims::new(m, k, n));
        P::make_storage(out.into_iter().map(P::from_f64).collect(), Shape::matrix(m, n)?)
    }

    fn scale(&self, a: &StorageOf<Self>, factor: f64) -> Result<StorageOf<Self>> {
        let out = a.to_vec().into_iter().map(|v| P::from_f64(P::to_f64(v) * factor)).collect();
        P::make_storage(out, a.shape().clone())
    }

    fn dot(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<f64> {
        TensorValidator::validate_same_shape(a.shape(), b.shape(), "dot")?;
        Ok(Self::widen(a)
            .into_iter()
            .zip(Self::widen(b))
            .map(|(x, y)| x * y)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_int4_matmul_clamps() {
        let backend = Int4Backend::new();
        let shape = Shape::matrix(2, 2).unwrap();
        let a = backend.from_values(vec![1, 2, 3, 4], shape.clone()).unwrap();
        let b = backend.from_values(vec![1, 0, 0, 1], shape).unwrap();
        assert_eq!(backend.matmul(&a, &b).unwrap().to_vec(), vec![1, 2, 3, 4]);

        let big = backend.matmul(&a, &a).unwrap();
        // [[7, 10], [15, 22]] clamped to 7
        assert_eq!(big.to_vec(), vec![7, 7, 7, 7]);
    }

    #[test]
    fn test_ternary_scale_and_dot() {
        let backend = TernaryBackend::new();
        let shape = Shape::vector(4).unwrap();
        let a = backend.from_values(vec![1, -1, 0, 1], shape.clone()).unwrap();
        let b = backend.from_values(vec![1, 1, 1, -1], shape).unwrap();

        assert_eq!(backend.dot(&a, &b).unwrap(), -1.0);
        assert_eq!(backend.scale(&a, 0.4).unwrap().to_vec(), vec![0, 0, 0, 0]);
        assert_eq!(backend.scale(&a, -3.0).unwrap().to_vec(), vec![-1, 1, 0, -1]);
    }

    #[test]
    fn test_fp16_matmul() {
        let backend = Fp16Backend::new();
        let values = [1.0, 2.0, 3.0, 4.0].map(f16::from_f32).to_vec();
        let a = backend.from_values(values, Shape::matrix(2, 2).unwrap()).unwrap();
        let c = backend.matmul(&a, &a).unwrap();
        let out: Vec<f32> = c.to_vec().into_iter().map(f16::to_f32).collect();
        assert_eq!(out, vec![7.0, 10.0, 15.0, 22.0]);
    }

    #[test]
    fn test_elementwise_is_unsupported() {
        let backend = Int4Backend::new();
        let a = backend.from_values(vec![1, 2], Shape::vector(2).unwrap()).unwrap();
        let err = backend.add(&a, &a).unwrap_err();
        assert!(err.is_unsupported());
        assert!(backend.relu(&a).unwrap_err().is_unsupported());
        assert!(backend.matmul4d(&a, &a).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_shape_ops_work_on_packed_storage() {
        let backend = Int4Backend::new();
        let a = backend.from_values(vec![1, 2, 3, 4, 5, 6], Shape::matrix(2, 3).unwrap()).unwrap();
        let t = backend.transpose(&a).unwrap();
        assert_eq!(t.shape().dims(), &[3, 2]);
        assert_eq!(t.to_vec(), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(backend.sum(&a), 21.0);
    }
}
