//! Compute backend trait and per-dtype implementations
//!
//! A backend is a stateless kernel table bound to one [`Precision`]. Native
//! backends exist for FP32, Int32 and Int8; FP16, Int4 and Ternary share the
//! [`GenericBackend`], which computes matmul, scale and dot through `f64`.
//!
//! Kernels a backend does not provide fall back to the trait defaults, which
//! return [`TensorError::UnsupportedOperation`]. Layout operations and
//! reductions are dtype-agnostic and have working defaults.

use std::fmt::Debug;
use std::ops::Range;

use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::ops::{Activation, ArithOp, Mean, Scalar, ScalarPosition, ShapeOps, Sum};
use crate::precision::Precision;
use crate::shape::Shape;
use crate::storage::TensorData;

mod fp32;
mod generic;
mod int32;
mod int8;

pub use fp32::Fp32Backend;
pub use generic::{Fp16Backend, GenericBackend, Int4Backend, TernaryBackend};
pub use int32::Int32Backend;
pub use int8::Int8Backend;

/// Storage type of a backend
pub type StorageOf<B> = <<B as ComputeBackend>::Precision as Precision>::Storage;

/// Host value type of a backend
pub type ValueOf<B> = <<B as ComputeBackend>::Precision as Precision>::Value;

/// Builds the error returned for a kernel a backend does not implement
pub fn unsupported(backend: &str, dtype: DType, operation: &str) -> TensorError {
    TensorError::unsupported_operation(
        "BACKEND_OPERATION_UNSUPPORTED",
        format!("{} is not implemented for {} tensors", operation, dtype),
        operation,
        backend,
        dtype.name(),
        "Convert the tensor to fp32 first, or use an operation this dtype supports",
    )
}

/// Kernel table for one dtype
pub trait ComputeBackend: Clone + Debug + Default + Send + Sync + 'static {
    /// Precision this backend computes in
    type Precision: Precision;

    /// Backend name used in errors and logs
    fn name(&self) -> &'static str;

    /// Encoding of tensors produced by this backend
    fn dtype(&self) -> DType {
        <Self::Precision as Precision>::DTYPE
    }

    /// Builds storage from one value per element
    fn from_values(&self, values: Vec<ValueOf<Self>>, shape: Shape) -> Result<StorageOf<Self>> {
        <Self::Precision as Precision>::make_storage(values, shape)
    }

    /// Rank-2 matrix product
    fn matmul(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>>;

    /// Rank-4 batched or channel-mixing product
    fn matmul4d(&self, _a: &StorageOf<Self>, _b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        Err(unsupported(self.name(), self.dtype(), "matmul4d"))
    }

    /// Multiplies every element by `factor`, narrowing per dtype
    fn scale(&self, a: &StorageOf<Self>, factor: f64) -> Result<StorageOf<Self>>;

    /// Sum of elementwise products of two equally shaped operands
    fn dot(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<f64>;

    /// Broadcasting elementwise arithmetic
    fn binary(&self, _a: &StorageOf<Self>, _b: &StorageOf<Self>, op: ArithOp) -> Result<StorageOf<Self>> {
        Err(unsupported(self.name(), self.dtype(), op.name()))
    }

    /// Elementwise `a + b`
    fn add(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.binary(a, b, ArithOp::Add)
    }

    /// Elementwise `a - b`
    fn sub(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.binary(a, b, ArithOp::Sub)
    }

    /// Elementwise `a * b`
    fn mul(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.binary(a, b, ArithOp::Mul)
    }

    /// Elementwise `a / b`
    fn div(&self, a: &StorageOf<Self>, b: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.binary(a, b, ArithOp::Div)
    }

    /// Arithmetic between a tensor and a scalar on either side
    fn scalar_op(
        &self,
        _a: &StorageOf<Self>,
        op: ArithOp,
        _scalar: Scalar,
        _position: ScalarPosition,
    ) -> Result<StorageOf<Self>> {
        Err(unsupported(self.name(), self.dtype(), op.name()))
    }

    /// Pointwise activation
    fn activation(&self, _a: &StorageOf<Self>, activation: Activation) -> Result<StorageOf<Self>> {
        Err(unsupported(self.name(), self.dtype(), activation.name()))
    }

    /// `max(0, x)`
    fn relu(&self, a: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.activation(a, Activation::Relu)
    }

    /// Logistic sigmoid
    fn sigmoid(&self, a: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.activation(a, Activation::Sigmoid)
    }

    /// Hyperbolic tangent
    fn tanh(&self, a: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        self.activation(a, Activation::Tanh)
    }

    /// Softmax along `dim` of a rank-1 or rank-2 tensor
    fn softmax(&self, _a: &StorageOf<Self>, _dim: usize) -> Result<StorageOf<Self>> {
        Err(unsupported(self.name(), self.dtype(), "softmax"))
    }

    /// Rank-2 transpose
    fn transpose(&self, a: &StorageOf<Self>) -> Result<StorageOf<Self>> {
        let (values, shape) = ShapeOps::transpose(&a.to_vec(), a.shape())?;
        self.from_values(values, shape)
    }

    /// Collapses axes `start..=end` into one
    fn flatten(&self, a: &StorageOf<Self>, start: isize, end: isize) -> Result<StorageOf<Self>> {
        let shape = ShapeOps::flatten(a.shape(), start, end)?;
        self.from_values(a.to_vec(), shape)
    }

    /// Reinterprets the values under a new shape with equal volume
    fn reshape(&self, a: &StorageOf<Self>, target: &[isize]) -> Result<StorageOf<Self>> {
        let shape = ShapeOps::reshape(a.shape(), target)?;
        self.from_values(a.to_vec(), shape)
    }

    /// Copies the block selected by one range per axis
    fn slice(&self, a: &StorageOf<Self>, ranges: &[Range<usize>]) -> Result<StorageOf<Self>> {
        a.slice(ranges)
    }

    /// Sum of all elements in `f64`
    fn sum(&self, a: &StorageOf<Self>) -> f64 {
        Sum::reduce_all(a.to_vec().into_iter().map(<Self::Precision as Precision>::to_f64))
    }

    /// Mean of all elements in `f64`
    fn mean(&self, a: &StorageOf<Self>) -> f64 {
        // shapes have no zero dimensions, so storage is never empty
        Mean::reduce_all(a.to_vec().into_iter().map(<Self::Precision as Precision>::to_f64)).unwrap_or(0.0)
    }
}
