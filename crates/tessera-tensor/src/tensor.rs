//! Core tensor type and operations

use std::fmt;
use std::ops::{Add, Div, Mul, Range, Sub};

use crate::backend::{ComputeBackend, StorageOf, ValueOf};
use crate::dtype::DType;
use crate::error::Result;
use crate::ops::{ArithOp, Scalar, ScalarPosition};
use crate::precision::Precision;
use crate::shape::{Shape, Strides};
use crate::storage::{DenseData, TensorData};

/// Immutable tensor: one storage bound to one backend
///
/// Every operation returns a new tensor; the receiver is never modified.
#[derive(Debug)]
pub struct Tensor<B: ComputeBackend> {
    /// The underlying storage
    data: StorageOf<B>,
    /// The backend used for operations
    backend: B,
}

impl<B: ComputeBackend> Tensor<B> {
    /// Binds existing storage to a backend
    pub fn new(data: StorageOf<B>, backend: B) -> Self {
        Self { data, backend }
    }

    /// Binds existing storage to the default backend instance
    pub fn from_storage(data: StorageOf<B>) -> Self {
        Self::new(data, B::default())
    }

    /// Creates a tensor from one value per element in row-major order
    pub fn from_vec(values: Vec<ValueOf<B>>, shape: Shape) -> Result<Self> {
        let backend = B::default();
        let data = backend.from_values(values, shape)?;
        Ok(Self::new(data, backend))
    }

    /// Creates a tensor filled with `value`
    pub fn full(shape: Shape, value: ValueOf<B>) -> Result<Self> {
        let values = vec![value; shape.volume()];
        Self::from_vec(values, shape)
    }

    /// Creates a tensor of zeros
    pub fn zeros(shape: Shape) -> Result<Self> {
        Self::full(shape, <B::Precision as Precision>::zero())
    }

    /// Creates a tensor of ones
    pub fn ones(shape: Shape) -> Result<Self> {
        Self::full(shape, <B::Precision as Precision>::one())
    }

    fn wrap(&self, data: StorageOf<B>) -> Self {
        Self::new(data, self.backend.clone())
    }

    /// Returns the shape of the tensor
    pub fn shape(&self) -> &Shape {
        self.data.shape()
    }

    /// Returns the row-major strides
    pub fn strides(&self) -> Strides {
        self.data.strides()
    }

    /// Returns the number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape().ndim()
    }

    /// Returns the total number of elements
    pub fn volume(&self) -> usize {
        self.shape().volume()
    }

    /// Returns the element encoding
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Returns the storage
    pub fn data(&self) -> &StorageOf<B> {
        &self.data
    }

    /// Consumes the tensor, returning its storage
    pub fn into_data(self) -> StorageOf<B> {
        self.data
    }

    /// Returns the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads one element by multi-dimensional index
    pub fn get(&self, index: &[usize]) -> Result<ValueOf<B>> {
        self.data.at(index)
    }

    /// Copies every value out in row-major order
    pub fn to_vec(&self) -> Vec<ValueOf<B>> {
        self.data.to_vec()
    }

    /// Copies every value out widened to `f64`
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data
            .to_vec()
            .into_iter()
            .map(<B::Precision as Precision>::to_f64)
            .collect()
    }

    /// Dense realization of the storage
    pub fn materialize(&self) -> Result<DenseData<ValueOf<B>>> {
        self.data.materialize()
    }

    /// Size of the underlying buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.data.byte_len()
    }

    /// Rank-2 matrix product
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.matmul(&self.data, &other.data)?))
    }

    /// Rank-4 batched or channel-mixing product
    pub fn matmul4d(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.matmul4d(&self.data, &other.data)?))
    }

    /// Multiplies every element by `factor`
    pub fn scale(&self, factor: f64) -> Result<Self> {
        Ok(self.wrap(self.backend.scale(&self.data, factor)?))
    }

    /// Dot product of two equally shaped tensors
    pub fn dot(&self, other: &Self) -> Result<f64> {
        self.backend.dot(&self.data, &other.data)
    }

    /// Broadcasting elementwise addition
    pub fn add(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.add(&self.data, &other.data)?))
    }

    /// Broadcasting elementwise subtraction
    pub fn sub(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.sub(&self.data, &other.data)?))
    }

    /// Broadcasting elementwise multiplication
    pub fn mul(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.mul(&self.data, &other.data)?))
    }

    /// Broadcasting elementwise division
    pub fn div(&self, other: &Self) -> Result<Self> {
        Ok(self.wrap(self.backend.div(&self.data, &other.data)?))
    }

    /// Arithmetic with a scalar on either side of the operator
    pub fn scalar_op(&self, op: ArithOp, scalar: impl Into<Scalar>, position: ScalarPosition) -> Result<Self> {
        Ok(self.wrap(self.backend.scalar_op(&self.data, op, scalar.into(), position)?))
    }

    /// `self + scalar`
    pub fn add_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Add, scalar, ScalarPosition::Rhs)
    }

    /// `self - scalar`
    pub fn sub_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Sub, scalar, ScalarPosition::Rhs)
    }

    /// `self * scalar`
    pub fn mul_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Mul, scalar, ScalarPosition::Rhs)
    }

    /// `self / scalar`
    pub fn div_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Div, scalar, ScalarPosition::Rhs)
    }

    /// `scalar - self`
    pub fn rsub_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Sub, scalar, ScalarPosition::Lhs)
    }

    /// `scalar / self`
    pub fn rdiv_scalar(&self, scalar: impl Into<Scalar>) -> Result<Self> {
        self.scalar_op(ArithOp::Div, scalar, ScalarPosition::Lhs)
    }

    /// `max(0, x)`
    pub fn relu(&self) -> Result<Self> {
        Ok(self.wrap(self.backend.relu(&self.data)?))
    }

    /// Logistic sigmoid
    pub fn sigmoid(&self) -> Result<Self> {
        Ok(self.wrap(self.backend.sigmoid(&self.data)?))
    }

    /// Hyperbolic tangent
    pub fn tanh(&self) -> Result<Self> {
        Ok(self.wrap(self.backend.tanh(&self.data)?))
    }

    /// Softmax along `dim` of a rank-1 or rank-2 tensor
    pub fn softmax(&self, dim: usize) -> Result<Self> {
        Ok(self.wrap(self.backend.softmax(&self.data, dim)?))
    }

    /// Rank-2 transpose
    pub fn t(&self) -> Result<Self> {
        Ok(self.wrap(self.backend.transpose(&self.data)?))
    }

    /// Collapses axes `start..=end`; `-1` names the last axis
    pub fn flatten(&self, start: isize, end: isize) -> Result<Self> {
        Ok(self.wrap(self.backend.flatten(&self.data, start, end)?))
    }

    /// Reinterprets under a new shape; one dimension may be `-1`
    pub fn reshape(&self, dims: &[isize]) -> Result<Self> {
        Ok(self.wrap(self.backend.reshape(&self.data, dims)?))
    }

    /// Copies the block selected by one half-open range per axis
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        Ok(self.wrap(self.backend.slice(&self.data, ranges)?))
    }

    /// Sum of all elements
    pub fn sum(&self) -> f64 {
        self.backend.sum(&self.data)
    }

    /// Mean of all elements
    pub fn mean(&self) -> f64 {
        self.backend.mean(&self.data)
    }
}

impl<B: ComputeBackend> Clone for Tensor<B> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            backend: self.backend.clone(),
        }
    }
}

impl<B: ComputeBackend> PartialEq for Tensor<B> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.dtype() == other.dtype() && self.to_vec() == other.to_vec()
    }
}

// Arithmetic operations
impl<B: ComputeBackend> Add for &Tensor<B> {
    type Output = Result<Tensor<B>>;

    fn add(self, rhs: Self) -> Self::Output {
        Tensor::add(self, rhs)
    }
}

impl<B: ComputeBackend> Sub for &Tensor<B> {
    type Output = Result<Tensor<B>>;

    fn sub(self, rhs: Self) -> Self::Output {
        Tensor::sub(self, rhs)
    }
}

impl<B: ComputeBackend> Mul for &Tensor<B> {
    type Output = Result<Tensor<B>>;

    fn mul(self, rhs: Self) -> Self::Output {
        Tensor::mul(self, rhs)
    }
}

impl<B: ComputeBackend> Div for &Tensor<B> {
    type Output = Result<Tensor<B>>;

    fn div(self, rhs: Self) -> Self::Output {
        Tensor::div(self, rhs)
    }
}

impl<B: ComputeBackend> fmt::Display for Tensor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, dtype={}, backend={})",
            self.shape(),
            self.dtype(),
            self.backend.name()
        )
    }
}
