//! Precision markers binding a dtype to its host value and storage
//!
//! A [`Precision`] supplies the conversion hooks the generic kernels need:
//! widening to `f64`, narrowing back with the dtype's clamping policy, and
//! building storage from a value array.

use std::fmt::Debug;

use half::f16;

use crate::dtype::DType;
use crate::error::Result;
use crate::storage::{DenseData, DenseElement, Int4Data, TensorData, TernaryData};
use crate::shape::Shape;

/// Conversion hooks for one element encoding
pub trait Precision: Copy + Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Host value read from storage
    type Value: DenseElement;
    /// Storage holding values of this precision
    type Storage: TensorData<Value = Self::Value>;

    /// Encoding tag
    const DTYPE: DType;

    /// Widens a value to `f64`
    fn to_f64(value: Self::Value) -> f64;

    /// Narrows an `f64`, rounding and clamping for integer encodings
    fn from_f64(value: f64) -> Self::Value;

    /// Additive identity
    fn zero() -> Self::Value {
        Self::from_f64(0.0)
    }

    /// Multiplicative identity
    fn one() -> Self::Value {
        Self::from_f64(1.0)
    }

    /// Builds storage from one value per element
    fn make_storage(values: Vec<Self::Value>, shape: Shape) -> Result<Self::Storage> {
        Self::Storage::from_values(values, shape)
    }
}

/// Rounds half away from zero and clamps into `[min, max]`; NaN maps to zero
pub(crate) fn round_clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.round().clamp(min, max)
    }
}

/// 32-bit IEEE float
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fp32;

impl Precision for Fp32 {
    type Value = f32;
    type Storage = DenseData<f32>;
    const DTYPE: DType = DType::Fp32;

    fn to_f64(value: f32) -> f64 {
        value as f64
    }

    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

/// 16-bit IEEE float
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fp16;

impl Precision for Fp16 {
    type Value = f16;
    type Storage = DenseData<f16>;
    const DTYPE: DType = DType::Fp16;

    fn to_f64(value: f16) -> f64 {
        value.to_f64()
    }

    fn from_f64(value: f64) -> f16 {
        f16::from_f64(value)
    }
}

/// 32-bit signed integer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int32;

impl Precision for Int32 {
    type Value = i32;
    type Storage = DenseData<i32>;
    const DTYPE: DType = DType::Int32;

    fn to_f64(value: i32) -> f64 {
        value as f64
    }

    fn from_f64(value: f64) -> i32 {
        round_clamp(value, i32::MIN as f64, i32::MAX as f64) as i32
    }
}

/// 8-bit signed integer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int8;

impl Precision for Int8 {
    type Value = i8;
    type Storage = DenseData<i8>;
    const DTYPE: DType = DType::Int8;

    fn to_f64(value: i8) -> f64 {
        value as f64
    }

    fn from_f64(value: f64) -> i8 {
        round_clamp(value, i8::MIN as f64, i8::MAX as f64) as i8
    }
}

/// Packed 4-bit signed integer, domain -8..=7
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int4;

impl Precision for Int4 {
    type Value = i8;
    type Storage = Int4Data;
    const DTYPE: DType = DType::Int4;

    fn to_f64(value: i8) -> f64 {
        value as f64
    }

    fn from_f64(value: f64) -> i8 {
        round_clamp(value, -8.0, 7.0) as i8
    }
}

/// Packed ternary, domain {-1, 0, 1}
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ternary;

impl Precision for Ternary {
    type Value = i8;
    type Storage = TernaryData;
    const DTYPE: DType = DType::Ternary;

    fn to_f64(value: i8) -> f64 {
        value as f64
    }

    fn from_f64(value: f64) -> i8 {
        round_clamp(value, -1.0, 1.0) as i8
    }
}
