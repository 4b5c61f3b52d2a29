//! Element encodings and their bit-width metadata

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Tag for a tensor's element encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE float
    Fp32,
    /// 16-bit IEEE float
    Fp16,
    /// 32-bit signed integer
    Int32,
    /// 8-bit signed integer
    Int8,
    /// 4-bit signed integer, two per byte, domain -8..=7
    Int4,
    /// 2-bit ternary, four per byte, domain {-1, 0, 1}
    Ternary,
}

impl DType {
    /// Every supported encoding
    pub const ALL: [DType; 6] = [
        DType::Fp32,
        DType::Fp16,
        DType::Int32,
        DType::Int8,
        DType::Int4,
        DType::Ternary,
    ];

    /// Bits occupied by one element
    pub fn size_in_bits(&self) -> usize {
        match self {
            DType::Fp32 | DType::Int32 => 32,
            DType::Fp16 => 16,
            DType::Int8 => 8,
            DType::Int4 => 4,
            DType::Ternary => 2,
        }
    }

    /// Number of logical values held by one byte, for sub-byte encodings
    pub fn values_per_byte(&self) -> Option<usize> {
        match self {
            DType::Int4 => Some(2),
            DType::Ternary => Some(4),
            _ => None,
        }
    }

    /// Returns whether several values share one byte
    pub fn is_packed(&self) -> bool {
        self.values_per_byte().is_some()
    }

    /// Returns whether this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Fp32 | DType::Fp16)
    }

    /// Returns whether arithmetic on this type saturates
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Number of bytes a buffer of `volume` elements occupies, `None` on overflow
    pub fn expected_bytes(&self, volume: usize) -> Option<usize> {
        match self.values_per_byte() {
            Some(per_byte) => Some(volume.div_ceil(per_byte)),
            None => volume.checked_mul(self.size_in_bits() / 8),
        }
    }

    /// Byte length of a buffer holding `shape`
    ///
    /// Fails when the length does not fit in `usize`.
    pub fn byte_len_for(&self, shape: &Shape) -> Result<usize> {
        self.expected_bytes(shape.volume()).ok_or_else(|| {
            TensorError::invalid_shape(
                "DTYPE_BYTE_LENGTH_OVERFLOW",
                format!("{} tensor of shape {} exceeds the addressable byte length", self, shape),
                shape.to_string(),
                "byte length",
                "Byte length overflows usize",
                "Split the tensor or use a narrower dtype",
            )
        })
    }

    /// Inclusive integer domain, `None` for floats
    pub fn value_range(&self) -> Option<(i64, i64)> {
        match self {
            DType::Fp32 | DType::Fp16 => None,
            DType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            DType::Int4 => Some((-8, 7)),
            DType::Ternary => Some((-1, 1)),
        }
    }

    /// Lowercase name used in configs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            DType::Fp32 => "fp32",
            DType::Fp16 => "fp16",
            DType::Int32 => "int32",
            DType::Int8 => "int8",
            DType::Int4 => "int4",
            DType::Ternary => "ternary",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a dtype name is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown dtype '{0}': expected one of fp32, fp16, int32, int8, int4, ternary")]
pub struct ParseDTypeError(pub String);

impl FromStr for DType {
    type Err = ParseDTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp32" | "f32" | "float32" => Ok(DType::Fp32),
            "fp16" | "f16" | "float16" | "half" => Ok(DType::Fp16),
            "int32" | "i32" => Ok(DType::Int32),
            "int8" | "i8" => Ok(DType::Int8),
            "int4" | "i4" => Ok(DType::Int4),
            "ternary" | "trit" => Ok(DType::Ternary),
            _ => Err(ParseDTypeError(s.to_string())),
        }
    }
}
