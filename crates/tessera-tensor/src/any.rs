//! Dtype-erased tensor
//!
//! [`AnyTensor`] holds a tensor of any supported encoding bound to its
//! backend. Byte decoding produces it because the dtype is only known at
//! runtime; callers match on it to recover the typed tensor.

use std::fmt;

use crate::backend::{ComputeBackend, Fp16Backend, Fp32Backend, Int32Backend, Int4Backend, Int8Backend, TernaryBackend};
use crate::dtype::DType;
use crate::shape::Shape;
use crate::tensor::Tensor;

/// A tensor of any dtype
#[derive(Debug, Clone, PartialEq)]
pub enum AnyTensor {
    /// 32-bit float
    Fp32(Tensor<Fp32Backend>),
    /// 16-bit float
    Fp16(Tensor<Fp16Backend>),
    /// 32-bit integer
    Int32(Tensor<Int32Backend>),
    /// 8-bit integer
    Int8(Tensor<Int8Backend>),
    /// Packed 4-bit integer
    Int4(Tensor<Int4Backend>),
    /// Packed ternary
    Ternary(Tensor<TernaryBackend>),
}

macro_rules! dispatch {
    ($self:expr, $t:ident => $body:expr) => {
        match $self {
            AnyTensor::Fp32($t) => $body,
            AnyTensor::Fp16($t) => $body,
            AnyTensor::Int32($t) => $body,
            AnyTensor::Int8($t) => $body,
            AnyTensor::Int4($t) => $body,
            AnyTensor::Ternary($t) => $body,
        }
    };
}

macro_rules! typed_access {
    ($($variant:ident, $backend:ty, $as_fn:ident, $into_fn:ident;)*) => {
        impl AnyTensor {
            $(
                #[doc = concat!("Borrows the tensor if it is ", stringify!($variant))]
                pub fn $as_fn(&self) -> Option<&Tensor<$backend>> {
                    match self {
                        AnyTensor::$variant(t) => Some(t),
                        _ => None,
                    }
                }

                #[doc = concat!("Takes the tensor if it is ", stringify!($variant))]
                pub fn $into_fn(self) -> Option<Tensor<$backend>> {
                    match self {
                        AnyTensor::$variant(t) => Some(t),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<Tensor<$backend>> for AnyTensor {
                fn from(t: Tensor<$backend>) -> Self {
                    AnyTensor::$variant(t)
                }
            }
        )*
    };
}

typed_access! {
    Fp32, Fp32Backend, as_fp32, into_fp32;
    Fp16, Fp16Backend, as_fp16, into_fp16;
    Int32, Int32Backend, as_int32, into_int32;
    Int8, Int8Backend, as_int8, into_int8;
    Int4, Int4Backend, as_int4, into_int4;
    Ternary, TernaryBackend, as_ternary, into_ternary;
}

impl AnyTensor {
    /// Element encoding
    pub fn dtype(&self) -> DType {
        dispatch!(self, t => t.dtype())
    }

    /// Tensor shape
    pub fn shape(&self) -> &Shape {
        dispatch!(self, t => t.shape())
    }

    /// Number of elements
    pub fn volume(&self) -> usize {
        dispatch!(self, t => t.volume())
    }

    /// Size of the backing buffer in bytes
    pub fn byte_len(&self) -> usize {
        dispatch!(self, t => t.byte_len())
    }

    /// Backend name
    pub fn backend_name(&self) -> &'static str {
        dispatch!(self, t => t.backend().name())
    }

    /// Every element widened to `f64`, row-major
    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, t => t.to_f64_vec())
    }
}

impl fmt::Display for AnyTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, t => fmt::Display::fmt(t, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reports_encoding() {
        let t = Tensor::<Int4Backend>::from_vec(vec![1, -2, 3], Shape::vector(3).unwrap()).unwrap();
        let any = AnyTensor::from(t);
        assert_eq!(any.dtype(), DType::Int4);
        assert_eq!(any.byte_len(), 2);
        assert_eq!(any.volume(), 3);
        assert_eq!(any.backend_name(), Int4Backend::new().name());
        assert_eq!(any.to_f64_vec(), vec![1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_typed_access() {
        let t = Tensor::<Fp32Backend>::ones(Shape::matrix(2, 2).unwrap()).unwrap();
        let any: AnyTensor = t.clone().into();
        assert!(any.as_int8().is_none());
        assert_eq!(any.as_fp32(), Some(&t));
        assert_eq!(any.into_fp32(), Some(t));
    }

    #[test]
    fn test_display() {
        let any = AnyTensor::from(Tensor::<Int8Backend>::zeros(Shape::vector(4).unwrap()).unwrap());
        assert_eq!(any.to_string(), "Tensor(shape=(4), dtype=int8, backend=int8)");
    }
}
