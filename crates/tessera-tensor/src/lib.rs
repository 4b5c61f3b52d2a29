//! Tessera Tensor: multi-precision tensors with per-dtype compute backends
//!
//! Tensors combine an immutable storage with a stateless backend. Six
//! encodings are supported, from 32-bit float down to bit-packed 4-bit and
//! ternary codes, and each dtype is bound to exactly one backend.
//!
//! # Features
//!
//! - **Dense and packed storage**: FP32, FP16, Int32 and Int8 one value per
//!   slot; Int4 two per byte, Ternary four per byte
//! - **Per-dtype backends**: native FP32, Int32 and Int8 kernels plus a
//!   generic backend computing through `f64`
//! - **Saturating integer math**: overflow clamps, integer division by zero
//!   yields zero
//! - **Broadcasting**: elementwise arithmetic follows the usual right-aligned
//!   broadcasting rules
//! - **Quantization**: affine and ternary conversion between float and
//!   integer tensors
//!
//! # Example
//!
//! ```rust
//! use tessera_tensor::prelude::*;
//!
//! let a = Tensor::<Fp32Backend>::from_vec(vec![1.0, 2.0, 3.0, 4.0], Shape::matrix(2, 2)?)?;
//! let b = Tensor::<Fp32Backend>::from_vec(vec![5.0, 6.0, 7.0, 8.0], Shape::matrix(2, 2)?)?;
//!
//! let c = a.matmul(&b)?;
//! assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
//!
//! let probs = c.softmax(1)?;
//! assert!((probs.sum() - 2.0).abs() < 1e-5);
//! # Ok::<(), tessera_tensor::TensorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]

pub mod any;
pub mod backend;
pub mod broadcast;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod packing;
pub mod precision;
pub mod quantization;
pub mod random;
pub mod shape;
pub mod storage;
pub mod tensor;
pub mod validation;

// Re-export main types
pub use any::AnyTensor;
pub use backend::{
    ComputeBackend, Fp16Backend, Fp32Backend, GenericBackend, Int32Backend, Int4Backend, Int8Backend,
    StorageOf, TernaryBackend, ValueOf,
};
pub use dtype::{DType, ParseDTypeError};
pub use error::{Result, TensorError};
pub use ops::{Activation, ArithOp, Scalar, ScalarPosition};
pub use precision::{Fp16, Fp32, Int32, Int4, Int8, Precision, Ternary};
pub use quantization::QuantizationParams;
pub use shape::{Shape, Strides, MAX_RANK};
pub use storage::{DenseData, DenseElement, Int4Data, TensorData, TernaryData};
pub use tensor::Tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AnyTensor, ComputeBackend, DType, Fp16Backend, Fp32Backend, Int32Backend, Int4Backend, Int8Backend,
        QuantizationParams, Result, Scalar, ScalarPosition, Shape, Tensor, TensorData, TensorError,
        TernaryBackend,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_backend_binding() {
        assert_eq!(Fp32Backend::new().dtype(), DType::Fp32);
        assert_eq!(Fp16Backend::new().dtype(), DType::Fp16);
        assert_eq!(Int32Backend::new().dtype(), DType::Int32);
        assert_eq!(Int8Backend::new().dtype(), DType::Int8);
        assert_eq!(Int4Backend::new().dtype(), DType::Int4);
        assert_eq!(TernaryBackend::new().dtype(), DType::Ternary);
    }

    #[test]
    fn test_shape_operations() {
        let shape = Shape::matrix(3, 4).unwrap();
        assert_eq!(shape.ndim(), 2);
        assert_eq!(shape.volume(), 12);
        assert!(Shape::from_slice(&[2, 3, 4, 5, 6]).is_err());
    }
}
