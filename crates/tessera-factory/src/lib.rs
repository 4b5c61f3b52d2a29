//! Decode raw byte buffers into typed tensors
//!
//! A [`FactoryRegistry`] holds one [`DecodeStrategy`] per dtype. Given a dtype,
//! a shape and a byte buffer it validates the buffer length, decodes the
//! elements (honouring byte order for dense encodings and unpacking Int4 and
//! ternary codes), and returns an [`AnyTensor`] bound to the matching backend.
//!
//! ```rust
//! use tessera_factory::global_registry;
//! use tessera_tensor::DType;
//!
//! let bytes: Vec<u8> = [1.0f32, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
//! let tensor = global_registry().create_tensor(DType::Fp32, &[2], &bytes)?;
//! assert_eq!(tensor.to_f64_vec(), vec![1.0, 2.0]);
//! # Ok::<(), tessera_factory::FactoryError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod decode;
pub mod error;
pub mod registry;

pub use config::{FactoryConfig, LogLevel, LoggingConfig, ENDIANNESS_ENV};
pub use decode::{
    DecodeStrategy, Endianness, F16Decoder, F32Decoder, I32Decoder, I8Decoder, Int4Decoder, TernaryDecoder,
};
pub use error::{FactoryError, Result};
pub use registry::{global_registry, FactoryRegistry, TensorSpec};

pub use tessera_tensor::AnyTensor;
