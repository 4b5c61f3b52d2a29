//! Error types for tensor decoding

use std::io;

use tessera_tensor::{DType, TensorError};
use thiserror::Error;

/// Result type alias for factory operations
pub type Result<T> = std::result::Result<T, FactoryError>;

fn list_dtypes(dtypes: &[DType]) -> String {
    if dtypes.is_empty() {
        return "none".to_string();
    }
    dtypes.iter().map(DType::name).collect::<Vec<_>>().join(", ")
}

/// Errors that can occur while turning bytes into tensors
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Validation or decoding failed inside the tensor layer
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// No strategy handles the requested dtype
    #[error("No decode strategy registered for {requested}; registered: {}", list_dtypes(.registered))]
    UnregisteredDType {
        /// The dtype that was asked for
        requested: DType,
        /// Dtypes the registry can decode
        registered: Vec<DType>,
    },

    /// A strategy exists but cannot honour the request
    #[error("Decoding {dtype} is not implemented: {detail}")]
    NotImplemented {
        /// Dtype of the strategy
        dtype: DType,
        /// What is missing
        detail: String,
    },

    /// One entry of a batch failed
    #[error("Batch entry '{entry}' failed: {source}")]
    BatchEntry {
        /// Name of the entry, or its generated name
        entry: String,
        /// Underlying failure
        #[source]
        source: Box<FactoryError>,
    },

    /// Two batch entries resolve to the same name
    #[error("Duplicate tensor name in batch: {0}")]
    DuplicateName(String),

    /// Input buffer exceeds the configured limit
    #[error("Input of {bytes} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge {
        /// Size of the rejected buffer
        bytes: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Batch holds more entries than the configured limit
    #[error("Batch of {entries} entries exceeds the limit of {limit}")]
    BatchTooLarge {
        /// Number of entries submitted
        entries: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file is not valid TOML
    #[error("Failed to parse configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl FactoryError {
    /// Wraps an error with the batch entry it came from
    pub fn in_entry(self, entry: impl Into<String>) -> Self {
        FactoryError::BatchEntry {
            entry: entry.into(),
            source: Box::new(self),
        }
    }

    /// The tensor-layer error at the root of this failure, if any
    pub fn tensor_error(&self) -> Option<&TensorError> {
        match self {
            FactoryError::Tensor(e) => Some(e),
            FactoryError::BatchEntry { source, .. } => source.tensor_error(),
            _ => None,
        }
    }
}
