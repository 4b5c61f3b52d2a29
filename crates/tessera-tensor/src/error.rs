//! Error types shared by every tensor component

use thiserror::Error;

/// Errors that can occur during tensor construction and computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Operand shapes cannot be combined by the operation
    #[error("Shape compatibility error [{code}]: {message}\nOperation: {operation}\nLeft shape: {left_shape}\nRight shape: {right_shape}\nSuggestion: {suggestion}")]
    IncompatibleShapes {
        /// Stable code, e.g. `BROADCAST_INCOMPATIBLE`
        code: &'static str,
        /// What went wrong
        message: String,
        /// Operation name
        operation: String,
        /// String representation of the left operand shape
        left_shape: String,
        /// String representation of the right operand shape
        right_shape: String,
        /// How to fix the call
        suggestion: String,
    },

    /// The shape itself is malformed
    #[error("Invalid shape [{code}]: {message}\nShape: {shape}\nOperation: {operation}\nReason: {reason}\nSuggestion: {suggestion}")]
    InvalidShape {
        /// Stable code, e.g. `SHAPE_ZERO_DIMENSION`
        code: &'static str,
        /// What went wrong
        message: String,
        /// String representation of the invalid shape
        shape: String,
        /// Operation name
        operation: String,
        /// Reason why the shape is invalid
        reason: String,
        /// How to fix the call
        suggestion: String,
    },

    /// Rank or axis arguments are out of the range an operation accepts
    #[error("Dimension error [{code}]: {message}\nExpected: {expected}\nActual: {actual}\nOperation: {operation}\nSuggestion: {suggestion}")]
    InvalidDimensions {
        /// Stable code, e.g. `SOFTMAX_RANK_UNSUPPORTED`
        code: &'static str,
        /// What went wrong
        message: String,
        /// What the operation expected
        expected: String,
        /// What it received
        actual: String,
        /// Operation name
        operation: String,
        /// How to fix the call
        suggestion: String,
    },

    /// An axis argument does not name an axis of the operand
    #[error("Invalid axis [{code}]: {message}\nAxis: {axis}\nRank: {ndim}\nOperation: {operation}\nSuggestion: {suggestion}")]
    InvalidAxis {
        /// Stable code, e.g. `AXIS_OUT_OF_RANGE`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The axis as supplied, possibly negative
        axis: isize,
        /// Rank of the operand
        ndim: usize,
        /// Operation name
        operation: String,
        /// How to fix the call
        suggestion: String,
    },

    /// A buffer length does not match the length implied by shape and dtype
    #[error("Size mismatch [{code}]: {message}\nData type: {dtype}\nShape: {shape}\nExpected: {expected}\nActual: {actual}\nSuggestion: {suggestion}")]
    SizeMismatch {
        /// Stable code, e.g. `STORAGE_LENGTH_MISMATCH`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The element encoding involved
        dtype: String,
        /// String representation of the shape
        shape: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
        /// How to fix the call
        suggestion: String,
    },

    /// Index is out of bounds for the given dimension
    #[error("Index out of bounds [{code}]: {message}\nIndex: {index}, Dimension: {dim}, Size: {size}\nOperation: {operation}\nSuggestion: {suggestion}")]
    OutOfBounds {
        /// Stable code, e.g. `STORAGE_INDEX_OUT_OF_BOUNDS`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The index that was out of bounds
        index: usize,
        /// The dimension where the index was applied
        dim: usize,
        /// The size of that dimension
        size: usize,
        /// Operation name
        operation: String,
        /// How to fix the call
        suggestion: String,
    },

    /// Invalid quantization parameters
    #[error("Quantization error [{code}]: {message}\nParameters: {params}\nData type: {dtype}\nSuggestion: {suggestion}")]
    QuantizationError {
        /// Stable code, e.g. `QUANTIZATION_INVALID_BITS`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The offending parameters
        params: String,
        /// Element dtype
        dtype: String,
        /// How to fix the call
        suggestion: String,
    },

    /// Packed bytes hold a bit pattern outside the encoding
    #[error("Decode error [{code}]: {message}\nData type: {dtype}\nElement: {position}\nSuggestion: {suggestion}")]
    DecodeError {
        /// Stable code, e.g. `TERNARY_RESERVED_PATTERN`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The data type being decoded
        dtype: String,
        /// Logical element index of the corrupt value
        position: usize,
        /// How to fix the call
        suggestion: String,
    },

    /// Operation not implemented for this backend/dtype combination
    #[error("Unsupported operation [{code}]: {message}\nOperation: {operation}\nBackend: {backend}\nData type: {dtype}\nSuggestion: {suggestion}")]
    UnsupportedOperation {
        /// Stable code, e.g. `BACKEND_OPERATION_UNSUPPORTED`
        code: &'static str,
        /// What went wrong
        message: String,
        /// The unsupported operation
        operation: String,
        /// The backend that doesn't support this operation
        backend: String,
        /// Element dtype
        dtype: String,
        /// How to fix the call
        suggestion: String,
    },
}

/// Convenient result type for tensor operations
pub type Result<T> = std::result::Result<T, TensorError>;

impl TensorError {
    /// Create an incompatible shapes error
    pub fn incompatible_shapes<S1, S2, S3, S4, S5>(
        code: &'static str,
        message: S1,
        operation: S2,
        left_shape: S3,
        right_shape: S4,
        suggestion: S5,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
        S5: Into<String>,
    {
        Self::IncompatibleShapes {
            code,
            message: message.into(),
            operation: operation.into(),
            left_shape: left_shape.into(),
            right_shape: right_shape.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid shape error
    pub fn invalid_shape<S1, S2, S3, S4, S5>(
        code: &'static str,
        message: S1,
        shape: S2,
        operation: S3,
        reason: S4,
        suggestion: S5,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
        S5: Into<String>,
    {
        Self::InvalidShape {
            code,
            message: message.into(),
            shape: shape.into(),
            operation: operation.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid dimensions error
    pub fn invalid_dimensions<S1, S2, S3, S4, S5>(
        code: &'static str,
        message: S1,
        expected: S2,
        actual: S3,
        operation: S4,
        suggestion: S5,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
        S5: Into<String>,
    {
        Self::InvalidDimensions {
            code,
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
            operation: operation.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid axis error
    pub fn invalid_axis<S1, S2, S3>(
        code: &'static str,
        message: S1,
        axis: isize,
        ndim: usize,
        operation: S2,
        suggestion: S3,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidAxis {
            code,
            message: message.into(),
            axis,
            ndim,
            operation: operation.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch<S1, S2, S3, S4>(
        code: &'static str,
        message: S1,
        dtype: S2,
        shape: S3,
        expected: usize,
        actual: usize,
        suggestion: S4,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self::SizeMismatch {
            code,
            message: message.into(),
            dtype: dtype.into(),
            shape: shape.into(),
            expected,
            actual,
            suggestion: suggestion.into(),
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds<S1, S2, S3>(
        code: &'static str,
        message: S1,
        index: usize,
        dim: usize,
        size: usize,
        operation: S2,
        suggestion: S3,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::OutOfBounds {
            code,
            message: message.into(),
            index,
            dim,
            size,
            operation: operation.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a quantization parameter error
    pub fn quantization<S1, S2, S3, S4>(
        code: &'static str,
        message: S1,
        params: S2,
        dtype: S3,
        suggestion: S4,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self::QuantizationError {
            code,
            message: message.into(),
            params: params.into(),
            dtype: dtype.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a decode error
    pub fn decode<S1, S2, S3>(
        code: &'static str,
        message: S1,
        dtype: S2,
        position: usize,
        suggestion: S3,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::DecodeError {
            code,
            message: message.into(),
            dtype: dtype.into(),
            position,
            suggestion: suggestion.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation<S1, S2, S3, S4, S5>(
        code: &'static str,
        message: S1,
        operation: S2,
        backend: S3,
        dtype: S4,
        suggestion: S5,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
        S5: Into<String>,
    {
        Self::UnsupportedOperation {
            code,
            message: message.into(),
            operation: operation.into(),
            backend: backend.into(),
            dtype: dtype.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Get the error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompatibleShapes { code, .. } => code,
            Self::InvalidShape { code, .. } => code,
            Self::InvalidDimensions { code, .. } => code,
            Self::InvalidAxis { code, .. } => code,
            Self::SizeMismatch { code, .. } => code,
            Self::OutOfBounds { code, .. } => code,
            Self::QuantizationError { code, .. } => code,
            Self::DecodeError { code, .. } => code,
            Self::UnsupportedOperation { code, .. } => code,
        }
    }

    /// Check if this is a shape-related error
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::IncompatibleShapes { .. }
                | Self::InvalidShape { .. }
                | Self::InvalidDimensions { .. }
                | Self::InvalidAxis { .. }
        )
    }

    /// Check if this is a construction/validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::InvalidShape { .. } | Self::SizeMismatch { .. })
    }

    /// Check if the operation is simply not implemented for the dtype
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Check if this is a corrupt-data error
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::DecodeError { .. })
    }
}
