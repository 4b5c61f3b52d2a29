//! Tensor validation utilities
//!
//! Contract checks run before any kernel touches data, so a failing
//! operation never produces a partial result.

use crate::broadcast;
use crate::error::{Result, TensorError};
use crate::shape::{Shape, MAX_RANK};

/// Which batched matrix product a pair of operand shapes describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatMul4dKind {
    /// `[B, C, M, K] x [B, C, K, N] -> [B, C, M, N]`
    Batched {
        /// Batch size
        batch: usize,
        /// Channel count
        channels: usize,
        /// Rows of each left matrix
        m: usize,
        /// Shared inner dimension
        k: usize,
        /// Columns of each right matrix
        n: usize,
    },
    /// `[B, Cin, H, W] x [Cin, Cout] -> [B, Cout, H, W]`
    ChannelMix {
        /// Batch size
        batch: usize,
        /// Input channels
        channels_in: usize,
        /// Output channels
        channels_out: usize,
        /// Spatial positions per channel (`H * W`)
        spatial: usize,
    },
}

/// Row/column layout of a softmax over one axis
///
/// Group `g` covers elements `start(g) + j * stride` for `j < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftmaxLayout {
    /// Number of independent groups
    pub groups: usize,
    /// Elements per group
    pub len: usize,
    /// Distance between consecutive elements of a group
    pub stride: usize,
    /// Distance between the first elements of consecutive groups
    pub group_step: usize,
}

impl SoftmaxLayout {
    /// Flat index of the first element of group `g`
    pub fn start(&self, g: usize) -> usize {
        g * self.group_step
    }
}

/// Tensor validation utilities
pub struct TensorValidator;

impl TensorValidator {
    /// Validate operand shapes for a broadcasting elementwise operation
    pub fn validate_binary_op_shapes(left: &Shape, right: &Shape, operation: &str) -> Result<Shape> {
        if left == right {
            return Ok(left.clone());
        }
        if !broadcast::can_broadcast(left, right) {
            return Err(TensorError::incompatible_shapes(
                "TENSOR_BINARY_OP_INCOMPATIBLE",
                format!("Shapes {} and {} are not compatible for {}", left, right, operation),
                operation,
                left.to_string(),
                right.to_string(),
                "Use tensors with equal shapes or shapes that broadcast",
            ));
        }
        broadcast::broadcast_shape(left, right)
    }

    /// Validate rank-2 matrix multiplication shapes, returning `(m, k, n)`
    pub fn validate_matmul_shapes(left: &Shape, right: &Shape) -> Result<(usize, usize, usize)> {
        if !left.is_matrix() || !right.is_matrix() {
            return Err(TensorError::invalid_dimensions(
                "MATMUL_REQUIRES_RANK_2",
                format!("matmul needs two rank-2 operands, got {} and {}", left, right),
                "rank 2 x rank 2",
                format!("rank {} x rank {}", left.ndim(), right.ndim()),
                "matrix multiplication",
                "Reshape the operands to matrices or use matmul4d for batched products",
            ));
        }

        let (m, k) = (left[0], left[1]);
        let (k2, n) = (right[0], right[1]);
        if k != k2 {
            return Err(TensorError::incompatible_shapes(
                "MATMUL_INNER_DIM_MISMATCH",
                format!("Inner dimensions differ: {} columns vs {} rows", k, k2),
                "matrix multiplication",
                left.to_string(),
                right.to_string(),
                "The left operand's column count must equal the right operand's row count",
            ));
        }
        Ok((m, k, n))
    }

    /// Classify and validate the operand shapes of a batched product
    pub fn validate_matmul4d_shapes(left: &Shape, right: &Shape) -> Result<MatMul4dKind> {
        match (left.ndim(), right.ndim()) {
            (4, 4) => {
                let l = left.dims();
                let r = right.dims();
                if l[0] != r[0] || l[1] != r[1] {
                    return Err(TensorError::incompatible_shapes(
                        "MATMUL4D_BATCH_MISMATCH",
                        format!("Batch/channel dimensions differ: ({}, {}) vs ({}, {})", l[0], l[1], r[0], r[1]),
                        "matmul4d",
                        left.to_string(),
                        right.to_string(),
                        "Both operands need the same batch and channel sizes",
                    ));
                }
                if l[3] != r[2] {
                    return Err(TensorError::incompatible_shapes(
                        "MATMUL4D_INNER_DIM_MISMATCH",
                        format!("Inner dimensions differ: {} vs {}", l[3], r[2]),
                        "matmul4d",
                        left.to_string(),
                        right.to_string(),
                        "The left operand's last axis must equal the right operand's third axis",
                    ));
                }
                Ok(MatMul4dKind::Batched {
                    batch: l[0],
                    channels: l[1],
                    m: l[2],
                    k: l[3],
                    n: r[3],
                })
            }
            (4, 2) => {
                let l = left.dims();
                let r = right.dims();
                if l[1] != r[0] {
                    return Err(TensorError::incompatible_shapes(
                        "MATMUL4D_CHANNEL_MISMATCH",
                        format!("Input has {} channels but the mixing matrix expects {}", l[1], r[0]),
                        "matmul4d",
                        left.to_string(),
                        right.to_string(),
                        "The mixing matrix must be [input channels, output channels]",
                    ));
                }
                Ok(MatMul4dKind::ChannelMix {
                    batch: l[0],
                    channels_in: l[1],
                    channels_out: r[1],
                    spatial: l[2] * l[3],
                })
            }
            (lr, rr) => Err(TensorError::unsupported_operation(
                "MATMUL4D_UNSUPPORTED_RANKS",
                format!("matmul4d is defined for rank 4 x rank 4 or rank 4 x rank 2, got rank {} x rank {}", lr, rr),
                "matmul4d",
                "any",
                "any",
                "Use matmul for rank-2 operands",
            )),
        }
    }

    /// Validate that two operands have identical shapes
    pub fn validate_same_shape(left: &Shape, right: &Shape, operation: &str) -> Result<()> {
        if left != right {
            return Err(TensorError::incompatible_shapes(
                "TENSOR_SHAPE_MISMATCH",
                format!("{} needs equal shapes, got {} and {}", operation, left, right),
                operation,
                left.to_string(),
                right.to_string(),
                "Reshape one operand so both shapes match",
            ));
        }
        Ok(())
    }

    /// Validate a softmax axis and return its layout
    pub fn validate_softmax(shape: &Shape, dim: usize) -> Result<SoftmaxLayout> {
        match shape.ndim() {
            1 if dim == 0 => Ok(SoftmaxLayout {
                groups: 1,
                len: shape[0],
                stride: 1,
                group_step: 0,
            }),
            2 if dim == 1 => Ok(SoftmaxLayout {
                groups: shape[0],
                len: shape[1],
                stride: 1,
                group_step: shape[1],
            }),
            2 if dim == 0 => Ok(SoftmaxLayout {
                groups: shape[1],
                len: shape[0],
                stride: shape[1],
                group_step: 1,
            }),
            1 | 2 => Err(TensorError::invalid_axis(
                "SOFTMAX_AXIS_OUT_OF_RANGE",
                format!("Axis {} does not exist on a tensor of shape {}", dim, shape),
                dim as isize,
                shape.ndim(),
                "softmax",
                "Use axis 0 for vectors, 0 or 1 for matrices",
            )),
            rank => Err(TensorError::invalid_dimensions(
                "SOFTMAX_RANK_UNSUPPORTED",
                format!("softmax supports rank 1 or 2, got shape {}", shape),
                "rank 1 or 2",
                format!("rank {}", rank),
                "softmax",
                "Reshape or flatten the tensor to at most two dimensions first",
            )),
        }
    }

    /// Validate that a tensor is a matrix, for transpose
    pub fn validate_transpose(shape: &Shape) -> Result<()> {
        if !shape.is_matrix() {
            return Err(TensorError::invalid_dimensions(
                "TRANSPOSE_REQUIRES_RANK_2",
                format!("transpose is defined for rank-2 tensors, got shape {}", shape),
                "rank 2",
                format!("rank {}", shape.ndim()),
                "transpose",
                "Reshape the tensor to a matrix first",
            ));
        }
        Ok(())
    }

    /// Resolve a possibly negative axis against a rank
    pub fn resolve_axis(axis: isize, ndim: usize, operation: &str) -> Result<usize> {
        let resolved = if axis < 0 { axis + ndim as isize } else { axis };
        if resolved < 0 || resolved >= ndim as isize {
            return Err(TensorError::invalid_axis(
                "AXIS_OUT_OF_RANGE",
                format!("Axis {} is out of range for rank {}", axis, ndim),
                axis,
                ndim,
                operation,
                format!("Use an axis in -{}..{}", ndim, ndim),
            ));
        }
        Ok(resolved as usize)
    }

    /// Compute the shape produced by collapsing axes `start..=end`
    pub fn resolve_flatten(shape: &Shape, start: isize, end: isize) -> Result<Shape> {
        let first = Self::resolve_axis(start, shape.ndim(), "flatten")?;
        let last = Self::resolve_axis(end, shape.ndim(), "flatten")?;
        if first > last {
            return Err(TensorError::invalid_axis(
                "FLATTEN_AXES_REVERSED",
                format!("Start axis {} comes after end axis {}", first, last),
                start,
                shape.ndim(),
                "flatten",
                "Pass start <= end",
            ));
        }

        let dims = shape.dims();
        let mut out = dims[..first].to_vec();
        out.push(dims[first..=last].iter().product());
        out.extend_from_slice(&dims[last + 1..]);
        Shape::new(out)
    }

    /// Resolve a reshape target with at most one `-1` placeholder
    pub fn resolve_reshape(shape: &Shape, target: &[isize]) -> Result<Shape> {
        if target.is_empty() || target.len() > MAX_RANK {
            return Err(TensorError::invalid_dimensions(
                "RESHAPE_RANK_OUT_OF_RANGE",
                format!("Reshape target has rank {}", target.len()),
                format!("1..={}", MAX_RANK),
                target.len().to_string(),
                "reshape",
                "Use between one and four dimensions",
            ));
        }

        let mut inferred = None;
        let mut known = 1usize;
        for (axis, &dim) in target.iter().enumerate() {
            match dim {
                -1 if inferred.is_none() => inferred = Some(axis),
                -1 => {
                    return Err(TensorError::invalid_shape(
                        "RESHAPE_MULTIPLE_INFERRED",
                        "Only one dimension may be -1",
                        format!("{:?}", target),
                        "reshape",
                        "Several inferred dimensions",
                        "Specify every dimension but one",
                    ))
                }
                d if d <= 0 => {
                    return Err(TensorError::invalid_shape(
                        "RESHAPE_INVALID_DIMENSION",
                        format!("Dimension {} has invalid size {}", axis, d),
                        format!("{:?}", target),
                        "reshape",
                        "Dimensions must be positive or -1",
                        "Use positive sizes and at most one -1",
                    ))
                }
                d => known = known.saturating_mul(d as usize),
            }
        }

        let volume = shape.volume();
        let mut dims: Vec<usize> = target.iter().map(|&d| d.max(0) as usize).collect();
        if let Some(axis) = inferred {
            if volume % known != 0 {
                return Err(TensorError::invalid_shape(
                    "RESHAPE_CANNOT_INFER",
                    format!("Volume {} is not divisible by {}", volume, known),
                    format!("{:?}", target),
                    "reshape",
                    "Inferred dimension would not be an integer",
                    "Choose dimensions whose product divides the volume",
                ));
            }
            dims[axis] = volume / known;
        } else if known != volume {
            return Err(TensorError::size_mismatch(
                "RESHAPE_VOLUME_MISMATCH",
                format!("Cannot reshape {} ({} elements) into {:?}", shape, volume, target),
                "any",
                shape.to_string(),
                volume,
                known,
                "The target dimensions must multiply to the same volume",
            ));
        }
        Shape::new(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::from_slice(dims).unwrap()
    }

    #[test]
    fn test_validate_binary_op_shapes() {
        let out = TensorValidator::validate_binary_op_shapes(&shape(&[3, 1]), &shape(&[1, 4]), "add").unwrap();
        assert_eq!(out.dims(), &[3, 4]);

        let err = TensorValidator::validate_binary_op_shapes(&shape(&[2, 3]), &shape(&[3, 2]), "add").unwrap_err();
        assert_eq!(err.code(), "TENSOR_BINARY_OP_INCOMPATIBLE");
    }

    #[test]
    fn test_validate_matmul_shapes() {
        assert_eq!(
            TensorValidator::validate_matmul_shapes(&shape(&[3, 4]), &shape(&[4, 5])).unwrap(),
            (3, 4, 5)
        );
        let err = TensorValidator::validate_matmul_shapes(&shape(&[3, 4]), &shape(&[3, 5])).unwrap_err();
        assert_eq!(err.code(), "MATMUL_INNER_DIM_MISMATCH");
        let err = TensorValidator::validate_matmul_shapes(&shape(&[3]), &shape(&[3, 5])).unwrap_err();
        assert_eq!(err.code(), "MATMUL_REQUIRES_RANK_2");
    }

    #[test]
    fn test_validate_matmul4d_kinds() {
        let kind = TensorValidator::validate_matmul4d_shapes(&shape(&[2, 3, 4, 5]), &shape(&[2, 3, 5, 6])).unwrap();
        assert_eq!(kind, MatMul4dKind::Batched { batch: 2, channels: 3, m: 4, k: 5, n: 6 });

        let kind = TensorValidator::validate_matmul4d_shapes(&shape(&[2, 3, 4, 5]), &shape(&[3, 8])).unwrap();
        assert_eq!(kind, MatMul4dKind::ChannelMix { batch: 2, channels_in: 3, channels_out: 8, spatial: 20 });

        let err = TensorValidator::validate_matmul4d_shapes(&shape(&[2, 3, 4, 5]), &shape(&[2, 4, 5, 6])).unwrap_err();
        assert_eq!(err.code(), "MATMUL4D_BATCH_MISMATCH");
        let err = TensorValidator::validate_matmul4d_shapes(&shape(&[3, 4, 5]), &shape(&[5, 6])).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_validate_softmax() {
        let layout = TensorValidator::validate_softmax(&shape(&[2, 3]), 0).unwrap();
        assert_eq!((layout.groups, layout.len, layout.stride), (3, 2, 3));
        assert_eq!(layout.start(2), 2);

        assert_eq!(
            TensorValidator::validate_softmax(&shape(&[4]), 1).unwrap_err().code(),
            "SOFTMAX_AXIS_OUT_OF_RANGE"
        );
        assert_eq!(
            TensorValidator::validate_softmax(&shape(&[2, 2, 2]), 0).unwrap_err().code(),
            "SOFTMAX_RANK_UNSUPPORTED"
        );
    }

    #[test]
    fn test_resolve_flatten() {
        let s = shape(&[2, 3, 4, 5]);
        assert_eq!(TensorValidator::resolve_flatten(&s, 1, 2).unwrap().dims(), &[2, 12, 5]);
        assert_eq!(TensorValidator::resolve_flatten(&s, 0, -1).unwrap().dims(), &[120]);
        assert_eq!(TensorValidator::resolve_flatten(&s, 2, 1).unwrap_err().code(), "FLATTEN_AXES_REVERSED");
        assert_eq!(TensorValidator::resolve_flatten(&s, 0, 4).unwrap_err().code(), "AXIS_OUT_OF_RANGE");
    }

    #[test]
    fn test_resolve_reshape() {
        let s = shape(&[2, 6]);
        assert_eq!(TensorValidator::resolve_reshape(&s, &[3, -1]).unwrap().dims(), &[3, 4]);
        assert_eq!(TensorValidator::resolve_reshape(&s, &[12]).unwrap().dims(), &[12]);
        assert_eq!(
            TensorValidator::resolve_reshape(&s, &[-1, -1]).unwrap_err().code(),
            "RESHAPE_MULTIPLE_INFERRED"
        );
        assert_eq!(
            TensorValidator::resolve_reshape(&s, &[5, -1]).unwrap_err().code(),
            "RESHAPE_CANNOT_INFER"
        );
        assert_eq!(
            TensorValidator::resolve_reshape(&s, &[5, 2]).unwrap_err().code(),
            "RESHAPE_VOLUME_MISMATCH"
        );
        assert_eq!(
            TensorValidator::resolve_reshape(&s, &[0, 12]).unwrap_err().code(),
            "RESHAPE_INVALID_DIMENSION"
        );
    }
}
