//! Shape and stride types for tensor dimensions

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TensorError};

/// Highest rank a tensor may have
pub const MAX_RANK: usize = 4;

/// Represents the shape of a tensor
///
/// A shape is an immutable list of 1 to [`MAX_RANK`] positive dimension
/// sizes laid out row-major: the last axis has unit stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a validated shape from a list of dimensions
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        Self::validate_dims(&dims)?;
        Ok(Self { dims })
    }

    /// Creates a shape from a slice of dimensions
    pub fn from_slice(dims: &[usize]) -> Result<Self> {
        Self::new(dims.to_vec())
    }

    /// Creates a 1D shape
    pub fn vector(size: usize) -> Result<Self> {
        Self::new(vec![size])
    }

    /// Creates a 2D shape
    pub fn matrix(rows: usize, cols: usize) -> Result<Self> {
        Self::new(vec![rows, cols])
    }

    fn validate_dims(dims: &[usize]) -> Result<()> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(TensorError::invalid_shape(
                "SHAPE_RANK_OUT_OF_RANGE",
                format!("Shape rank {} is outside 1..={}", dims.len(), MAX_RANK),
                format!("{:?}", dims),
                "shape validation",
                "Unsupported rank",
                "Use between one and four dimensions",
            ));
        }

        let mut total = 1usize;
        for (axis, &dim) in dims.iter().enumerate() {
            if dim == 0 {
                return Err(TensorError::invalid_shape(
                    "SHAPE_ZERO_DIMENSION",
                    format!("Dimension {} has size zero", axis),
                    format!("{:?}", dims),
                    "shape validation",
                    "Zero dimension found",
                    "All shape dimensions must be positive",
                ));
            }
            total = total.checked_mul(dim).ok_or_else(|| {
                TensorError::invalid_shape(
                    "SHAPE_TOO_LARGE",
                    "Shape is too large",
                    format!("{:?}", dims),
                    "shape validation",
                    "Overflow in element count",
                    "Use smaller dimensions to avoid overflow",
                )
            })?;
        }
        Ok(())
    }

    /// Returns the number of dimensions (rank)
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Returns the dimensions as a slice
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the total number of elements
    pub fn volume(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns whether this is a vector (1-dimensional)
    pub fn is_vector(&self) -> bool {
        self.dims.len() == 1
    }

    /// Returns whether this is a matrix (2-dimensional)
    pub fn is_matrix(&self) -> bool {
        self.dims.len() == 2
    }

    /// Computes row-major strides for this shape
    pub fn strides(&self) -> Strides {
        Strides::from_shape(self)
    }

    /// Maps a multi-dimensional index to a flat row-major offset
    pub fn index(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(TensorError::invalid_dimensions(
                "SHAPE_INDEX_ARITY_MISMATCH",
                format!("Index has {} components but shape {} has rank {}", indices.len(), self, self.ndim()),
                self.ndim().to_string(),
                indices.len().to_string(),
                "multi-index lookup",
                "Provide exactly one index per dimension",
            ));
        }

        let mut offset = 0usize;
        for (axis, (&idx, &dim)) in indices.iter().zip(&self.dims).enumerate() {
            if idx >= dim {
                return Err(TensorError::out_of_bounds(
                    "SHAPE_INDEX_OUT_OF_BOUNDS",
                    format!("Index {} is out of bounds for axis {} of shape {}", idx, axis, self),
                    idx,
                    axis,
                    dim,
                    "multi-index lookup",
                    "Indices must satisfy 0 <= index < dimension size",
                ));
            }
            offset = offset * dim + idx;
        }
        Ok(offset)
    }

    /// Inverse of [`Shape::index`]: decomposes a flat offset into coordinates
    pub fn unravel(&self, flat: usize) -> Result<Vec<usize>> {
        let volume = self.volume();
        if flat >= volume {
            return Err(TensorError::out_of_bounds(
                "SHAPE_FLAT_INDEX_OUT_OF_BOUNDS",
                format!("Flat index {} is out of bounds for volume {}", flat, volume),
                flat,
                0,
                volume,
                "flat index decomposition",
                "Flat indices must be smaller than the shape volume",
            ));
        }

        let mut coords = vec![0; self.ndim()];
        let mut rest = flat;
        for axis in (0..self.ndim()).rev() {
            coords[axis] = rest % self.dims[axis];
            rest /= self.dims[axis];
        }
        Ok(coords)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, dim) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        write!(f, ")")
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.dims[index]
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = TensorError;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        Self::new(dims)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TensorError;

    fn try_from(dims: &[usize]) -> Result<Self> {
        Self::from_slice(dims)
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims
    }
}

/// Represents the row-major strides of a tensor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Strides {
    strides: Vec<usize>,
}

impl Strides {
    /// Creates strides from a shape in row-major (C) order
    pub fn from_shape(shape: &Shape) -> Self {
        let mut strides = vec![1usize; shape.ndim()];
        for i in (0..shape.ndim() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        Self { strides }
    }

    /// Returns the strides as a slice
    pub fn as_slice(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the number of dimensions
    pub fn ndim(&self) -> usize {
        self.strides.len()
    }

    /// Computes the offset for a given multi-dimensional index
    ///
    /// Only the arity is checked here; bounds are the shape's concern.
    pub fn offset(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.strides.len() {
            return Err(TensorError::invalid_dimensions(
                "STRIDES_INDEX_ARITY_MISMATCH",
                "Index dimension mismatch",
                self.strides.len().to_string(),
                indices.len().to_string(),
                "stride offset",
                "Provide exactly one index per dimension",
            ));
        }

        Ok(indices.iter().zip(&self.strides).map(|(idx, stride)| idx * stride).sum())
    }
}

impl Index<usize> for Strides {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        &self.strides[index]
    }
}

impl fmt::Display for Strides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, stride) in self.strides.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", stride)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_creation() {
        let shape = Shape::vector(10).unwrap();
        assert_eq!(shape.ndim(), 1);
        assert_eq!(shape.volume(), 10);

        let shape = Shape::matrix(3, 4).unwrap();
        assert_eq!(shape.ndim(), 2);
        assert_eq!(shape.volume(), 12);
        assert_eq!(shape.to_string(), "(3, 4)");
    }

    #[test]
    fn test_rank_and_zero_validation() {
        assert_eq!(Shape::new(Vec::<usize>::new()).unwrap_err().code(), "SHAPE_RANK_OUT_OF_RANGE");
        assert_eq!(Shape::new(vec![1, 2, 3, 4, 5]).unwrap_err().code(), "SHAPE_RANK_OUT_OF_RANGE");
        assert_eq!(Shape::new(vec![2, 0]).unwrap_err().code(), "SHAPE_ZERO_DIMENSION");
        assert!(Shape::new(vec![2, 3, 4, 5]).is_ok());
    }

    #[test]
    fn test_strides() {
        let shape = Shape::new(vec![2, 3, 4]).unwrap();
        let strides = shape.strides();

        assert_eq!(strides.as_slice(), &[12, 4, 1]);
        assert_eq!(strides.offset(&[1, 2, 3]).unwrap(), 23);
        assert!(strides.offset(&[1, 2]).is_err());
    }

    #[test]
    fn test_index_bounds() {
        let shape = Shape::matrix(3, 4).unwrap();
        assert_eq!(shape.index(&[1, 2]).unwrap(), 6);
        assert_eq!(shape.index(&[2, 3]).unwrap(), 11);

        let err = shape.index(&[3, 0]).unwrap_err();
        assert_eq!(err.code(), "SHAPE_INDEX_OUT_OF_BOUNDS");
        let err = shape.index(&[1]).unwrap_err();
        assert_eq!(err.code(), "SHAPE_INDEX_ARITY_MISMATCH");
    }

    #[test]
    fn test_unravel_inverts_index() {
        let shape = Shape::new(vec![2, 3, 4]).unwrap();
        for flat in 0..shape.volume() {
            let coords = shape.unravel(flat).unwrap();
            assert_eq!(shape.index(&coords).unwrap(), flat);
        }
        assert!(shape.unravel(24).is_err());
    }
}
