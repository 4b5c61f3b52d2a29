//! Dtype-agnostic layout operations
//!
//! Flatten and reshape are row-major reinterpretations: the value order is
//! untouched and only the shape changes. Transpose reorders values.

use crate::error::Result;
use crate::shape::Shape;
use crate::validation::TensorValidator;

/// Layout kernels over flat value arrays
pub struct ShapeOps;

impl ShapeOps {
    /// Transposes a row-major matrix
    pub fn transpose<V: Copy>(values: &[V], shape: &Shape) -> Result<(Vec<V>, Shape)> {
        TensorValidator::validate_transpose(shape)?;
        let (rows, cols) = (shape[0], shape[1]);

        let mut out = Vec::with_capacity(values.len());
        for j in 0..cols {
            for i in 0..rows {
                out.push(values[i * cols + j]);
            }
        }
        Ok((out, Shape::matrix(cols, rows)?))
    }

    /// Shape after collapsing axes `start..=end`; negative axes count from the end
    pub fn flatten(shape: &Shape, start: isize, end: isize) -> Result<Shape> {
        TensorValidator::resolve_flatten(shape, start, end)
    }

    /// Shape after reshaping to `target`, which may hold one `-1`
    pub fn reshape(shape: &Shape, target: &[isize]) -> Result<Shape> {
        TensorValidator::resolve_reshape(shape, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose() {
        let shape = Shape::matrix(2, 3).unwrap();
        let (out, out_shape) = ShapeOps::transpose(&[1, 2, 3, 4, 5, 6], &shape).unwrap();
        assert_eq!(out_shape.dims(), &[3, 2]);
        assert_eq!(out, vec![1, 4, 2, 5, 3, 6]);

        let (back, back_shape) = ShapeOps::transpose(&out, &out_shape).unwrap();
        assert_eq!(back_shape, shape);
        assert_eq!(back, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_transpose_rejects_vectors() {
        let shape = Shape::vector(3).unwrap();
        assert!(ShapeOps::transpose(&[1, 2, 3], &shape).unwrap_err().is_shape_error());
    }
}
