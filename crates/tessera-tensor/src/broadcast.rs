//! NumPy-style broadcasting
//!
//! Shapes are aligned on their trailing axes. A missing leading axis counts
//! as size 1, and two aligned sizes are compatible when they are equal or
//! one of them is 1.

use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Returns whether the two shapes can be broadcast together
pub fn can_broadcast(a: &Shape, b: &Shape) -> bool {
    a.dims()
        .iter()
        .rev()
        .zip(b.dims().iter().rev())
        .all(|(&x, &y)| x == y || x == 1 || y == 1)
}

/// Computes the shape two operands broadcast to
pub fn broadcast_shape(a: &Shape, b: &Shape) -> Result<Shape> {
    if !can_broadcast(a, b) {
        return Err(TensorError::incompatible_shapes(
            "BROADCAST_INCOMPATIBLE",
            format!("Shapes {} and {} cannot be broadcast together", a, b),
            "broadcast",
            a.to_string(),
            b.to_string(),
            "Aligned trailing dimensions must be equal or 1",
        ));
    }

    let rank = a.ndim().max(b.ndim());
    let dims = (0..rank)
        .map(|i| {
            let x = aligned_dim(a, rank, i);
            let y = aligned_dim(b, rank, i);
            x.max(y)
        })
        .collect::<Vec<_>>();
    Shape::new(dims)
}

fn aligned_dim(shape: &Shape, rank: usize, axis: usize) -> usize {
    let pad = rank - shape.ndim();
    if axis < pad {
        1
    } else {
        shape[axis - pad]
    }
}

/// Maps a flat index of the broadcast result onto the operand's flat index
///
/// `flat` must be smaller than `result_shape.volume()` and `original_shape`
/// must broadcast to `result_shape`.
pub fn broadcast_index(flat: usize, result_shape: &Shape, original_shape: &Shape) -> usize {
    let rank = result_shape.ndim();
    let pad = rank - original_shape.ndim();

    let mut rest = flat;
    let mut source = 0usize;
    let mut stride = 1usize;
    for axis in (0..rank).rev() {
        let coord = rest % result_shape[axis];
        rest /= result_shape[axis];

        if axis < pad {
            continue;
        }
        let dim = original_shape[axis - pad];
        if dim != 1 {
            source += coord * stride;
        }
        stride *= dim;
    }
    source
}

/// Applies `op` pairwise over two broadcast operands
///
/// Equal shapes take a straight zip; otherwise each result element is
/// remapped to its source element in both operands.
pub fn zip_broadcast<T, U, F>(
    a: &[T],
    a_shape: &Shape,
    b: &[T],
    b_shape: &Shape,
    op: F,
) -> Result<(Vec<U>, Shape)>
where
    T: Copy,
    F: Fn(T, T) -> U,
{
    if a_shape == b_shape {
        let values = a.iter().zip(b).map(|(&x, &y)| op(x, y)).collect();
        return Ok((values, a_shape.clone()));
    }

    let shape = broadcast_shape(a_shape, b_shape)?;
    let values = (0..shape.volume())
        .map(|flat| {
            let x = a[broadcast_index(flat, &shape, a_shape)];
            let y = b[broadcast_index(flat, &shape, b_shape)];
            op(x, y)
        })
        .collect();
    Ok((values, shape))
}
