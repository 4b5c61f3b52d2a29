//! Tensor storage: dense buffers and bit-packed sub-byte buffers
//!
//! Every storage owns its buffer and is immutable once built. Construction
//! checks the buffer length against the shape, so a storage value always
//! satisfies `len == volume` (dense) or `len == ceil(volume / values_per_byte)`
//! (packed).

use std::fmt::Debug;
use std::ops::Range;

use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::packing;
use crate::shape::{Shape, Strides};

/// Host value type that can live in a [`DenseData`] buffer
pub trait DenseElement: Copy + Debug + PartialEq + Default + Send + Sync + 'static {
    /// Encoding used when the value is stored densely on its own
    const DTYPE: DType;
}

impl DenseElement for f32 {
    const DTYPE: DType = DType::Fp32;
}

impl DenseElement for f16 {
    const DTYPE: DType = DType::Fp16;
}

impl DenseElement for i32 {
    const DTYPE: DType = DType::Int32;
}

impl DenseElement for i8 {
    const DTYPE: DType = DType::Int8;
}

/// Read-only view over a tensor buffer
pub trait TensorData: Clone + Debug + Send + Sync + Sized + 'static {
    /// Host value produced by element reads
    type Value: DenseElement;

    /// Builds storage from one value per element, in row-major order
    fn from_values(values: Vec<Self::Value>, shape: Shape) -> Result<Self>;

    /// Element encoding of the buffer
    fn dtype(&self) -> DType;

    /// Logical shape
    fn shape(&self) -> &Shape;

    /// Row-major strides of the logical shape
    fn strides(&self) -> Strides {
        self.shape().strides()
    }

    /// Storage is always laid out contiguously
    fn is_contiguous(&self) -> bool {
        true
    }

    /// Element offset of the first value in the buffer
    fn offset(&self) -> usize {
        0
    }

    /// Number of logical elements
    fn len(&self) -> usize {
        self.shape().volume()
    }

    /// Storage never holds zero elements
    fn is_empty(&self) -> bool {
        false
    }

    /// Reads the element at a flat row-major position
    fn get(&self, flat: usize) -> Result<Self::Value>;

    /// Reads the element at a multi-dimensional index
    fn at(&self, index: &[usize]) -> Result<Self::Value> {
        let flat = self.shape().index(index)?;
        self.get(flat)
    }

    /// Copies every element out in row-major order
    fn to_vec(&self) -> Vec<Self::Value>;

    /// Size of the underlying buffer in bytes
    fn byte_len(&self) -> usize;

    /// Copies the sub-block selected by one half-open range per axis
    fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        let (values, shape) = gather_slice(self, ranges)?;
        Self::from_values(values, shape)
    }

    /// Dense realization of the buffer, keeping the dtype tag
    fn materialize(&self) -> Result<DenseData<Self::Value>> {
        DenseData::with_dtype(self.to_vec(), self.shape().clone(), self.dtype())
    }
}

fn out_of_bounds(flat: usize, shape: &Shape) -> TensorError {
    TensorError::out_of_bounds(
        "STORAGE_INDEX_OUT_OF_BOUNDS",
        format!("Flat index {} is out of bounds for shape {}", flat, shape),
        flat,
        0,
        shape.volume(),
        "element read",
        "Flat indices must be smaller than the shape volume",
    )
}

/// Validates slice ranges and returns the shape of the selected block
pub fn slice_shape(shape: &Shape, ranges: &[Range<usize>]) -> Result<Shape> {
    if ranges.len() != shape.ndim() {
        return Err(TensorError::invalid_dimensions(
            "SLICE_RANK_MISMATCH",
            format!("Got {} ranges for a tensor of rank {}", ranges.len(), shape.ndim()),
            shape.ndim().to_string(),
            ranges.len().to_string(),
            "slice",
            "Provide exactly one range per dimension",
        ));
    }

    let mut dims = Vec::with_capacity(ranges.len());
    for (axis, (range, &dim)) in ranges.iter().zip(shape.dims()).enumerate() {
        if range.start >= range.end || range.end > dim {
            return Err(TensorError::out_of_bounds(
                "SLICE_RANGE_INVALID",
                format!(
                    "Range {}..{} is invalid for axis {} of size {}",
                    range.start, range.end, axis, dim
                ),
                range.end,
                axis,
                dim,
                "slice",
                "Each range must satisfy start < end <= dimension size",
            ));
        }
        dims.push(range.end - range.start);
    }
    Shape::new(dims)
}

/// Gathers the values of a slice in row-major order of the result
pub fn gather_slice<D: TensorData>(data: &D, ranges: &[Range<usize>]) -> Result<(Vec<D::Value>, Shape)> {
    let shape = slice_shape(data.shape(), ranges)?;
    let strides = data.strides();
    let mut values = Vec::with_capacity(shape.volume());

    for flat in 0..shape.volume() {
        let coords = shape.unravel(flat)?;
        let source = coords
            .iter()
            .zip(ranges)
            .zip(strides.as_slice())
            .map(|((&c, range), &stride)| (c + range.start) * stride)
            .sum();
        values.push(data.get(source)?);
    }
    Ok((values, shape))
}

/// One value per element over a flat `Vec`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseData<V> {
    values: Vec<V>,
    shape: Shape,
    dtype: DType,
}

impl<V: DenseElement> DenseData<V> {
    /// Creates dense storage tagged with the value type's own dtype
    pub fn new(values: Vec<V>, shape: Shape) -> Result<Self> {
        Self::with_dtype(values, shape, V::DTYPE)
    }

    /// Creates dense storage under an explicit dtype tag
    ///
    /// Used when a packed encoding is materialized: an Int4 tensor realized
    /// densely still holds `i8` values but keeps its `int4` tag.
    pub fn with_dtype(values: Vec<V>, shape: Shape, dtype: DType) -> Result<Self> {
        if values.len() != shape.volume() {
            return Err(TensorError::size_mismatch(
                "STORAGE_LENGTH_MISMATCH",
                format!(
                    "Shape {} needs {} elements but {} were supplied",
                    shape,
                    shape.volume(),
                    values.len()
                ),
                dtype.name(),
                shape.to_string(),
                shape.volume(),
                values.len(),
                "Supply exactly one value per element of the shape",
            ));
        }
        Ok(Self { values, shape, dtype })
    }

    /// Borrows the values
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Consumes the storage, returning its values
    pub fn into_values(self) -> Vec<V> {
        self.values
    }
}

impl<V: DenseElement> TensorData for DenseData<V> {
    type Value = V;

    fn from_values(values: Vec<V>, shape: Shape) -> Result<Self> {
        Self::new(values, shape)
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn get(&self, flat: usize) -> Result<V> {
        self.values
            .get(flat)
            .copied()
            .ok_or_else(|| out_of_bounds(flat, &self.shape))
    }

    fn to_vec(&self) -> Vec<V> {
        self.values.clone()
    }

    fn byte_len(&self) -> usize {
        self.values.len() * std::mem::size_of::<V>()
    }

    fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        let (values, shape) = gather_slice(self, ranges)?;
        Self::with_dtype(values, shape, self.dtype)
    }

    fn materialize(&self) -> Result<DenseData<V>> {
        Ok(self.clone())
    }
}

fn packed_length_error(dtype: DType, shape: &Shape, expected: usize, actual: usize) -> TensorError {
    TensorError::size_mismatch(
        "STORAGE_BYTE_LENGTH_MISMATCH",
        format!(
            "{} tensor of shape {} needs {} packed bytes, got {}",
            dtype, shape, expected, actual
        ),
        dtype.name(),
        shape.to_string(),
        expected,
        actual,
        format!(
            "Packed {} storage holds {} values per byte; supply ceil(volume / {}) bytes",
            dtype,
            dtype.values_per_byte().unwrap_or(1),
            dtype.values_per_byte().unwrap_or(1)
        ),
    )
}

/// Signed 4-bit values packed two per byte
///
/// See [`crate::packing`] for the nibble layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Int4Data {
    bytes: Vec<u8>,
    shape: Shape,
}

impl Int4Data {
    /// Wraps already packed bytes
    pub fn from_packed(bytes: Vec<u8>, shape: Shape) -> Result<Self> {
        let expected = DType::Int4.byte_len_for(&shape)?;
        if bytes.len() != expected {
            return Err(packed_length_error(DType::Int4, &shape, expected, bytes.len()));
        }
        Ok(Self { bytes, shape })
    }

    /// Borrows the packed bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl TensorData for Int4Data {
    type Value = i8;

    /// Values outside [-8, 7] are clamped while packing
    fn from_values(values: Vec<i8>, shape: Shape) -> Result<Self> {
        if values.len() != shape.volume() {
            return Err(TensorError::size_mismatch(
                "STORAGE_LENGTH_MISMATCH",
                format!("Shape {} needs {} elements but {} were supplied", shape, shape.volume(), values.len()),
                DType::Int4.name(),
                shape.to_string(),
                shape.volume(),
                values.len(),
                "Supply exactly one value per element of the shape",
            ));
        }
        Ok(Self {
            bytes: packing::pack_int4(&values),
            shape,
        })
    }

    fn dtype(&self) -> DType {
        DType::Int4
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn get(&self, flat: usize) -> Result<i8> {
        if flat >= self.shape.volume() {
            return Err(out_of_bounds(flat, &self.shape));
        }
        Ok(packing::read_int4(&self.bytes, flat))
    }

    fn to_vec(&self) -> Vec<i8> {
        (0..self.shape.volume())
            .map(|i| packing::read_int4(&self.bytes, i))
            .collect()
    }

    fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Ternary values packed four per byte
///
/// Construction from packed bytes rejects the reserved `0b11` code, so every
/// read afterwards is infallible apart from bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TernaryData {
    bytes: Vec<u8>,
    shape: Shape,
}

impl TernaryData {
    /// Wraps already packed bytes, validating every logical field
    ///
    /// Padding fields past the last element are not inspected.
    pub fn from_packed(bytes: Vec<u8>, shape: Shape) -> Result<Self> {
        let expected = DType::Ternary.byte_len_for(&shape)?;
        if bytes.len() != expected {
            return Err(packed_length_error(DType::Ternary, &shape, expected, bytes.len()));
        }
        packing::validate_ternary(&bytes, shape.volume())?;
        Ok(Self { bytes, shape })
    }

    /// Borrows the packed bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn read(&self, index: usize) -> i8 {
        // 0b11 cannot occur here; from_packed rejects it and pack_ternary never writes it
        match packing::ternary_code(&self.bytes, index) {
            0b00 => -1,
            0b10 => 1,
            _ => 0,
        }
    }
}

impl TensorData for TernaryData {
    type Value = i8;

    /// Values are clamped to their sign while packing
    fn from_values(values: Vec<i8>, shape: Shape) -> Result<Self> {
        if values.len() != shape.volume() {
            return Err(TensorError::size_mismatch(
                "STORAGE_LENGTH_MISMATCH",
                format!("Shape {} needs {} elements but {} were supplied", shape, shape.volume(), values.len()),
                DType::Ternary.name(),
                shape.to_string(),
                shape.volume(),
                values.len(),
                "Supply exactly one value per element of the shape",
            ));
        }
        Ok(Self {
            bytes: packing::pack_ternary(&values),
            shape,
        })
    }

    fn dtype(&self) -> DType {
        DType::Ternary
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn get(&self, flat: usize) -> Result<i8> {
        if flat >= self.shape.volume() {
            return Err(out_of_bounds(flat, &self.shape));
        }
        Ok(self.read(flat))
    }

    fn to_vec(&self) -> Vec<i8> {
        (0..self.shape.volume()).map(|i| self.read(i)).collect()
    }

    fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
