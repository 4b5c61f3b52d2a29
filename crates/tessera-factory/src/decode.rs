//! Per-dtype decode strategies
//!
//! A strategy turns a validated byte buffer into an [`AnyTensor`]. Dense
//! encodings honour the requested byte order; packed encodings are
//! byte-order independent and reject reserved bit patterns. A strategy
//! either returns the whole tensor or an error, never partial data.

use std::fmt::{self, Debug};
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use half::f16;
use serde::{Deserialize, Serialize};
use tessera_tensor::backend::{Fp16Backend, Fp32Backend, Int32Backend, Int4Backend, Int8Backend, TernaryBackend};
use tessera_tensor::{AnyTensor, DType, Int4Data, Shape, Tensor, TensorError, TernaryData};

use crate::error::{FactoryError, Result};

/// Byte order of multi-byte elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Least significant byte first
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl Endianness {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Endianness::Little => "little",
            Endianness::Big => "big",
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endianness {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            other => Err(FactoryError::InvalidConfig(format!(
                "Unknown endianness '{}': expected little or big",
                other
            ))),
        }
    }
}

/// Checks a buffer length against the length implied by `dtype` and `shape`
pub fn validate_length(dtype: DType, shape: &Shape, actual: usize) -> Result<()> {
    let expected = dtype.byte_len_for(shape)?;
    if expected != actual {
        return Err(TensorError::size_mismatch(
            "FACTORY_BYTE_LENGTH_MISMATCH",
            format!(
                "{} tensor of shape {} needs {} bytes but {} were provided",
                dtype, shape, expected, actual
            ),
            dtype.name(),
            shape.to_string(),
            expected,
            actual,
            "Check the shape and dtype against the producer of the buffer",
        )
        .into());
    }
    Ok(())
}

/// Decoder for one dtype
pub trait DecodeStrategy: Debug + Send + Sync {
    /// Dtype this strategy produces
    fn dtype(&self) -> DType;

    /// Whether the strategy can read the given byte order
    fn supports(&self, _endianness: Endianness) -> bool {
        true
    }

    /// Decodes a buffer whose length has been validated
    fn decode(&self, bytes: &[u8], shape: Shape, endianness: Endianness) -> Result<AnyTensor>;
}

fn read_dense<T: Default + Clone>(
    bytes: &[u8],
    width: usize,
    endianness: Endianness,
    little: fn(&[u8], &mut [T]),
    big: fn(&[u8], &mut [T]),
) -> Vec<T> {
    let mut out = vec![T::default(); bytes.len() / width];
    match endianness {
        Endianness::Little => little(bytes, &mut out),
        Endianness::Big => big(bytes, &mut out),
    }
    out
}

/// 32-bit float decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct F32Decoder;

impl DecodeStrategy for F32Decoder {
    fn dtype(&self) -> DType {
        DType::Fp32
    }

    fn decode(&self, bytes: &[u8], shape: Shape, endianness: Endianness) -> Result<AnyTensor> {
        validate_length(DType::Fp32, &shape, bytes.len())?;

        // Aligned little-endian input on a little-endian host is a plain cast
        let native = cfg!(target_endian = "little") && endianness == Endianness::Little;
        let values = match bytemuck::try_cast_slice::<u8, f32>(bytes) {
            Ok(cast) if native => cast.to_vec(),
            _ => read_dense(bytes, 4, endianness, LittleEndian::read_f32_into, BigEndian::read_f32_into),
        };
        Ok(Tensor::<Fp32Backend>::from_vec(values, shape)?.into())
    }
}

/// 16-bit float decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct F16Decoder;

impl DecodeStrategy for F16Decoder {
    fn dtype(&self) -> DType {
        DType::Fp16
    }

    fn decode(&self, bytes: &[u8], shape: Shape, endianness: Endianness) -> Result<AnyTensor> {
        validate_length(DType::Fp16, &shape, bytes.len())?;
        let bits = read_dense(bytes, 2, endianness, LittleEndian::read_u16_into, BigEndian::read_u16_into);
        let values = bits.into_iter().map(f16::from_bits).collect();
        Ok(Tensor::<Fp16Backend>::from_vec(values, shape)?.into())
    }
}

/// 32-bit integer decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct I32Decoder;

impl DecodeStrategy for I32Decoder {
    fn dtype(&self) -> DType {
        DType::Int32
    }

    fn decode(&self, bytes: &[u8], shape: Shape, endianness: Endianness) -> Result<AnyTensor> {
        validate_length(DType::Int32, &shape, bytes.len())?;
        let values = read_dense(bytes, 4, endianness, LittleEndian::read_i32_into, BigEndian::read_i32_into);
        Ok(Tensor::<Int32Backend>::from_vec(values, shape)?.into())
    }
}

/// 8-bit integer decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct I8Decoder;

impl DecodeStrategy for I8Decoder {
    fn dtype(&self) -> DType {
        DType::Int8
    }

    fn decode(&self, bytes: &[u8], shape: Shape, _endianness: Endianness) -> Result<AnyTensor> {
        validate_length(DType::Int8, &shape, bytes.len())?;
        let values = bytemuck::cast_slice::<u8, i8>(bytes).to_vec();
        Ok(Tensor::<Int8Backend>::from_vec(values, shape)?.into())
    }
}

/// Packed 4-bit decoder, even elements in the high nibble
#[derive(Debug, Clone, Copy, Default)]
pub struct Int4Decoder;

impl DecodeStrategy for Int4Decoder {
    fn dtype(&self) -> DType {
        DType::Int4
    }

    fn decode(&self, bytes: &[u8], shape: Shape, _endianness: Endianness) -> Result<AnyTensor> {
        let storage = Int4Data::from_packed(bytes.to_vec(), shape)?;
        Ok(Tensor::<Int4Backend>::from_storage(storage).into())
    }
}

/// Packed ternary decoder, lowest bit pair first
#[derive(Debug, Clone, Copy, Default)]
pub struct TernaryDecoder;

impl DecodeStrategy for TernaryDecoder {
    fn dtype(&self) -> DType {
        DType::Ternary
    }

    fn decode(&self, bytes: &[u8], shape: Shape, _endianness: Endianness) -> Result<AnyTensor> {
        let storage = TernaryData::from_packed(bytes.to_vec(), shape)?;
        Ok(Tensor::<TernaryBackend>::from_storage(storage).into())
    }
}

/// One strategy per built-in dtype
pub fn default_strategies() -> Vec<Box<dyn DecodeStrategy>> {
    vec![
        Box::new(F32Decoder),
        Box::new(F16Decoder),
        Box::new(I32Decoder),
        Box::new(I8Decoder),
        Box::new(Int4Decoder),
        Box::new(TernaryDecoder),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn shape(dims: &[usize]) -> Shape {
        Shape::from_slice(dims).unwrap()
    }

    #[test]
    fn test_f32_both_byte_orders() {
        let mut le = Vec::new();
        let mut be = Vec::new();
        for v in [1.5f32, -2.0, 0.25] {
            le.write_f32::<LittleEndian>(v).unwrap();
            be.write_f32::<BigEndian>(v).unwrap();
        }

        let a = F32Decoder.decode(&le, shape(&[3]), Endianness::Little).unwrap();
        let b = F32Decoder.decode(&be, shape(&[3]), Endianness::Big).unwrap();
        assert_eq!(a.as_fp32().unwrap().to_vec(), vec![1.5, -2.0, 0.25]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_unaligned_f32_input() {
        let mut buf = vec![0u8];
        buf.write_f32::<LittleEndian>(3.0).unwrap();
        let t = F32Decoder.decode(&buf[1..], shape(&[1]), Endianness::Little).unwrap();
        assert_eq!(t.to_f64_vec(), vec![3.0]);
    }

    #[test]
    fn test_f16_and_i32() {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(f16::from_f32(0.5).to_bits()).unwrap();
        let t = F16Decoder.decode(&buf, shape(&[1]), Endianness::Big).unwrap();
        assert_eq!(t.to_f64_vec(), vec![0.5]);

        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(-70000).unwrap();
        buf.write_i32::<LittleEndian>(i32::MAX).unwrap();
        let t = I32Decoder.decode(&buf, shape(&[2]), Endianness::Little).unwrap();
        assert_eq!(t.as_int32().unwrap().to_vec(), vec![-70000, i32::MAX]);
    }

    #[test]
    fn test_i8_reinterprets_bytes() {
        let t = I8Decoder.decode(&[0x7f, 0x80, 0xff], shape(&[3]), Endianness::Big).unwrap();
        assert_eq!(t.as_int8().unwrap().to_vec(), vec![127, -128, -1]);
    }

    #[test]
    fn test_packed_decoders() {
        // (3, -5) -> 0x3 << 4 | 0xB
        let t = Int4Decoder.decode(&[0x3B], shape(&[2]), Endianness::Little).unwrap();
        assert_eq!(t.as_int4().unwrap().to_vec(), vec![3, -5]);

        // -1, 0, 1 -> 00, 01, 10
        let t = TernaryDecoder.decode(&[0b0010_0100], shape(&[3]), Endianness::Little).unwrap();
        assert_eq!(t.as_ternary().unwrap().to_vec(), vec![-1, 0, 1]);

        let err = TernaryDecoder.decode(&[0b1100_0000], shape(&[4]), Endianness::Little).unwrap_err();
        assert!(err.tensor_error().is_some_and(TensorError::is_decode_error));
    }

    #[test]
    fn test_length_checked_before_decoding() {
        let err = F32Decoder.decode(&[0u8; 23], shape(&[2, 3]), Endianness::Little).unwrap_err();
        let tensor_err = err.tensor_error().unwrap();
        assert_eq!(tensor_err.code(), "FACTORY_BYTE_LENGTH_MISMATCH");
    }

    #[test]
    fn test_endianness_parsing() {
        assert_eq!("LE".parse::<Endianness>().unwrap(), Endianness::Little);
        assert_eq!("big".parse::<Endianness>().unwrap(), Endianness::Big);
        assert!("middle".parse::<Endianness>().is_err());
        assert_eq!(Endianness::default(), Endianness::Little);
    }
}
