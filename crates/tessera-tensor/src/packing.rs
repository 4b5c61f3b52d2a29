//! Bit packing for sub-byte encodings
//!
//! # Int4 layout
//!
//! Element `i` lives in byte `i / 2`. Even indices occupy the high nibble,
//! odd indices the low nibble. Nibbles are two's complement: a nibble `n >= 8`
//! decodes to `n - 16`.
//!
//! ```text
//! byte:   [ e0 e0 e0 e0 | e1 e1 e1 e1 ]
//! bit:      7  6  5  4    3  2  1  0
//! ```
//!
//! # Ternary layout
//!
//! Element `i` lives in byte `i / 4` at bit offset `(i % 4) * 2`, counted from
//! the least significant bit. Codes: `00 -> -1`, `01 -> 0`, `10 -> 1`.
//! The pattern `11` is reserved and rejected on decode.
//!
//! ```text
//! byte:   [ e3 e3 | e2 e2 | e1 e1 | e0 e0 ]
//! bit:      7  6    5  4    3  2    1  0
//! ```

use crate::error::{Result, TensorError};

/// Smallest Int4 value
pub const INT4_MIN: i8 = -8;
/// Largest Int4 value
pub const INT4_MAX: i8 = 7;
/// Int4 values per byte
pub const INT4_VALUES_PER_BYTE: usize = 2;
/// Ternary values per byte
pub const TERNARY_VALUES_PER_BYTE: usize = 4;

const TERNARY_NEG: u8 = 0b00;
const TERNARY_ZERO: u8 = 0b01;
const TERNARY_POS: u8 = 0b10;
const TERNARY_RESERVED: u8 = 0b11;

/// Bytes needed for `count` Int4 values
pub fn int4_packed_len(count: usize) -> usize {
    count.div_ceil(INT4_VALUES_PER_BYTE)
}

/// Bytes needed for `count` ternary values
pub fn ternary_packed_len(count: usize) -> usize {
    count.div_ceil(TERNARY_VALUES_PER_BYTE)
}

/// Clamps to [-8, 7] and encodes as a 4-bit two's complement nibble
pub fn encode_int4_nibble(value: i8) -> u8 {
    let clamped = value.clamp(INT4_MIN, INT4_MAX);
    if clamped < 0 {
        (clamped as i16 + 16) as u8
    } else {
        clamped as u8
    }
}

/// Sign-extends the low four bits of `nibble`
pub fn decode_int4_nibble(nibble: u8) -> i8 {
    let nibble = nibble & 0x0F;
    if nibble >= 8 {
        nibble as i8 - 16
    } else {
        nibble as i8
    }
}

fn int4_shift(index: usize) -> u32 {
    if index % 2 == 0 {
        4
    } else {
        0
    }
}

/// Writes element `index` into `bytes`, leaving the sibling nibble untouched
///
/// Panics if `index / 2` is outside `bytes`.
pub fn write_int4(bytes: &mut [u8], index: usize, value: i8) {
    let shift = int4_shift(index);
    let byte = &mut bytes[index / INT4_VALUES_PER_BYTE];
    *byte &= !(0x0F << shift);
    *byte |= encode_int4_nibble(value) << shift;
}

/// Reads element `index` from `bytes`
///
/// Panics if `index / 2` is outside `bytes`.
pub fn read_int4(bytes: &[u8], index: usize) -> i8 {
    decode_int4_nibble(bytes[index / INT4_VALUES_PER_BYTE] >> int4_shift(index))
}

/// Packs values (clamped to [-8, 7]) two per byte
pub fn pack_int4(values: &[i8]) -> Vec<u8> {
    let mut bytes = vec![0u8; int4_packed_len(values.len())];
    for (i, &value) in values.iter().enumerate() {
        write_int4(&mut bytes, i, value);
    }
    bytes
}

/// Unpacks `count` Int4 values
pub fn unpack_int4(bytes: &[u8], count: usize) -> Result<Vec<i8>> {
    check_packed_len("int4", bytes.len(), int4_packed_len(count), count)?;
    Ok((0..count).map(|i| read_int4(bytes, i)).collect())
}

/// Encodes a value as a 2-bit ternary code, clamping to {-1, 0, 1}
pub fn encode_ternary(value: i8) -> u8 {
    match value.signum() {
        -1 => TERNARY_NEG,
        0 => TERNARY_ZERO,
        _ => TERNARY_POS,
    }
}

/// Decodes a 2-bit ternary code; `position` is only used for the error
pub fn decode_ternary(code: u8, position: usize) -> Result<i8> {
    match code & 0b11 {
        TERNARY_NEG => Ok(-1),
        TERNARY_ZERO => Ok(0),
        TERNARY_POS => Ok(1),
        _ => Err(TensorError::decode(
            "TERNARY_RESERVED_PATTERN",
            format!("Ternary element {} holds the reserved bit pattern 0b11", position),
            "ternary",
            position,
            "Ternary codes are 00 (-1), 01 (0) and 10 (1); the source buffer is corrupt or not ternary",
        )),
    }
}

fn ternary_shift(index: usize) -> u32 {
    ((index % TERNARY_VALUES_PER_BYTE) * 2) as u32
}

/// Raw 2-bit code of element `index`
pub fn ternary_code(bytes: &[u8], index: usize) -> u8 {
    (bytes[index / TERNARY_VALUES_PER_BYTE] >> ternary_shift(index)) & 0b11
}

/// Writes element `index` into `bytes`, leaving the other three fields untouched
pub fn write_ternary(bytes: &mut [u8], index: usize, value: i8) {
    let shift = ternary_shift(index);
    let byte = &mut bytes[index / TERNARY_VALUES_PER_BYTE];
    *byte &= !(0b11 << shift);
    *byte |= encode_ternary(value) << shift;
}

/// Reads element `index`, rejecting the reserved pattern
pub fn read_ternary(bytes: &[u8], index: usize) -> Result<i8> {
    decode_ternary(ternary_code(bytes, index), index)
}

/// Packs values (clamped to {-1, 0, 1}) four per byte
///
/// Unused trailing fields of the last byte are zero.
pub fn pack_ternary(values: &[i8]) -> Vec<u8> {
    let mut bytes = vec![0u8; ternary_packed_len(values.len())];
    for (i, &value) in values.iter().enumerate() {
        write_ternary(&mut bytes, i, value);
    }
    bytes
}

/// Unpacks `count` ternary values, failing on the first reserved pattern
pub fn unpack_ternary(bytes: &[u8], count: usize) -> Result<Vec<i8>> {
    check_packed_len("ternary", bytes.len(), ternary_packed_len(count), count)?;
    (0..count).map(|i| read_ternary(bytes, i)).collect()
}

/// Checks every logical field for the reserved pattern without allocating
pub fn validate_ternary(bytes: &[u8], count: usize) -> Result<()> {
    check_packed_len("ternary", bytes.len(), ternary_packed_len(count), count)?;
    for i in 0..count {
        if ternary_code(bytes, i) == TERNARY_RESERVED {
            decode_ternary(TERNARY_RESERVED, i)?;
        }
    }
    Ok(())
}

fn check_packed_len(dtype: &str, actual: usize, expected: usize, count: usize) -> Result<()> {
    if actual != expected {
        return Err(TensorError::size_mismatch(
            "PACKED_LENGTH_MISMATCH",
            format!("{} values of {} need {} bytes, got {}", count, dtype, expected, actual),
            dtype,
            format!("[{}]", count),
            expected,
            actual,
            "Provide exactly ceil(count / values_per_byte) bytes",
        ));
    }
    Ok(())
}
