//! Quantization utilities for converting between float and integer codes
//!
//! Affine quantization maps a float `x` to `round(x / scale) + zero_point`,
//! clamped to the target code range; dequantization inverts it with
//! `(q - zero_point) * scale`. Ternary quantization thresholds instead of
//! scaling. Tensor-level conversions below build on these scalar rules.

use half::f16;
use tracing::debug;

use crate::backend::{Fp16Backend, Fp32Backend, Int4Backend, Int8Backend, TernaryBackend};
use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::packing::{INT4_MAX, INT4_MIN};
use crate::tensor::Tensor;

/// Code range of signed 8-bit quantization
pub const INT8_RANGE: (i32, i32) = (i8::MIN as i32, i8::MAX as i32);
/// Code range of signed 4-bit quantization
pub const INT4_RANGE: (i32, i32) = (INT4_MIN as i32, INT4_MAX as i32);
/// Code range of ternary quantization
pub const TERNARY_RANGE: (i32, i32) = (-1, 1);

/// Scale and zero point of an affine quantization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationParams {
    /// Float step between adjacent codes
    pub scale: f32,
    /// Code representing 0.0
    pub zero_point: i32,
}

impl QuantizationParams {
    /// Creates parameters, rejecting non-positive or non-finite scales
    pub fn new(scale: f32, zero_point: i32) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TensorError::quantization(
                "QUANTIZATION_INVALID_SCALE",
                format!("Scale {} must be positive and finite", scale),
                format!("scale={}, zero_point={}", scale, zero_point),
                "any",
                "Derive the scale from the data range with calculate_quantization_scale",
            ));
        }
        Ok(Self { scale, zero_point })
    }

    /// Parameters with a zero point of 0
    pub fn symmetric(scale: f32) -> Result<Self> {
        Self::new(scale, 0)
    }

    /// Symmetric parameters covering `[min, max]` with `bits`-bit codes
    pub fn from_range(min: f32, max: f32, bits: u8) -> Result<Self> {
        Self::symmetric(calculate_quantization_scale(min, max, bits)?)
    }

    /// Symmetric parameters covering the absolute maximum of `values`
    pub fn from_values(values: &[f32], bits: u8) -> Result<Self> {
        let max_abs = values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| v.abs())
            .fold(0.0f32, f32::max);
        Self::from_range(-max_abs, max_abs, bits)
    }
}

/// Quantizes one value and clamps it into `range`
///
/// NaN maps to the zero point.
pub fn quantize(value: f32, scale: f32, zero_point: i32, range: (i32, i32)) -> i32 {
    let (min, max) = range;
    if value.is_nan() {
        return zero_point.clamp(min, max);
    }
    let code = (value as f64 / scale as f64).round() + zero_point as f64;
    code.clamp(min as f64, max as f64) as i32
}

/// Recovers the float a code stands for
pub fn dequantize(code: i32, scale: f32, zero_point: i32) -> f32 {
    ((code as i64 - zero_point as i64) as f64 * scale as f64) as f32
}

/// Maps values above `threshold` to 1, below `-threshold` to -1, others to 0
pub fn quantize_ternary(value: f32, threshold: f32) -> i8 {
    if value > threshold {
        1
    } else if value < -threshold {
        -1
    } else {
        0
    }
}

/// Symmetric scale `max(|min|, |max|) / (2^(bits-1) - 1)`
///
/// An all-zero range yields 1.0 so the parameters stay valid.
pub fn calculate_quantization_scale(min: f32, max: f32, bits: u8) -> Result<f32> {
    if !(2..=32).contains(&bits) {
        return Err(TensorError::quantization(
            "QUANTIZATION_INVALID_BITS",
            format!("Cannot build a symmetric scale for {}-bit codes", bits),
            format!("bits={}", bits),
            "any",
            "Use a bit width between 2 and 32",
        ));
    }
    if !(min.is_finite() && max.is_finite()) {
        return Err(TensorError::quantization(
            "QUANTIZATION_NON_FINITE_RANGE",
            "Quantization range must be finite",
            format!("min={}, max={}", min, max),
            "any",
            "Filter NaN and infinite values before computing the range",
        ));
    }

    let max_abs = min.abs().max(max.abs()) as f64;
    if max_abs == 0.0 {
        return Ok(1.0);
    }
    let levels = (1u64 << (bits - 1)) as f64 - 1.0;
    Ok((max_abs / levels) as f32)
}

fn clamp_to(value: i32, range: (i32, i32)) -> i8 {
    value.clamp(range.0, range.1) as i8
}

/// Saturating 8-bit addition
pub fn safe_add_int8(a: i8, b: i8) -> i8 {
    a.saturating_add(b)
}

/// Saturating 8-bit subtraction
pub fn safe_sub_int8(a: i8, b: i8) -> i8 {
    a.saturating_sub(b)
}

/// Saturating 8-bit multiplication
pub fn safe_mul_int8(a: i8, b: i8) -> i8 {
    a.saturating_mul(b)
}

/// 4-bit addition clamped to [-8, 7]
pub fn safe_add_int4(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 + b as i32, INT4_RANGE)
}

/// 4-bit subtraction clamped to [-8, 7]
pub fn safe_sub_int4(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 - b as i32, INT4_RANGE)
}

/// 4-bit multiplication clamped to [-8, 7]
pub fn safe_mul_int4(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 * b as i32, INT4_RANGE)
}

/// Ternary addition clamped to {-1, 0, 1}
pub fn safe_add_ternary(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 + b as i32, TERNARY_RANGE)
}

/// Ternary subtraction clamped to {-1, 0, 1}
pub fn safe_sub_ternary(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 - b as i32, TERNARY_RANGE)
}

/// Ternary multiplication clamped to {-1, 0, 1}
pub fn safe_mul_ternary(a: i8, b: i8) -> i8 {
    clamp_to(a as i32 * b as i32, TERNARY_RANGE)
}

fn quantize_codes(t: &Tensor<Fp32Backend>, params: QuantizationParams, range: (i32, i32), target: DType) -> Vec<i8> {
    debug!(
        scale = params.scale,
        zero_point = params.zero_point,
        %target,
        volume = t.volume(),
        "quantizing fp32 tensor"
    );
    t.to_vec()
        .into_iter()
        .map(|v| quantize(v, params.scale, params.zero_point, range) as i8)
        .collect()
}

fn dequantize_codes(codes: Vec<i8>, params: QuantizationParams) -> Vec<f32> {
    codes
        .into_iter()
        .map(|q| dequantize(q as i32, params.scale, params.zero_point))
        .collect()
}

/// Quantizes an FP32 tensor to 8-bit codes
pub fn quantize_float_to_int8(t: &Tensor<Fp32Backend>, params: QuantizationParams) -> Result<Tensor<Int8Backend>> {
    Tensor::from_vec(quantize_codes(t, params, INT8_RANGE, DType::Int8), t.shape().clone())
}

/// Quantizes an FP32 tensor to packed 4-bit codes
pub fn quantize_float_to_int4(t: &Tensor<Fp32Backend>, params: QuantizationParams) -> Result<Tensor<Int4Backend>> {
    Tensor::from_vec(quantize_codes(t, params, INT4_RANGE, DType::Int4), t.shape().clone())
}

/// Thresholds an FP32 tensor to packed ternary codes
pub fn quantize_float_to_ternary(t: &Tensor<Fp32Backend>, threshold: f32) -> Result<Tensor<TernaryBackend>> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(TensorError::quantization(
            "QUANTIZATION_INVALID_THRESHOLD",
            format!("Ternary threshold {} must be non-negative and finite", threshold),
            format!("threshold={}", threshold),
            "ternary",
            "Pass a threshold such as half the mean absolute value",
        ));
    }
    let codes = t.to_vec().into_iter().map(|v| quantize_ternary(v, threshold)).collect();
    Tensor::from_vec(codes, t.shape().clone())
}

/// Dequantizes 8-bit codes to FP32
pub fn dequantize_int8_to_float(t: &Tensor<Int8Backend>, params: QuantizationParams) -> Result<Tensor<Fp32Backend>> {
    Tensor::from_vec(dequantize_codes(t.to_vec(), params), t.shape().clone())
}

/// Dequantizes packed 4-bit codes to FP32
pub fn dequantize_int4_to_float(t: &Tensor<Int4Backend>, params: QuantizationParams) -> Result<Tensor<Fp32Backend>> {
    Tensor::from_vec(dequantize_codes(t.to_vec(), params), t.shape().clone())
}

/// Expands ternary codes to `{-scale, 0, scale}`
pub fn dequantize_ternary_to_float(t: &Tensor<TernaryBackend>, scale: f32) -> Result<Tensor<Fp32Backend>> {
    let params = QuantizationParams::symmetric(scale)?;
    Tensor::from_vec(dequantize_codes(t.to_vec(), params), t.shape().clone())
}

/// Narrows FP32 to FP16 with IEEE round-to-nearest-even
pub fn fp32_to_fp16(t: &Tensor<Fp32Backend>) -> Result<Tensor<Fp16Backend>> {
    Tensor::from_vec(t.to_vec().into_iter().map(f16::from_f32).collect(), t.shape().clone())
}

/// Widens FP16 to FP32 exactly
pub fn fp16_to_fp32(t: &Tensor<Fp16Backend>) -> Result<Tensor<Fp32Backend>> {
    Tensor::from_vec(t.to_vec().into_iter().map(f16::to_f32).collect(), t.shape().clone())
}
