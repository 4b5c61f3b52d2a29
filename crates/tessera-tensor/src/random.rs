//! Random tensor initializers
//!
//! Samples are drawn in `f64` from a caller-supplied [`Rng`] and narrowed
//! through the precision's conversion, so integer tensors receive rounded,
//! clamped samples. Seeding the generator makes the output reproducible.

use std::f64::consts::PI;

use rand::Rng;

use crate::backend::ComputeBackend;
use crate::error::{Result, TensorError};
use crate::precision::Precision;
use crate::shape::Shape;
use crate::tensor::Tensor;

impl<B: ComputeBackend> Tensor<B> {
    /// Uniform samples from `[0, 1)`
    pub fn random<R: Rng>(shape: Shape, rng: &mut R) -> Result<Self> {
        Self::random_uniform(shape, 0.0, 1.0, rng)
    }

    /// Uniform samples from `[low, high)`
    pub fn random_uniform<R: Rng>(shape: Shape, low: f64, high: f64, rng: &mut R) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(TensorError::invalid_dimensions(
                "RANDOM_INVALID_RANGE",
                format!("Uniform range [{}, {}) is empty or not finite", low, high),
                "finite low < high",
                format!("[{}, {})", low, high),
                "random_uniform",
                "Pass finite bounds with low < high",
            ));
        }

        let values = (0..shape.volume())
            .map(|_| <B::Precision as Precision>::from_f64(rng.gen_range(low..high)))
            .collect();
        Self::from_vec(values, shape)
    }

    /// Normal samples via the Box–Muller transform
    pub fn random_normal<R: Rng>(shape: Shape, mean: f64, std_dev: f64, rng: &mut R) -> Result<Self> {
        if !(mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0) {
            return Err(TensorError::invalid_dimensions(
                "RANDOM_INVALID_DISTRIBUTION",
                format!("Normal distribution N({}, {}) is invalid", mean, std_dev),
                "finite mean and non-negative finite std_dev",
                format!("mean={}, std_dev={}", mean, std_dev),
                "random_normal",
                "Pass a finite mean and a non-negative standard deviation",
            ));
        }

        let values = (0..shape.volume())
            .map(|_| {
                // u1 in (0, 1] keeps ln finite
                let u1: f64 = 1.0 - rng.gen::<f64>();
                let u2: f64 = rng.gen();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
                <B::Precision as Precision>::from_f64(mean + std_dev * z)
            })
            .collect();
        Self::from_vec(values, shape)
    }
}
