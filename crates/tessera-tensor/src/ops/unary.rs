//! Activation kernels

use num_traits::Float;

use crate::error::Result;
use crate::shape::Shape;
use crate::validation::TensorValidator;

/// Pointwise activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `max(0, x)`
    Relu,
    /// `1 / (1 + e^-x)`
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
}

impl Activation {
    /// Operation name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
        }
    }

    /// Applies the activation to one value
    pub fn apply<T: Float>(&self, x: T) -> T {
        match self {
            Activation::Relu => {
                if x > T::zero() {
                    x
                } else {
                    T::zero()
                }
            }
            Activation::Sigmoid => T::one() / (T::one() + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Applies the activation to a slice
    pub fn map<T: Float>(&self, input: &[T]) -> Vec<T> {
        input.iter().map(|&x| self.apply(x)).collect()
    }

    /// Applies the activation to quantized codes
    ///
    /// Codes are divided by `scale` into the normalized domain, activated,
    /// multiplied back and narrowed by `narrow`. The round trip is lossy.
    pub fn map_rescaled<V, W, N>(&self, input: &[V], scale: f64, widen: W, narrow: N) -> Vec<V>
    where
        V: Copy,
        W: Fn(V) -> f64,
        N: Fn(f64) -> V,
    {
        input
            .iter()
            .map(|&v| narrow(self.apply(widen(v) / scale) * scale))
            .collect()
    }
}

/// Numerically stable softmax over one axis of a rank-1 or rank-2 tensor
pub struct Softmax;

impl Softmax {
    /// Computes softmax of `input` (laid out as `shape`) along `dim`
    pub fn apply<T: Float>(input: &[T], shape: &Shape, dim: usize) -> Result<Vec<T>> {
        let layout = TensorValidator::validate_softmax(shape, dim)?;
        let mut output = vec![T::zero(); input.len()];

        for g in 0..layout.groups {
            let start = layout.start(g);
            let index = |j: usize| start + j * layout.stride;

            let max = (0..layout.len)
                .map(|j| input[index(j)])
                .fold(T::neg_infinity(), |a, b| a.max(b));

            let mut sum = T::zero();
            for j in 0..layout.len {
                let e = (input[index(j)] - max).exp();
                output[index(j)] = e;
                sum = sum + e;
            }

            let inv = T::one() / sum;
            for j in 0..layout.len {
                output[index(j)] = output[index(j)] * inv;
            }
        }
        Ok(output)
    }

    /// Softmax over quantized codes through the rescale pattern
    pub fn apply_rescaled<V, W, N>(
        input: &[V],
        shape: &Shape,
        dim: usize,
        scale: f64,
        widen: W,
        narrow: N,
    ) -> Result<Vec<V>>
    where
        V: Copy,
        W: Fn(V) -> f64,
        N: Fn(f64) -> V,
    {
        let normalized: Vec<f64> = input.iter().map(|&v| widen(v) / scale).collect();
        let probabilities = Self::apply(&normalized, shape, dim)?;
        Ok(probabilities.into_iter().map(|p| narrow(p * scale)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_activations() {
        assert_eq!(Activation::Relu.map(&[-1.0f32, 0.0, 2.5]), vec![0.0, 0.0, 2.5]);
        assert_relative_eq!(Activation::Sigmoid.apply(0.0f64), 0.5);
        assert_relative_eq!(Activation::Tanh.apply(1.0f64), 1.0f64.tanh());
    }

    #[test]
    fn test_softmax_rows_and_columns() {
        let shape = Shape::matrix(2, 2).unwrap();
        let input = [1.0f64, 2.0, 3.0, 4.0];

        let rows = Softmax::apply(&input, &shape, 1).unwrap();
        assert_relative_eq!(rows[0] + rows[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[2] + rows[3], 1.0, epsilon = 1e-12);
        assert_relative_eq!(rows[0], rows[2], epsilon = 1e-12);

        let cols = Softmax::apply(&input, &shape, 0).unwrap();
        assert_relative_eq!(cols[0] + cols[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cols[1] + cols[3], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_large_inputs_stay_finite() {
        let shape = Shape::vector(3).unwrap();
        let out = Softmax::apply(&[1000.0f32, 1000.0, 1000.0], &shape, 0).unwrap();
        for p in out {
            assert_relative_eq!(p, 1.0 / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rescaled_sigmoid() {
        let narrow = |x: f64| x.round().clamp(-128.0, 127.0) as i8;
        let out = Activation::Sigmoid.map_rescaled(&[0i8, 127, -127], 127.0, |v| v as f64, narrow);
        // sigmoid(0) * 127 = 63.5, sigmoid(1) * 127 = 92.8, sigmoid(-1) * 127 = 34.2
        assert_eq!(out, vec![64, 93, 34]);
    }
}
