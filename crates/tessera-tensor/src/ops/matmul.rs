//! Matrix multiplication kernels
//!
//! Every kernel writes each output element exactly once. With the `parallel`
//! feature, output rows are handed to rayon workers; there is no shared
//! accumulator, so results do not depend on scheduling.

use std::ops::{Add, Mul};

use num_traits::Zero;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

/// Below this many multiply-adds the sequential loop is used
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 64 * 64 * 64;

/// Dimensions of a rank-2 product `[m, k] x [k, n]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatMulDims {
    /// Rows of the left operand
    pub m: usize,
    /// Shared inner dimension
    pub k: usize,
    /// Columns of the right operand
    pub n: usize,
}

impl MatMulDims {
    /// Creates dimensions from `(m, k, n)`
    pub fn new(m: usize, k: usize, n: usize) -> Self {
        Self { m, k, n }
    }

    fn work(&self) -> usize {
        self.m.saturating_mul(self.k).saturating_mul(self.n)
    }
}

/// General matrix multiplication
pub struct Gemm;

impl Gemm {
    /// Row-major product accumulating in `A` and storing through `store`
    ///
    /// Float kernels use `A = T`; integer kernels pick a wider accumulator
    /// and saturate in `store`.
    pub fn compute<T, A, W, S>(a: &[T], b: &[T], dims: MatMulDims, widen: W, store: S) -> Vec<T>
    where
        T: Copy + Default + Send + Sync,
        A: Copy + Zero + Add<Output = A> + Mul<Output = A>,
        W: Fn(T) -> A + Sync,
        S: Fn(A) -> T + Sync,
    {
        let MatMulDims { k, n, .. } = dims;
        let row = |i: usize, out: &mut [T]| {
            let a_row = &a[i * k..(i + 1) * k];
            for (j, o) in out.iter_mut().enumerate() {
                let mut acc = A::zero();
                for (l, &x) in a_row.iter().enumerate() {
                    acc = acc + widen(x) * widen(b[l * n + j]);
                }
                *o = store(acc);
            }
        };

        let mut output = vec![T::default(); dims.m * n];

        #[cfg(feature = "parallel")]
        {
            if dims.work() >= PARALLEL_THRESHOLD {
                output
                    .par_chunks_mut(n)
                    .enumerate()
                    .for_each(|(i, out)| row(i, out));
                return output;
            }
        }

        trace!(m = dims.m, k, n, work = dims.work(), "sequential matmul");
        for (i, out) in output.chunks_mut(n).enumerate() {
            row(i, out);
        }
        output
    }

    /// Native single precision product
    pub fn compute_f32(a: &[f32], b: &[f32], dims: MatMulDims) -> Vec<f32> {
        Self::compute(a, b, dims, |x| x, |acc| acc)
    }

    /// Double precision product, used by the generic backend
    pub fn compute_f64(a: &[f64], b: &[f64], dims: MatMulDims) -> Vec<f64> {
        Self::compute(a, b, dims, |x| x, |acc| acc)
    }
}

/// Batched products over rank-4 operands
pub struct BatchedMatMul;

impl BatchedMatMul {
    /// `[B, C, M, K] x [B, C, K, N] -> [B, C, M, N]`
    pub fn compute_f32(a: &[f32], b: &[f32], batches: usize, dims: MatMulDims) -> Vec<f32> {
        let a_size = dims.m * dims.k;
        let b_size = dims.k * dims.n;
        let mut output = Vec::with_capacity(batches * dims.m * dims.n);

        for idx in 0..batches {
            let a_mat = &a[idx * a_size..(idx + 1) * a_size];
            let b_mat = &b[idx * b_size..(idx + 1) * b_size];
            output.extend(Gemm::compute_f32(a_mat, b_mat, dims));
        }
        output
    }

    /// `[B, Cin, H, W] x [Cin, Cout] -> [B, Cout, H, W]`
    ///
    /// Each spatial position is an independent `Cin`-vector mixed by the
    /// weight matrix: `out[b, co, p] = sum_ci x[b, ci, p] * w[ci, co]`.
    pub fn channel_mix_f32(
        input: &[f32],
        weights: &[f32],
        batch: usize,
        channels_in: usize,
        channels_out: usize,
        spatial: usize,
    ) -> Vec<f32> {
        let mut output = vec![0.0f32; batch * channels_out * spatial];
        let in_size = channels_in * spatial;
        let out_size = channels_out * spatial;

        for bi in 0..batch {
            let x = &input[bi * in_size..(bi + 1) * in_size];
            let out = &mut output[bi * out_size..(bi + 1) * out_size];
            for co in 0..channels_out {
                for p in 0..spatial {
                    let mut acc = 0.0f32;
                    for ci in 0..channels_in {
                        acc += x[ci * spatial + p] * weights[ci * channels_out + co];
                    }
                    out[co * spatial + p] = acc;
                }
            }
        }
        output
    }
}
