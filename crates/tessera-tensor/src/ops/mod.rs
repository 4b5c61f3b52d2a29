//! Tensor kernels over flat value slices
//!
//! Kernels here know nothing about backends or storage. Backends read values
//! out of storage, call a kernel and wrap the result.

pub mod binary;
pub mod matmul;
pub mod reduce;
pub mod shape;
pub mod unary;

pub use binary::{Elementwise, SaturatingInt};
pub use matmul::{BatchedMatMul, Gemm, MatMulDims};
pub use reduce::{Mean, MinMax, Sum};
pub use shape::ShapeOps;
pub use unary::{Activation, Softmax};

use std::fmt;

/// Elementwise arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
}

impl ArithOp {
    /// Operation name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        }
    }

    /// Applies the operator with IEEE semantics
    pub fn apply_float<T: num_traits::Float>(&self, a: T, b: T) -> T {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }

    /// Applies the operator in `i64`; division by zero yields 0
    pub fn apply_int(&self, a: i64, b: i64) -> i64 {
        match self {
            ArithOp::Add => a.saturating_add(b),
            ArithOp::Sub => a.saturating_sub(b),
            ArithOp::Mul => a.saturating_mul(b),
            ArithOp::Div => {
                if b == 0 {
                    0
                } else {
                    a.saturating_div(b)
                }
            }
        }
    }

    /// Applies the operator in `f64` for integer results; division by zero yields 0
    pub fn apply_int_f64(&self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Div if b == 0.0 => 0.0,
            _ => self.apply_float(a, b),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar operand for tensor/scalar arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Integer operand
    Int(i32),
    /// Single precision operand
    Float(f32),
    /// Double precision operand
    Double(f64),
}

impl Scalar {
    /// Widens the operand to `f64`
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v as f64,
            Scalar::Double(v) => v,
        }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

/// Side of the operator the scalar sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarPosition {
    /// `tensor op scalar`
    #[default]
    Rhs,
    /// `scalar op tensor`
    Lhs,
}

impl ScalarPosition {
    /// Orders a tensor element and the scalar as operator operands
    pub fn order<T>(&self, element: T, scalar: T) -> (T, T) {
        match self {
            ScalarPosition::Rhs => (element, scalar),
            ScalarPosition::Lhs => (scalar, element),
        }
    }
}
