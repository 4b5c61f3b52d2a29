//! Utility functions for Tessera CLI

use anyhow::{Context, Result};
use console::style;
use serde_json::{json, Value};
use std::path::Path;
use tessera_factory::FactoryError;
use tessera_tensor::ops::{Mean, MinMax};
use tessera_tensor::AnyTensor;

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Reads a raw tensor file, refusing files larger than `limit` before reading
pub fn read_tensor_file(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read tensor file: {}", path.display()))?;
    let bytes = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if bytes > limit {
        return Err(FactoryError::InputTooLarge { bytes, limit })
            .with_context(|| format!("Refusing to read tensor file: {}", path.display()));
    }
    std::fs::read(path).with_context(|| format!("Failed to read tensor file: {}", path.display()))
}

/// Shape as a comma-separated list, e.g. `2,3`
pub fn format_dims(dims: &[usize]) -> String {
    dims.iter().map(usize::to_string).collect::<Vec<_>>().join(",")
}

/// Summary statistics of a decoded tensor
#[derive(Debug, Clone, PartialEq)]
pub struct TensorStats {
    /// Smallest non-NaN element
    pub min: Option<f64>,
    /// Largest non-NaN element
    pub max: Option<f64>,
    /// Arithmetic mean
    pub mean: Option<f64>,
}

impl TensorStats {
    /// Computes statistics over every element widened to `f64`
    pub fn of(tensor: &AnyTensor) -> Self {
        let values = tensor.to_f64_vec();
        let range = MinMax::reduce_all(values.iter().copied());
        Self {
            min: range.map(|(lo, _)| lo),
            max: range.map(|(_, hi)| hi),
            mean: Mean::reduce_all(values),
        }
    }
}

/// JSON description of a tensor
pub fn describe(name: Option<&str>, tensor: &AnyTensor, preview: usize) -> Value {
    let stats = TensorStats::of(tensor);
    let head: Vec<f64> = tensor.to_f64_vec().into_iter().take(preview).collect();
    let mut value = json!({
        "dtype": tensor.dtype().name(),
        "shape": tensor.shape().dims(),
        "elements": tensor.volume(),
        "bytes": tensor.byte_len(),
        "backend": tensor.backend_name(),
        "min": stats.min,
        "max": stats.max,
        "mean": stats.mean,
        "preview": head,
    });
    if let (Some(name), Value::Object(map)) = (name, &mut value) {
        map.insert("name".to_string(), Value::String(name.to_string()));
    }
    value
}

/// Format an optional statistic with fixed precision
pub fn format_stat(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// Print formatted output (JSON or human-readable)
pub fn print_output(data: &Value, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        print_human_readable(data);
    }
    Ok(())
}

/// Print human-readable output
fn print_human_readable(data: &Value) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                println!("{}: {}", style(key).bold(), format_value(value));
            }
        }
        _ => println!("{}", format_value(data)),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

/// Print success message with styling
pub fn print_success(message: &str) {
    println!("{} {}", style("Success:").green().bold(), message);
}
