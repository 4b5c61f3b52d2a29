//! Inspect command: decode one raw buffer and summarize it

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tessera_factory::{Endianness, FactoryRegistry};
use tessera_tensor::DType;
use tracing::{debug, info};

use crate::commands::Command;
use crate::config::Config;
use crate::utils::{describe, format_bytes, format_dims, format_stat, print_output, read_tensor_file, TensorStats};

#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Raw tensor file
    pub file: PathBuf,

    /// Element encoding (fp32, fp16, int32, int8, int4, ternary)
    #[arg(long)]
    pub dtype: DType,

    /// Comma-separated dimensions, e.g. 2,3
    #[arg(long, value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Read multi-byte elements as big-endian
    #[arg(long)]
    pub big_endian: bool,
}

impl InspectCommand {
    fn endianness(&self, config: &Config) -> Endianness {
        if self.big_endian {
            Endianness::Big
        } else {
            config.factory.default_endianness
        }
    }
}

impl Command for InspectCommand {
    fn execute(&self, config: &Config, json_output: bool) -> Result<()> {
        debug!("Executing inspect command: {:?}", self);

        let bytes = read_tensor_file(&self.file, config.factory.max_tensor_bytes)?;
        info!("Read {} from {}", format_bytes(bytes.len() as u64), self.file.display());

        let mut registry = FactoryRegistry::with_config(config.factory.clone());
        registry.initialize();

        let endianness = self.endianness(config);
        let tensor = registry
            .create_tensor_with(self.dtype, &self.shape, &bytes, endianness)
            .with_context(|| {
                format!(
                    "Failed to decode {} as {} with shape {}",
                    self.file.display(),
                    self.dtype,
                    format_dims(&self.shape)
                )
            })?;

        if json_output {
            return print_output(&describe(None, &tensor, config.output.preview_elements), true);
        }

        let stats = TensorStats::of(&tensor);
        let precision = config.output.precision;
        let summary = serde_json::json!({
            "file": self.file.display().to_string(),
            "dtype": tensor.dtype().name(),
            "shape": tensor.shape().to_string(),
            "elements": tensor.volume(),
            "bytes": tensor.byte_len(),
            "endianness": endianness.name(),
            "min": format_stat(stats.min, precision),
            "max": format_stat(stats.max, precision),
            "mean": format_stat(stats.mean, precision),
        });
        print_output(&summary, false)?;

        let preview: Vec<String> = tensor
            .to_f64_vec()
            .into_iter()
            .take(config.output.preview_elements)
            .map(|v| format!("{:.*}", precision, v))
            .collect();
        if !preview.is_empty() {
            let more = if tensor.volume() > preview.len() { ", ..." } else { "" };
            println!("preview: [{}{}]", preview.join(", "), more);
        }
        Ok(())
    }
}
