//! Batch command: decode every tensor listed in a TOML manifest
//!
//! ```toml
//! [[tensor]]
//! name = "weights"
//! dtype = "int4"
//! shape = [4, 8]
//! file = "weights.bin"
//! endianness = "little"   # optional
//! ```
//!
//! Relative `file` paths resolve against the manifest's directory.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tessera_factory::{Endianness, FactoryConfig, FactoryError, FactoryRegistry, TensorSpec};
use tessera_tensor::DType;
use tracing::{debug, info};

use crate::commands::Command;
use crate::config::Config;
use crate::utils::{describe, format_dims, format_stat, print_output, print_success, read_tensor_file, TensorStats};

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Manifest listing the tensors to decode
    pub manifest: PathBuf,
}

/// Parsed manifest
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Entries in file order
    #[serde(rename = "tensor", default)]
    pub tensors: Vec<ManifestEntry>,
}

/// One `[[tensor]]` table
#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    /// Name in the report; defaults to `tensor_<index>`
    pub name: Option<String>,
    /// Element encoding
    pub dtype: DType,
    /// Dimensions
    pub shape: Vec<usize>,
    /// Raw data file
    pub file: PathBuf,
    /// Byte order override
    pub endianness: Option<Endianness>,
}

impl Manifest {
    /// Reads and parses a manifest
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }

    /// Loads every referenced file into a decode request
    ///
    /// The entry count and each file size are checked against `limits`
    /// before any data is read.
    pub fn into_specs(self, base_dir: &Path, limits: &FactoryConfig) -> Result<Vec<TensorSpec>> {
        if self.tensors.len() > limits.max_batch_entries {
            return Err(FactoryError::BatchTooLarge {
                entries: self.tensors.len(),
                limit: limits.max_batch_entries,
            }
            .into());
        }

        self.tensors
            .into_iter()
            .map(|entry| {
                let path = base_dir.join(&entry.file);
                let bytes = read_tensor_file(&path, limits.max_tensor_bytes)?;
                Ok(TensorSpec {
                    dtype: entry.dtype,
                    shape: entry.shape,
                    bytes,
                    name: entry.name,
                    endianness: entry.endianness,
                })
            })
            .collect()
    }
}

#[derive(Tabled)]
struct TensorRow {
    name: String,
    dtype: String,
    shape: String,
    bytes: usize,
    min: String,
    max: String,
    mean: String,
}

impl Command for BatchCommand {
    fn execute(&self, config: &Config, json_output: bool) -> Result<()> {
        debug!("Executing batch command: {:?}", self);

        let manifest = Manifest::load(&self.manifest)?;
        let base_dir = self.manifest.parent().unwrap_or_else(|| Path::new("."));
        let specs = manifest.into_specs(base_dir, &config.factory)?;
        info!("Decoding {} tensors from {}", specs.len(), self.manifest.display());

        let mut registry = FactoryRegistry::with_config(config.factory.clone());
        registry.initialize();
        let tensors = registry
            .create_batch(&specs)
            .with_context(|| format!("Failed to decode batch {}", self.manifest.display()))?;

        let mut names: Vec<&String> = tensors.keys().collect();
        names.sort();

        if json_output {
            let entries: Vec<_> = names
                .iter()
                .map(|name| describe(Some(name.as_str()), &tensors[*name], config.output.preview_elements))
                .collect();
            return print_output(&serde_json::Value::Array(entries), true);
        }

        let precision = config.output.precision;
        let rows: Vec<TensorRow> = names
            .iter()
            .map(|name| {
                let tensor = &tensors[*name];
                let stats = TensorStats::of(tensor);
                TensorRow {
                    name: (*name).clone(),
                    dtype: tensor.dtype().to_string(),
                    shape: format_dims(tensor.shape().dims()),
                    bytes: tensor.byte_len(),
                    min: format_stat(stats.min, precision),
                    max: format_stat(stats.max, precision),
                    mean: format_stat(stats.mean, precision),
                }
            })
            .collect();

        let table = Table::new(rows).with(Style::modern()).to_string();
        println!("{}", table);
        print_success(&format!("Decoded {} tensors", tensors.len()));
        Ok(())
    }
}
