//! Command implementations for Tessera CLI

pub mod batch;
pub mod inspect;

use anyhow::Result;

/// Trait for CLI command execution
pub trait Command {
    /// Execute the command
    fn execute(&self, config: &crate::config::Config, json_output: bool) -> Result<()>;
}
