//! Subcommand implementations.

pub mod check;
pub mod components;
pub mod init;
pub mod output;

use anyhow::{Context, Result};
use arch_gate_core::{spec, Spec};
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Loads and assembles the rule document for the project at `path`.
///
/// Spec errors are rendered as diagnostics.
pub fn load_spec(path: &Path, source: &ConfigSource) -> Result<Spec> {
    let Some(config) = source.path() else {
        anyhow::bail!("No arch-gate.toml found. Run `arch-gate init` to create one.");
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", config.display());
    }

    let root = source.project_root(path);
    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("Project directory not found: {}", root.display()))?;

    let spec = spec::load_spec_file(config, &root)
        .map_err(|e| anyhow::anyhow!("{:?}", miette::Report::new(e)))
        .with_context(|| format!("Failed to load {}", config.display()))?;

    tracing::info!(
        "Loaded {} components from {}",
        spec.components().len(),
        config.display()
    );
    Ok(spec)
}
