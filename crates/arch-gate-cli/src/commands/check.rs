//! Check command implementation.

use anyhow::{Context, Result};
use arch_gate_core::{PlainRenderer, WalkProjectFilesResolver};
use arch_gate_deepscan::{DeepScan, JsonUsageScanner};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Arguments of the check command.
pub struct CheckArgs {
    /// Project directory.
    pub path: PathBuf,
    /// Usage trees file.
    pub usages: PathBuf,
    /// Output format.
    pub format: OutputFormat,
    /// Pool width override.
    pub workers: Option<NonZeroUsize>,
    /// Whether `.gitignore` is honored when indexing files.
    pub respect_gitignore: bool,
    /// Resolved rule document.
    pub source: ConfigSource,
}

/// Runs the check command.
pub fn run(args: &CheckArgs) -> Result<()> {
    let spec = super::load_spec(&args.path, &args.source)?;

    let scanner = JsonUsageScanner::from_file(&args.usages, spec.root())
        .with_context(|| format!("Failed to load usages: {}", args.usages.display()))?;
    tracing::info!(
        "Loaded {} usages from {}",
        scanner.len(),
        args.usages.display()
    );

    let mut engine = DeepScan::new(
        Arc::new(WalkProjectFilesResolver::new().respect_gitignore(args.respect_gitignore)),
        Arc::new(PlainRenderer::new()),
        Arc::new(scanner),
    );
    if let Some(workers) = args.workers {
        engine = engine.with_workers(workers);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let spec = Arc::new(spec);
    let mut result = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping deep scan");
                on_interrupt.cancel();
            }
        });

        engine.check(Arc::clone(&spec), cancel).await
    })?;

    result.sort();
    super::output::print(&result, args.format)?;

    if result.has_warnings() {
        std::process::exit(1);
    }

    Ok(())
}
