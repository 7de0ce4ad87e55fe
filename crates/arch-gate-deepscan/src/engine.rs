//! Deep-scan engine.
//!
//! For every component with deep scan enabled, asks the [`UsageScanner`]
//! for usage trees of each of its packages and checks every concrete type
//! injected into a gate against the allowed imports of the component that
//! declares the gate.
//!
//! Components are checked in parallel on a bounded pool; each component's
//! packages are scanned sequentially.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arch_gate_core::paths::slash_path;
use arch_gate_core::{
    CheckResult, CodeReference, Component, ComponentName, DeepscanWarning, FileComponentIndex,
    FilesError, ProjectFilesResolver, SourcePosition, SourceRenderer, Spec, WarningDependency,
    WarningGate, WarningTarget,
};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collector::{Progress, ViolationCollector};
use crate::usage::{Criteria, CriteriaError, Gate, Implementation, ScanError, Usage, UsageScanner};

/// Errors that abort a deep-scan run.
#[derive(Debug, thiserror::Error)]
pub enum DeepScanError {
    /// Project files could not be enumerated.
    #[error("failed to resolve project files: {0}")]
    Files(#[from] FilesError),

    /// Scan criteria for a package were malformed.
    #[error("component '{component}' check failed: bad criteria for '{path}': {source}")]
    Criteria {
        /// Component being checked.
        component: ComponentName,
        /// Package directory.
        path: PathBuf,
        /// Why the criteria were rejected.
        source: CriteriaError,
    },

    /// The scanner failed on a package.
    #[error("component '{component}' check failed: failed to scan '{path}': {source}")]
    Scan {
        /// Component being checked.
        component: ComponentName,
        /// Package directory.
        path: PathBuf,
        /// Scanner error.
        source: ScanError,
    },

    /// The run was cancelled before every component was dispatched.
    #[error("deep scan cancelled")]
    Cancelled,

    /// A worker task panicked.
    #[error("deep scan worker failed: {0}")]
    Join(#[from] JoinError),
}

/// Pool width for a machine with `cpus` logical CPUs.
///
/// Leaves headroom for other work: 1 → 1, 2 → 2, 3 → 2, 4 → 3, 5 → 4,
/// 6 → 4, 8 → 6.
#[must_use]
pub fn workers_count(cpus: usize) -> usize {
    match cpus {
        0 | 1 => 1,
        2 => 2,
        n => (n * 4 / 5).max(2),
    }
}

/// Deep-scan checker.
///
/// Immutable and shareable; every [`DeepScan::check`] call builds its own
/// run state.
#[derive(Clone)]
pub struct DeepScan {
    files: Arc<dyn ProjectFilesResolver>,
    renderer: Arc<dyn SourceRenderer>,
    scanner: Arc<dyn UsageScanner>,
    workers: Option<NonZeroUsize>,
}

impl std::fmt::Debug for DeepScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepScan")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl DeepScan {
    /// Creates a checker from its collaborators.
    #[must_use]
    pub fn new(
        files: Arc<dyn ProjectFilesResolver>,
        renderer: Arc<dyn SourceRenderer>,
        scanner: Arc<dyn UsageScanner>,
    ) -> Self {
        Self {
            files,
            renderer,
            scanner,
            workers: None,
        }
    }

    /// Overrides the CPU-based pool width.
    #[must_use]
    pub fn with_workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Effective pool width: the configured or CPU-based width, capped by
    /// the scanner's supported concurrency.
    #[must_use]
    pub fn width(&self) -> usize {
        let width = self.workers.map_or_else(
            || {
                let cpus = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
                workers_count(cpus)
            },
            NonZeroUsize::get,
        );
        match self.scanner.max_concurrency() {
            Some(max) => width.min(max.get()),
            None => width,
        }
    }

    /// Checks every deep-scan-enabled component of `spec`.
    ///
    /// Warnings are data; only configuration and scanner failures are
    /// errors. The first failing component aborts the run and its partial
    /// warnings are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if project files cannot be enumerated, a scan fails,
    /// or `cancel` fires before every component was dispatched.
    pub async fn check(
        &self,
        spec: Arc<Spec>,
        cancel: CancellationToken,
    ) -> Result<CheckResult, DeepScanError> {
        let width = self.width();
        info!("Deep scan ({} workers)", width);

        let files = Arc::clone(&self.files);
        let index_spec = Arc::clone(&spec);
        let index = tokio::task::spawn_blocking(move || {
            FileComponentIndex::build(files.as_ref(), &index_spec)
        })
        .await??;

        let targets: Vec<ComponentName> = spec
            .components()
            .values()
            .filter(|c| c.deep_scan())
            .map(|c| c.name().clone())
            .collect();
        let components_checked = targets.len();

        let session = Arc::new(Session {
            spec,
            index,
            collector: ViolationCollector::new(),
            progress: Progress::new(targets.len()),
            scanner: Arc::clone(&self.scanner),
            renderer: Arc::clone(&self.renderer),
        });

        let packages_scanned = dispatch(&session, targets, width, &cancel).await?;
        if session.collector.is_empty() {
            debug!("No injection crosses a component boundary");
        }

        let result = CheckResult {
            deepscan_warnings: session.collector.take(),
            components_checked,
            packages_scanned,
        };
        info!(
            "Deep scan done: {} components, {} packages, {} warnings",
            result.components_checked,
            result.packages_scanned,
            result.deepscan_warnings.len()
        );
        Ok(result)
    }
}

/// Runs one blocking task per component, at most `width` at a time.
///
/// A permit is taken before each dispatch and released when the task ends.
/// On the first failure, or on cancellation, pending tasks are aborted and
/// in-flight ones awaited.
async fn dispatch(
    session: &Arc<Session>,
    targets: Vec<ComponentName>,
    width: usize,
    cancel: &CancellationToken,
) -> Result<usize, DeepScanError> {
    let semaphore = Arc::new(Semaphore::new(width.max(1)));
    let mut tasks: JoinSet<Result<usize, DeepScanError>> = JoinSet::new();
    let mut pending = targets.into_iter().peekable();
    let mut packages = 0;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled(), if pending.peek().is_some() => {
                warn!(
                    "Deep scan cancelled after {}/{} components, {} not dispatched",
                    session.progress.done(),
                    session.progress.total(),
                    pending.len()
                );
                tasks.shutdown().await;
                return Err(DeepScanError::Cancelled);
            }

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                match joined.map_err(DeepScanError::from).and_then(|r| r) {
                    Ok(scanned) => packages += scanned,
                    Err(e) => {
                        tasks.shutdown().await;
                        return Err(e);
                    }
                }
            }

            permit = Arc::clone(&semaphore).acquire_owned(), if pending.peek().is_some() => {
                let Ok(permit) = permit else {
                    tasks.shutdown().await;
                    return Err(DeepScanError::Cancelled);
                };
                if let Some(name) = pending.next() {
                    let session = Arc::clone(session);
                    tasks.spawn_blocking(move || {
                        let _permit = permit;
                        session.check_component(&name)
                    });
                }
            }

            else => break,
        }
    }

    Ok(packages)
}

/// State of one check run.
struct Session {
    spec: Arc<Spec>,
    index: FileComponentIndex,
    collector: ViolationCollector,
    progress: Progress,
    scanner: Arc<dyn UsageScanner>,
    renderer: Arc<dyn SourceRenderer>,
}

impl Session {
    /// Scans every package of one component; returns the package count.
    fn check_component(&self, name: &ComponentName) -> Result<usize, DeepScanError> {
        let Some(component) = self.spec.component(name) else {
            return Ok(0);
        };

        for package in component.resolved_paths() {
            self.scan_package(component, &package.abs_path)?;
        }

        let done = self.progress.advance();
        debug!(
            "Component '{}' checked ({}/{}), {} warnings so far",
            name,
            done,
            self.progress.total(),
            self.collector.len()
        );
        Ok(component.resolved_paths().len())
    }

    fn scan_package(&self, component: &Component, package: &Path) -> Result<(), DeepScanError> {
        debug!("Scanning {} for '{}'", package.display(), component.name());

        let criteria = self.criteria(package).map_err(|e| DeepScanError::Criteria {
            component: component.name().clone(),
            path: package.to_path_buf(),
            source: e,
        })?;
        let usages = self
            .scanner
            .usages(&criteria)
            .map_err(|e| DeepScanError::Scan {
                component: component.name().clone(),
                path: package.to_path_buf(),
                source: e,
            })?;

        for usage in &usages {
            self.check_usage(usage);
        }
        Ok(())
    }

    fn criteria(&self, package: &Path) -> Result<Criteria, CriteriaError> {
        Criteria::builder()
            .package_path(package)
            .analyse_scope(self.spec.analyse_scope())
            .excluded_paths(
                self.spec
                    .excluded_paths()
                    .iter()
                    .map(|p| p.abs_path.clone())
                    .collect(),
            )
            .excluded_file_matchers(self.spec.excluded_files().to_vec())
            .build()
    }

    fn check_usage(&self, usage: &Usage) {
        for gate in &usage.gates {
            let Some(owner) = self.gate_owner(gate) else {
                debug!(
                    "Skipping gate {}: {} is untracked",
                    gate.method_name,
                    gate.method_definition.file.display()
                );
                continue;
            };
            for implementation in &gate.implementations {
                if let Some(target) = self.foreign_target(owner, implementation) {
                    let warning = self.warning(owner, gate, implementation, target.clone());
                    self.collector.record(warning);
                }
            }
        }
    }

    /// Component whose rules apply to `gate`: the owner of the file
    /// declaring the gate method.
    fn gate_owner(&self, gate: &Gate) -> Option<&Component> {
        let name = self.index.component_of(&gate.method_definition.file)?;
        self.spec.component(name)
    }

    /// Returns the component owning the injected type when the injection
    /// breaks `component`'s rules.
    fn foreign_target(
        &self,
        component: &Component,
        implementation: &Implementation,
    ) -> Option<&ComponentName> {
        let definition = &implementation.target.definition;
        if component.allows_import(&definition.import) {
            return None;
        }

        // Untracked files are stdlib or vendored code.
        let target = self.index.component_of(&definition.place.file)?;
        if target == component.name() || component.rule().any_project_deps {
            return None;
        }
        Some(target)
    }

    fn warning(
        &self,
        component: &Component,
        gate: &Gate,
        implementation: &Implementation,
        target: ComponentName,
    ) -> DeepscanWarning {
        let injector = &implementation.injector;
        let place = &implementation.target.definition.place;

        DeepscanWarning {
            gate: WarningGate {
                component: component.name().clone(),
                method_name: gate.method_name.clone(),
                relative_path: self.relative(&gate.argument_definition),
                definition: gate.argument_definition.clone(),
            },
            dependency: WarningDependency {
                component: target,
                name: implementation.target.qualified_name(),
                injection_ast: injector.code_name.clone(),
                injection: injector.param_definition.clone(),
                injection_path: self.relative(&injector.param_definition),
                source_code_preview: self.preview(implementation),
            },
            target: WarningTarget {
                relative_path: self.relative(place),
                definition: place.clone(),
            },
        }
    }

    fn relative(&self, position: &SourcePosition) -> String {
        format!(
            "{}:{}",
            slash_path(&self.spec.relative_path(&position.file)),
            position.line
        )
    }

    /// Call site snippet, from the enclosing declaration to the argument.
    fn preview(&self, implementation: &Implementation) -> String {
        let injector = &implementation.injector;
        let reference = CodeReference::new(
            injector.param_definition.clone(),
            injector.method_definition.line,
            injector.param_definition.line,
        );
        let code = self.renderer.source_code_without_offset(&reference, false);
        String::from_utf8_lossy(&code).into_owned()
    }
}
