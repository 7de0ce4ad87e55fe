//! # arch-gate-core
//!
//! Component model and project indexing for architecture conformance checks.
//!
//! This crate provides everything a checker needs before it looks at code:
//!
//! - [`spec`] loads a TOML rule document into a validated [`Spec`], with
//!   every component's allowed imports already resolved
//! - [`ProjectFilesResolver`] and [`FileComponentIndex`] map source files to
//!   the component owning them
//! - [`SourceRenderer`] renders annotated code snippets for warnings
//! - [`DeepscanWarning`] and [`CheckResult`] describe findings
//!
//! ## Example
//!
//! ```ignore
//! use arch_gate_core::{spec, FileComponentIndex, WalkProjectFilesResolver};
//!
//! let root = std::env::current_dir()?;
//! let spec = spec::load_spec_file(&root.join("arch-gate.toml"), &root)?;
//! let index = FileComponentIndex::build(&WalkProjectFilesResolver::new(), &spec)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod files;
mod render;
mod types;

/// Mask resolution and path helpers.
pub mod paths;
/// Rule document loading and assembly.
pub mod spec;

pub use files::{
    is_excluded, FileComponentIndex, FilesError, ProjectFile, ProjectFilesResolver,
    WalkProjectFilesResolver,
};
pub use paths::{GlobPathResolver, PathResolveError, PathResolver};
pub use render::{PlainRenderer, SourceRenderer};
pub use spec::model::{
    Component, ComponentName, DependencyRule, ModelError, Options, ResolvedPath, Spec, Vendor,
    VendorName,
};
pub use spec::LoadSpecError;
pub use types::{
    CheckResult, CodeReference, DeepscanWarning, SourcePosition, WarningDependency,
    WarningGate, WarningTarget,
};
