//! Component rules driven by TOML configuration.
//!
//! # Architecture
//!
//! ```text
//! TOML text
//!   ↓ serde (DTO layer)
//! config_dto types
//!   ↓ validate + convert (loader)
//! Document (pure domain model)
//!   ↓ resolve masks + flatten allow-lists (assembler)
//! Spec
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;

pub mod allowed_imports;
pub mod assembler;
pub mod config_dto;
pub mod loader;
pub mod model;

/// Errors from reading a rule document into a [`model::Spec`].
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum LoadSpecError {
    /// The rule document could not be read.
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(arch_gate::spec::io))]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// TOML deserialization failed.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(arch_gate::spec::toml))]
    Toml(#[from] toml::de::Error),

    /// Document validation failed.
    #[error("{0}")]
    #[diagnostic(
        code(arch_gate::spec::invalid),
        help("every name used in `deps` and `common-*` must be declared under `components` or `vendors`")
    )]
    Load(#[from] loader::LoadError),

    /// Mask resolution or allow-list assembly failed.
    #[error("{0}")]
    #[diagnostic(
        code(arch_gate::spec::assemble),
        help("component masks are resolved relative to `workdir` and must match at least one directory")
    )]
    Assemble(#[from] allowed_imports::AssembleError),
}

/// Parses TOML content and assembles the spec for the project at `root`,
/// which must be absolute.
///
/// # Errors
///
/// Returns an error if parsing, validation or assembly fails.
pub fn load_spec(content: &str, root: &Path) -> Result<model::Spec, LoadSpecError> {
    let dto: config_dto::DocumentDto = toml::from_str(content)?;
    let document = loader::load(dto)?;
    Ok(assembler::assemble(&document, root)?)
}

/// Reads a rule document from `path` and assembles it.
///
/// # Errors
///
/// See [`load_spec`]; also fails if the file cannot be read.
pub fn load_spec_file(path: &Path, root: &Path) -> Result<model::Spec, LoadSpecError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadSpecError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_spec(&content, root)
}
