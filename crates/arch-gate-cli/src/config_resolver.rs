//! Rule document discovery.
//!
//! Resolves which `arch-gate.toml` applies, in priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. nearest `arch-gate.toml` or `.arch-gate.toml` in the target directory
//!    or any of its ancestors
//! 3. `$ARCH_GATE_CONFIG_DIR/config.toml` or `~/.arch-gate/config.toml`
//! 4. nothing found
//!
//! A project document also fixes the project root: the directory holding it.

use std::path::{Path, PathBuf};

/// Where the rule document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config`.
    Explicit(PathBuf),
    /// Found in the target directory or one of its ancestors.
    Project(PathBuf),
    /// Loaded from the global config directory.
    Global(PathBuf),
    /// No rule document found.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the document came from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }

    /// Project root the document applies to.
    ///
    /// A project document's directory; `target` for every other source.
    #[must_use]
    pub fn project_root(&self, target: &Path) -> PathBuf {
        match self {
            Self::Project(p) => p
                .parent()
                .map_or_else(|| target.to_path_buf(), Path::to_path_buf),
            _ => target.to_path_buf(),
        }
    }
}

/// Project-level document names, checked in order within each directory.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["arch-gate.toml", ".arch-gate.toml"];

/// Document name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the rule document for `target`.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(target: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(target, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(target: &Path, explicit: Option<&Path>, global_dir: Option<PathBuf>) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = find_project_config(target) {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Nearest project document at or above `start`.
fn find_project_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Returns the global config directory.
///
/// Resolution: `$ARCH_GATE_CONFIG_DIR` > `~/.arch-gate/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ARCH_GATE_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".arch-gate"))
}
