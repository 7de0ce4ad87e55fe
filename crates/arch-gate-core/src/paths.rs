//! Resolution of component source masks into package directories.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::spec::model::ResolvedPath;

/// Suffix marking a recursive mask: `internal/services/...`.
const RECURSIVE_SUFFIX: &str = "/...";

/// Errors from resolving a source-path mask.
#[derive(Debug, thiserror::Error)]
pub enum PathResolveError {
    /// The mask is not a valid glob pattern.
    #[error("invalid mask '{mask}': {source}")]
    InvalidPattern {
        /// The offending mask.
        mask: String,
        /// The glob error.
        source: glob::PatternError,
    },

    /// Reading a matched entry failed.
    #[error("failed to read '{mask}' match: {source}")]
    Io {
        /// The offending mask.
        mask: String,
        /// The glob error.
        source: glob::GlobError,
    },

    /// The mask matched no directory.
    #[error("mask '{mask}' matched no directories")]
    NotFound {
        /// The offending mask.
        mask: String,
    },
}

/// Resolves a component's local path mask into concrete package directories.
pub trait PathResolver: Send + Sync {
    /// Resolves `mask` into one entry per matched directory.
    ///
    /// # Errors
    ///
    /// Fails naming the mask when it is invalid or matches nothing.
    fn resolve_local_path(&self, mask: &str) -> Result<Vec<ResolvedPath>, PathResolveError>;
}

/// Resolves masks with glob patterns relative to `root/workdir`.
///
/// Supported syntax: plain directories (`internal/app`), glob wildcards
/// (`internal/*/handlers`, `internal/**`) and a trailing `/...` which
/// matches the directory and everything below it.
#[derive(Debug, Clone)]
pub struct GlobPathResolver {
    root: PathBuf,
    workdir: PathBuf,
    module: String,
}

impl GlobPathResolver {
    /// Creates a new resolver.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, workdir: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            workdir: workdir.into(),
            module: module.into(),
        }
    }

    fn patterns(&self, mask: &str) -> Vec<String> {
        let base = clean(&self.root.join(&self.workdir));
        let mask = mask.trim_start_matches("./");
        if let Some(prefix) = mask.strip_suffix(RECURSIVE_SUFFIX) {
            let dir = literal_prefix(&base, &clean(&base.join(prefix)));
            vec![
                dir.to_string_lossy().into_owned(),
                dir.join("**").to_string_lossy().into_owned(),
            ]
        } else {
            let path = literal_prefix(&base, &clean(&base.join(mask)));
            vec![path.to_string_lossy().into_owned()]
        }
    }

    fn to_resolved(&self, dir: &Path) -> ResolvedPath {
        let local_path = dir
            .strip_prefix(&self.root)
            .map(slash_path)
            .unwrap_or_default();
        let import_path = match (self.module.is_empty(), local_path.is_empty()) {
            (true, _) => local_path.clone(),
            (false, true) => self.module.clone(),
            (false, false) => format!("{}/{}", self.module, local_path),
        };
        ResolvedPath::new(import_path, local_path, dir)
    }
}

impl PathResolver for GlobPathResolver {
    fn resolve_local_path(&self, mask: &str) -> Result<Vec<ResolvedPath>, PathResolveError> {
        let mut dirs = Vec::new();

        for pattern in self.patterns(mask) {
            let entries = glob::glob(&pattern).map_err(|e| PathResolveError::InvalidPattern {
                mask: mask.to_string(),
                source: e,
            })?;
            for entry in entries {
                let path = entry.map_err(|e| PathResolveError::Io {
                    mask: mask.to_string(),
                    source: e,
                })?;
                if path.is_dir() {
                    dirs.push(path);
                }
            }
        }

        dirs.sort();
        dirs.dedup();

        if dirs.is_empty() {
            return Err(PathResolveError::NotFound {
                mask: mask.to_string(),
            });
        }

        debug!("Mask '{}' resolved to {} directories", mask, dirs.len());
        Ok(dirs.iter().map(|d| self.to_resolved(d)).collect())
    }
}

/// Escapes glob metacharacters in the part of `path` that comes from
/// `base`, so only the mask itself is matched as a pattern.
fn literal_prefix(base: &Path, path: &Path) -> PathBuf {
    let Some(anchor) = base.ancestors().find(|a| path.starts_with(a)) else {
        return path.to_path_buf();
    };
    let escaped = PathBuf::from(glob::Pattern::escape(&anchor.to_string_lossy()));
    match path.strip_prefix(anchor) {
        Ok(rest) if !rest.as_os_str().is_empty() => escaped.join(rest),
        _ => escaped,
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` where possible.
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Joins path components with `/` regardless of platform.
#[must_use]
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for dir in [
            "internal/app",
            "internal/services/billing",
            "internal/services/billing/tax",
            "internal/services/shipping",
            "internal/models",
        ] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("internal/app/main.go"), "").unwrap();
        tmp
    }

    #[test]
    fn resolves_plain_directory() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), ".", "example.com/shop");

        let resolved = resolver.resolve_local_path("internal/app").unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].import_path, "example.com/shop/internal/app");
        assert_eq!(resolved[0].local_path, "internal/app");
        assert_eq!(resolved[0].abs_path, tmp.path().join("internal/app"));
    }

    #[test]
    fn resolves_wildcard_to_directories_only() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), "", "");

        let resolved = resolver.resolve_local_path("internal/*").unwrap();
        let locals: Vec<&str> = resolved.iter().map(|r| r.local_path.as_str()).collect();
        assert_eq!(
            locals,
            vec!["internal/app", "internal/models", "internal/services"]
        );
        // Without a module the import path is the local path.
        assert_eq!(resolved[0].import_path, "internal/app");
    }

    #[test]
    fn resolves_recursive_suffix() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), "", "m");

        let resolved = resolver.resolve_local_path("internal/services/...").unwrap();
        let imports: Vec<&str> = resolved.iter().map(|r| r.import_path.as_str()).collect();
        assert_eq!(
            imports,
            vec![
                "m/internal/services",
                "m/internal/services/billing",
                "m/internal/services/billing/tax",
                "m/internal/services/shipping",
            ]
        );
    }

    #[test]
    fn resolves_relative_to_workdir() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), "internal", "m");

        let resolved = resolver.resolve_local_path("models").unwrap();
        assert_eq!(resolved[0].local_path, "internal/models");
        assert_eq!(resolved[0].import_path, "m/internal/models");
    }

    #[test]
    fn unmatched_mask_is_named_in_error() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), "", "m");

        let err = resolver.resolve_local_path("internal/missing/*").unwrap_err();
        assert!(matches!(err, PathResolveError::NotFound { .. }));
        assert!(err.to_string().contains("'internal/missing/*'"));
    }

    #[test]
    fn root_with_glob_metacharacters_is_literal() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj[1]");
        for dir in ["internal/app", "internal/models"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        let resolver = GlobPathResolver::new(&root, ".", "m");

        let resolved = resolver.resolve_local_path("internal/app").unwrap();
        assert_eq!(resolved[0].local_path, "internal/app");
        assert_eq!(resolved[0].abs_path, root.join("internal/app"));

        let resolved = resolver.resolve_local_path("internal/*").unwrap();
        assert_eq!(resolved.len(), 2);

        let resolved = resolver.resolve_local_path("internal/...").unwrap();
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn file_match_is_not_a_package() {
        let tmp = project();
        let resolver = GlobPathResolver::new(tmp.path(), "", "m");

        assert!(resolver.resolve_local_path("internal/app/main.go").is_err());
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("./")), PathBuf::from("."));
        assert_eq!(clean(Path::new("a/../..")), PathBuf::from(".."));
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("internal/app")), "internal/app");
        assert_eq!(slash_path(Path::new("")), "");
    }
}
