//! Usage trees and the scanner contract.
//!
//! `UsageScanner` is the extension point for plugging in a language
//! front-end. The engine only consumes the trees it returns; it never parses
//! source code itself.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use arch_gate_core::SourcePosition;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A gate-bearing declaration: a method with at least one abstract parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Declaration name.
    pub name: String,
    /// Where the declaration is defined.
    pub definition: SourcePosition,
    /// Abstract parameters, in declaration order.
    #[serde(default)]
    pub gates: Vec<Gate>,
}

/// An abstract parameter and every concrete type passed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    /// The parameter's definition.
    pub argument_definition: SourcePosition,
    /// The enclosing method's definition.
    pub method_definition: SourcePosition,
    /// The enclosing method's name.
    pub method_name: String,
    /// Concrete values observed at call sites.
    #[serde(default)]
    pub implementations: Vec<Implementation>,
}

/// One concrete value passed into a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// The call site.
    pub injector: Injector,
    /// The concrete type.
    pub target: Target,
}

/// Call site passing a concrete value into a gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injector {
    /// Position of the passed argument.
    pub param_definition: SourcePosition,
    /// Position of the declaration enclosing the call.
    pub method_definition: SourcePosition,
    /// Source token of the passed argument.
    pub code_name: String,
}

/// Concrete type behind an injected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Where and in which package the type is defined.
    pub definition: TargetDefinition,
    /// Type name.
    pub struct_name: String,
}

/// Definition site of a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDefinition {
    /// Position of the type declaration.
    pub place: SourcePosition,
    /// Import path of the declaring package.
    pub import: String,
    /// Short package name.
    pub pkg: String,
}

impl Target {
    /// Returns `pkg.Type`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.definition.pkg, self.struct_name)
    }
}

// ────────────────────────────────────────────
// Criteria
// ────────────────────────────────────────────

/// Errors from building scan criteria.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// No package path was given.
    #[error("package path must not be empty")]
    EmptyPackagePath,

    /// The package path is not absolute.
    #[error("package path '{path}' must be absolute")]
    RelativePackagePath {
        /// The offending path.
        path: PathBuf,
    },

    /// No analyse scope was given.
    #[error("analyse scope must not be empty")]
    EmptyAnalyseScope,
}

/// What to scan: one package, searched for call sites within a scope.
#[derive(Debug, Clone)]
pub struct Criteria {
    package_path: PathBuf,
    analyse_scope: PathBuf,
    excluded_paths: Vec<PathBuf>,
    excluded_file_matchers: Vec<Regex>,
}

impl Criteria {
    /// Starts building criteria.
    #[must_use]
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// Absolute directory of the scanned package.
    #[must_use]
    pub fn package_path(&self) -> &Path {
        &self.package_path
    }

    /// Directory searched for call sites.
    #[must_use]
    pub fn analyse_scope(&self) -> &Path {
        &self.analyse_scope
    }

    /// Directories never scanned.
    #[must_use]
    pub fn excluded_paths(&self) -> &[PathBuf] {
        &self.excluded_paths
    }

    /// File expressions never scanned.
    #[must_use]
    pub fn excluded_file_matchers(&self) -> &[Regex] {
        &self.excluded_file_matchers
    }

    /// Tests whether `file` is excluded or outside the analyse scope.
    #[must_use]
    pub fn skips(&self, file: &Path) -> bool {
        if !file.starts_with(&self.analyse_scope) {
            return true;
        }
        if self.excluded_paths.iter().any(|p| file.starts_with(p)) {
            return true;
        }
        let file_str = file.to_string_lossy();
        self.excluded_file_matchers
            .iter()
            .any(|m| m.is_match(&file_str))
    }
}

/// Builder for [`Criteria`].
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    package_path: PathBuf,
    analyse_scope: PathBuf,
    excluded_paths: Vec<PathBuf>,
    excluded_file_matchers: Vec<Regex>,
}

impl CriteriaBuilder {
    /// Sets the package directory to scan.
    #[must_use]
    pub fn package_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.package_path = path.into();
        self
    }

    /// Sets the directory searched for call sites.
    #[must_use]
    pub fn analyse_scope(mut self, scope: impl Into<PathBuf>) -> Self {
        self.analyse_scope = scope.into();
        self
    }

    /// Sets excluded directories.
    #[must_use]
    pub fn excluded_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.excluded_paths = paths;
        self
    }

    /// Sets excluded file expressions.
    #[must_use]
    pub fn excluded_file_matchers(mut self, matchers: Vec<Regex>) -> Self {
        self.excluded_file_matchers = matchers;
        self
    }

    /// Validates and builds the criteria.
    ///
    /// # Errors
    ///
    /// Fails when the package path is empty or relative, or the scope is
    /// empty.
    pub fn build(self) -> Result<Criteria, CriteriaError> {
        if self.package_path.as_os_str().is_empty() {
            return Err(CriteriaError::EmptyPackagePath);
        }
        if !self.package_path.is_absolute() {
            return Err(CriteriaError::RelativePackagePath {
                path: self.package_path,
            });
        }
        if self.analyse_scope.as_os_str().is_empty() {
            return Err(CriteriaError::EmptyAnalyseScope);
        }
        Ok(Criteria {
            package_path: self.package_path,
            analyse_scope: self.analyse_scope,
            excluded_paths: self.excluded_paths,
            excluded_file_matchers: self.excluded_file_matchers,
        })
    }
}

// ────────────────────────────────────────────
// Scanner
// ────────────────────────────────────────────

/// Errors from a usage scanner.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Reading scanner input failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// Scanner input is malformed.
    #[error("malformed usage data: {0}")]
    Parse(#[from] serde_json::Error),

    /// The scanner could not analyse a package.
    #[error("cannot scan '{package}': {reason}")]
    Package {
        /// The package being scanned.
        package: PathBuf,
        /// Why scanning failed.
        reason: String,
    },
}

/// Produces usage trees for one package at a time.
///
/// Calls are blocking; the engine runs them off the async runtime.
pub trait UsageScanner: Send + Sync {
    /// Returns every gate-bearing declaration in the criteria's package,
    /// with implementations found within the analyse scope.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed criteria or scan I/O failure.
    fn usages(&self, criteria: &Criteria) -> Result<Vec<Usage>, ScanError>;

    /// Maximum number of concurrent `usages` calls this scanner supports.
    ///
    /// `None` means unbounded. Scanners holding internal locks for a whole
    /// call should return `Some(1)`.
    fn max_concurrency(&self) -> Option<NonZeroUsize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_absolute_package() {
        assert_eq!(
            Criteria::builder().analyse_scope("/p").build().unwrap_err(),
            CriteriaError::EmptyPackagePath
        );
        assert_eq!(
            Criteria::builder()
                .package_path("internal/a")
                .analyse_scope("/p")
                .build()
                .unwrap_err(),
            CriteriaError::RelativePackagePath {
                path: PathBuf::from("internal/a")
            }
        );
        assert_eq!(
            Criteria::builder().package_path("/p/internal/a").build().unwrap_err(),
            CriteriaError::EmptyAnalyseScope
        );
    }

    #[test]
    fn skips_excluded_and_out_of_scope_files() {
        let criteria = Criteria::builder()
            .package_path("/p/internal/a")
            .analyse_scope("/p")
            .excluded_paths(vec![PathBuf::from("/p/internal/legacy")])
            .excluded_file_matchers(vec![Regex::new(r"_test\.go$").unwrap()])
            .build()
            .unwrap();

        assert!(!criteria.skips(Path::new("/p/internal/a/a.go")));
        assert!(criteria.skips(Path::new("/p/internal/legacy/old.go")));
        assert!(criteria.skips(Path::new("/p/internal/a/a_test.go")));
        assert!(criteria.skips(Path::new("/usr/lib/go/src/fmt/print.go")));
    }

    #[test]
    fn usage_deserializes_without_gates() {
        let usage: Usage = serde_json::from_str(
            r#"{"name": "NewService", "definition": {"file": "/p/a.go", "line": 3, "column": 6}}"#,
        )
        .unwrap();
        assert_eq!(usage.name, "NewService");
        assert!(usage.gates.is_empty());
    }

    #[test]
    fn target_qualified_name() {
        let target = Target {
            definition: TargetDefinition {
                place: SourcePosition::new("/p/b/pg.go", 3, 6),
                import: "example.com/shop/internal/b".into(),
                pkg: "b".into(),
            },
            struct_name: "Postgres".into(),
        };
        assert_eq!(target.qualified_name(), "b.Postgres");
    }
}
