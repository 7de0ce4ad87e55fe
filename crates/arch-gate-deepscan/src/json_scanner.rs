//! Usage scanner backed by an exported JSON document.
//!
//! Language front-ends export their usage trees once (a JSON array of
//! [`Usage`]); this scanner serves them per package. Relative file paths in
//! the document are resolved against a base directory, normally the project
//! root.

use std::path::Path;

use arch_gate_core::SourcePosition;
use tracing::debug;

use crate::usage::{Criteria, ScanError, Usage, UsageScanner};

/// Serves pre-computed usage trees.
#[derive(Debug, Clone, Default)]
pub struct JsonUsageScanner {
    usages: Vec<Usage>,
}

impl JsonUsageScanner {
    /// Creates a scanner over already-absolute usage trees.
    #[must_use]
    pub fn new(usages: Vec<Usage>) -> Self {
        Self { usages }
    }

    /// Reads usage trees from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path, base: &Path) -> Result<Self, ScanError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScanError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, base)
    }

    /// Parses usage trees from JSON content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON array of usages.
    pub fn parse(content: &str, base: &Path) -> Result<Self, ScanError> {
        let mut usages: Vec<Usage> = serde_json::from_str(content)?;
        for usage in &mut usages {
            absolutize_usage(usage, base);
        }
        debug!("Loaded {} usages", usages.len());
        Ok(Self { usages })
    }

    /// Returns the number of loaded usages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.usages.len()
    }

    /// Returns true if no usage was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

impl UsageScanner for JsonUsageScanner {
    fn usages(&self, criteria: &Criteria) -> Result<Vec<Usage>, ScanError> {
        let found: Vec<Usage> = self
            .usages
            .iter()
            .filter(|usage| {
                usage.definition.file.parent() == Some(criteria.package_path())
                    && !criteria.skips(&usage.definition.file)
            })
            .map(|usage| {
                let mut usage = usage.clone();
                for gate in &mut usage.gates {
                    gate.implementations
                        .retain(|imp| !criteria.skips(&imp.injector.param_definition.file));
                }
                usage
            })
            .collect();

        debug!(
            "Package {}: {} usages",
            criteria.package_path().display(),
            found.len()
        );
        Ok(found)
    }
}

fn absolutize_usage(usage: &mut Usage, base: &Path) {
    absolutize(&mut usage.definition, base);
    for gate in &mut usage.gates {
        absolutize(&mut gate.argument_definition, base);
        absolutize(&mut gate.method_definition, base);
        for imp in &mut gate.implementations {
            absolutize(&mut imp.injector.param_definition, base);
            absolutize(&mut imp.injector.method_definition, base);
            absolutize(&mut imp.target.definition.place, base);
        }
    }
}

fn absolutize(position: &mut SourcePosition, base: &Path) {
    if position.file.is_relative() {
        position.file = arch_gate_core::paths::clean(&base.join(&position.file));
    }
}
