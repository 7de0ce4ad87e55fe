//! Core types for deep-scan warnings and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::spec::model::ComponentName;

/// Source code position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Absolute file path.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl SourcePosition {
    /// Creates a new position.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A region of source code around a pointer, for snippet rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeReference {
    /// The position to point at; `None` renders nothing.
    pub pointer: Option<SourcePosition>,
    /// First line of the region.
    pub line_from: usize,
    /// Last line of the region.
    pub line_to: usize,
}

impl CodeReference {
    /// Creates a reference spanning `line_from..=line_to` around `pointer`.
    #[must_use]
    pub fn new(pointer: SourcePosition, line_from: usize, line_to: usize) -> Self {
        Self {
            pointer: Some(pointer),
            line_from,
            line_to,
        }
    }

    /// Creates a reference to the single line of `pointer`.
    #[must_use]
    pub fn single_line(pointer: SourcePosition) -> Self {
        let line = pointer.line;
        Self::new(pointer, line, line)
    }
}

/// The gate side of a deep-scan warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningGate {
    /// Component owning the gate.
    pub component: ComponentName,
    /// Name of the method declaring the gate.
    pub method_name: String,
    /// `relative/file:line` of the gate argument.
    pub relative_path: String,
    /// Gate argument definition.
    pub definition: SourcePosition,
}

/// The injected dependency side of a deep-scan warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningDependency {
    /// Component owning the injected type.
    pub component: ComponentName,
    /// Qualified type name, `pkg.Type`.
    pub name: String,
    /// Source token passed at the call site.
    pub injection_ast: String,
    /// Call-site position of the injected value.
    pub injection: SourcePosition,
    /// `relative/file:line` of the call site.
    pub injection_path: String,
    /// Rendered call-site snippet.
    pub source_code_preview: String,
}

/// Where the injected type is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningTarget {
    /// `relative/file:line` of the type definition.
    pub relative_path: String,
    /// Type definition position.
    pub definition: SourcePosition,
}

/// A dependency-rule violation hidden behind an injected implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepscanWarning {
    /// Gate side.
    pub gate: WarningGate,
    /// Injected dependency side.
    pub dependency: WarningDependency,
    /// Target type definition.
    pub target: WarningTarget,
}

impl DeepscanWarning {
    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "component '{}' shouldn't depend on '{}' via '{}'",
            self.gate.component, self.dependency.component, self.dependency.name
        )
    }

    /// Formats the warning for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("deepscan at {}\n", self.dependency.injection_path);
        let _ = writeln!(output, "  warning: {}", self.message());
        let _ = writeln!(
            output,
            "  = gate: {}() argument at {}",
            self.gate.method_name, self.gate.relative_path
        );
        let _ = writeln!(
            output,
            "  = injected: `{}` defined at {}",
            self.dependency.injection_ast, self.target.relative_path
        );
        output
    }
}

impl fmt::Display for DeepscanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [deepscan] {} -> {} ({} injected into {})",
            self.dependency.injection_path,
            self.gate.component,
            self.dependency.component,
            self.dependency.name,
            self.gate.method_name,
        )
    }
}

/// Result of one deep-scan check run.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// All warnings found.
    pub deepscan_warnings: Vec<DeepscanWarning>,
    /// Number of deep-scan-enabled components checked.
    pub components_checked: usize,
    /// Number of packages handed to the scanner.
    pub packages_scanned: usize,
}

impl CheckResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any warning was found.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.deepscan_warnings.is_empty()
    }

    /// Sorts warnings by call site, for stable display.
    pub fn sort(&mut self) {
        self.deepscan_warnings.sort_by(|a, b| {
            a.dependency
                .injection
                .file
                .cmp(&b.dependency.injection.file)
                .then(a.dependency.injection.line.cmp(&b.dependency.injection.line))
                .then(a.gate.component.cmp(&b.gate.component))
        });
    }

    /// Counts warnings per gate component.
    #[must_use]
    pub fn count_by_component(&self) -> Vec<(ComponentName, usize)> {
        let mut counts: std::collections::BTreeMap<&ComponentName, usize> =
            std::collections::BTreeMap::new();
        for warning in &self.deepscan_warnings {
            *counts.entry(&warning.gate.component).or_default() += 1;
        }
        counts.into_iter().map(|(k, v)| (k.clone(), v)).collect()
    }
}
