//! Domain model for component rules.
//!
//! [`Document`] is the validated rule document as written by the user.
//! [`Spec`] is the assembled form: every component carries its resolved
//! package directories and its flattened allowed-import set, so nothing is
//! expanded while a check is running.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

fn validate_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// A validated component identifier (non-empty, `[A-Za-z0-9_.-]` only).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentName(String);

impl ComponentName {
    /// Creates a new component name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains invalid characters.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "component" });
        }
        if !validate_identifier(name) {
            return Err(ModelError::InvalidName {
                kind: "component",
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated vendor identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorName(String);

impl VendorName {
    /// Creates a new vendor name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains invalid characters.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "vendor" });
        }
        if !validate_identifier(name) {
            return Err(ModelError::InvalidName {
                kind: "vendor",
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VendorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A concrete, importable location.
///
/// Either a package directory matched by a component mask, or a vendor
/// import path placed under the vendor directory convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedPath {
    /// Import path used by source code to refer to this package.
    pub import_path: String,
    /// Path relative to the project root, `/` separated.
    pub local_path: String,
    /// Absolute path on disk.
    pub abs_path: PathBuf,
}

impl ResolvedPath {
    /// Creates a new resolved path.
    #[must_use]
    pub fn new(
        import_path: impl Into<String>,
        local_path: impl Into<String>,
        abs_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            import_path: import_path.into(),
            local_path: local_path.into(),
            abs_path: abs_path.into(),
        }
    }
}

// ────────────────────────────────────────────
// Document entities
// ────────────────────────────────────────────

/// Project-wide switches from the `[allow]` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Every component may import any vendor.
    pub dep_on_any_vendor: bool,
    /// Default deep-scan flag for components without an explicit one.
    pub deep_scan: bool,
}

/// An external dependency identified by its import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    name: VendorName,
    import_path: String,
}

impl Vendor {
    /// Creates a new vendor.
    #[must_use]
    pub fn new(name: VendorName, import_path: impl Into<String>) -> Self {
        Self {
            name,
            import_path: import_path.into(),
        }
    }

    /// Returns the vendor name.
    #[must_use]
    pub fn name(&self) -> &VendorName {
        &self.name
    }

    /// Returns the declared import path.
    #[must_use]
    pub fn import_path(&self) -> &str {
        &self.import_path
    }
}

/// A component as declared: name plus source-path masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDef {
    name: ComponentName,
    masks: Vec<String>,
}

impl ComponentDef {
    /// Creates a new component definition.
    #[must_use]
    pub fn new(name: ComponentName, masks: Vec<String>) -> Self {
        Self { name, masks }
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Returns the source-path masks, relative to the working directory.
    #[must_use]
    pub fn masks(&self) -> &[String] {
        &self.masks
    }
}

/// Dependency rules of one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyRule {
    /// Components this component may depend on.
    pub may_depend_on: Vec<ComponentName>,
    /// Vendors this component may use.
    pub can_use: Vec<VendorName>,
    /// May depend on any project component.
    pub any_project_deps: bool,
    /// May use any vendor.
    pub any_vendor_deps: bool,
    /// Per-component deep-scan override.
    pub deep_scan: Option<bool>,
}

// ────────────────────────────────────────────
// Document (validated, not yet assembled)
// ────────────────────────────────────────────

/// Validated rule document.
///
/// All name references are verified at construction time.
#[derive(Debug, Clone)]
pub struct Document {
    workdir: PathBuf,
    module: String,
    options: Options,
    exclude: Vec<String>,
    exclude_files: Vec<Regex>,
    vendors: BTreeMap<VendorName, Vendor>,
    components: BTreeMap<ComponentName, ComponentDef>,
    dependencies: BTreeMap<ComponentName, DependencyRule>,
    common_components: Vec<ComponentName>,
    common_vendors: Vec<VendorName>,
}

/// Parts of a [`Document`] before cross-reference validation.
#[derive(Debug, Clone, Default)]
pub struct DocumentParts {
    /// Working directory, relative to the project root.
    pub workdir: PathBuf,
    /// Import path of the project root (may be empty).
    pub module: String,
    /// Project-wide switches.
    pub options: Options,
    /// Excluded directories, relative to the working directory.
    pub exclude: Vec<String>,
    /// Excluded file name expressions.
    pub exclude_files: Vec<Regex>,
    /// Vendor definitions.
    pub vendors: Vec<Vendor>,
    /// Component definitions.
    pub components: Vec<ComponentDef>,
    /// Dependency rules keyed by component.
    pub dependencies: Vec<(ComponentName, DependencyRule)>,
    /// Components every component may depend on.
    pub common_components: Vec<ComponentName>,
    /// Vendors every component may use.
    pub common_vendors: Vec<VendorName>,
}

impl Document {
    /// Creates a new document with full cross-reference validation.
    ///
    /// # Errors
    ///
    /// Returns every reference to an undefined component or vendor.
    pub fn new(parts: DocumentParts) -> Result<Self, Vec<ModelError>> {
        let vendors: BTreeMap<VendorName, Vendor> = parts
            .vendors
            .into_iter()
            .map(|v| (v.name.clone(), v))
            .collect();
        let components: BTreeMap<ComponentName, ComponentDef> = parts
            .components
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        let mut errors = Vec::new();

        let check_component = |errors: &mut Vec<ModelError>, context: String, name: &ComponentName| {
            if !components.contains_key(name) {
                errors.push(ModelError::UnknownComponent {
                    context,
                    name: name.clone(),
                });
            }
        };
        let check_vendor = |errors: &mut Vec<ModelError>, context: String, name: &VendorName| {
            if !vendors.contains_key(name) {
                errors.push(ModelError::UnknownVendor {
                    context,
                    name: name.clone(),
                });
            }
        };

        for component in components.values() {
            if component.masks.is_empty() {
                errors.push(ModelError::NoMasks {
                    component: component.name.clone(),
                });
            }
        }

        for (owner, rule) in &parts.dependencies {
            check_component(&mut errors, "deps".to_string(), owner);
            for name in &rule.may_depend_on {
                check_component(&mut errors, format!("deps.{owner}.may-depend-on"), name);
            }
            for name in &rule.can_use {
                check_vendor(&mut errors, format!("deps.{owner}.can-use"), name);
            }
        }

        for name in &parts.common_components {
            check_component(&mut errors, "common-components".to_string(), name);
        }
        for name in &parts.common_vendors {
            check_vendor(&mut errors, "common-vendors".to_string(), name);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            workdir: parts.workdir,
            module: parts.module,
            options: parts.options,
            exclude: parts.exclude,
            exclude_files: parts.exclude_files,
            vendors,
            components,
            dependencies: parts.dependencies.into_iter().collect(),
            common_components: parts.common_components,
            common_vendors: parts.common_vendors,
        })
    }

    /// Returns the working directory, relative to the project root.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Returns the import path of the project root.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the project-wide switches.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns the excluded directories.
    #[must_use]
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Returns the excluded file expressions.
    #[must_use]
    pub fn exclude_files(&self) -> &[Regex] {
        &self.exclude_files
    }

    /// Returns all vendors.
    #[must_use]
    pub fn vendors(&self) -> &BTreeMap<VendorName, Vendor> {
        &self.vendors
    }

    /// Returns all component definitions.
    #[must_use]
    pub fn components(&self) -> &BTreeMap<ComponentName, ComponentDef> {
        &self.components
    }

    /// Gets a component definition by name.
    #[must_use]
    pub fn component(&self, name: &ComponentName) -> Option<&ComponentDef> {
        self.components.get(name)
    }

    /// Gets a vendor by name.
    #[must_use]
    pub fn vendor(&self, name: &VendorName) -> Option<&Vendor> {
        self.vendors.get(name)
    }

    /// Gets the dependency rule of a component.
    #[must_use]
    pub fn dependency_rule(&self, name: &ComponentName) -> Option<&DependencyRule> {
        self.dependencies.get(name)
    }

    /// Returns the components every component may depend on.
    #[must_use]
    pub fn common_components(&self) -> &[ComponentName] {
        &self.common_components
    }

    /// Returns the vendors every component may use.
    #[must_use]
    pub fn common_vendors(&self) -> &[VendorName] {
        &self.common_vendors
    }
}

// ────────────────────────────────────────────
// Assembled spec
// ────────────────────────────────────────────

/// A fully assembled component.
#[derive(Debug, Clone)]
pub struct Component {
    name: ComponentName,
    masks: Vec<String>,
    resolved_paths: Vec<ResolvedPath>,
    deep_scan: bool,
    rule: DependencyRule,
    allowed_imports: Vec<ResolvedPath>,
}

impl Component {
    /// Creates a new assembled component.
    #[must_use]
    pub fn new(
        name: ComponentName,
        masks: Vec<String>,
        resolved_paths: Vec<ResolvedPath>,
        deep_scan: bool,
        rule: DependencyRule,
        allowed_imports: Vec<ResolvedPath>,
    ) -> Self {
        Self {
            name,
            masks,
            resolved_paths,
            deep_scan,
            rule,
            allowed_imports,
        }
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Returns the declared masks.
    #[must_use]
    pub fn masks(&self) -> &[String] {
        &self.masks
    }

    /// Returns the package directories owned by this component.
    #[must_use]
    pub fn resolved_paths(&self) -> &[ResolvedPath] {
        &self.resolved_paths
    }

    /// Returns whether deep scan is enabled.
    #[must_use]
    pub fn deep_scan(&self) -> bool {
        self.deep_scan
    }

    /// Returns the dependency rule.
    #[must_use]
    pub fn rule(&self) -> &DependencyRule {
        &self.rule
    }

    /// Returns the flattened allowed-import set.
    #[must_use]
    pub fn allowed_imports(&self) -> &[ResolvedPath] {
        &self.allowed_imports
    }

    /// Tests whether an import path is in the allowed-import set.
    ///
    /// Exact, case-sensitive comparison.
    #[must_use]
    pub fn allows_import(&self, import_path: &str) -> bool {
        self.allowed_imports
            .iter()
            .any(|allowed| allowed.import_path == import_path)
    }
}

/// Assembled specification consumed by checkers.
#[derive(Debug, Clone)]
pub struct Spec {
    root: PathBuf,
    workdir: PathBuf,
    module: String,
    options: Options,
    components: BTreeMap<ComponentName, Component>,
    vendors: BTreeMap<VendorName, Vendor>,
    excluded_paths: Vec<ResolvedPath>,
    excluded_files: Vec<Regex>,
}

impl Spec {
    /// Creates an empty spec rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workdir: PathBuf::new(),
            module: String::new(),
            options: Options::default(),
            components: BTreeMap::new(),
            vendors: BTreeMap::new(),
            excluded_paths: Vec::new(),
            excluded_files: Vec::new(),
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Sets the module import path.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Sets the project-wide switches.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Adds an assembled component.
    #[must_use]
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.insert(component.name.clone(), component);
        self
    }

    /// Adds a vendor.
    #[must_use]
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendors.insert(vendor.name.clone(), vendor);
        self
    }

    /// Adds an excluded directory.
    #[must_use]
    pub fn with_excluded_path(mut self, path: ResolvedPath) -> Self {
        self.excluded_paths.push(path);
        self
    }

    /// Adds an excluded file expression.
    #[must_use]
    pub fn with_excluded_file(mut self, matcher: Regex) -> Self {
        self.excluded_files.push(matcher);
        self
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the working directory, relative to the root.
    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Returns the absolute directory that bounds analysis.
    #[must_use]
    pub fn analyse_scope(&self) -> PathBuf {
        crate::paths::clean(&self.root.join(&self.workdir))
    }

    /// Returns the module import path.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the project-wide switches.
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns all components in name order.
    #[must_use]
    pub fn components(&self) -> &BTreeMap<ComponentName, Component> {
        &self.components
    }

    /// Gets a component by name.
    #[must_use]
    pub fn component(&self, name: &ComponentName) -> Option<&Component> {
        self.components.get(name)
    }

    /// Returns all vendors.
    #[must_use]
    pub fn vendors(&self) -> &BTreeMap<VendorName, Vendor> {
        &self.vendors
    }

    /// Returns the excluded directories.
    #[must_use]
    pub fn excluded_paths(&self) -> &[ResolvedPath] {
        &self.excluded_paths
    }

    /// Returns the excluded file expressions.
    #[must_use]
    pub fn excluded_files(&self) -> &[Regex] {
        &self.excluded_files
    }

    /// Strips the project root from `path`, for display.
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in domain model construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Identifier is empty.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// `component` or `vendor`.
        kind: &'static str,
    },

    /// Identifier contains invalid characters.
    #[error("invalid {kind} name `{name}`: must be [A-Za-z0-9_.-]")]
    InvalidName {
        /// `component` or `vendor`.
        kind: &'static str,
        /// The invalid name.
        name: String,
    },

    /// Component has no source-path masks.
    #[error("component `{component}` has no source path (`in`)")]
    NoMasks {
        /// The component.
        component: ComponentName,
    },

    /// File expression is not a valid regular expression.
    #[error("invalid file expression `{pattern}`: {reason}")]
    InvalidRegex {
        /// The invalid expression.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },

    /// A reference points to an undefined component.
    #[error("{context}: unknown component `{name}`")]
    UnknownComponent {
        /// Where the reference was found.
        context: String,
        /// The undefined component.
        name: ComponentName,
    },

    /// A reference points to an undefined vendor.
    #[error("{context}: unknown vendor `{name}`")]
    UnknownVendor {
        /// Where the reference was found.
        context: String,
        /// The undefined vendor.
        name: VendorName,
    },
}

// ────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cn(name: &str) -> ComponentName {
        ComponentName::new(name).unwrap()
    }

    fn vn(name: &str) -> VendorName {
        VendorName::new(name).unwrap()
    }

    // -- names --

    #[test]
    fn component_name_valid() {
        assert!(ComponentName::new("app").is_ok());
        assert!(ComponentName::new("repo_impl-2.v1").is_ok());
    }

    #[test]
    fn component_name_empty_rejected() {
        assert!(matches!(
            ComponentName::new(""),
            Err(ModelError::EmptyName { kind: "component" })
        ));
    }

    #[test]
    fn vendor_name_invalid_chars_rejected() {
        assert!(matches!(
            VendorName::new("go pkg"),
            Err(ModelError::InvalidName { kind: "vendor", .. })
        ));
    }

    // -- Document --

    fn parts() -> DocumentParts {
        DocumentParts {
            vendors: vec![Vendor::new(vn("errors"), "github.com/pkg/errors")],
            components: vec![
                ComponentDef::new(cn("app"), vec!["internal/app".into()]),
                ComponentDef::new(cn("models"), vec!["internal/models".into()]),
            ],
            dependencies: vec![(
                cn("app"),
                DependencyRule {
                    may_depend_on: vec![cn("models")],
                    can_use: vec![vn("errors")],
                    ..DependencyRule::default()
                },
            )],
            ..DocumentParts::default()
        }
    }

    #[test]
    fn document_valid() {
        let doc = Document::new(parts()).unwrap();
        assert_eq!(doc.components().len(), 2);
        assert!(doc.dependency_rule(&cn("app")).is_some());
        assert!(doc.dependency_rule(&cn("models")).is_none());
    }

    #[test]
    fn document_rejects_unknown_references() {
        let mut p = parts();
        p.common_components.push(cn("ghost"));
        p.common_vendors.push(vn("nope"));
        p.dependencies[0].1.may_depend_on.push(cn("other"));

        let errors = Document::new(p).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.to_string() == "deps.app.may-depend-on: unknown component `other`"));
        assert!(errors
            .iter()
            .any(|e| e.to_string() == "common-vendors: unknown vendor `nope`"));
    }

    #[test]
    fn document_rejects_component_without_masks() {
        let mut p = parts();
        p.components.push(ComponentDef::new(cn("empty"), vec![]));
        let errors = Document::new(p).unwrap_err();
        assert!(matches!(errors[0], ModelError::NoMasks { .. }));
    }

    // -- Component --

    #[test]
    fn allows_import_is_exact_and_case_sensitive() {
        let component = Component::new(
            cn("app"),
            vec![],
            vec![],
            true,
            DependencyRule::default(),
            vec![ResolvedPath::new(
                "example.com/shop/internal/models",
                "internal/models",
                "/p/internal/models",
            )],
        );
        assert!(component.allows_import("example.com/shop/internal/models"));
        assert!(!component.allows_import("example.com/shop/internal/Models"));
        assert!(!component.allows_import("example.com/shop/internal/models/sub"));
        assert!(!component.allows_import("example.com/shop/internal"));
    }

    #[test]
    fn spec_relative_path_strips_root() {
        let spec = Spec::new("/p");
        assert_eq!(
            spec.relative_path(Path::new("/p/internal/app/a.go")),
            PathBuf::from("internal/app/a.go")
        );
        assert_eq!(
            spec.relative_path(Path::new("/other/x.go")),
            PathBuf::from("/other/x.go")
        );
    }
}
