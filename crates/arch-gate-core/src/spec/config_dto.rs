//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Raw TOML representation of the rule document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DocumentDto {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Working directory relative to the project root.
    #[serde(default)]
    pub workdir: Option<String>,

    /// Import path of the project root.
    #[serde(default)]
    pub module: String,

    /// Project-wide switches.
    #[serde(default)]
    pub allow: AllowDto,

    /// Excluded directories.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Excluded file expressions.
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Components every component may depend on.
    #[serde(default)]
    pub common_components: Vec<String>,

    /// Vendors every component may use.
    #[serde(default)]
    pub common_vendors: Vec<String>,

    /// Vendor definitions keyed by name.
    #[serde(default)]
    pub vendors: BTreeMap<String, VendorDto>,

    /// Component definitions keyed by name.
    #[serde(default)]
    pub components: BTreeMap<String, ComponentDto>,

    /// Dependency rules keyed by component name.
    #[serde(default)]
    pub deps: BTreeMap<String, RulesDto>,
}

/// TOML representation of the `[allow]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AllowDto {
    /// Every component may import any vendor.
    #[serde(default)]
    pub dep_on_any_vendor: bool,
    /// Default deep-scan flag (default: true).
    #[serde(default)]
    pub deep_scan: Option<bool>,
}

/// TOML representation of a vendor.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorDto {
    /// Import path.
    #[serde(rename = "in")]
    pub import_path: String,
}

/// TOML representation of a component.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDto {
    /// One or more source-path masks.
    #[serde(rename = "in")]
    pub local_path: MaskList,
}

/// A single mask or a list of masks.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaskList {
    /// `in = "internal/app"`
    One(String),
    /// `in = ["internal/app", "internal/app/*"]`
    Many(Vec<String>),
}

impl MaskList {
    /// Flattens into a list of masks.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(mask) => vec![mask],
            Self::Many(masks) => masks,
        }
    }
}

/// TOML representation of one component's dependency rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RulesDto {
    /// Allowed component names.
    #[serde(default)]
    pub may_depend_on: Vec<String>,
    /// Allowed vendor names.
    #[serde(default)]
    pub can_use: Vec<String>,
    /// May depend on any project component.
    #[serde(default)]
    pub any_project_deps: bool,
    /// May use any vendor.
    #[serde(default)]
    pub any_vendor_deps: bool,
    /// Deep-scan override.
    #[serde(default)]
    pub deep_scan: Option<bool>,
}

fn default_version() -> u32 {
    1
}
