//! DTO → Domain model conversion with validation.

use regex::Regex;
use std::path::PathBuf;

use super::config_dto::{DocumentDto, RulesDto};
use super::model::{
    ComponentDef, ComponentName, DependencyRule, Document, DocumentParts, ModelError, Options,
    Vendor, VendorName,
};

/// Highest document version this loader understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A field-level validation error.
    #[error("{context}: {source}")]
    Validation {
        /// Where the error occurred (e.g., "components.app").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// The document declares a version this loader does not support.
    #[error("unsupported document version {version}, expected 1")]
    UnsupportedVersion {
        /// The declared version.
        version: u32,
    },

    /// Cross-reference errors from document construction.
    #[error("rule document validation errors:\n{}", format_errors(.0))]
    CrossRef(Vec<ModelError>),
}

fn format_errors(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a `DocumentDto` to a validated `Document`.
///
/// # Errors
///
/// Returns the first field-level error, or every cross-reference error.
pub fn load(dto: DocumentDto) -> Result<Document, LoadError> {
    if dto.version != SUPPORTED_VERSION {
        return Err(LoadError::UnsupportedVersion {
            version: dto.version,
        });
    }

    let vendors = dto
        .vendors
        .into_iter()
        .map(|(name, v)| {
            let name = vendor_name(&name, "vendors")?;
            Ok(Vendor::new(name, v.import_path))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let components = dto
        .components
        .into_iter()
        .map(|(name, c)| {
            let name = component_name(&name, "components")?;
            Ok(ComponentDef::new(name, c.local_path.into_vec()))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let dependencies = dto
        .deps
        .into_iter()
        .map(|(name, rules)| {
            let owner = component_name(&name, "deps")?;
            let rule = convert_rules(&owner, rules)?;
            Ok((owner, rule))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let exclude_files = dto
        .exclude_files
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            Regex::new(pattern).map_err(|e| LoadError::Validation {
                context: format!("exclude-files[{i}]"),
                source: ModelError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let common_components = dto
        .common_components
        .iter()
        .map(|name| component_name(name, "common-components"))
        .collect::<Result<Vec<_>, _>>()?;

    let common_vendors = dto
        .common_vendors
        .iter()
        .map(|name| vendor_name(name, "common-vendors"))
        .collect::<Result<Vec<_>, _>>()?;

    let parts = DocumentParts {
        workdir: PathBuf::from(dto.workdir.unwrap_or_default()),
        module: dto.module.trim_end_matches('/').to_string(),
        options: Options {
            dep_on_any_vendor: dto.allow.dep_on_any_vendor,
            deep_scan: dto.allow.deep_scan.unwrap_or(true),
        },
        exclude: dto.exclude,
        exclude_files,
        vendors,
        components,
        dependencies,
        common_components,
        common_vendors,
    };

    Document::new(parts).map_err(LoadError::CrossRef)
}

fn convert_rules(owner: &ComponentName, dto: RulesDto) -> Result<DependencyRule, LoadError> {
    let ctx = format!("deps.{owner}");

    let may_depend_on = dto
        .may_depend_on
        .iter()
        .map(|name| component_name(name, &format!("{ctx}.may-depend-on")))
        .collect::<Result<Vec<_>, _>>()?;

    let can_use = dto
        .can_use
        .iter()
        .map(|name| vendor_name(name, &format!("{ctx}.can-use")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DependencyRule {
        may_depend_on,
        can_use,
        any_project_deps: dto.any_project_deps,
        any_vendor_deps: dto.any_vendor_deps,
        deep_scan: dto.deep_scan,
    })
}

fn component_name(name: &str, context: &str) -> Result<ComponentName, LoadError> {
    ComponentName::new(name).map_err(|e| LoadError::Validation {
        context: context.to_string(),
        source: e,
    })
}

fn vendor_name(name: &str, context: &str) -> Result<VendorName, LoadError> {
    VendorName::new(name).map_err(|e| LoadError::Validation {
        context: context.to_string(),
        source: e,
    })
}
