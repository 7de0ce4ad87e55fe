//! Flattening of dependency rules into concrete allowed-import sets.

use std::path::PathBuf;

use crate::paths::{PathResolveError, PathResolver};

use super::model::{ComponentName, Document, ResolvedPath, VendorName};

/// Directory holding vendored dependencies, relative to the project root.
pub const VENDOR_DIR: &str = "vendor";

/// Errors from assembling an allowed-import set.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// A component mask resolved to nothing.
    #[error("failed to resolve mask '{mask}'")]
    UnresolvedMask {
        /// The offending mask.
        mask: String,
        /// Why resolution failed.
        source: PathResolveError,
    },

    /// An allowed component is not defined.
    #[error("unknown component `{0}`")]
    UnknownComponent(ComponentName),

    /// An allowed vendor is not defined.
    #[error("unknown vendor `{0}`")]
    UnknownVendor(VendorName),

    /// The project root is not an absolute path.
    #[error("project root '{root}' must be an absolute path")]
    RelativeRoot {
        /// The rejected root.
        root: PathBuf,
    },

    /// Assembly of a specific component failed.
    #[error("component `{component}`: {source}")]
    Component {
        /// The component being assembled.
        component: ComponentName,
        /// The underlying failure.
        source: Box<AssembleError>,
    },
}

/// Turns allow-lists into resolved importable paths.
///
/// Runs once per component while the spec is assembled, never while
/// scanning.
pub struct AllowedImportResolver<'a, R: PathResolver + ?Sized> {
    root: PathBuf,
    resolver: &'a R,
}

impl<'a, R: PathResolver + ?Sized> AllowedImportResolver<'a, R> {
    /// Creates a resolver for a project rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, resolver: &'a R) -> Self {
        Self {
            root: root.into(),
            resolver,
        }
    }

    /// Resolves explicit component and vendor allow-lists, plus the
    /// document's common allowances, into a flat list.
    ///
    /// Order is deterministic: components (explicit, then common), then
    /// vendors (explicit, then common). Entries are not de-duplicated.
    ///
    /// # Errors
    ///
    /// Fails when any allowed component mask resolves to nothing, or a
    /// name is not defined in the document.
    pub fn assemble(
        &self,
        document: &Document,
        component_names: &[ComponentName],
        vendor_names: &[VendorName],
    ) -> Result<Vec<ResolvedPath>, AssembleError> {
        let mut list = Vec::new();

        let allowed_components = component_names
            .iter()
            .chain(document.common_components());
        let allowed_vendors = vendor_names.iter().chain(document.common_vendors());

        for name in allowed_components {
            let component = document
                .component(name)
                .ok_or_else(|| AssembleError::UnknownComponent(name.clone()))?;

            for mask in component.masks() {
                let resolved = self.resolver.resolve_local_path(mask).map_err(|e| {
                    AssembleError::UnresolvedMask {
                        mask: mask.clone(),
                        source: e,
                    }
                })?;
                list.extend(resolved);
            }
        }

        for name in allowed_vendors {
            let vendor = document
                .vendor(name)
                .ok_or_else(|| AssembleError::UnknownVendor(name.clone()))?;
            list.push(self.vendor_entry(vendor.import_path()));
        }

        Ok(list)
    }

    fn vendor_entry(&self, import_path: &str) -> ResolvedPath {
        let local_path = format!("{VENDOR_DIR}/{import_path}");
        let abs_path = self.root.join(&local_path);
        ResolvedPath::new(import_path, local_path, abs_path)
    }
}
