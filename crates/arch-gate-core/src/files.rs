//! Project file enumeration and file → component ownership.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::spec::model::{ComponentName, Spec};

/// Errors from enumerating project files.
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Directory walk failed.
    #[error("failed to walk {root}: {source}")]
    Walk {
        /// Directory being walked.
        root: PathBuf,
        /// Walk error.
        source: ignore::Error,
    },
}

/// A project file and the component owning it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Absolute file path.
    pub path: PathBuf,
    /// Owning component; `None` for files outside every component.
    pub component: Option<ComponentName>,
}

/// Enumerates every tracked project file with its owner.
pub trait ProjectFilesResolver: Send + Sync {
    /// Lists project files for `spec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be enumerated.
    fn project_files(&self, spec: &Spec) -> Result<Vec<ProjectFile>, FilesError>;
}

/// Walks `root/workdir` on disk.
///
/// A file belongs to the component whose resolved package directory is the
/// file's parent directory. Excluded directories and files matching an
/// excluded expression are skipped entirely.
#[derive(Debug, Clone)]
pub struct WalkProjectFilesResolver {
    respect_gitignore: bool,
}

impl Default for WalkProjectFilesResolver {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
        }
    }
}

impl WalkProjectFilesResolver {
    /// Creates a resolver that honors `.gitignore`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `.gitignore` files are honored (default: true).
    #[must_use]
    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Maps each package directory to its owner.
    ///
    /// A directory claimed by several components goes to the first one in
    /// name order.
    fn package_owners(spec: &Spec) -> HashMap<&Path, &ComponentName> {
        let mut owners: HashMap<&Path, &ComponentName> = HashMap::new();
        for (name, component) in spec.components() {
            for package in component.resolved_paths() {
                if let Some(existing) = owners.get(package.abs_path.as_path()) {
                    if *existing != name {
                        warn!(
                            "Directory {} claimed by '{}' and '{}', keeping '{}'",
                            package.local_path, existing, name, existing
                        );
                    }
                    continue;
                }
                owners.insert(package.abs_path.as_path(), name);
            }
        }
        owners
    }
}

impl ProjectFilesResolver for WalkProjectFilesResolver {
    fn project_files(&self, spec: &Spec) -> Result<Vec<ProjectFile>, FilesError> {
        let scope = spec.analyse_scope();
        let owners = Self::package_owners(spec);

        let mut builder = ignore::WalkBuilder::new(&scope);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry.map_err(|e| FilesError::Walk {
                root: scope.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if is_excluded(spec, path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            let component = path
                .parent()
                .and_then(|dir| owners.get(dir))
                .map(|name| (*name).clone());
            files.push(ProjectFile {
                path: path.to_path_buf(),
                component,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// Tests whether `path` is inside an excluded directory or matches an
/// excluded file expression.
#[must_use]
pub fn is_excluded(spec: &Spec, path: &Path) -> bool {
    if spec
        .excluded_paths()
        .iter()
        .any(|excluded| path.starts_with(&excluded.abs_path))
    {
        return true;
    }
    let path_str = path.to_string_lossy();
    spec.excluded_files()
        .iter()
        .any(|matcher| matcher.is_match(&path_str))
}

/// Read-only mapping from absolute file path to owning component.
///
/// Built once per check run. Files absent from the index are untracked
/// (standard library or vendored code).
#[derive(Debug, Clone, Default)]
pub struct FileComponentIndex {
    files: HashMap<PathBuf, ComponentName>,
}

impl FileComponentIndex {
    /// Builds the index; files without an owner are not indexed.
    #[must_use]
    pub fn from_project_files(files: impl IntoIterator<Item = ProjectFile>) -> Self {
        let files = files
            .into_iter()
            .filter_map(|f| f.component.map(|c| (f.path, c)))
            .collect();
        Self { files }
    }

    /// Enumerates files through `resolver` and indexes them.
    ///
    /// # Errors
    ///
    /// Propagates enumeration failures.
    pub fn build<R: ProjectFilesResolver + ?Sized>(
        resolver: &R,
        spec: &Spec,
    ) -> Result<Self, FilesError> {
        let files = resolver.project_files(spec)?;
        let index = Self::from_project_files(files);
        debug!("Indexed {} tracked files", index.len());
        Ok(index)
    }

    /// Returns the component owning `path`, if tracked.
    #[must_use]
    pub fn component_of(&self, path: &Path) -> Option<&ComponentName> {
        self.files.get(path)
    }

    /// Returns the number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
