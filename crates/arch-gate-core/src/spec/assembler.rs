//! Assembly of a validated [`Document`] into a checkable [`Spec`].

use std::path::Path;

use tracing::{debug, info};

use crate::paths::{clean, GlobPathResolver, PathResolver};

use super::allowed_imports::{AllowedImportResolver, AssembleError};
use super::model::{Component, ComponentDef, DependencyRule, Document, ResolvedPath, Spec};

/// Assembles `document` for the project at `root`, resolving masks on disk.
///
/// # Errors
///
/// Fails when `root` is relative, or on the first component whose masks,
/// or whose allowed components' masks, resolve to nothing.
pub fn assemble(document: &Document, root: &Path) -> Result<Spec, AssembleError> {
    let resolver = GlobPathResolver::new(root, document.workdir(), document.module());
    assemble_with(document, root, &resolver)
}

/// Assembles `document` with a caller-supplied path resolver.
///
/// # Errors
///
/// See [`assemble`].
pub fn assemble_with<R: PathResolver + ?Sized>(
    document: &Document,
    root: &Path,
    resolver: &R,
) -> Result<Spec, AssembleError> {
    if !root.is_absolute() {
        return Err(AssembleError::RelativeRoot {
            root: root.to_path_buf(),
        });
    }
    info!(
        "Assembling {} components, {} vendors",
        document.components().len(),
        document.vendors().len()
    );

    let allowed = AllowedImportResolver::new(root, resolver);
    let mut spec = Spec::new(root)
        .with_workdir(document.workdir())
        .with_module(document.module())
        .with_options(document.options());

    for vendor in document.vendors().values() {
        spec = spec.with_vendor(vendor.clone());
    }

    let scope = root.join(document.workdir());
    for excluded in document.exclude() {
        let abs = clean(&scope.join(excluded));
        let local = abs
            .strip_prefix(root)
            .map(crate::paths::slash_path)
            .unwrap_or_else(|_| excluded.clone());
        spec = spec.with_excluded_path(ResolvedPath::new(local.clone(), local, abs));
    }

    for matcher in document.exclude_files() {
        spec = spec.with_excluded_file(matcher.clone());
    }

    for definition in document.components().values() {
        let component = assemble_component(document, definition, resolver, &allowed).map_err(
            |e| AssembleError::Component {
                component: definition.name().clone(),
                source: Box::new(e),
            },
        )?;
        spec = spec.with_component(component);
    }

    Ok(spec)
}

fn assemble_component<R: PathResolver + ?Sized>(
    document: &Document,
    definition: &ComponentDef,
    resolver: &R,
    allowed: &AllowedImportResolver<'_, R>,
) -> Result<Component, AssembleError> {
    let mut resolved_paths = Vec::new();
    for mask in definition.masks() {
        let resolved =
            resolver
                .resolve_local_path(mask)
                .map_err(|e| AssembleError::UnresolvedMask {
                    mask: mask.clone(),
                    source: e,
                })?;
        resolved_paths.extend(resolved);
    }

    let rule = document
        .dependency_rule(definition.name())
        .cloned()
        .unwrap_or_else(DependencyRule::default);
    let deep_scan = rule.deep_scan.unwrap_or(document.options().deep_scan);
    let allowed_imports = allowed.assemble(document, &rule.may_depend_on, &rule.can_use)?;

    debug!(
        "Component '{}': {} packages, {} allowed imports, deep scan {}",
        definition.name(),
        resolved_paths.len(),
        allowed_imports.len(),
        if deep_scan { "on" } else { "off" }
    );

    Ok(Component::new(
        definition.name().clone(),
        definition.masks().to_vec(),
        resolved_paths,
        deep_scan,
        rule,
        allowed_imports,
    ))
}
