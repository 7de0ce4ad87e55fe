//! Components command: shows how the rule document was resolved.

use anyhow::Result;
use arch_gate_core::Spec;
use std::fmt::Write as _;
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Runs the components command.
pub fn run(path: &Path, source: &ConfigSource) -> Result<()> {
    let spec = super::load_spec(path, source)?;
    print!("{}", describe(&spec));
    Ok(())
}

/// Renders every component with its packages and allowed imports.
fn describe(spec: &Spec) -> String {
    let mut out = String::new();
    for (name, component) in spec.components() {
        let scan = if component.deep_scan() { "" } else { " (deep scan off)" };
        let _ = writeln!(out, "{name}{scan}");

        for package in component.resolved_paths() {
            let _ = writeln!(out, "  in      {}", package.local_path);
        }
        if component.rule().any_project_deps {
            let _ = writeln!(out, "  allows  any project package");
        }
        for allowed in component.allowed_imports() {
            let _ = writeln!(out, "  allows  {}", allowed.import_path);
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} component(s), {} vendor(s)",
        spec.components().len(),
        spec.vendors().len()
    );
    out
}
