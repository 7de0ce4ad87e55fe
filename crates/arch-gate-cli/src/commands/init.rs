//! Init command implementation.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

const CONFIG_NAME: &str = "arch-gate.toml";

const DEFAULT_CONFIG: &str = r#"# arch-gate rule document
version = 1

# Directory holding the components, relative to this file
workdir = "."

# Import path of the project root
module = "example.com/project"

# Directories never checked, relative to workdir
exclude = ["internal/legacy"]

# Regular expressions on file paths that are never checked
exclude-files = ["_test\\.go$"]

# Allowed for every component
common-components = ["models"]
common-vendors = []

[allow]
dep-on-any-vendor = false
deep-scan = true

# [vendors.errors]
# in = "github.com/pkg/errors"

[components.models]
in = "internal/models"

[components.app]
in = ["internal/app", "internal/app/*"]

[deps.app]
may-depend-on = ["models"]
# can-use = ["errors"]
# any-project-deps = false
# deep-scan = true
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = write_template(Path::new("."), force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to describe your components");
    println!("  2. Run: arch-gate components");
    println!("  3. Run: arch-gate check --usages <FILE>");

    Ok(())
}

/// Writes the template into `dir`, refusing to clobber an existing document.
fn write_template(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}
