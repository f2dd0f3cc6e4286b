//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# nsdep configuration

# Set to false to skip analysis for this project
is_enabled = true

# Let A.B.C reference A.B and A without an explicit rule
child_can_depend_on_parent_implicitly = false

# Stop reporting after this many illegal dependencies
max_issue_count = 100

# Severity of reported dependencies: "info", "warning" or "error"
severity = "warning"

# Backoff between attempts to reach the analyzer service, in milliseconds
retry_backoff_ms = [100, 1000, 5000]

# Rules are a target pattern, or a { from, to } pair.
# Patterns: "*", "A.B" (exact) or "A.B.*" (strict descendants).
# Anything not allowed is illegal; disallowed rules override allowed ones.
allowed = [
    # "MyApp.*",
    # { from = "MyApp.Web.*", to = "MyApp.Domain.*" },
]

disallowed = [
    # { from = "MyApp.Domain.*", to = "MyApp.Web.*" },
]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("nsdep.toml");
    write_config(config_path, force)?;

    println!("Created nsdep.toml");
    println!("\nNext steps:");
    println!("  1. Edit nsdep.toml to configure allowed and disallowed dependencies");
    println!("  2. Run: nsdep check <FILES>...");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}
