//! `colorsoc clean`: remove build output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::manifest::SocManifest;

/// Directory removed when no output directory is given.
pub const DEFAULT_BUILD_ROOT: &str = "build";

/// Remove the output directory: `output_dir` if given, else the manifest's
/// `[build] output-dir`, else `build/` under the project directory.
pub fn run(
    project_dir: &Path,
    manifest: Option<&SocManifest>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let target: PathBuf = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => manifest
            .and_then(|m| m.build.output_dir.as_ref())
            .map(|dir| project_dir.join(dir))
            .unwrap_or_else(|| project_dir.join(DEFAULT_BUILD_ROOT)),
    };

    if target.exists() {
        fs::remove_dir_all(&target)
            .with_context(|| format!("removing {}", target.display()))?;
        println!("Removed {}", target.display());
    } else {
        println!("Already clean: {} does not exist", target.display());
    }
    Ok(())
}
