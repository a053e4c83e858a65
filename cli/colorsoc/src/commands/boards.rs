//! `colorsoc boards`: board catalog commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use colorsoc_build::config::DEFAULT_REVISION;
use colorsoc_platform::parse::{
    check_board_name, discover_boards, generate_template, load_platform_toml, platform_to_toml,
    project_catalog, validate_platform,
};
use colorsoc_platform::{Platform, PlatformCatalog};

fn board_path(project_dir: &Path, name: &str) -> Result<PathBuf> {
    check_board_name(name)?;
    Ok(project_dir.join("boards").join(format!("{name}.board.toml")))
}

/// List built-in boards and any custom boards in the project.
pub fn list(project_dir: &Path) -> Result<()> {
    let builtin = PlatformCatalog::builtin();
    println!("Built-in boards:");
    println!();
    for platform in builtin.boards() {
        println!(
            "  {:<24} {:<8} {:<6} {}",
            platform.name, platform.variant, platform.revision, platform.description
        );
    }

    let custom = discover_boards(project_dir)?;
    if !custom.is_empty() {
        println!();
        println!("Custom boards (boards/):");
        println!();
        for (name, path) in &custom {
            match load_platform_toml(path) {
                Ok(platform) => println!(
                    "  {:<24} {:<8} {:<6} {}",
                    name, platform.variant, platform.revision, platform.description
                ),
                Err(e) => println!("  {name:<24} (invalid: {e})"),
            }
        }
    }

    println!();
    println!("Use 'colorsoc boards describe <variant> --revision <rev>' for details.");
    Ok(())
}

/// Find a board by platform name, or by variant and revision.
fn find<'a>(catalog: &'a PlatformCatalog, name: &str, revision: Option<&str>) -> Result<&'a Platform> {
    if revision.is_none() {
        if let Some(platform) = catalog.by_name(name) {
            return Ok(platform);
        }
    }
    let platform = catalog.lookup(name, revision.unwrap_or(DEFAULT_REVISION))?;
    Ok(platform)
}

/// Describe a board revision in detail.
pub fn describe(
    project_dir: &Path,
    name: &str,
    revision: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let catalog = project_catalog(project_dir).context("loading board definitions")?;
    let platform = find(&catalog, name, revision)?;

    if format == Some("toml") {
        print!("{}", platform_to_toml(platform)?);
        return Ok(());
    }

    println!("=== Board: {} ===", platform.name);
    println!("{}", platform.description);
    println!();

    println!("--- Device ---");
    println!("  Variant:      {}", platform.variant);
    println!("  Revision:     {}", platform.revision);
    println!("  FPGA:         {}", platform.device);
    println!(
        "  nextpnr:      --{} --package {} --speed {}",
        platform.architecture, platform.package, platform.speed_grade
    );
    println!();

    println!("--- Pins ---");
    let clock = &platform.clock;
    println!(
        "  {:<12} {:<4} {} ({} MHz)",
        clock.name,
        clock.site,
        clock.io_standard,
        clock.frequency_mhz()
    );
    if let Some(ref led) = platform.user_led {
        println!("  {:<12} {:<4} {}", led.name, led.site, led.io_standard);
    }
    println!();

    println!("--- Memory ---");
    println!(
        "  Size granularity: {} bytes",
        platform.memory_granularity_bytes
    );

    Ok(())
}

/// Write a template `boards/<name>.board.toml`.
pub fn add(project_dir: &Path, name: &str) -> Result<()> {
    let path = board_path(project_dir, name)?;
    if path.exists() {
        bail!("board '{name}' already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let template = generate_template(name)?;
    fs::write(&path, template).with_context(|| format!("writing {}", path.display()))?;
    println!("Created {}", path.display());
    println!("Edit the device, pins and revision, then run 'colorsoc boards validate {name}'.");
    Ok(())
}

/// Validate `boards/<name>.board.toml`.
pub fn validate(project_dir: &Path, name: &str) -> Result<()> {
    let path = board_path(project_dir, name)?;
    let platform = load_platform_toml(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    match validate_platform(&platform) {
        Ok(()) => {
            println!("{}: valid ({} v{})", name, platform.variant, platform.revision);
            Ok(())
        }
        Err(issues) => {
            let mut errors = 0;
            for issue in &issues {
                println!("  {}: {}", issue.severity, issue.message);
                if issue.severity == "error" {
                    errors += 1;
                }
            }
            if errors > 0 {
                bail!("{name}: {errors} error(s)");
            }
            println!("{name}: valid with {} warning(s)", issues.len());
            Ok(())
        }
    }
}
