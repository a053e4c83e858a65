//! `colorsoc doctor`: toolchain diagnostics.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;

use colorsoc_build::toolchain::{ECPPACK, NEXTPNR, YOSYS};
use colorsoc_build::{DEFAULT_LOADER, QUARTUS_ENV};
use colorsoc_platform::parse::discover_boards;

use crate::manifest::SocManifest;

/// A program to probe and the arguments that make it print its version.
type Tool<'a> = (&'a str, &'a [&'a str]);

const TRELLIS: [Tool<'static>; 3] = [
    (YOSYS, &["-V"]),
    (NEXTPNR, &["--version"]),
    (ECPPACK, &["--help"]),
];

/// Print toolchain diagnostic information.
pub fn run(project_dir: &Path) -> Result<()> {
    let manifest = SocManifest::find_and_load(project_dir);
    let loader = match &manifest {
        Ok(Some((manifest, _))) => manifest.load.loader.clone(),
        _ => None,
    };
    let loader = loader.as_deref().unwrap_or(DEFAULT_LOADER);
    print!(
        "{}",
        render(
            project_dir,
            &manifest,
            &TRELLIS,
            (loader, &["--Version"]),
            std::env::var_os(QUARTUS_ENV),
        )
    );
    Ok(())
}

fn render(
    project_dir: &Path,
    manifest: &Result<Option<(SocManifest, PathBuf)>>,
    toolchain: &[Tool<'_>],
    loader: Tool<'_>,
    quartus: Option<OsString>,
) -> String {
    let mut out = String::new();
    out.push_str("=== colorsoc doctor ===\n\n");
    out.push_str(&format!(
        "colorsoc version: {}\n\n",
        env!("CARGO_PKG_VERSION")
    ));

    out.push_str("--- Trellis Toolchain ---\n");
    for (name, args) in toolchain {
        out.push_str(&tool_status(name, args));
    }
    out.push('\n');

    out.push_str("--- Loader ---\n");
    out.push_str(&tool_status(loader.0, loader.1));
    match quartus {
        Some(path) if !path.is_empty() => out.push_str(&format!(
            "  {QUARTUS_ENV}: {}\n",
            Path::new(&path).display()
        )),
        _ => out.push_str(&format!(
            "  {QUARTUS_ENV}: not set (required for the usb-blaster probe)\n"
        )),
    }
    out.push('\n');

    out.push_str("--- Project Status ---\n");
    match manifest {
        Ok(Some((manifest, dir))) => {
            out.push_str(&format!("  soc.toml: found at {}\n", dir.display()));
            if let Some(ref board) = manifest.soc.board {
                out.push_str(&format!("  Board:    {board}\n"));
            }
            if let Some(ref revision) = manifest.soc.revision {
                out.push_str(&format!("  Revision: {revision}\n"));
            }
        }
        Ok(None) => out.push_str("  soc.toml: not found\n"),
        Err(e) => out.push_str(&format!("  soc.toml: error: {e:#}\n")),
    }
    match discover_boards(project_dir) {
        Ok(boards) if boards.is_empty() => out.push_str("  Custom boards: none\n"),
        Ok(boards) => {
            let names: Vec<&str> = boards.iter().map(|(name, _)| name.as_str()).collect();
            out.push_str(&format!("  Custom boards: {}\n", names.join(", ")));
        }
        Err(e) => out.push_str(&format!("  Custom boards: error: {e}\n")),
    }
    out
}

fn tool_status(name: &str, args: &[&str]) -> String {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first_line = stdout
                .lines()
                .chain(stderr.lines())
                .find(|l| !l.trim().is_empty())
                .unwrap_or("(unknown version)");
            format!("  {name}: {first_line}\n")
        }
        Err(_) => format!("  {name}: not found\n"),
    }
}
