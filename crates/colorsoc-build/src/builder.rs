//! Build orchestration: support files, then the Trellis flow.
//!
//! [`Builder::build`] always writes the support files. With
//! `run_synthesis` set it then runs yosys, nextpnr-ecp5 and ecppack in the
//! gateware directory, stopping at the first failure. Tool output passes
//! through unmodified and partially written output is left in place.
//!
//! Concurrent builds against the same output directory are not safe: callers
//! must serialize them. There is no timeout or cancellation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::runner::ToolRunner;
use crate::soc::SocDescriptor;
use crate::support::render_all;
use crate::toolchain::TrellisSettings;

/// Where the bitstream lives (or will live) for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitstreamArtifact {
    pub path: PathBuf,
    pub build_name: String,
}

impl BitstreamArtifact {
    /// The deterministic bitstream location for `build_name` under `options`.
    pub fn locate(options: &BuildOptions, build_name: &str) -> Self {
        Self {
            path: options.gateware_dir().join(format!("{build_name}.bit")),
            build_name: build_name.to_string(),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// A written support file and its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportFile {
    pub path: PathBuf,
    /// Lowercase hex digest of the contents.
    pub sha256: String,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub artifact: BitstreamArtifact,
    pub support_files: Vec<SupportFile>,
    /// Whether the synthesis toolchain ran.
    pub synthesized: bool,
    pub duration: Duration,
}

/// Drives the build for one descriptor.
pub struct Builder<'a> {
    runner: &'a mut dyn ToolRunner,
}

impl<'a> Builder<'a> {
    pub fn new(runner: &'a mut dyn ToolRunner) -> Self {
        Self { runner }
    }

    /// Write support files and, if requested, run synthesis.
    pub fn build(
        &mut self,
        soc: &SocDescriptor,
        options: &BuildOptions,
    ) -> Result<BuildOutput, BuildError> {
        let start = Instant::now();
        let settings = TrellisSettings::from_options(&options.toolchain_options)?;
        let artifact = BitstreamArtifact::locate(options, &soc.build_name);

        let support_files = write_support_files(soc, &settings, options)?;
        info!(
            build_name = %soc.build_name,
            files = support_files.len(),
            dir = %options.output_directory.display(),
            "wrote support files"
        );

        if options.run_synthesis {
            let gateware = options.gateware_dir();
            for invocation in settings.invocations(soc, &gateware) {
                info!(tool = %invocation.program, "running");
                let exit = self
                    .runner
                    .run(&invocation)
                    .map_err(|e| spawn_error(&invocation.program, e))?;
                if !exit.success() {
                    return Err(BuildError::ToolchainFailed {
                        tool: invocation.program.clone(),
                        code: exit.code,
                    });
                }
            }
            if !artifact.exists() {
                return Err(BuildError::BitstreamMissing {
                    path: artifact.path,
                });
            }
            info!(bitstream = %artifact.path.display(), "synthesis complete");
        } else {
            debug!("synthesis not requested");
        }

        Ok(BuildOutput {
            artifact,
            support_files,
            synthesized: options.run_synthesis,
            duration: start.elapsed(),
        })
    }
}

fn write_support_files(
    soc: &SocDescriptor,
    settings: &TrellisSettings,
    options: &BuildOptions,
) -> Result<Vec<SupportFile>, BuildError> {
    let rendered = render_all(soc, settings, options).map_err(|e| BuildError::Io {
        path: options.output_directory.clone(),
        source: e.into(),
    })?;

    let mut written = Vec::with_capacity(rendered.len());
    for file in rendered {
        if let Some(parent) = file.path.parent() {
            create_dir(parent)?;
        }
        fs::write(&file.path, &file.contents).map_err(|source| BuildError::Io {
            path: file.path.clone(),
            source,
        })?;
        debug!(path = %file.path.display(), bytes = file.contents.len(), "wrote");
        written.push(SupportFile {
            sha256: sha256_hex(file.contents.as_bytes()),
            path: file.path,
        });
    }
    Ok(written)
}

fn create_dir(dir: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn spawn_error(tool: &str, err: io::Error) -> BuildError {
    if err.kind() == io::ErrorKind::NotFound {
        BuildError::ToolNotFound {
            tool: tool.to_string(),
        }
    } else {
        BuildError::Spawn {
            tool: tool.to_string(),
            source: err,
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
