//! Error taxonomy for descriptor assembly, build and deploy.
//!
//! None of these are retried. Build and deploy errors that stem from a failed
//! external process carry that process's exit code so the CLI can exit with it.

use std::path::PathBuf;

use colorsoc_platform::PlatformError;
use thiserror::Error;

/// Invalid or incomplete configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(
        "{region} size {size:#x} must be a non-zero power of two and a multiple of {granularity} bytes"
    )]
    MemorySize {
        region: &'static str,
        size: u64,
        granularity: u64,
    },

    #[error("{region} of {size:#x} bytes overlaps {other}")]
    MemoryOverlap {
        region: &'static str,
        size: u64,
        other: &'static str,
    },

    #[error(
        "system clock of {requested_hz} Hz cannot be derived from '{clock}' ({available_hz} Hz); \
         the clock/reset generator has no PLL"
    )]
    ClockMismatch {
        requested_hz: u64,
        clock: String,
        available_hz: u64,
    },

    #[error("environment variable {name} must be set to use the '{probe}' probe")]
    MissingEnvironmentVariable { name: String, probe: String },

    #[error("unknown toolchain option '{name}' (known options: {})", known.join(", "))]
    UnknownToolchainOption {
        name: String,
        known: &'static [&'static str],
    },

    #[error("toolchain option '{name}' expects {expected}, got '{value}'")]
    InvalidToolchainOption {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// Failure while materializing support files or running synthesis.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} not found in PATH")]
    ToolNotFound { tool: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with {}", describe_code(*code))]
    ToolchainFailed { tool: String, code: Option<i32> },

    #[error("toolchain finished but no bitstream was written to {}", path.display())]
    BitstreamMissing { path: PathBuf },
}

impl BuildError {
    /// Process exit code reflecting this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::ToolchainFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Failure while uploading a bitstream.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("bitstream {} does not exist (build it first with --build)", path.display())]
    BitstreamNotFound { path: PathBuf },

    #[error("{tool} not found in PATH")]
    ToolNotFound { tool: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed with {}", describe_code(*code))]
    UploadFailed { tool: String, code: Option<i32> },
}

impl DeployError {
    /// Process exit code reflecting this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::UploadFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
