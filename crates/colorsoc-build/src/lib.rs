//! Build and deploy orchestration for colorsoc.
//!
//! Turns a declarative SoC configuration into a set of toolchain invocations
//! and uploads the resulting bitstream:
//!
//! 1. [`SocDescriptor::assemble`] composes platform, CPU core and clock/reset
//!    generator from a [`BoardConfig`].
//! 2. [`Builder::build`] writes build support files and, when asked, runs the
//!    Trellis flow (yosys, nextpnr-ecp5, ecppack) to produce a bitstream.
//! 3. [`deploy`] classifies the probe, derives loader arguments and runs
//!    openFPGALoader.
//!
//! Every external process goes through a [`ToolRunner`], so the whole
//! pipeline can be exercised without a toolchain installed.

pub mod builder;
pub mod config;
pub mod deploy;
pub mod error;
pub mod report;
pub mod runner;
pub mod soc;
pub mod support;
pub mod toolchain;

pub use builder::{BitstreamArtifact, BuildOutput, Builder, SupportFile};
pub use config::{BoardConfig, BuildOptions, CpuType, ToolchainOptions};
pub use deploy::{
    deploy, DeployOptions, Probe, UploadOutcome, DEFAULT_CABLE, DEFAULT_LOADER, QUARTUS_ENV,
};
pub use error::{BuildError, ConfigurationError, DeployError};
pub use report::BuildReport;
pub use runner::{Invocation, ProcessExit, SystemRunner, ToolRunner};
pub use soc::{ClockResetGenerator, CpuCore, MemoryRegion, SocDescriptor};
pub use toolchain::TrellisSettings;
