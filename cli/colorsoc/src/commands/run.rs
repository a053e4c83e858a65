//! Default command: assemble the SoC, write support files, optionally
//! synthesize and upload.

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use colorsoc_build::config::default_output_dir;
use colorsoc_build::{
    deploy, BuildOptions, BuildOutput, BuildReport, Builder, Probe, SocDescriptor, SystemRunner,
    ToolRunner, UploadOutcome,
};
use colorsoc_platform::parse::project_catalog;

use crate::manifest::{Settings, SocManifest};
use crate::SocArgs;

/// What a run did.
#[derive(Debug)]
pub struct RunOutcome {
    pub build: BuildOutput,
    /// Present when the bitstream was uploaded.
    pub upload: Option<UploadOutcome>,
}

/// Run against the real toolchain and process environment.
pub fn run(project_dir: &Path, manifest: Option<&SocManifest>, args: &SocArgs) -> Result<()> {
    let mut runner = SystemRunner;
    execute(project_dir, manifest, args, &mut runner, |key| {
        std::env::var_os(key)
    })?;
    Ok(())
}

/// Resolve settings, build, and deploy through `runner`, reading the
/// environment through `env`.
pub fn execute<E>(
    project_dir: &Path,
    manifest: Option<&SocManifest>,
    args: &SocArgs,
    runner: &mut dyn ToolRunner,
    env: E,
) -> Result<RunOutcome>
where
    E: Fn(&str) -> Option<OsString>,
{
    let settings = Settings::resolve(args, manifest, project_dir);
    debug!(?settings, "resolved settings");

    let catalog = project_catalog(project_dir).context("loading board definitions")?;
    let soc = SocDescriptor::assemble(&catalog, &settings.board, &settings.board.board_variant)
        .context("assembling SoC")?;

    // A misconfigured probe must fail before the toolchain starts.
    if settings.load {
        Probe::classify(&settings.cable, &env).context("configuring probe")?;
    }

    let output_directory = settings
        .output_dir
        .clone()
        .unwrap_or_else(|| project_dir.join(default_output_dir(&soc.build_name)));
    let options = BuildOptions {
        output_directory,
        toolchain_options: settings.toolchain.clone(),
        run_synthesis: settings.build,
    };

    let build = Builder::new(&mut *runner)
        .build(&soc, &options)
        .with_context(|| format!("building {}", soc.build_name))?;
    println!("{}", BuildReport::new(&soc, &options, &build));

    let upload = if settings.load {
        info!(cable = %settings.cable, loader = %settings.loader, "loading bitstream");
        let outcome = deploy(
            &build.artifact,
            &settings.cable,
            &settings.loader,
            &env,
            runner,
        )
        .context("loading bitstream")?;
        Some(outcome)
    } else {
        None
    };

    Ok(RunOutcome { build, upload })
}
