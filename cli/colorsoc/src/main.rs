//! colorsoc CLI: build and deploy a LiteX RISC-V test SoC on Colorlight boards.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colorsoc_build::config::parse_size;
use colorsoc_build::{BuildError, CpuType, DeployError, ToolchainOptions};
use manifest::SocManifest;

#[derive(Parser)]
#[command(
    name = "colorsoc",
    version,
    about = "LiteX RISC-V test SoC on the Colorlight 5A-75E/5A-75B",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    soc: SocArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Board, SoC, Trellis and deploy options for the default run.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SocArgs {
    /// Board variant (5A-75E or 5A-75B)
    #[arg(long)]
    pub board: Option<String>,
    /// Board revision
    #[arg(long)]
    pub revision: Option<String>,
    /// Soft CPU (vexriscv, picorv32, serv, femtorv, minerva)
    #[arg(long)]
    pub cpu_type: Option<CpuType>,
    /// System clock frequency in Hz (e.g. 25000000 or 25e6)
    #[arg(long, value_parser = parse_frequency)]
    pub sys_clk_freq: Option<u64>,
    /// Integrated ROM size in bytes
    #[arg(long, value_parser = parse_size)]
    pub integrated_rom_size: Option<u64>,
    /// Integrated main RAM size in bytes
    #[arg(long, value_parser = parse_size)]
    pub integrated_main_ram_size: Option<u64>,
    /// Output directory (default: build/<platform name>)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Use Yosys's nowidelut mode
    #[arg(long)]
    pub yosys_nowidelut: bool,
    /// Use Yosys's abc9 mode
    #[arg(long)]
    pub yosys_abc9: bool,
    /// Fail place-and-route on timing violations
    #[arg(long)]
    pub nextpnr_timingstrict: bool,
    /// Ignore combinational loops in timing analysis
    #[arg(long)]
    pub nextpnr_ignoreloops: bool,
    /// Placement seed
    #[arg(long)]
    pub nextpnr_seed: Option<u32>,
    /// Next bitstream address for multiboot
    #[arg(long)]
    pub ecppack_bootaddr: Option<String>,
    /// SPI flash mode (fast-read, dual-spi, qspi)
    #[arg(long)]
    pub ecppack_spimode: Option<String>,
    /// SPI flash clock frequency in MHz
    #[arg(long)]
    pub ecppack_freq: Option<String>,
    /// Compress the bitstream
    #[arg(long)]
    pub ecppack_compress: bool,
    /// Extra toolchain option as KEY=VALUE (repeatable)
    #[arg(long = "toolchain-option", value_parser = ToolchainOptions::parse_pair)]
    pub toolchain_option: Vec<(String, String)>,

    /// Run synthesis and produce a bitstream
    #[arg(long)]
    pub build: bool,
    /// Upload the bitstream to the board
    #[arg(long)]
    pub load: bool,
    /// JTAG probe (ft232RL, usb-blaster, or any openFPGALoader cable name)
    #[arg(long)]
    pub cable: Option<String>,
}

impl SocArgs {
    /// Toolchain options given on the command line.
    pub fn toolchain_options(&self) -> ToolchainOptions {
        let mut options: ToolchainOptions = self.toolchain_option.iter().cloned().collect();
        for (enabled, name) in [
            (self.yosys_nowidelut, "yosys-nowidelut"),
            (self.yosys_abc9, "yosys-abc9"),
            (self.nextpnr_timingstrict, "nextpnr-timingstrict"),
            (self.nextpnr_ignoreloops, "nextpnr-ignoreloops"),
            (self.ecppack_compress, "ecppack-compress"),
        ] {
            if enabled {
                options.enable(name);
            }
        }
        if let Some(seed) = self.nextpnr_seed {
            options.set("nextpnr-seed", seed.to_string());
        }
        for (value, name) in [
            (&self.ecppack_bootaddr, "ecppack-bootaddr"),
            (&self.ecppack_spimode, "ecppack-spimode"),
            (&self.ecppack_freq, "ecppack-freq"),
        ] {
            if let Some(value) = value {
                options.set(name, value.as_str());
            }
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage board definitions
    Boards {
        #[command(subcommand)]
        action: BoardsAction,
    },
    /// Check toolchain, loader and project status
    Doctor,
    /// Remove the build output directory
    Clean {
        /// Output directory to remove (default: build/)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BoardsAction {
    /// List built-in and custom boards
    List,
    /// Show details of a board revision
    Describe {
        /// Board variant (e.g. 5A-75E) or platform name
        name: String,
        /// Board revision (default: 6.0)
        #[arg(long)]
        revision: Option<String>,
        /// Output format (default: human-readable, "toml" for TOML)
        #[arg(long)]
        format: Option<String>,
    },
    /// Add a custom board definition
    Add {
        /// Board name
        name: String,
    },
    /// Validate a custom board definition
    Validate {
        /// Board name
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(exit_code(&e));
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Exit with the failing external process's code where there is one.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<BuildError>() {
        return e.exit_code();
    }
    if let Some(e) = err.downcast_ref::<DeployError>() {
        return e.exit_code();
    }
    1
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        None => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::run::run(&project_dir, manifest.as_ref(), &cli.soc)
        }

        Some(Commands::Boards { action }) => {
            let (_, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            match action {
                BoardsAction::List => commands::boards::list(&project_dir),
                BoardsAction::Describe {
                    name,
                    revision,
                    format,
                } => commands::boards::describe(
                    &project_dir,
                    &name,
                    revision.as_deref(),
                    format.as_deref(),
                ),
                BoardsAction::Add { name } => commands::boards::add(&project_dir, &name),
                BoardsAction::Validate { name } => commands::boards::validate(&project_dir, &name),
            }
        }

        Some(Commands::Doctor) => {
            let (_, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::doctor::run(&project_dir)
        }

        Some(Commands::Clean { output_dir }) => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::clean::run(&project_dir, manifest.as_ref(), output_dir.as_deref())
        }
    }
}

/// Try to load a manifest from the current directory upward. Returns (None, None) if not found.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(Option<SocManifest>, Option<PathBuf>)> {
    match SocManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), Some(dir))),
        None => Ok((None, None)),
    }
}

/// Parse a frequency in Hz, accepting plain integers and float notation like `25e6`.
fn parse_frequency(s: &str) -> Result<u64, String> {
    let s = s.trim().replace('_', "");
    if let Ok(hz) = s.parse::<u64>() {
        return Ok(hz);
    }
    match s.parse::<f64>() {
        Ok(hz) if hz.is_finite() && hz > 0.0 && hz.fract() == 0.0 && hz <= u64::MAX as f64 => {
            Ok(hz as u64)
        }
        _ => Err(format!("invalid frequency '{s}'")),
    }
}
