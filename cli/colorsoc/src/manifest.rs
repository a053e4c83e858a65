//! `soc.toml` manifest parsing and settings resolution.
//!
//! Precedence for every setting: command line, then manifest, then the
//! built-in default. Boolean toolchain flags can only be turned on from
//! either source.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use colorsoc_build::config::{
    DEFAULT_BOARD, DEFAULT_RAM_SIZE, DEFAULT_REVISION, DEFAULT_ROM_SIZE, DEFAULT_SYS_CLK_FREQ,
};
use colorsoc_build::{BoardConfig, CpuType, ToolchainOptions, DEFAULT_CABLE, DEFAULT_LOADER};

use crate::SocArgs;

pub const MANIFEST_FILE: &str = "soc.toml";

/// The top-level `soc.toml` structure. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocManifest {
    #[serde(default)]
    pub soc: SocSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub load: LoadSection,
}

/// `[soc]`: board and SoC core settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SocSection {
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub cpu_type: Option<CpuType>,
    #[serde(default)]
    pub sys_clk_freq: Option<u64>,
    #[serde(default)]
    pub integrated_rom_size: Option<u64>,
    #[serde(default)]
    pub integrated_main_ram_size: Option<u64>,
}

/// `[build]`: output location and toolchain options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSection {
    /// Relative paths are resolved against the manifest directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Trellis options; values may be strings, integers or booleans.
    #[serde(default)]
    pub toolchain: BTreeMap<String, toml::Value>,
}

/// `[load]`: probe and loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoadSection {
    #[serde(default)]
    pub cable: Option<String>,
    #[serde(default)]
    pub loader: Option<String>,
}

impl SocManifest {
    /// Search upward from `start_dir` for a `soc.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: SocManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing soc.toml")
    }

    /// Toolchain options from `[build.toolchain]`, values rendered as strings.
    pub fn toolchain_options(&self) -> ToolchainOptions {
        self.build
            .toolchain
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// Everything a run needs, after precedence has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub board: BoardConfig,
    /// Explicit output directory; `None` means `build/<platform name>` under
    /// the project directory.
    pub output_dir: Option<PathBuf>,
    pub toolchain: ToolchainOptions,
    pub build: bool,
    pub load: bool,
    pub cable: String,
    pub loader: String,
}

impl Settings {
    pub fn resolve(args: &SocArgs, manifest: Option<&SocManifest>, project_dir: &Path) -> Self {
        let empty = SocManifest::default();
        let manifest = manifest.unwrap_or(&empty);
        let soc = &manifest.soc;

        let board = BoardConfig {
            board_variant: pick(&args.board, &soc.board, || DEFAULT_BOARD.to_string()),
            revision: pick(&args.revision, &soc.revision, || DEFAULT_REVISION.to_string()),
            clock_frequency_hz: pick(&args.sys_clk_freq, &soc.sys_clk_freq, || {
                DEFAULT_SYS_CLK_FREQ
            }),
            cpu_type: pick(&args.cpu_type, &soc.cpu_type, CpuType::default),
            rom_size_bytes: pick(&args.integrated_rom_size, &soc.integrated_rom_size, || {
                DEFAULT_ROM_SIZE
            }),
            ram_size_bytes: pick(
                &args.integrated_main_ram_size,
                &soc.integrated_main_ram_size,
                || DEFAULT_RAM_SIZE,
            ),
        };

        let output_dir = args.output_dir.clone().or_else(|| {
            manifest
                .build
                .output_dir
                .as_ref()
                .map(|dir| project_dir.join(dir))
        });

        let mut toolchain = manifest.toolchain_options();
        toolchain.merge(&args.toolchain_options());

        Self {
            board,
            output_dir,
            toolchain,
            build: args.build,
            load: args.load,
            cable: pick(&args.cable, &manifest.load.cable, || DEFAULT_CABLE.to_string()),
            loader: manifest
                .load
                .loader
                .clone()
                .unwrap_or_else(|| DEFAULT_LOADER.to_string()),
        }
    }
}

fn pick<T: Clone>(cli: &Option<T>, manifest: &Option<T>, default: impl FnOnce() -> T) -> T {
    cli.clone()
        .or_else(|| manifest.clone())
        .unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[soc]
board = "5A-75B"
revision = "8.0"
cpu-type = "picorv32"
sys-clk-freq = 25000000
integrated-rom-size = 65536
integrated-main-ram-size = 16384

[build]
output-dir = "build/custom"

[build.toolchain]
nextpnr-seed = 7
yosys-abc9 = true
ecppack-spimode = "qspi"

[load]
cable = "usb-blaster"
loader = "/opt/ofl/openFPGALoader"
"#;

    #[test]
    fn parse_full_manifest() {
        let manifest = SocManifest::from_str(FULL).unwrap();
        assert_eq!(manifest.soc.board.as_deref(), Some("5A-75B"));
        assert_eq!(manifest.soc.cpu_type, Some(CpuType::PicoRv32));
        assert_eq!(manifest.soc.integrated_rom_size, Some(65536));
        assert_eq!(manifest.load.cable.as_deref(), Some("usb-blaster"));

        let options = manifest.toolchain_options();
        assert_eq!(options.get("nextpnr-seed"), Some("7"));
        assert_eq!(options.get("yosys-abc9"), Some("true"));
        assert_eq!(options.get("ecppack-spimode"), Some("qspi"));
    }

    #[test]
    fn parse_empty_manifest() {
        let manifest = SocManifest::from_str("").unwrap();
        assert!(manifest.soc.board.is_none());
        assert!(manifest.build.toolchain.is_empty());
    }

    #[test]
    fn reject_invalid_manifest() {
        assert!(SocManifest::from_str("this is not valid toml [[[").is_err());
        assert!(SocManifest::from_str("[soc]\nboard-name = \"x\"\n").is_err());
        assert!(SocManifest::from_str("[soc]\ncpu-type = \"z80\"\n").is_err());
    }

    #[test]
    fn defaults_without_manifest() {
        let settings = Settings::resolve(&SocArgs::default(), None, Path::new("/p"));
        assert_eq!(settings.board, BoardConfig::default());
        assert_eq!(settings.output_dir, None);
        assert!(settings.toolchain.is_empty());
        assert!(!settings.build && !settings.load);
        assert_eq!(settings.cable, "ft232RL");
        assert_eq!(settings.loader, "openFPGALoader");
    }

    #[test]
    fn manifest_fills_in_missing_arguments() {
        let manifest = SocManifest::from_str(FULL).unwrap();
        let settings = Settings::resolve(&SocArgs::default(), Some(&manifest), Path::new("/p"));
        assert_eq!(settings.board.board_variant, "5A-75B");
        assert_eq!(settings.board.revision, "8.0");
        assert_eq!(settings.board.cpu_type, CpuType::PicoRv32);
        assert_eq!(settings.board.rom_size_bytes, 0x10000);
        assert_eq!(settings.output_dir, Some(PathBuf::from("/p/build/custom")));
        assert_eq!(settings.cable, "usb-blaster");
        assert_eq!(settings.loader, "/opt/ofl/openFPGALoader");
    }

    #[test]
    fn command_line_wins() {
        let manifest = SocManifest::from_str(FULL).unwrap();
        let args = SocArgs {
            revision: Some("7.0".into()),
            cable: Some("ft232RL".into()),
            output_dir: Some(PathBuf::from("elsewhere")),
            nextpnr_seed: Some(11),
            ecppack_compress: true,
            ..SocArgs::default()
        };
        let settings = Settings::resolve(&args, Some(&manifest), Path::new("/p"));
        assert_eq!(settings.board.board_variant, "5A-75B");
        assert_eq!(settings.board.revision, "7.0");
        assert_eq!(settings.cable, "ft232RL");
        assert_eq!(settings.output_dir, Some(PathBuf::from("elsewhere")));
        assert_eq!(settings.toolchain.get("nextpnr-seed"), Some("11"));
        assert_eq!(settings.toolchain.get("yosys-abc9"), Some("true"));
        assert_eq!(settings.toolchain.get("ecppack-compress"), Some("true"));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("soc.toml"), "[soc]\nrevision = \"7.1\"\n").unwrap();

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found_dir) = SocManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.soc.revision.as_deref(), Some("7.1"));
        assert_eq!(found_dir, dir.path());
    }

    #[test]
    fn find_and_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("soc.toml"), "[soc\n").unwrap();
        let err = SocManifest::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
