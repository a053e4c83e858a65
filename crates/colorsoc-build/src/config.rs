//! Typed configuration: what to build, where, and with which toolchain options.
//!
//! These types only carry values. Semantic checks (supported revision, memory
//! alignment, clock compatibility, option names) happen where the values are
//! consumed: descriptor assembly and the toolchain.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default board variant.
pub const DEFAULT_BOARD: &str = "5A-75E";
/// Default board revision.
pub const DEFAULT_REVISION: &str = "6.0";
/// Default system clock: the board's 25 MHz oscillator.
pub const DEFAULT_SYS_CLK_FREQ: u64 = 25_000_000;
/// Default integrated ROM size.
pub const DEFAULT_ROM_SIZE: u64 = 0x8000;
/// Default integrated main RAM size.
pub const DEFAULT_RAM_SIZE: u64 = 0x4000;

/// Soft CPU placed in the SoC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuType {
    #[default]
    VexRiscv,
    PicoRv32,
    Serv,
    FemtoRv,
    Minerva,
}

impl CpuType {
    pub const ALL: [CpuType; 5] = [
        CpuType::VexRiscv,
        CpuType::PicoRv32,
        CpuType::Serv,
        CpuType::FemtoRv,
        CpuType::Minerva,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            CpuType::VexRiscv => "vexriscv",
            CpuType::PicoRv32 => "picorv32",
            CpuType::Serv => "serv",
            CpuType::FemtoRv => "femtorv",
            CpuType::Minerva => "minerva",
        }
    }

    /// Width of the CPU's system bus.
    pub fn data_width_bits(self) -> u32 {
        32
    }

    /// GCC `-march` string the firmware for this CPU is built with.
    pub fn march(self) -> &'static str {
        match self {
            CpuType::Serv => "rv32i",
            _ => "rv32im",
        }
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CpuType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CpuType::ALL
            .into_iter()
            .find(|cpu| cpu.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = CpuType::ALL.iter().map(|c| c.name()).collect();
                format!("unknown CPU type '{s}' (choose: {})", names.join(", "))
            })
    }
}

/// What SoC to assemble and for which board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// Board variant (e.g. "5A-75E").
    pub board_variant: String,
    /// Board revision (e.g. "6.0").
    pub revision: String,
    /// System clock frequency in Hz.
    pub clock_frequency_hz: u64,
    pub cpu_type: CpuType,
    /// Integrated ROM size in bytes.
    pub rom_size_bytes: u64,
    /// Integrated main RAM size in bytes.
    pub ram_size_bytes: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_variant: DEFAULT_BOARD.into(),
            revision: DEFAULT_REVISION.into(),
            clock_frequency_hz: DEFAULT_SYS_CLK_FREQ,
            cpu_type: CpuType::default(),
            rom_size_bytes: DEFAULT_ROM_SIZE,
            ram_size_bytes: DEFAULT_RAM_SIZE,
        }
    }
}

/// Free-form toolchain options, keyed by option name.
///
/// Ordered so that anything derived from it is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolchainOptions(BTreeMap<String, String>);

impl ToolchainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Set a boolean flag option to "true".
    pub fn enable(&mut self, name: impl Into<String>) {
        self.set(name, "true");
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merge(&mut self, other: &ToolchainOptions) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// Parse a `KEY=VALUE` pair. A bare `KEY` means `KEY=true`.
    pub fn parse_pair(s: &str) -> Result<(String, String), String> {
        let (key, value) = match s.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (s.trim(), "true"),
        };
        if key.is_empty() {
            return Err(format!("invalid toolchain option '{s}': empty name"));
        }
        Ok((key.to_string(), value.to_string()))
    }
}

impl FromIterator<(String, String)> for ToolchainOptions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where to build and whether to run synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Root output directory; gateware and software live below it.
    pub output_directory: PathBuf,
    pub toolchain_options: ToolchainOptions,
    /// Run the synthesis toolchain. Support files are written either way.
    pub run_synthesis: bool,
}

impl BuildOptions {
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            toolchain_options: ToolchainOptions::new(),
            run_synthesis: false,
        }
    }

    /// Directory holding constraints, scripts and the bitstream.
    pub fn gateware_dir(&self) -> PathBuf {
        self.output_directory.join("gateware")
    }

    /// Directory holding generated firmware headers.
    pub fn generated_include_dir(&self) -> PathBuf {
        self.output_directory
            .join("software")
            .join("include")
            .join("generated")
    }
}

/// Default output directory for a platform: `build/<platform name>`.
pub fn default_output_dir(platform_name: &str) -> PathBuf {
    Path::new("build").join(platform_name)
}

/// Parse a byte size given in decimal or `0x` hexadecimal.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid size '{s}': {e}"))
}
