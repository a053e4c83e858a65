//! Trellis toolchain for Lattice ECP5: yosys, nextpnr-ecp5, ecppack.
//!
//! Free-form [`ToolchainOptions`] are interpreted here into typed
//! [`TrellisSettings`]; the settings then produce the synthesis script and
//! the ordered invocation plan.

use std::path::Path;

use crate::config::ToolchainOptions;
use crate::error::ConfigurationError;
use crate::runner::Invocation;
use crate::soc::SocDescriptor;

pub const YOSYS: &str = "yosys";
pub const NEXTPNR: &str = "nextpnr-ecp5";
pub const ECPPACK: &str = "ecppack";

/// Option names understood by the Trellis toolchain.
pub const OPTION_NAMES: [&str; 9] = [
    "yosys-nowidelut",
    "yosys-abc9",
    "nextpnr-timingstrict",
    "nextpnr-ignoreloops",
    "nextpnr-seed",
    "ecppack-bootaddr",
    "ecppack-spimode",
    "ecppack-freq",
    "ecppack-compress",
];

/// Typed Trellis settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrellisSettings {
    /// Keep yosys from using wide LUTs (LUT6+).
    pub yosys_nowidelut: bool,
    /// Use the abc9 mapping flow.
    pub yosys_abc9: bool,
    /// Fail place-and-route on timing violations.
    pub nextpnr_timingstrict: bool,
    pub nextpnr_ignoreloops: bool,
    pub nextpnr_seed: u32,
    pub ecppack_bootaddr: Option<String>,
    pub ecppack_spimode: Option<String>,
    pub ecppack_freq: Option<String>,
    pub ecppack_compress: bool,
}

impl Default for TrellisSettings {
    fn default() -> Self {
        Self {
            yosys_nowidelut: false,
            yosys_abc9: false,
            nextpnr_timingstrict: false,
            nextpnr_ignoreloops: false,
            nextpnr_seed: 1,
            ecppack_bootaddr: None,
            ecppack_spimode: None,
            ecppack_freq: None,
            ecppack_compress: false,
        }
    }
}

impl TrellisSettings {
    /// Interpret toolchain options. Unknown names and malformed values are
    /// configuration errors.
    pub fn from_options(options: &ToolchainOptions) -> Result<Self, ConfigurationError> {
        let mut settings = Self::default();
        for (name, value) in options.iter() {
            match name {
                "yosys-nowidelut" => settings.yosys_nowidelut = parse_bool(name, value)?,
                "yosys-abc9" => settings.yosys_abc9 = parse_bool(name, value)?,
                "nextpnr-timingstrict" => {
                    settings.nextpnr_timingstrict = parse_bool(name, value)?
                }
                "nextpnr-ignoreloops" => settings.nextpnr_ignoreloops = parse_bool(name, value)?,
                "nextpnr-seed" => {
                    settings.nextpnr_seed =
                        value
                            .parse()
                            .map_err(|_| ConfigurationError::InvalidToolchainOption {
                                name: name.to_string(),
                                value: value.to_string(),
                                expected: "an unsigned integer",
                            })?
                }
                "ecppack-bootaddr" => settings.ecppack_bootaddr = Some(value.to_string()),
                "ecppack-spimode" => settings.ecppack_spimode = Some(value.to_string()),
                "ecppack-freq" => settings.ecppack_freq = Some(value.to_string()),
                "ecppack-compress" => settings.ecppack_compress = parse_bool(name, value)?,
                _ => {
                    return Err(ConfigurationError::UnknownToolchainOption {
                        name: name.to_string(),
                        known: &OPTION_NAMES,
                    })
                }
            }
        }
        Ok(settings)
    }

    /// Yosys synthesis script for the descriptor's top level.
    pub fn yosys_script(&self, soc: &SocDescriptor) -> String {
        let name = &soc.build_name;
        let mut synth = format!("synth_ecp5 -json {name}.json -top {name}");
        if self.yosys_abc9 {
            synth.push_str(" -abc9");
        }
        if self.yosys_nowidelut {
            synth.push_str(" -nowidelut");
        }

        let mut script = String::new();
        script.push_str("verilog_defaults -push\n");
        script.push_str("verilog_defaults -add -defer\n");
        script.push_str(&format!("read_verilog {name}.v\n"));
        script.push_str("verilog_defaults -pop\n");
        script.push_str(
            "attrmap -tocase keep -imap keep=\"true\" keep=1 -imap keep=\"false\" keep=0 -remove keep=0\n",
        );
        script.push_str(&synth);
        script.push('\n');
        script
    }

    /// The ordered invocation plan, run inside `gateware_dir`.
    pub fn invocations(&self, soc: &SocDescriptor, gateware_dir: &Path) -> Vec<Invocation> {
        let name = &soc.build_name;
        let platform = &soc.platform;

        let yosys = Invocation::new(YOSYS)
            .args(["-l".to_string(), format!("{name}.rpt"), format!("{name}.ys")])
            .current_dir(gateware_dir);

        let mut nextpnr = Invocation::new(NEXTPNR)
            .args(["--json".to_string(), format!("{name}.json")])
            .args(["--lpf".to_string(), format!("{name}.lpf")])
            .args(["--textcfg".to_string(), format!("{name}.config")])
            .arg(format!("--{}", platform.architecture))
            .args(["--package", platform.package.as_str()])
            .args(["--speed", platform.speed_grade.as_str()]);
        if !self.nextpnr_timingstrict {
            nextpnr = nextpnr.arg("--timing-allow-fail");
        }
        if self.nextpnr_ignoreloops {
            nextpnr = nextpnr.arg("--ignore-loops");
        }
        let nextpnr = nextpnr
            .args(["--seed".to_string(), self.nextpnr_seed.to_string()])
            .current_dir(gateware_dir);

        let mut ecppack = Invocation::new(ECPPACK);
        if let Some(ref addr) = self.ecppack_bootaddr {
            ecppack = ecppack.args(["--bootaddr", addr.as_str()]);
        }
        if let Some(ref mode) = self.ecppack_spimode {
            ecppack = ecppack.args(["--spimode", mode.as_str()]);
        }
        if let Some(ref freq) = self.ecppack_freq {
            ecppack = ecppack.args(["--freq", freq.as_str()]);
        }
        if self.ecppack_compress {
            ecppack = ecppack.arg("--compress");
        }
        let ecppack = ecppack
            .arg(format!("{name}.config"))
            .args(["--svf".to_string(), format!("{name}.svf")])
            .args(["--bit".to_string(), format!("{name}.bit")])
            .current_dir(gateware_dir);

        vec![yosys, nextpnr, ecppack]
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidToolchainOption {
            name: name.to_string(),
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}
