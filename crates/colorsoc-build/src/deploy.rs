//! Bitstream upload through openFPGALoader.
//!
//! The probe name is classified into a [`Probe`] before anything runs, so a
//! misconfigured probe never starts a process. Probes without special
//! handling still get an upload attempt with no extra arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::builder::BitstreamArtifact;
use crate::error::{ConfigurationError, DeployError};
use crate::runner::{Invocation, ToolRunner};

/// Environment variable holding the Quartus installation root.
pub const QUARTUS_ENV: &str = "QUARTUSPATH";
/// Default loader program.
pub const DEFAULT_LOADER: &str = "openFPGALoader";
/// Probe used when none is configured.
pub const DEFAULT_CABLE: &str = FT232RL;

const FT232RL: &str = "ft232RL";
const USB_BLASTER: &str = "usb-blaster";
const FT232RL_PINS: &str = "RXD:RTS:TXD:CTS";

/// A classified JTAG probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// FTDI serial adapter bit-banging JTAG on the given pin mapping.
    Ftdi { pins: String },
    /// Altera USB-Blaster clone; needs the firmware shipped with Quartus.
    UsbBlaster { firmware: PathBuf },
    /// Anything else, passed to the loader as-is.
    Other { name: String },
}

impl Probe {
    /// Classify `name`, consulting `env` only for probes that need it.
    pub fn classify<E>(name: &str, env: E) -> Result<Self, ConfigurationError>
    where
        E: Fn(&str) -> Option<OsString>,
    {
        match name {
            FT232RL => Ok(Probe::Ftdi {
                pins: FT232RL_PINS.to_string(),
            }),
            USB_BLASTER => {
                let quartus = env(QUARTUS_ENV)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| ConfigurationError::MissingEnvironmentVariable {
                        name: QUARTUS_ENV.to_string(),
                        probe: name.to_string(),
                    })?;
                Ok(Probe::UsbBlaster {
                    firmware: PathBuf::from(quartus)
                        .join("linux64")
                        .join("blaster_6810.hex"),
                })
            }
            other => Ok(Probe::Other {
                name: other.to_string(),
            }),
        }
    }

    /// Loader arguments this probe needs besides `--cable`.
    pub fn extra_args(&self) -> Vec<OsString> {
        match self {
            Probe::Ftdi { pins } => vec![format!("--pins={pins}").into()],
            Probe::UsbBlaster { firmware } => {
                vec!["--probe-firmware".into(), firmware.clone().into_os_string()]
            }
            Probe::Other { .. } => Vec::new(),
        }
    }
}

/// Fully resolved upload parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    pub probe_name: String,
    pub cable_extra_args: Vec<OsString>,
    pub bitstream_path: PathBuf,
}

impl DeployOptions {
    /// Classify the probe and derive loader arguments for `artifact`.
    pub fn resolve<E>(
        artifact: &BitstreamArtifact,
        probe_name: &str,
        env: E,
    ) -> Result<Self, ConfigurationError>
    where
        E: Fn(&str) -> Option<OsString>,
    {
        let probe = Probe::classify(probe_name, env)?;
        if let Probe::Other { ref name } = probe {
            warn!(probe = %name, "no special handling for probe, passing it through");
        }
        Ok(Self {
            probe_name: probe_name.to_string(),
            cable_extra_args: probe.extra_args(),
            bitstream_path: artifact.path.clone(),
        })
    }

    /// Summary printed before the loader runs.
    pub fn banner(&self) -> String {
        let extra: Vec<String> = self
            .cable_extra_args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let mut out = String::new();
        out.push_str(&format!("Bitstream: {}\n", self.bitstream_path.display()));
        out.push_str(&format!("Cable:     {}\n", self.probe_name));
        out.push_str(&format!("Extra:     {extra:?}"));
        out
    }

    /// The loader command line.
    pub fn invocation(&self, loader: &str) -> Invocation {
        Invocation::new(loader)
            .args(["--cable", self.probe_name.as_str()])
            .args(&self.cable_extra_args)
            .arg(&self.bitstream_path)
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub code: i32,
}

/// Upload `artifact` through `probe_name` using `loader`.
pub fn deploy<E>(
    artifact: &BitstreamArtifact,
    probe_name: &str,
    loader: &str,
    env: E,
    runner: &mut dyn ToolRunner,
) -> Result<UploadOutcome, DeployError>
where
    E: Fn(&str) -> Option<OsString>,
{
    let options = DeployOptions::resolve(artifact, probe_name, env)?;
    if !artifact.exists() {
        return Err(DeployError::BitstreamNotFound {
            path: artifact.path.clone(),
        });
    }

    println!("{}", options.banner());

    let invocation = options.invocation(loader);
    info!(command = %invocation, "uploading bitstream");
    let exit = runner.run(&invocation).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeployError::ToolNotFound {
                tool: loader.to_string(),
            }
        } else {
            DeployError::Spawn {
                tool: loader.to_string(),
                source: e,
            }
        }
    })?;

    if !exit.success() {
        return Err(DeployError::UploadFailed {
            tool: loader.to_string(),
            code: exit.code,
        });
    }
    info!("upload complete");
    Ok(UploadOutcome { code: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;

    fn no_env(_: &str) -> Option<OsString> {
        None
    }

    fn quartus(key: &str) -> Option<OsString> {
        (key == QUARTUS_ENV).then(|| OsString::from("/opt/quartus"))
    }

    fn built_artifact(dir: &std::path::Path) -> BitstreamArtifact {
        let artifact = BitstreamArtifact {
            path: dir.join("colorlight_5a_75e_v6_0.bit"),
            build_name: "colorlight_5a_75e_v6_0".into(),
        };
        std::fs::write(&artifact.path, b"bitstream").unwrap();
        artifact
    }

    #[test]
    fn ft232rl_always_gets_pin_mapping() {
        for env in [no_env as fn(&str) -> Option<OsString>, quartus] {
            let probe = Probe::classify("ft232RL", env).unwrap();
            assert_eq!(
                probe.extra_args(),
                vec![OsString::from("--pins=RXD:RTS:TXD:CTS")]
            );
        }
    }

    #[test]
    fn usb_blaster_requires_quartus_path() {
        let err = Probe::classify("usb-blaster", no_env).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingEnvironmentVariable { ref name, .. } if name == "QUARTUSPATH"
        ));
        let empty = |_: &str| Some(OsString::new());
        assert!(Probe::classify("usb-blaster", empty).is_err());
    }

    #[test]
    fn usb_blaster_uses_quartus_firmware() {
        let probe = Probe::classify("usb-blaster", quartus).unwrap();
        assert_eq!(
            probe.extra_args(),
            vec![
                OsString::from("--probe-firmware"),
                OsString::from("/opt/quartus/linux64/blaster_6810.hex"),
            ]
        );
    }

    #[test]
    fn unknown_probe_passes_through() {
        let probe = Probe::classify("digilent_hs2", no_env).unwrap();
        assert_eq!(
            probe,
            Probe::Other {
                name: "digilent_hs2".into()
            }
        );
        assert!(probe.extra_args().is_empty());
    }

    #[test]
    fn resolve_exposes_extra_args() {
        let artifact = BitstreamArtifact {
            path: PathBuf::from("/b/soc.bit"),
            build_name: "soc".into(),
        };
        let options = DeployOptions::resolve(&artifact, "ft232RL", no_env).unwrap();
        assert_eq!(options.cable_extra_args.len(), 1);
        assert_eq!(
            options.invocation(DEFAULT_LOADER).to_string(),
            "openFPGALoader --cable ft232RL --pins=RXD:RTS:TXD:CTS /b/soc.bit"
        );
    }

    fn banner_lines(probe: &str, env: fn(&str) -> Option<OsString>) -> Vec<String> {
        let artifact = BitstreamArtifact {
            path: PathBuf::from("/b/soc.bit"),
            build_name: "soc".into(),
        };
        let options = DeployOptions::resolve(&artifact, probe, env).unwrap();
        options.banner().lines().map(str::to_string).collect()
    }

    #[test]
    fn banner_for_ft232rl() {
        assert_eq!(
            banner_lines("ft232RL", no_env),
            vec![
                "Bitstream: /b/soc.bit",
                "Cable:     ft232RL",
                "Extra:     [\"--pins=RXD:RTS:TXD:CTS\"]",
            ]
        );
    }

    #[test]
    fn banner_for_usb_blaster() {
        assert_eq!(
            banner_lines("usb-blaster", quartus),
            vec![
                "Bitstream: /b/soc.bit",
                "Cable:     usb-blaster",
                "Extra:     [\"--probe-firmware\", \"/opt/quartus/linux64/blaster_6810.hex\"]",
            ]
        );
    }

    #[test]
    fn banner_for_unknown_probe_has_no_extra_args() {
        assert_eq!(
            banner_lines("digilent_hs2", no_env),
            vec![
                "Bitstream: /b/soc.bit",
                "Cable:     digilent_hs2",
                "Extra:     []",
            ]
        );
    }

    #[test]
    fn missing_environment_runs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = built_artifact(tmp.path());
        let mut runner = RecordingRunner::default();
        let err = deploy(&artifact, "usb-blaster", DEFAULT_LOADER, no_env, &mut runner).unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn unknown_probe_still_uploads() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = built_artifact(tmp.path());
        let mut runner = RecordingRunner::default();
        let outcome = deploy(&artifact, "my-probe", DEFAULT_LOADER, no_env, &mut runner).unwrap();
        assert_eq!(outcome, UploadOutcome { code: 0 });
        assert_eq!(runner.calls.len(), 1);
        assert_eq!(
            runner.calls[0].arg_strings(),
            vec![
                "--cable".to_string(),
                "my-probe".to_string(),
                artifact.path.display().to_string()
            ]
        );
    }

    #[test]
    fn usb_blaster_upload_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = built_artifact(tmp.path());
        let mut runner = RecordingRunner::default();
        deploy(&artifact, "usb-blaster", "ofl", quartus, &mut runner).unwrap();
        let call = &runner.calls[0];
        assert_eq!(call.program, "ofl");
        assert_eq!(
            call.flag_value("--probe-firmware"),
            Some(std::ffi::OsStr::new("/opt/quartus/linux64/blaster_6810.hex"))
        );
    }

    #[test]
    fn missing_bitstream_is_reported_before_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = BitstreamArtifact {
            path: tmp.path().join("absent.bit"),
            build_name: "absent".into(),
        };
        let mut runner = RecordingRunner::default();
        let err = deploy(&artifact, "ft232RL", DEFAULT_LOADER, no_env, &mut runner).unwrap_err();
        assert!(matches!(err, DeployError::BitstreamNotFound { .. }));
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn loader_failure_propagates_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = built_artifact(tmp.path());
        let mut runner = RecordingRunner::failing(DEFAULT_LOADER, 4);
        let err = deploy(&artifact, "ft232RL", DEFAULT_LOADER, no_env, &mut runner).unwrap_err();
        assert!(matches!(err, DeployError::UploadFailed { code: Some(4), .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn missing_loader_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = built_artifact(tmp.path());
        let mut runner = RecordingRunner::default();
        runner.missing.push(DEFAULT_LOADER.into());
        let err = deploy(&artifact, "ft232RL", DEFAULT_LOADER, no_env, &mut runner).unwrap_err();
        assert!(matches!(err, DeployError::ToolNotFound { .. }));
    }
}
