//! Build report.

use std::fmt;
use std::path::PathBuf;

use crate::builder::{BuildOutput, SupportFile};
use crate::config::BuildOptions;
use crate::soc::SocDescriptor;

/// Human-readable summary of one build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Board variant and revision, e.g. "5A-75E v6.0".
    pub board: String,
    pub build_name: String,
    pub cpu: String,
    pub gateware_dir: PathBuf,
    pub include_dir: PathBuf,
    pub support_files: Vec<SupportFile>,
    pub synthesized: bool,
    pub bitstream: PathBuf,
    /// Total build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildReport {
    pub fn new(soc: &SocDescriptor, options: &BuildOptions, output: &BuildOutput) -> Self {
        Self {
            board: format!("{} v{}", soc.platform.variant, soc.platform.revision),
            build_name: soc.build_name.clone(),
            cpu: soc.core.cpu_type.to_string(),
            gateware_dir: options.gateware_dir(),
            include_dir: options.generated_include_dir(),
            support_files: output.support_files.clone(),
            synthesized: output.synthesized,
            bitstream: output.artifact.path.clone(),
            duration_ms: output.duration.as_millis() as u64,
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(f, "Board: {}", self.board)?;
        writeln!(f, "Build name: {}", self.build_name)?;
        writeln!(f, "CPU: {}", self.cpu)?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f)?;

        writeln!(f, "--- Directories ---")?;
        writeln!(f, "  Gateware: {}", self.gateware_dir.display())?;
        writeln!(f, "  Headers:  {}", self.include_dir.display())?;

        writeln!(f)?;
        writeln!(f, "--- Support files ({}) ---", self.support_files.len())?;
        for file in &self.support_files {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.path.display().to_string());
            writeln!(f, "  {name}  sha256:{:.12}", file.sha256)?;
        }

        writeln!(f)?;
        if self.synthesized {
            writeln!(f, "--- Synthesis: DONE ---")?;
            writeln!(f, "  Bitstream: {}", self.bitstream.display())?;
        } else {
            writeln!(f, "--- Synthesis: SKIPPED ---")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(synthesized: bool) -> BuildReport {
        BuildReport {
            board: "5A-75E v6.0".into(),
            build_name: "colorlight_5a_75e_v6_0".into(),
            cpu: "vexriscv".into(),
            gateware_dir: PathBuf::from("build/x/gateware"),
            include_dir: PathBuf::from("build/x/software/include/generated"),
            support_files: vec![SupportFile {
                path: PathBuf::from("build/x/gateware/colorlight_5a_75e_v6_0.lpf"),
                sha256: "abcdef1234567890abcdef".into(),
            }],
            synthesized,
            bitstream: PathBuf::from("build/x/gateware/colorlight_5a_75e_v6_0.bit"),
            duration_ms: 7,
        }
    }

    #[test]
    fn report_display() {
        let output = format!("{}", report(true));
        assert!(output.contains("Build Report"));
        assert!(output.contains("5A-75E v6.0"));
        assert!(output.contains("colorlight_5a_75e_v6_0.lpf  sha256:abcdef123456\n"));
        assert!(output.contains("Synthesis: DONE"));
        assert!(output.contains("colorlight_5a_75e_v6_0.bit"));
    }

    #[test]
    fn skipped_synthesis_omits_bitstream() {
        let output = report(false).to_string();
        assert!(output.contains("Synthesis: SKIPPED"));
        assert!(!output.contains(".bit"));
    }
}
