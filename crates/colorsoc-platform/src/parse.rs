//! TOML parsing, serialization, validation, and discovery for board definitions.
//!
//! Custom boards are stored as `.board.toml` files in the `boards/` directory
//! of a colorsoc project.

use std::path::{Path, PathBuf};

use crate::board::Platform;
use crate::catalog::PlatformCatalog;
use crate::error::{PlatformError, Result};

/// A validation issue found in a board definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Whether `name` can be used as a platform name.
///
/// Platform names become file stems, the yosys top module and the default
/// output directory, so only ASCII letters, digits and `_` are accepted.
pub fn is_valid_board_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject a name that [`is_valid_board_name`] does not accept.
pub fn check_board_name(name: &str) -> Result<()> {
    if is_valid_board_name(name) {
        Ok(())
    } else {
        Err(PlatformError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Load a platform from a `.board.toml` file.
pub fn load_platform_toml(path: &Path) -> Result<Platform> {
    if !path.exists() {
        return Err(PlatformError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_platform_toml(&content)
}

/// Parse a platform from a TOML string.
pub fn parse_platform_toml(toml_str: &str) -> Result<Platform> {
    let platform: Platform = toml::from_str(toml_str)?;
    Ok(platform)
}

/// Serialize a platform to pretty TOML.
pub fn platform_to_toml(platform: &Platform) -> Result<String> {
    let toml_str = toml::to_string_pretty(platform)?;
    Ok(toml_str)
}

/// Validate a board definition.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_platform(platform: &Platform) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut error = |message: String| {
        issues.push(ValidationIssue {
            severity: "error",
            message,
        })
    };

    for (field, value) in [
        ("name", &platform.name),
        ("variant", &platform.variant),
        ("revision", &platform.revision),
        ("device", &platform.device),
        ("architecture", &platform.architecture),
        ("package", &platform.package),
        ("speed-grade", &platform.speed_grade),
    ] {
        if value.trim().is_empty() {
            error(format!("{field} is empty"));
        }
    }

    if !platform.name.trim().is_empty() && !is_valid_board_name(&platform.name) {
        error(format!(
            "name '{}' may only contain ASCII letters, digits and '_'",
            platform.name
        ));
    }

    if platform.clock.frequency_hz == 0 {
        error(format!(
            "clock '{}' has a frequency of 0 Hz",
            platform.clock.name
        ));
    }
    if platform.clock.site.trim().is_empty() {
        error(format!("clock '{}' has no site", platform.clock.name));
    }

    let granularity = platform.memory_granularity_bytes;
    if granularity == 0 || !granularity.is_power_of_two() {
        error(format!(
            "memory granularity {granularity} is not a power of two"
        ));
    }

    if let Some(ref led) = platform.user_led {
        if led.site.trim().is_empty() {
            error(format!("pin '{}' has no site", led.name));
        } else if led.site == platform.clock.site {
            error(format!(
                "pin '{}' and clock '{}' share site {}",
                led.name, platform.clock.name, led.site
            ));
        }
    }

    if platform.architecture.starts_with('-') {
        issues.push(ValidationIssue {
            severity: "warning",
            message: format!(
                "architecture '{}' should be given without leading dashes",
                platform.architecture
            ),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Generate a template `.board.toml` for a new board.
///
/// Seeds from the 5A-75E v6.0 with the given custom name.
pub fn generate_template(name: &str) -> Result<String> {
    check_board_name(name)?;
    let mut platform = Platform::colorlight_5a_75e_v6_0();
    platform.name = name.into();
    platform.variant = name.to_ascii_uppercase();
    platform.revision = "1.0".into();
    platform.description = format!("Custom board {name}");
    platform_to_toml(&platform)
}

/// Discover all `.board.toml` files in a project's `boards/` directory.
///
/// Returns a list of (board_name, file_path) pairs.
pub fn discover_boards(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let boards_dir = project_dir.join("boards");
    if !boards_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut boards = Vec::new();
    for entry in std::fs::read_dir(&boards_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".board.toml"));
        if let Some(name) = name {
            boards.push((name.to_string(), path.clone()));
        }
    }
    boards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(boards)
}

/// Build a catalog from the built-in boards plus every valid board file in
/// `project_dir/boards`. Invalid files are reported as errors.
pub fn project_catalog(project_dir: &Path) -> Result<PlatformCatalog> {
    let mut catalog = PlatformCatalog::builtin();
    for (name, path) in discover_boards(project_dir)? {
        let platform = load_platform_toml(&path)?;
        if let Err(issues) = validate_platform(&platform) {
            let detail = issues
                .iter()
                .filter(|i| i.severity == "error")
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if !detail.is_empty() {
                return Err(PlatformError::Validation {
                    detail: format!("{name}: {detail}"),
                });
            }
        }
        catalog.register(platform);
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_builtin() {
        let original = Platform::colorlight_5a_75e_v6_0();
        let toml_str = platform_to_toml(&original).unwrap();
        let parsed = parse_platform_toml(&toml_str).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml_str = r#"
name = "ulx3s_v3_1"
variant = "ULX3S"
revision = "3.1"
device = "LFE5U-85F-6BG381C"
architecture = "85k"
package = "CABGA381"
speed-grade = "6"
memory-granularity-bytes = 4

[clock]
name = "clk25"
site = "G2"
frequency-hz = 25000000
io-standard = "LVCMOS33"
"#;
        let platform = parse_platform_toml(toml_str).unwrap();
        assert_eq!(platform.variant, "ULX3S");
        assert_eq!(platform.clock.site, "G2");
        assert!(platform.user_led.is_none());
        assert!(platform.description.is_empty());
        assert!(validate_platform(&platform).is_ok());
    }

    #[test]
    fn parse_invalid_returns_error() {
        assert!(parse_platform_toml("this is not valid toml [[[").is_err());
    }

    #[test]
    fn parse_missing_field_returns_error() {
        assert!(parse_platform_toml("name = \"incomplete\"\n").is_err());
    }

    #[test]
    fn validate_builtins() {
        for platform in PlatformCatalog::builtin().boards() {
            assert!(validate_platform(platform).is_ok(), "{}", platform.name);
        }
    }

    #[test]
    fn validate_zero_clock() {
        let mut platform = Platform::colorlight_5a_75b_v7_0();
        platform.clock.frequency_hz = 0;
        let issues = validate_platform(&platform).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("0 Hz")));
    }

    #[test]
    fn validate_bad_granularity() {
        let mut platform = Platform::colorlight_5a_75b_v7_0();
        platform.memory_granularity_bytes = 6;
        let issues = validate_platform(&platform).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("power of two")));
    }

    #[test]
    fn validate_shared_site() {
        let mut platform = Platform::colorlight_5a_75e_v6_0();
        if let Some(ref mut led) = platform.user_led {
            led.site = "P6".into();
        }
        let issues = validate_platform(&platform).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("share site")));
    }

    #[test]
    fn validate_empty_revision() {
        let mut platform = Platform::colorlight_5a_75e_v6_0();
        platform.revision = " ".into();
        let issues = validate_platform(&platform).unwrap_err();
        assert!(issues.iter().any(|i| i.message == "revision is empty"));
    }

    #[test]
    fn generate_template_is_valid() {
        let toml_str = generate_template("my_board").unwrap();
        let platform = parse_platform_toml(&toml_str).unwrap();
        assert_eq!(platform.name, "my_board");
        assert_eq!(platform.variant, "MY_BOARD");
        assert_eq!(platform.revision, "1.0");
        assert!(validate_platform(&platform).is_ok());
    }

    #[test]
    fn board_names_are_path_safe() {
        assert!(is_valid_board_name("colorlight_5a_75e_v6_0"));
        assert!(is_valid_board_name("Lab2"));
        for bad in ["", "../../escaped soc", "a/b", "my-board", "with space", "..", "v6.0"] {
            assert!(!is_valid_board_name(bad), "{bad:?}");
        }
    }

    #[test]
    fn validate_rejects_escaping_name() {
        let mut platform = Platform::colorlight_5a_75e_v6_0();
        platform.name = "../../escaped soc".into();
        let issues = validate_platform(&platform).unwrap_err();
        assert!(issues
            .iter()
            .any(|i| i.severity == "error" && i.message.contains("'../../escaped soc'")));
    }

    #[test]
    fn template_rejects_bad_name() {
        let err = generate_template("../up").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidName { ref name } if name == "../up"));
    }

    #[test]
    fn project_catalog_rejects_escaping_name() {
        let dir = tempfile::tempdir().unwrap();
        let boards_dir = dir.path().join("boards");
        std::fs::create_dir_all(&boards_dir).unwrap();

        let mut platform = parse_platform_toml(&generate_template("lab").unwrap()).unwrap();
        platform.name = "../../escaped soc".into();
        std::fs::write(
            boards_dir.join("lab.board.toml"),
            platform_to_toml(&platform).unwrap(),
        )
        .unwrap();

        let err = project_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[test]
    fn discover_boards_finds_files() {
        let dir = tempfile::tempdir().unwrap();
        let boards_dir = dir.path().join("boards");
        std::fs::create_dir_all(&boards_dir).unwrap();

        let template = generate_template("board_a").unwrap();
        std::fs::write(boards_dir.join("board_a.board.toml"), &template).unwrap();
        std::fs::write(boards_dir.join("board_b.board.toml"), &template).unwrap();
        std::fs::write(boards_dir.join("notes.txt"), "ignore me").unwrap();

        let boards = discover_boards(dir.path()).unwrap();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0].0, "board_a");
        assert_eq!(boards[1].0, "board_b");
    }

    #[test]
    fn discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_boards(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn load_not_found() {
        let result = load_platform_toml(Path::new("/nonexistent/path.board.toml"));
        assert!(matches!(result.unwrap_err(), PlatformError::NotFound { .. }));
    }

    #[test]
    fn project_catalog_adds_custom_boards() {
        let dir = tempfile::tempdir().unwrap();
        let boards_dir = dir.path().join("boards");
        std::fs::create_dir_all(&boards_dir).unwrap();
        std::fs::write(
            boards_dir.join("lab.board.toml"),
            generate_template("lab").unwrap(),
        )
        .unwrap();

        let catalog = project_catalog(dir.path()).unwrap();
        assert_eq!(catalog.len(), PlatformCatalog::builtin().len() + 1);
        assert_eq!(catalog.lookup("LAB", "1.0").unwrap().name, "lab");
    }

    #[test]
    fn project_catalog_rejects_invalid_board() {
        let dir = tempfile::tempdir().unwrap();
        let boards_dir = dir.path().join("boards");
        std::fs::create_dir_all(&boards_dir).unwrap();

        let mut platform = Platform::colorlight_5a_75e_v6_0();
        platform.clock.frequency_hz = 0;
        std::fs::write(
            boards_dir.join("broken.board.toml"),
            platform_to_toml(&platform).unwrap(),
        )
        .unwrap();

        let err = project_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }
}
