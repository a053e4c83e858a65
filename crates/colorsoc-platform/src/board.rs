//! Board platform model.
//!
//! A [`Platform`] is one revision of one board. The device string is kept
//! verbatim alongside the Trellis parameters (architecture, package, speed
//! grade) that nextpnr-ecp5 needs, so no device-string parsing is required
//! downstream.

use serde::{Deserialize, Serialize};

/// I/O standard used by every Colorlight pin this crate knows about.
pub const LVCMOS33: &str = "LVCMOS33";

/// A named pin bound to a package site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PinAssignment {
    /// Signal name used in constraints (e.g. "user_led_n").
    pub name: String,
    /// Package ball (e.g. "T6").
    pub site: String,
    /// I/O standard (e.g. "LVCMOS33").
    pub io_standard: String,
}

/// The board oscillator input that clocks the SoC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockPin {
    /// Signal name (e.g. "clk25").
    pub name: String,
    /// Package ball.
    pub site: String,
    /// Oscillator frequency in Hz.
    pub frequency_hz: u64,
    /// I/O standard.
    pub io_standard: String,
}

impl ClockPin {
    /// Oscillator frequency in MHz.
    pub fn frequency_mhz(&self) -> f64 {
        self.frequency_hz as f64 / 1e6
    }
}

/// One revision of one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Platform {
    /// Platform name, unique per (variant, revision), e.g. "colorlight_5a_75e_v6_0".
    pub name: String,
    /// Board variant as printed on the board (e.g. "5A-75E").
    pub variant: String,
    /// Board revision (e.g. "6.0").
    pub revision: String,
    /// Short human-readable description.
    #[serde(default)]
    pub description: String,
    /// Full FPGA device string (e.g. "LFE5U-25F-6BG256C").
    pub device: String,
    /// nextpnr-ecp5 architecture flag without dashes (e.g. "25k").
    pub architecture: String,
    /// nextpnr-ecp5 package name (e.g. "CABGA256").
    pub package: String,
    /// Speed grade (e.g. "6").
    pub speed_grade: String,
    /// System clock input.
    pub clock: ClockPin,
    /// Active-low user LED, if the board has one wired.
    #[serde(default)]
    pub user_led: Option<PinAssignment>,
    /// Alignment every integrated memory size must respect, in bytes.
    pub memory_granularity_bytes: u64,
}

impl Platform {
    /// Build a Colorlight ECP5 board entry. All known revisions share the
    /// same LFE5U-25F device and 25 MHz oscillator on P6.
    pub fn colorlight(variant: &str, revision: &str, led_site: &str) -> Self {
        Self {
            name: platform_name("colorlight", variant, revision),
            variant: variant.to_string(),
            revision: revision.to_string(),
            description: format!("Colorlight {variant} v{revision} (ECP5 LFE5U-25F, 25 MHz)"),
            device: "LFE5U-25F-6BG256C".into(),
            architecture: "25k".into(),
            package: "CABGA256".into(),
            speed_grade: "6".into(),
            clock: ClockPin {
                name: "clk25".into(),
                site: "P6".into(),
                frequency_hz: 25_000_000,
                io_standard: LVCMOS33.into(),
            },
            user_led: Some(PinAssignment {
                name: "user_led_n".into(),
                site: led_site.into(),
                io_standard: LVCMOS33.into(),
            }),
            memory_granularity_bytes: 4,
        }
    }

    /// Colorlight 5A-75E, revision 6.0.
    pub fn colorlight_5a_75e_v6_0() -> Self {
        Self::colorlight("5A-75E", "6.0", "T6")
    }

    /// Colorlight 5A-75E, revision 7.1.
    pub fn colorlight_5a_75e_v7_1() -> Self {
        Self::colorlight("5A-75E", "7.1", "T6")
    }

    /// Colorlight 5A-75B, revision 6.0.
    pub fn colorlight_5a_75b_v6_0() -> Self {
        Self::colorlight("5A-75B", "6.0", "T6")
    }

    /// Colorlight 5A-75B, revision 7.0.
    pub fn colorlight_5a_75b_v7_0() -> Self {
        Self::colorlight("5A-75B", "7.0", "T6")
    }

    /// Colorlight 5A-75B, revision 8.0.
    pub fn colorlight_5a_75b_v8_0() -> Self {
        Self::colorlight("5A-75B", "8.0", "L2")
    }
}

/// Derive a platform name from vendor, variant and revision:
/// `("colorlight", "5A-75E", "6.0")` becomes `colorlight_5a_75e_v6_0`.
pub fn platform_name(vendor: &str, variant: &str, revision: &str) -> String {
    format!(
        "{}_{}_v{}",
        slug(vendor),
        slug(variant),
        slug(revision)
    )
}

fn slug(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
