//! SoC descriptor assembly.
//!
//! A [`SocDescriptor`] is the declarative composition handed to the build:
//! the board platform, a CPU-bearing core with its memory map, and a
//! clock/reset generator wired straight to the board oscillator.

use serde::Serialize;
use tracing::{debug, info};

use colorsoc_platform::parse::check_board_name;
use colorsoc_platform::{Platform, PlatformCatalog};

use crate::config::{BoardConfig, CpuType};
use crate::error::ConfigurationError;

/// Identification string prefix; the caller's version label is appended.
pub const IDENT_PREFIX: &str = "LiteX RISC-V CPU Test SoC";

pub const ROM_BASE: u64 = 0x0000_0000;
pub const SRAM_BASE: u64 = 0x1000_0000;
pub const SRAM_SIZE: u64 = 0x2000;
pub const MAIN_RAM_BASE: u64 = 0x4000_0000;
pub const CSR_BASE: u64 = 0xF000_0000;
pub const CSR_SIZE: u64 = 0x1_0000;

/// One entry of the SoC memory map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    pub name: &'static str,
    pub origin: u64,
    pub size: u64,
    /// CPU data cache may hold this region.
    pub cached: bool,
}

impl MemoryRegion {
    /// One past the last address.
    pub fn end(&self) -> u64 {
        self.origin.saturating_add(self.size)
    }
}

/// The CPU-bearing core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuCore {
    pub cpu_type: CpuType,
    pub clock_frequency_hz: u64,
    pub ident: String,
    pub memory_map: Vec<MemoryRegion>,
}

impl CpuCore {
    pub fn region(&self, name: &str) -> Option<&MemoryRegion> {
        self.memory_map.iter().find(|r| r.name == name)
    }
}

/// Clock/reset generator: the `sys` clock domain is driven directly by the
/// board oscillator pin, reset is power-on only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockResetGenerator {
    pub domain: &'static str,
    pub clock_pin: String,
    pub frequency_hz: u64,
}

/// A fully assembled SoC, ready to hand to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocDescriptor {
    pub build_name: String,
    pub platform: Platform,
    pub core: CpuCore,
    pub crg: ClockResetGenerator,
}

impl SocDescriptor {
    /// Compose platform, core and clock/reset generator for `config`.
    ///
    /// `version_label` is embedded in the SoC identification string.
    pub fn assemble(
        catalog: &PlatformCatalog,
        config: &BoardConfig,
        version_label: &str,
    ) -> Result<Self, ConfigurationError> {
        let platform = catalog
            .lookup(&config.board_variant, &config.revision)?
            .clone();
        // The name becomes the stem of every file written under gateware/.
        check_board_name(&platform.name)?;

        let granularity = platform.memory_granularity_bytes;
        check_memory_size("rom", config.rom_size_bytes, granularity)?;
        check_memory_size("main_ram", config.ram_size_bytes, granularity)?;

        if config.clock_frequency_hz != platform.clock.frequency_hz {
            return Err(ConfigurationError::ClockMismatch {
                requested_hz: config.clock_frequency_hz,
                clock: platform.clock.name.clone(),
                available_hz: platform.clock.frequency_hz,
            });
        }

        let memory_map = vec![
            MemoryRegion {
                name: "rom",
                origin: ROM_BASE,
                size: config.rom_size_bytes,
                cached: true,
            },
            MemoryRegion {
                name: "sram",
                origin: SRAM_BASE,
                size: SRAM_SIZE,
                cached: true,
            },
            MemoryRegion {
                name: "main_ram",
                origin: MAIN_RAM_BASE,
                size: config.ram_size_bytes,
                cached: true,
            },
            MemoryRegion {
                name: "csr",
                origin: CSR_BASE,
                size: CSR_SIZE,
                cached: false,
            },
        ];
        check_no_overlap(&memory_map)?;

        let core = CpuCore {
            cpu_type: config.cpu_type,
            clock_frequency_hz: config.clock_frequency_hz,
            ident: format!("{IDENT_PREFIX} {version_label}"),
            memory_map,
        };

        let crg = ClockResetGenerator {
            domain: "sys",
            clock_pin: platform.clock.name.clone(),
            frequency_hz: platform.clock.frequency_hz,
        };

        let descriptor = Self {
            build_name: platform.name.clone(),
            platform,
            core,
            crg,
        };
        info!(
            build_name = %descriptor.build_name,
            cpu = %descriptor.core.cpu_type,
            "assembled SoC descriptor"
        );
        debug!(ident = %descriptor.core.ident, "SoC identification");
        Ok(descriptor)
    }

    /// Serialize the descriptor for the hardware-description framework.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn check_memory_size(
    region: &'static str,
    size: u64,
    granularity: u64,
) -> Result<(), ConfigurationError> {
    if size == 0 || !size.is_power_of_two() || size % granularity != 0 {
        return Err(ConfigurationError::MemorySize {
            region,
            size,
            granularity,
        });
    }
    Ok(())
}

fn check_no_overlap(regions: &[MemoryRegion]) -> Result<(), ConfigurationError> {
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            if a.origin < b.end() && b.origin < a.end() {
                return Err(ConfigurationError::MemoryOverlap {
                    region: a.name,
                    size: a.size,
                    other: b.name,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorsoc_platform::PlatformError;

    fn assemble(config: &BoardConfig) -> Result<SocDescriptor, ConfigurationError> {
        SocDescriptor::assemble(&PlatformCatalog::builtin(), config, "5A-75E")
    }

    #[test]
    fn default_config_assembles() {
        let soc = assemble(&BoardConfig::default()).unwrap();
        assert_eq!(soc.build_name, "colorlight_5a_75e_v6_0");
        assert_eq!(soc.core.ident, "LiteX RISC-V CPU Test SoC 5A-75E");
        assert_eq!(soc.core.cpu_type, CpuType::VexRiscv);
        assert_eq!(soc.core.region("rom").unwrap().size, 0x8000);
        assert_eq!(soc.core.region("main_ram").unwrap().size, 0x4000);
        assert_eq!(soc.crg.clock_pin, "clk25");
        assert_eq!(soc.crg.frequency_hz, 25_000_000);
    }

    #[test]
    fn registered_board_with_unsafe_name_is_rejected() {
        let mut catalog = PlatformCatalog::builtin();
        let mut platform = Platform::colorlight_5a_75e_v6_0();
        platform.name = "../../escaped soc".into();
        platform.variant = "ESCAPE".into();
        catalog.register(platform);

        let config = BoardConfig {
            board_variant: "ESCAPE".into(),
            ..BoardConfig::default()
        };
        let err = SocDescriptor::assemble(&catalog, &config, "ESCAPE").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::Platform(PlatformError::InvalidName { .. })
        ));
    }

    #[test]
    fn every_supported_revision_has_a_unique_build_name() {
        let catalog = PlatformCatalog::builtin();
        let mut names = Vec::new();
        for platform in catalog.boards() {
            let config = BoardConfig {
                board_variant: platform.variant.clone(),
                revision: platform.revision.clone(),
                ..BoardConfig::default()
            };
            let soc = SocDescriptor::assemble(&catalog, &config, &platform.variant).unwrap();
            assert!(!names.contains(&soc.build_name), "{}", soc.build_name);
            names.push(soc.build_name);
        }
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn unsupported_revision_is_a_configuration_error() {
        for revision in ["5.0", "7.0", "8.0", ""] {
            let config = BoardConfig {
                revision: revision.into(),
                ..BoardConfig::default()
            };
            let err = assemble(&config).unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigurationError::Platform(PlatformError::UnsupportedRevision { .. })
                ),
                "revision {revision:?}: {err}"
            );
        }
    }

    #[test]
    fn rejects_non_power_of_two_rom() {
        let config = BoardConfig {
            rom_size_bytes: 0x6000,
            ..BoardConfig::default()
        };
        let err = assemble(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MemorySize { region: "rom", .. }
        ));
    }

    #[test]
    fn rejects_sub_granularity_ram() {
        let config = BoardConfig {
            ram_size_bytes: 2,
            ..BoardConfig::default()
        };
        let err = assemble(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MemorySize {
                region: "main_ram",
                granularity: 4,
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_ram() {
        let config = BoardConfig {
            ram_size_bytes: 0,
            ..BoardConfig::default()
        };
        assert!(assemble(&config).is_err());
    }

    #[test]
    fn rejects_rom_overlapping_sram() {
        let config = BoardConfig {
            rom_size_bytes: 0x2000_0000,
            ..BoardConfig::default()
        };
        let err = assemble(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MemoryOverlap {
                region: "rom",
                other: "sram",
                ..
            }
        ));
    }

    #[test]
    fn rejects_clock_without_pll() {
        let config = BoardConfig {
            clock_frequency_hz: 50_000_000,
            ..BoardConfig::default()
        };
        let err = assemble(&config).unwrap_err();
        assert!(matches!(err, ConfigurationError::ClockMismatch { .. }));
    }

    #[test]
    fn json_export_is_stable() {
        let soc = assemble(&BoardConfig::default()).unwrap();
        let a = soc.to_json().unwrap();
        let b = assemble(&BoardConfig::default()).unwrap().to_json().unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"build_name\": \"colorlight_5a_75e_v6_0\""));
        assert!(a.contains("\"cpu_type\": \"vexriscv\""));
    }
}
