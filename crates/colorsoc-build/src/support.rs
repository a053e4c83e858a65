//! Build support file rendering.
//!
//! Everything here is a pure function of the descriptor, the Trellis settings
//! and the output layout. No timestamps or host details are embedded, so a
//! re-run renders byte-identical files.

use std::path::PathBuf;

use crate::config::BuildOptions;
use crate::runner::Invocation;
use crate::soc::SocDescriptor;
use crate::toolchain::TrellisSettings;

/// A rendered file and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Render every support file for `soc`, in a fixed order.
pub fn render_all(
    soc: &SocDescriptor,
    settings: &TrellisSettings,
    options: &BuildOptions,
) -> serde_json::Result<Vec<RenderedFile>> {
    let name = &soc.build_name;
    let gateware = options.gateware_dir();
    let include = options.generated_include_dir();
    let plan = settings.invocations(soc, &gateware);

    Ok(vec![
        RenderedFile {
            path: gateware.join(format!("{name}.lpf")),
            contents: render_lpf(soc),
        },
        RenderedFile {
            path: gateware.join(format!("{name}.ys")),
            contents: settings.yosys_script(soc),
        },
        RenderedFile {
            path: gateware.join(format!("build_{name}.sh")),
            contents: render_build_script(soc, &plan),
        },
        RenderedFile {
            path: gateware.join(format!("{name}.soc.json")),
            contents: soc.to_json()? + "\n",
        },
        RenderedFile {
            path: include.join("mem.h"),
            contents: render_mem_header(soc),
        },
        RenderedFile {
            path: include.join("soc.h"),
            contents: render_soc_header(soc),
        },
    ])
}

/// Lattice Preference File: pin locations, I/O standards and the clock
/// constraint.
pub fn render_lpf(soc: &SocDescriptor) -> String {
    let platform = &soc.platform;
    let clock = &platform.clock;
    let mut out = String::new();
    out.push_str("BLOCK RESETPATHS;\n");
    out.push_str("BLOCK ASYNCPATHS;\n");

    out.push_str(&format!("LOCATE COMP \"{}\" SITE \"{}\";\n", clock.name, clock.site));
    out.push_str(&format!("IOBUF PORT \"{}\" IO_TYPE={};\n", clock.name, clock.io_standard));
    if let Some(ref led) = platform.user_led {
        out.push_str(&format!("LOCATE COMP \"{}\" SITE \"{}\";\n", led.name, led.site));
        out.push_str(&format!("IOBUF PORT \"{}\" IO_TYPE={};\n", led.name, led.io_standard));
    }
    out.push_str(&format!(
        "FREQUENCY PORT \"{}\" {:.1} MHz;\n",
        clock.name,
        clock.frequency_mhz()
    ));
    out
}

/// Shell script replaying `plan`. Written for reference, never executed.
pub fn render_build_script(soc: &SocDescriptor, plan: &[Invocation]) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(&format!("# Trellis flow for {}\n", soc.build_name));
    out.push_str("set -e\n");
    out.push_str("cd \"$(dirname \"$0\")\"\n");
    for invocation in plan {
        out.push_str(&format!("{invocation}\n"));
    }
    out
}

/// Firmware memory map header.
pub fn render_mem_header(soc: &SocDescriptor) -> String {
    let mut out = String::new();
    out.push_str("#ifndef __GENERATED_MEM_H\n");
    out.push_str("#define __GENERATED_MEM_H\n");
    for region in &soc.core.memory_map {
        let upper = region.name.to_ascii_uppercase();
        out.push('\n');
        out.push_str(&format!("#ifndef {upper}_BASE\n"));
        out.push_str(&format!("#define {upper}_BASE 0x{:08x}L\n", region.origin));
        out.push_str(&format!("#define {upper}_SIZE 0x{:08x}\n", region.size));
        out.push_str("#endif\n");
    }
    out.push_str("\n#endif\n");
    out
}

/// Firmware SoC configuration header.
pub fn render_soc_header(soc: &SocDescriptor) -> String {
    let cpu = soc.core.cpu_type;
    let mut out = String::new();
    out.push_str("#ifndef __GENERATED_SOC_H\n");
    out.push_str("#define __GENERATED_SOC_H\n");
    out.push_str(&format!("#define CONFIG_CLOCK_FREQUENCY {}\n", soc.core.clock_frequency_hz));
    out.push_str(&format!("#define CONFIG_CPU_TYPE_{}\n", cpu.name().to_ascii_uppercase()));
    out.push_str(&format!("#define CONFIG_CPU_HUMAN_NAME \"{}\"\n", cpu.name()));
    out.push_str(&format!("#define CONFIG_CPU_MARCH \"{}\"\n", cpu.march()));
    out.push_str(&format!("#define CONFIG_BUS_DATA_WIDTH {}\n", cpu.data_width_bits()));
    out.push_str(&format!("#define CONFIG_IDENTIFIER \"{}\"\n", c_escape(&soc.core.ident)));
    out.push_str(&format!("#define CONFIG_PLATFORM_NAME \"{}\"\n", soc.build_name));
    out.push_str("#endif\n");
    out
}

fn c_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
