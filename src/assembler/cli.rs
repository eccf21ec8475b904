// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::{AsmError, AsmErrorKind, AsmRunError};

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "MOS 6502 Assembler with labels, BYTE data and zero-page optimization.

Outputs are opt-in: specify -x/--hex, -b/--bin, or both.
If neither is specified, the assembler defaults to hex output.
Use -o/--outfile to set the output base name when filenames are omitted;
it defaults to the input base.";

#[derive(Parser, Debug)]
#[command(
    name = "forge6502",
    version = VERSION,
    about = "MOS 6502 Assembler with labels, BYTE data and zero-page optimization",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "FILE",
        long_help = "Input assembly file. Must end with .asm."
    )]
    pub infile: PathBuf,
    #[arg(
        short = 'x',
        long = "hex",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit an Intel Hex file. FILE is optional; when omitted, the output base is used and a .hex extension is added."
    )]
    pub hex_name: Option<String>,
    #[arg(
        short = 'b',
        long = "bin",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit a raw binary spanning the emitted output. FILE is optional; when omitted, the output base is used and a .bin extension is added."
    )]
    pub bin_name: Option<String>,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "BASE",
        long_help = "Output filename base when -x/-b omit filenames. Defaults to the input base."
    )]
    pub outfile: Option<String>,
    #[arg(
        short = 'f',
        long = "fill",
        value_name = "hh",
        long_help = "Fill byte for gaps in binary output (2 hex digits). Defaults to 00."
    )]
    pub fill_byte: Option<String>,
    #[arg(
        short = 's',
        long = "symbols",
        long_help = "Print the symbol table after assembly."
    )]
    pub dump_symbols: bool,
}

pub fn is_valid_hex_2(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Resolve an output name: empty means "derive from base", a name without
/// an extension gets the default one appended.
pub fn resolve_output_path(base: &str, name: Option<String>, extension: &str) -> Option<String> {
    let name = name?;
    if name.is_empty() {
        return Some(format!("{base}.{extension}"));
    }
    let path = PathBuf::from(&name);
    if path.extension().is_none() {
        return Some(format!("{name}.{extension}"));
    }
    Some(name)
}

pub fn input_base_from_path(path: &Path) -> Result<(String, String), AsmRunError> {
    let asm_name = path.to_string_lossy().to_string();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(name) => name,
        None => {
            return Err(AsmRunError::new(
                AsmError::new(AsmErrorKind::Cli, "Invalid input file name"),
                Vec::new(),
                Vec::new(),
            ))
        }
    };
    if !file_name.ends_with(".asm") {
        return Err(AsmRunError::new(
            AsmError::new(AsmErrorKind::Cli, "Input file must end with .asm"),
            Vec::new(),
            Vec::new(),
        ));
    }
    let base = file_name.strip_suffix(".asm").unwrap_or(file_name);
    Ok((asm_name, base.to_string()))
}

/// Validate CLI arguments and return parsed configuration.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, AsmRunError> {
    let fill_byte = match cli.fill_byte.as_deref() {
        Some(fill) => {
            if !is_valid_hex_2(fill) {
                return Err(AsmRunError::new(
                    AsmError::new(
                        AsmErrorKind::Cli,
                        "Invalid -f/--fill byte; must be 2 hex digits",
                    ),
                    Vec::new(),
                    Vec::new(),
                ));
            }
            u8::from_str_radix(fill, 16).map_err(|_| {
                AsmRunError::new(
                    AsmError::new(
                        AsmErrorKind::Cli,
                        "Invalid -f/--fill byte; must be 2 hex digits",
                    ),
                    Vec::new(),
                    Vec::new(),
                )
            })?
        }
        None => 0x00,
    };

    let default_outputs = cli.hex_name.is_none() && cli.bin_name.is_none();

    Ok(CliConfig {
        fill_byte,
        default_outputs,
        dump_symbols: cli.dump_symbols,
    })
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub fill_byte: u8,
    pub default_outputs: bool,
    pub dump_symbols: bool,
}
