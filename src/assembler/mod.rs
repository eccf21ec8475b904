// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 Assembler - main entry point.
//!
//! Ties the scanner, the resolution pipeline and the emitter together
//! and walks the resolved stream into an [`ObjectImage`].

pub mod cli;


use std::fs;
use std::path::Path;

use clap::Parser;

use crate::emitter::{emit_instruction, EmitOutcome};
use crate::error::{AsmError, AsmErrorKind, AsmRunError, AsmRunReport, Diagnostic, Severity};
use crate::passes::run_pipeline;
use crate::scanner::scan;
use crate::sink::{CodeSink, ObjectImage};
use crate::stream::TokenStream;
use crate::token::{OpcodeToken, Span, Token, TokenKind};

use cli::{input_base_from_path, resolve_output_path, validate_cli, Cli, CliConfig};

pub use cli::VERSION;

/// Run the assembler with command-line arguments.
pub fn run() -> Result<AsmRunReport, AsmRunError> {
    let cli = Cli::parse();
    let config = validate_cli(&cli)?;
    let (asm_name, input_base) = input_base_from_path(&cli.infile)?;
    run_one(&cli, &asm_name, &input_base, &config)
}

fn run_one(
    cli: &Cli,
    asm_name: &str,
    input_base: &str,
    config: &CliConfig,
) -> Result<AsmRunReport, AsmRunError> {
    let contents = fs::read_to_string(asm_name).map_err(|err| {
        AsmRunError::new(
            AsmError::new(AsmErrorKind::Io, format!("{asm_name}: {err}")),
            Vec::new(),
            Vec::new(),
        )
    })?;
    let source_lines: Vec<String> = contents.lines().map(|s| s.to_string()).collect();

    tracing::debug!(file = asm_name, "assembling");
    let (image, diagnostics) = assemble(&contents);
    let diagnostics: Vec<Diagnostic> = diagnostics
        .into_iter()
        .map(|d| d.with_file(Some(asm_name.to_string())))
        .collect();

    if diagnostics.iter().any(|d| d.severity() == Severity::Error) {
        return Err(AsmRunError::new(
            AsmError::new(
                AsmErrorKind::Emit,
                "Errors detected in source. No output files created.",
            ),
            diagnostics,
            source_lines,
        ));
    }

    let out_base = cli
        .outfile
        .clone()
        .unwrap_or_else(|| input_base.to_string());
    let hex_path = match &cli.hex_name {
        Some(name) => resolve_output_path(&out_base, Some(name.clone()), "hex"),
        None if config.default_outputs => resolve_output_path(&out_base, Some(String::new()), "hex"),
        None => None,
    };
    let bin_path = resolve_output_path(&out_base, cli.bin_name.clone(), "bin");

    if !image.is_empty() {
        if let Some(path) = &hex_path {
            image
                .write_hex_file(Path::new(path))
                .map_err(|err| AsmRunError::new(err, Vec::new(), source_lines.clone()))?;
            tracing::info!(file = path.as_str(), "hex output written");
        }
        if let Some(path) = &bin_path {
            image
                .write_bin_file(Path::new(path), config.fill_byte)
                .map_err(|err| AsmRunError::new(err, Vec::new(), source_lines.clone()))?;
            tracing::info!(file = path.as_str(), "bin output written");
        }
    }

    if config.dump_symbols {
        print!("{}", image.symbol_dump());
    }

    Ok(AsmRunReport::new(diagnostics, source_lines))
}

/// Assemble a complete source text into a fresh image.
pub fn assemble(source: &str) -> (ObjectImage, Vec<Diagnostic>) {
    let mut image = ObjectImage::new();
    let diagnostics = assemble_into(source, &mut image);
    (image, diagnostics)
}

/// Assemble into an existing image. Returns every diagnostic the run
/// produced; errors never abort the walk, so one run reports them all.
pub fn assemble_into(source: &str, image: &mut ObjectImage) -> Vec<Diagnostic> {
    let stream = run_pipeline(TokenStream::new(scan(source)));
    let mut diagnostics = Vec::new();
    walk(stream, image, &mut diagnostics);
    image.finish();
    diagnostics.extend(image.take_problems());
    diagnostics
}

/// Dispatch each resolved token to the sink.
fn walk(mut stream: TokenStream, sink: &mut ObjectImage, diagnostics: &mut Vec<Diagnostic>) {
    loop {
        let token = stream.take();
        if token.is_eof() {
            break;
        }
        match &token.kind {
            TokenKind::CursorAssign(addr) => sink.set_cursor(*addr),
            TokenKind::LabelDef { name, addr } => {
                // duplicates are recorded by the sink itself
                match addr {
                    Some(addr) => {
                        sink.define_label_at(*addr, name, token.span);
                    }
                    None => {
                        sink.define_label(name, token.span);
                    }
                }
            }
            TokenKind::Opcode(op) => match emit_instruction(op, token.span, sink) {
                EmitOutcome::Emitted => {}
                EmitOutcome::NoMatchingEncoding => diagnostics.push(Diagnostic::new(
                    AsmErrorKind::Emit,
                    format!("no {} encoding for this operand", op.mnemonic),
                    token.span,
                )),
                EmitOutcome::SyntaxError => diagnostics.push(operand_diagnostic(op, token.span)),
            },
            TokenKind::Pragma { keyword, params } => {
                process_pragma(keyword, params, token.span, sink, diagnostics)
            }
            TokenKind::SyntaxError { message, text } => diagnostics.push(Diagnostic::new(
                AsmErrorKind::Syntax,
                format!("{message}: {text}"),
                token.span,
            )),
            _ => diagnostics.push(Diagnostic::new(
                AsmErrorKind::Syntax,
                format!("unexpected {}", token.describe()),
                token.span,
            )),
        }
    }
}

/// Dig the terminal error out of an opcode's operand slot.
fn operand_diagnostic(op: &OpcodeToken, span: Span) -> Diagnostic {
    let mut inner = op.operand.as_deref();
    while let Some(token) = inner {
        match &token.kind {
            TokenKind::SyntaxError { message, text } => {
                return Diagnostic::new(
                    AsmErrorKind::Syntax,
                    format!("{message}: {text}"),
                    token.span,
                );
            }
            TokenKind::Immediate(next) | TokenKind::Address(_, next) => inner = Some(next.as_ref()),
            _ => break,
        }
    }
    Diagnostic::new(
        AsmErrorKind::Syntax,
        format!("invalid operand for {}", op.mnemonic),
        span,
    )
}

fn process_pragma(
    keyword: &str,
    params: &[Token],
    span: Span,
    sink: &mut ObjectImage,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if keyword != "BYTE" {
        diagnostics.push(Diagnostic::new(
            AsmErrorKind::Syntax,
            format!("unknown pragma {keyword}"),
            span,
        ));
        return;
    }
    if params.is_empty() {
        diagnostics.push(Diagnostic::warning(
            AsmErrorKind::Emit,
            "BYTE with no parameters",
            span,
        ));
        return;
    }
    for param in params {
        match &param.kind {
            TokenKind::StringLiteral(text) => sink.write_string(text),
            TokenKind::SyntaxError { message, text } => diagnostics.push(Diagnostic::new(
                AsmErrorKind::Syntax,
                format!("{message}: {text}"),
                param.span,
            )),
            TokenKind::Identifier(name) => match sink.try_resolve_label(name) {
                Some(value) if value <= 0xff => sink.write_byte(value as u8),
                Some(_) => diagnostics.push(Diagnostic::new(
                    AsmErrorKind::Emit,
                    format!("BYTE parameter '{name}' does not fit in one byte"),
                    param.span,
                )),
                None => diagnostics.push(Diagnostic::new(
                    AsmErrorKind::Symbol,
                    format!("unresolved BYTE parameter '{name}'"),
                    param.span,
                )),
            },
            _ => match param.byte_value() {
                Some(value) => sink.write_byte(value),
                None => diagnostics.push(Diagnostic::new(
                    AsmErrorKind::Emit,
                    format!("invalid BYTE parameter: {}", param.describe()),
                    param.span,
                )),
            },
        }
    }
}
