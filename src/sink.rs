// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The code-emission boundary and its standard implementation.
//!
//! The emitter talks to a [`CodeSink`] and never to an output format
//! directly. [`ObjectImage`] is the production sink: it records emitted
//! bytes as ordered `(addr, byte)` entries, keeps the symbol table, and
//! back-patches forward references once their labels resolve.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{AsmError, AsmErrorKind, Diagnostic};
use crate::symbol_table::{SymbolTable, SymbolTableResult};
use crate::token::Span;

/// Width of a deferred label operand, fixed at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandWidth {
    Byte,
    Word,
}

/// Destination for assembled code. Instruction emission, raw data bytes,
/// cursor control and label bookkeeping all cross this boundary.
pub trait CodeSink {
    /// Emit one raw data byte at the cursor.
    fn write_byte(&mut self, value: u8);
    /// Emit the bytes of `text` in source order.
    fn write_string(&mut self, text: &str);

    /// Emit a one-byte instruction (implied or accumulator form).
    fn emit_implied(&mut self, code: u8);
    /// Emit opcode plus a one-byte operand.
    fn emit_byte_operand(&mut self, code: u8, value: u8);
    /// Emit opcode plus a little-endian word operand.
    fn emit_word_operand(&mut self, code: u8, value: u16);
    /// Emit opcode plus a placeholder operand of the given width,
    /// patched when `name` resolves.
    fn emit_label_operand(&mut self, code: u8, name: &str, width: OperandWidth, span: Span);
    /// Emit a branch to a known target address; the displacement is
    /// computed and range-checked against the operand position.
    fn emit_relative(&mut self, code: u8, target: u16, span: Span);
    /// Emit a branch to a label, patched when it resolves.
    fn emit_relative_label(&mut self, code: u8, name: &str, span: Span);

    /// Reposition the output cursor.
    fn set_cursor(&mut self, addr: u16);
    /// Current output cursor.
    fn cursor(&self) -> u16;

    /// Bind `name` to the current cursor. Returns false on a duplicate.
    fn define_label(&mut self, name: &str, span: Span) -> bool;
    /// Bind `name` to a fixed address. Returns false on a duplicate.
    fn define_label_at(&mut self, addr: u16, name: &str, span: Span) -> bool;
    /// Look a label up without creating anything.
    fn try_resolve_label(&self, name: &str) -> Option<u16>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixupKind {
    Byte,
    Word,
    Relative,
}

/// A placeholder operand waiting for its label. `addr` is the address of
/// the first placeholder byte.
#[derive(Debug, Clone)]
struct Fixup {
    addr: u16,
    name: String,
    kind: FixupKind,
    span: Span,
}

/// In-memory image of the assembled program.
///
/// Entries are kept in emission order rather than as a flat 64K array, so
/// sparse programs stay sparse and the writers can compute occupied ranges.
#[derive(Debug, Default)]
pub struct ObjectImage {
    entries: Vec<(u16, u8)>,
    cursor: u16,
    symbols: SymbolTable,
    fixups: Vec<Fixup>,
    problems: Vec<Diagnostic>,
}

impl ObjectImage {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_byte(&mut self, value: u8) {
        self.entries.push((self.cursor, value));
        self.cursor = self.cursor.wrapping_add(1);
    }

    fn patch(&mut self, addr: u16, value: u8) {
        // last write wins, matching cursor-overlap semantics
        for entry in self.entries.iter_mut().rev() {
            if entry.0 == addr {
                entry.1 = value;
                return;
            }
        }
    }

    fn problem(&mut self, message: impl Into<String>, span: Span) {
        self.problems
            .push(Diagnostic::new(AsmErrorKind::Symbol, message, span));
    }

    fn apply_fixup(&mut self, fixup: &Fixup, target: u16) {
        match fixup.kind {
            FixupKind::Byte => {
                if target > 0xff {
                    self.problem(
                        format!("label '{}' does not fit in one byte", fixup.name),
                        fixup.span,
                    );
                    return;
                }
                self.patch(fixup.addr, target as u8);
            }
            FixupKind::Word => {
                self.patch(fixup.addr, (target & 0xff) as u8);
                self.patch(fixup.addr.wrapping_add(1), (target >> 8) as u8);
            }
            FixupKind::Relative => {
                match relative_displacement(fixup.addr, target) {
                    Some(disp) => self.patch(fixup.addr, disp),
                    None => self.problem(
                        format!("branch to '{}' is out of range", fixup.name),
                        fixup.span,
                    ),
                }
            }
        }
    }

    fn resolve_pending(&mut self, name: &str, addr: u16) {
        let mut matched = Vec::new();
        self.fixups.retain(|f| {
            if f.name.eq_ignore_ascii_case(name) {
                matched.push(f.clone());
                false
            } else {
                true
            }
        });
        for fixup in &matched {
            self.apply_fixup(fixup, addr);
        }
    }

    fn bind(&mut self, name: &str, addr: u16, span: Span) -> bool {
        match self.symbols.define(name, addr) {
            SymbolTableResult::Ok => {
                self.resolve_pending(name, addr);
                true
            }
            SymbolTableResult::Duplicate => {
                self.problem(format!("duplicate label '{name}'"), span);
                false
            }
        }
    }

    /// Report every fixup whose label never resolved, then drain them.
    /// Call once after the full token walk.
    pub fn finish(&mut self) {
        let unresolved = std::mem::take(&mut self.fixups);
        for fixup in unresolved {
            self.problem(format!("unresolved label '{}'", fixup.name), fixup.span);
        }
    }

    pub fn problems(&self) -> &[Diagnostic] {
        &self.problems
    }

    pub fn take_problems(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.problems)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lowest and highest occupied address, if anything was emitted.
    pub fn output_range(&self) -> Option<(u16, u16)> {
        let first = self.entries.first()?.0;
        let mut lo = first;
        let mut hi = first;
        for &(addr, _) in &self.entries {
            lo = lo.min(addr);
            hi = hi.max(addr);
        }
        Some((lo, hi))
    }

    /// Resolve the image into a dense byte vector over its occupied range,
    /// padding gaps with `fill` and letting later entries win overlaps.
    fn flatten(&self, fill: u8) -> Option<(u16, Vec<u8>)> {
        let (lo, hi) = self.output_range()?;
        let mut bytes = vec![fill; (hi - lo) as usize + 1];
        for &(addr, byte) in &self.entries {
            bytes[(addr - lo) as usize] = byte;
        }
        Some((lo, bytes))
    }

    /// Write the occupied range as a raw binary, gaps padded with `fill`.
    pub fn write_bin_file(&self, path: &Path, fill: u8) -> Result<(), AsmError> {
        let Some((_, bytes)) = self.flatten(fill) else {
            return Err(AsmError::new(AsmErrorKind::Io, "nothing to write"));
        };
        let file = File::create(path)
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        let mut out = BufWriter::new(file);
        out.write_all(&bytes)
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        out.flush()
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Write the image as Intel hex, 16 data bytes per record.
    pub fn write_hex_file(&self, path: &Path) -> Result<(), AsmError> {
        let Some((lo, bytes)) = self.flatten(0x00) else {
            return Err(AsmError::new(AsmErrorKind::Io, "nothing to write"));
        };
        let file = File::create(path)
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        let mut out = BufWriter::new(file);
        for (i, chunk) in bytes.chunks(16).enumerate() {
            let addr = lo.wrapping_add((i * 16) as u16);
            write_hex_record(&mut out, addr, chunk)
                .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        }
        writeln!(out, ":00000001FF")
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        out.flush()
            .map_err(|e| AsmError::new(AsmErrorKind::Io, format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Symbol table dump in definition order, one `NAME = $hhhh` per line.
    pub fn symbol_dump(&self) -> String {
        self.symbols.dump()
    }

    #[cfg(test)]
    pub(crate) fn bytes_at(&self, start: u16, len: usize) -> Vec<u8> {
        let Some((lo, bytes)) = self.flatten(0x00) else {
            return Vec::new();
        };
        let offset = ((start - lo) as usize).min(bytes.len());
        let end = (offset + len).min(bytes.len());
        bytes[offset..end].to_vec()
    }
}

/// Signed displacement for a branch whose operand byte sits at
/// `operand_addr`; the base is the address right after that byte.
fn relative_displacement(operand_addr: u16, target: u16) -> Option<u8> {
    let base = operand_addr.wrapping_add(1) as i32;
    let disp = target as i32 - base;
    if (-128..=127).contains(&disp) {
        Some(disp as u8)
    } else {
        None
    }
}

fn write_hex_record<W: Write>(out: &mut W, addr: u16, data: &[u8]) -> std::io::Result<()> {
    let mut sum = data.len() as u8;
    sum = sum.wrapping_add((addr >> 8) as u8).wrapping_add(addr as u8);
    write!(out, ":{:02X}{:04X}00", data.len(), addr)?;
    for &byte in data {
        write!(out, "{byte:02X}")?;
        sum = sum.wrapping_add(byte);
    }
    writeln!(out, "{:02X}", sum.wrapping_neg())
}

impl CodeSink for ObjectImage {
    fn write_byte(&mut self, value: u8) {
        self.push_byte(value);
    }

    fn write_string(&mut self, text: &str) {
        for byte in text.bytes() {
            self.push_byte(byte);
        }
    }

    fn emit_implied(&mut self, code: u8) {
        self.push_byte(code);
    }

    fn emit_byte_operand(&mut self, code: u8, value: u8) {
        self.push_byte(code);
        self.push_byte(value);
    }

    fn emit_word_operand(&mut self, code: u8, value: u16) {
        self.push_byte(code);
        self.push_byte((value & 0xff) as u8);
        self.push_byte((value >> 8) as u8);
    }

    fn emit_label_operand(&mut self, code: u8, name: &str, width: OperandWidth, span: Span) {
        self.push_byte(code);
        let operand_addr = self.cursor;
        let kind = match width {
            OperandWidth::Byte => {
                self.push_byte(0x00);
                FixupKind::Byte
            }
            OperandWidth::Word => {
                self.push_byte(0x00);
                self.push_byte(0x00);
                FixupKind::Word
            }
        };
        self.fixups.push(Fixup {
            addr: operand_addr,
            name: name.to_string(),
            kind,
            span,
        });
    }

    fn emit_relative(&mut self, code: u8, target: u16, span: Span) {
        self.push_byte(code);
        match relative_displacement(self.cursor, target) {
            Some(disp) => self.push_byte(disp),
            None => {
                self.problem(format!("branch to ${target:04x} is out of range"), span);
                self.push_byte(0x00);
            }
        }
    }

    fn emit_relative_label(&mut self, code: u8, name: &str, span: Span) {
        self.push_byte(code);
        let operand_addr = self.cursor;
        self.push_byte(0x00);
        self.fixups.push(Fixup {
            addr: operand_addr,
            name: name.to_string(),
            kind: FixupKind::Relative,
            span,
        });
    }

    fn set_cursor(&mut self, addr: u16) {
        self.cursor = addr;
    }

    fn cursor(&self) -> u16 {
        self.cursor
    }

    fn define_label(&mut self, name: &str, span: Span) -> bool {
        let addr = self.cursor;
        self.bind(name, addr, span)
    }

    fn define_label_at(&mut self, addr: u16, name: &str, span: Span) -> bool {
        self.bind(name, addr, span)
    }

    fn try_resolve_label(&self, name: &str) -> Option<u16> {
        self.symbols.resolve(name)
    }
}
