// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction table for the MOS 6502.
//!
//! One row per legal mnemonic/addressing-mode pair. The table is small
//! enough that linear search is sufficient. All 56 documented mnemonics
//! are present, including the full SBC row set mirroring ADC.

/// Addressing modes of the MOS 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// No operand (NOP, RTS, BRK, ...)
    Implied,
    /// ASL A, ROL A, ...
    Accumulator,
    /// #$nn
    Immediate,
    /// $nn
    ZeroPage,
    /// $nn,X
    ZeroPageX,
    /// $nn,Y
    ZeroPageY,
    /// $nnnn
    Absolute,
    /// $nnnn,X
    AbsoluteX,
    /// $nnnn,Y
    AbsoluteY,
    /// ($nnnn) - JMP only
    Indirect,
    /// ($nn,X)
    IndirectX,
    /// ($nn),Y
    IndirectY,
    /// Branch target, signed 8-bit offset
    Relative,
}

impl AddressMode {
    /// Number of operand bytes following the opcode byte.
    pub fn operand_size(&self) -> u8 {
        match self {
            AddressMode::Implied | AddressMode::Accumulator => 0,
            AddressMode::Immediate
            | AddressMode::ZeroPage
            | AddressMode::ZeroPageX
            | AddressMode::ZeroPageY
            | AddressMode::IndirectX
            | AddressMode::IndirectY
            | AddressMode::Relative => 1,
            AddressMode::Absolute
            | AddressMode::AbsoluteX
            | AddressMode::AbsoluteY
            | AddressMode::Indirect => 2,
        }
    }
}

pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub mode: AddressMode,
    pub code: u8,
}

const fn row(mnemonic: &'static str, mode: AddressMode, code: u8) -> OpcodeEntry {
    OpcodeEntry {
        mnemonic,
        mode,
        code,
    }
}

use AddressMode::*;

pub static OPCODE_TABLE: &[OpcodeEntry] = &[
    row("ADC", Immediate, 0x69),
    row("ADC", ZeroPage, 0x65),
    row("ADC", ZeroPageX, 0x75),
    row("ADC", Absolute, 0x6D),
    row("ADC", AbsoluteX, 0x7D),
    row("ADC", AbsoluteY, 0x79),
    row("ADC", IndirectX, 0x61),
    row("ADC", IndirectY, 0x71),
    row("AND", Immediate, 0x29),
    row("AND", ZeroPage, 0x25),
    row("AND", ZeroPageX, 0x35),
    row("AND", Absolute, 0x2D),
    row("AND", AbsoluteX, 0x3D),
    row("AND", AbsoluteY, 0x39),
    row("AND", IndirectX, 0x21),
    row("AND", IndirectY, 0x31),
    row("ASL", Accumulator, 0x0A),
    row("ASL", ZeroPage, 0x06),
    row("ASL", ZeroPageX, 0x16),
    row("ASL", Absolute, 0x0E),
    row("ASL", AbsoluteX, 0x1E),
    row("BCC", Relative, 0x90),
    row("BCS", Relative, 0xB0),
    row("BEQ", Relative, 0xF0),
    row("BIT", ZeroPage, 0x24),
    row("BIT", Absolute, 0x2C),
    row("BMI", Relative, 0x30),
    row("BNE", Relative, 0xD0),
    row("BPL", Relative, 0x10),
    row("BRK", Implied, 0x00),
    row("BVC", Relative, 0x50),
    row("BVS", Relative, 0x70),
    row("CLC", Implied, 0x18),
    row("CLD", Implied, 0xD8),
    row("CLI", Implied, 0x58),
    row("CLV", Implied, 0xB8),
    row("CMP", Immediate, 0xC9),
    row("CMP", ZeroPage, 0xC5),
    row("CMP", ZeroPageX, 0xD5),
    row("CMP", Absolute, 0xCD),
    row("CMP", AbsoluteX, 0xDD),
    row("CMP", AbsoluteY, 0xD9),
    row("CMP", IndirectX, 0xC1),
    row("CMP", IndirectY, 0xD1),
    row("CPX", Immediate, 0xE0),
    row("CPX", ZeroPage, 0xE4),
    row("CPX", Absolute, 0xEC),
    row("CPY", Immediate, 0xC0),
    row("CPY", ZeroPage, 0xC4),
    row("CPY", Absolute, 0xCC),
    row("DEC", ZeroPage, 0xC6),
    row("DEC", ZeroPageX, 0xD6),
    row("DEC", Absolute, 0xCE),
    row("DEC", AbsoluteX, 0xDE),
    row("DEX", Implied, 0xCA),
    row("DEY", Implied, 0x88),
    row("EOR", Immediate, 0x49),
    row("EOR", ZeroPage, 0x45),
    row("EOR", ZeroPageX, 0x55),
    row("EOR", Absolute, 0x4D),
    row("EOR", AbsoluteX, 0x5D),
    row("EOR", AbsoluteY, 0x59),
    row("EOR", IndirectX, 0x41),
    row("EOR", IndirectY, 0x51),
    row("INC", ZeroPage, 0xE6),
    row("INC", ZeroPageX, 0xF6),
    row("INC", Absolute, 0xEE),
    row("INC", AbsoluteX, 0xFE),
    row("INX", Implied, 0xE8),
    row("INY", Implied, 0xC8),
    row("JMP", Absolute, 0x4C),
    row("JMP", Indirect, 0x6C),
    row("JSR", Absolute, 0x20),
    row("LDA", Immediate, 0xA9),
    row("LDA", ZeroPage, 0xA5),
    row("LDA", ZeroPageX, 0xB5),
    row("LDA", Absolute, 0xAD),
    row("LDA", AbsoluteX, 0xBD),
    row("LDA", AbsoluteY, 0xB9),
    row("LDA", IndirectX, 0xA1),
    row("LDA", IndirectY, 0xB1),
    row("LDX", Immediate, 0xA2),
    row("LDX", ZeroPage, 0xA6),
    row("LDX", ZeroPageY, 0xB6),
    row("LDX", Absolute, 0xAE),
    row("LDX", AbsoluteY, 0xBE),
    row("LDY", Immediate, 0xA0),
    row("LDY", ZeroPage, 0xA4),
    row("LDY", ZeroPageX, 0xB4),
    row("LDY", Absolute, 0xAC),
    row("LDY", AbsoluteX, 0xBC),
    row("LSR", Accumulator, 0x4A),
    row("LSR", ZeroPage, 0x46),
    row("LSR", ZeroPageX, 0x56),
    row("LSR", Absolute, 0x4E),
    row("LSR", AbsoluteX, 0x5E),
    row("NOP", Implied, 0xEA),
    row("ORA", Immediate, 0x09),
    row("ORA", ZeroPage, 0x05),
    row("ORA", ZeroPageX, 0x15),
    row("ORA", Absolute, 0x0D),
    row("ORA", AbsoluteX, 0x1D),
    row("ORA", AbsoluteY, 0x19),
    row("ORA", IndirectX, 0x01),
    row("ORA", IndirectY, 0x11),
    row("PHA", Implied, 0x48),
    row("PHP", Implied, 0x08),
    row("PLA", Implied, 0x68),
    row("PLP", Implied, 0x28),
    row("ROL", Accumulator, 0x2A),
    row("ROL", ZeroPage, 0x26),
    row("ROL", ZeroPageX, 0x36),
    row("ROL", Absolute, 0x2E),
    row("ROL", AbsoluteX, 0x3E),
    row("ROR", Accumulator, 0x6A),
    row("ROR", ZeroPage, 0x66),
    row("ROR", ZeroPageX, 0x76),
    row("ROR", Absolute, 0x6E),
    row("ROR", AbsoluteX, 0x7E),
    row("RTI", Implied, 0x40),
    row("RTS", Implied, 0x60),
    row("SBC", Immediate, 0xE9),
    row("SBC", ZeroPage, 0xE5),
    row("SBC", ZeroPageX, 0xF5),
    row("SBC", Absolute, 0xED),
    row("SBC", AbsoluteX, 0xFD),
    row("SBC", AbsoluteY, 0xF9),
    row("SBC", IndirectX, 0xE1),
    row("SBC", IndirectY, 0xF1),
    row("SEC", Implied, 0x38),
    row("SED", Implied, 0xF8),
    row("SEI", Implied, 0x78),
    row("STA", ZeroPage, 0x85),
    row("STA", ZeroPageX, 0x95),
    row("STA", Absolute, 0x8D),
    row("STA", AbsoluteX, 0x9D),
    row("STA", AbsoluteY, 0x99),
    row("STA", IndirectX, 0x81),
    row("STA", IndirectY, 0x91),
    row("STX", ZeroPage, 0x86),
    row("STX", ZeroPageY, 0x96),
    row("STX", Absolute, 0x8E),
    row("STY", ZeroPage, 0x84),
    row("STY", ZeroPageX, 0x94),
    row("STY", Absolute, 0x8C),
    row("TAX", Implied, 0xAA),
    row("TAY", Implied, 0xA8),
    row("TSX", Implied, 0xBA),
    row("TXA", Implied, 0x8A),
    row("TXS", Implied, 0x9A),
    row("TYA", Implied, 0x98),
];

/// Look up the opcode byte for a mnemonic/mode pair.
pub fn lookup(mnemonic: &str, mode: AddressMode) -> Option<u8> {
    OPCODE_TABLE
        .iter()
        .find(|e| e.mnemonic.eq_ignore_ascii_case(mnemonic) && e.mode == mode)
        .map(|e| e.code)
}

/// Check if a name is a known mnemonic (any mode, case-insensitive).
pub fn is_mnemonic(name: &str) -> bool {
    OPCODE_TABLE
        .iter()
        .any(|e| e.mnemonic.eq_ignore_ascii_case(name))
}

pub fn supports(mnemonic: &str, mode: AddressMode) -> bool {
    lookup(mnemonic, mode).is_some()
}

/// Whether the find-opcodes pass should expect an operand token.
///
/// Implied-only mnemonics never consume one; shift/rotate mnemonics with an
/// accumulator row still report true because they also take memory
/// operands, and the operand pass declines to attach a line terminator.
pub fn requires_operand(mnemonic: &str) -> bool {
    !supports(mnemonic, AddressMode::Implied)
}

/// Branch mnemonics have exactly one table row, with relative addressing.
pub fn is_branch(mnemonic: &str) -> bool {
    supports(mnemonic, AddressMode::Relative)
}
