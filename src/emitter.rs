// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction emission: maps a resolved opcode token to a table row and
//! hands the encoded bytes to a [`CodeSink`].
//!
//! Width selection is value-driven. A resolved operand below `$100` takes
//! the zero-page row when the mnemonic has one; an operand that is still
//! an unresolved label takes the absolute row so the placeholder width
//! never changes after patching.

use crate::opcodes::{self, AddressMode};
use crate::sink::{CodeSink, OperandWidth};
use crate::token::{AddressingKind, OpcodeToken, Span, Token, TokenKind};

/// What happened when an opcode token reached the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Bytes were handed to the sink.
    Emitted,
    /// The operand shape is well-formed but the mnemonic has no row for
    /// it, e.g. `JMP #$10` or `STA #$10`.
    NoMatchingEncoding,
    /// The operand slot holds a terminal syntax-error token.
    SyntaxError,
}

/// Emit one instruction. The token is the output of the full resolution
/// pipeline, so its operand (if any) is already shape-classified.
pub fn emit_instruction(op: &OpcodeToken, span: Span, sink: &mut dyn CodeSink) -> EmitOutcome {
    let mnemonic = op.mnemonic.as_str();
    let Some(operand) = op.operand.as_deref() else {
        return emit_bare(mnemonic, sink);
    };

    match &operand.kind {
        TokenKind::SyntaxError { .. } => EmitOutcome::SyntaxError,
        TokenKind::Immediate(inner) => emit_immediate(mnemonic, inner, sink),
        TokenKind::Address(kind, inner) => match kind {
            AddressingKind::Absolute => emit_plain(mnemonic, inner, span, sink),
            AddressingKind::AbsoluteX => {
                emit_direct(mnemonic, inner, AddressMode::ZeroPageX, AddressMode::AbsoluteX, sink)
            }
            AddressingKind::AbsoluteY => {
                emit_direct(mnemonic, inner, AddressMode::ZeroPageY, AddressMode::AbsoluteY, sink)
            }
            AddressingKind::Indirect => emit_indirect_word(mnemonic, inner, sink),
            AddressingKind::IndirectX => {
                emit_indirect_byte(mnemonic, inner, AddressMode::IndirectX, sink)
            }
            AddressingKind::IndirectY => {
                emit_indirect_byte(mnemonic, inner, AddressMode::IndirectY, sink)
            }
        },
        // hand-built tokens may carry the value unit unwrapped
        _ if operand.is_value_unit() => emit_plain(mnemonic, operand, span, sink),
        _ => EmitOutcome::NoMatchingEncoding,
    }
}

/// A plain address term: accumulator shorthand, branch target or direct
/// address, in that order.
fn emit_plain(mnemonic: &str, operand: &Token, span: Span, sink: &mut dyn CodeSink) -> EmitOutcome {
    if let Some(name) = operand.label_name() {
        if name.eq_ignore_ascii_case("A") {
            if let Some(code) = opcodes::lookup(mnemonic, AddressMode::Accumulator) {
                sink.emit_implied(code);
                return EmitOutcome::Emitted;
            }
        }
    }
    if opcodes::is_branch(mnemonic) {
        emit_branch(mnemonic, operand, span, sink)
    } else {
        emit_direct(mnemonic, operand, AddressMode::ZeroPage, AddressMode::Absolute, sink)
    }
}

fn emit_bare(mnemonic: &str, sink: &mut dyn CodeSink) -> EmitOutcome {
    if let Some(code) = opcodes::lookup(mnemonic, AddressMode::Implied) {
        sink.emit_implied(code);
        return EmitOutcome::Emitted;
    }
    // shift/rotate written without an operand targets the accumulator
    if let Some(code) = opcodes::lookup(mnemonic, AddressMode::Accumulator) {
        sink.emit_implied(code);
        return EmitOutcome::Emitted;
    }
    EmitOutcome::NoMatchingEncoding
}

fn emit_immediate(mnemonic: &str, inner: &Token, sink: &mut dyn CodeSink) -> EmitOutcome {
    let Some(code) = opcodes::lookup(mnemonic, AddressMode::Immediate) else {
        return EmitOutcome::NoMatchingEncoding;
    };
    if matches!(inner.kind, TokenKind::SyntaxError { .. }) {
        return EmitOutcome::SyntaxError;
    }
    if let Some(value) = inner.byte_value() {
        sink.emit_byte_operand(code, value);
        return EmitOutcome::Emitted;
    }
    if let Some(name) = inner.label_name() {
        match sink.try_resolve_label(name) {
            Some(value) if value <= 0xff => {
                sink.emit_byte_operand(code, value as u8);
                return EmitOutcome::Emitted;
            }
            Some(_) => return EmitOutcome::NoMatchingEncoding,
            None => {
                sink.emit_label_operand(code, name, OperandWidth::Byte, inner.span);
                return EmitOutcome::Emitted;
            }
        }
    }
    EmitOutcome::NoMatchingEncoding
}

/// Direct addressing with a zero-page narrowing: a value below `$100`
/// takes `zp` when the mnemonic has that row, everything else takes
/// `abs`. Unresolved labels always take `abs`.
fn emit_direct(
    mnemonic: &str,
    operand: &Token,
    zp: AddressMode,
    abs: AddressMode,
    sink: &mut dyn CodeSink,
) -> EmitOutcome {
    let resolved = operand
        .word_value()
        .or_else(|| operand.label_name().and_then(|n| sink.try_resolve_label(n)));
    if let Some(value) = resolved {
        if value <= 0xff {
            if let Some(code) = opcodes::lookup(mnemonic, zp) {
                sink.emit_byte_operand(code, value as u8);
                return EmitOutcome::Emitted;
            }
        }
        return match opcodes::lookup(mnemonic, abs) {
            Some(code) => {
                sink.emit_word_operand(code, value);
                EmitOutcome::Emitted
            }
            None => EmitOutcome::NoMatchingEncoding,
        };
    }
    match operand.label_name() {
        Some(name) => match opcodes::lookup(mnemonic, abs) {
            Some(code) => {
                sink.emit_label_operand(code, name, OperandWidth::Word, operand.span);
                EmitOutcome::Emitted
            }
            None => EmitOutcome::NoMatchingEncoding,
        },
        None => EmitOutcome::NoMatchingEncoding,
    }
}

fn emit_indirect_word(mnemonic: &str, inner: &Token, sink: &mut dyn CodeSink) -> EmitOutcome {
    let Some(code) = opcodes::lookup(mnemonic, AddressMode::Indirect) else {
        return EmitOutcome::NoMatchingEncoding;
    };
    let resolved = inner
        .word_value()
        .or_else(|| inner.label_name().and_then(|n| sink.try_resolve_label(n)));
    if let Some(value) = resolved {
        sink.emit_word_operand(code, value);
        return EmitOutcome::Emitted;
    }
    match inner.label_name() {
        Some(name) => {
            sink.emit_label_operand(code, name, OperandWidth::Word, inner.span);
            EmitOutcome::Emitted
        }
        None => EmitOutcome::NoMatchingEncoding,
    }
}

/// The `(a,X)` and `(a),Y` forms address zero page only.
fn emit_indirect_byte(
    mnemonic: &str,
    inner: &Token,
    mode: AddressMode,
    sink: &mut dyn CodeSink,
) -> EmitOutcome {
    let Some(code) = opcodes::lookup(mnemonic, mode) else {
        return EmitOutcome::NoMatchingEncoding;
    };
    let resolved = inner
        .word_value()
        .or_else(|| inner.label_name().and_then(|n| sink.try_resolve_label(n)));
    match resolved {
        Some(value) if value <= 0xff => {
            sink.emit_byte_operand(code, value as u8);
            EmitOutcome::Emitted
        }
        Some(_) => EmitOutcome::NoMatchingEncoding,
        None => match inner.label_name() {
            Some(name) => {
                sink.emit_label_operand(code, name, OperandWidth::Byte, inner.span);
                EmitOutcome::Emitted
            }
            None => EmitOutcome::NoMatchingEncoding,
        },
    }
}

fn emit_branch(
    mnemonic: &str,
    operand: &Token,
    span: Span,
    sink: &mut dyn CodeSink,
) -> EmitOutcome {
    let Some(code) = opcodes::lookup(mnemonic, AddressMode::Relative) else {
        return EmitOutcome::NoMatchingEncoding;
    };
    let resolved = operand
        .word_value()
        .or_else(|| operand.label_name().and_then(|n| sink.try_resolve_label(n)));
    if let Some(target) = resolved {
        sink.emit_relative(code, target, span);
        return EmitOutcome::Emitted;
    }
    match operand.label_name() {
        Some(name) => {
            sink.emit_relative_label(code, name, operand.span);
            EmitOutcome::Emitted
        }
        None => EmitOutcome::NoMatchingEncoding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ObjectImage;
    use crate::token::Span;

    fn span() -> Span {
        Span::new(1, 1, 1)
    }

    fn number(text: &str, base: u32) -> Token {
        Token::new(
            TokenKind::Number(crate::token::NumberLiteral {
                text: text.to_string(),
                base,
            }),
            span(),
        )
    }

    fn identifier(name: &str) -> Token {
        Token::new(TokenKind::Identifier(name.to_string()), span())
    }

    fn opcode(mnemonic: &str, operand: Option<Token>) -> OpcodeToken {
        OpcodeToken {
            mnemonic: mnemonic.to_string(),
            operand: operand.map(Box::new),
            requires_operand: opcodes::requires_operand(mnemonic),
        }
    }

    fn emit(op: &OpcodeToken, image: &mut ObjectImage) -> EmitOutcome {
        emit_instruction(op, span(), image)
    }

    #[test]
    fn implied_is_one_byte() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        assert_eq!(emit(&opcode("NOP", None), &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 1), vec![0xea]);
    }

    #[test]
    fn bare_shift_targets_accumulator() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        assert_eq!(emit(&opcode("ASL", None), &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 1), vec![0x0a]);
    }

    #[test]
    fn explicit_accumulator_operand() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("LSR", Some(identifier("A")));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 1), vec![0x4a]);
    }

    #[test]
    fn small_value_narrows_to_zero_page() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("LDA", Some(number("42", 16)));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 2), vec![0xa5, 0x42]);
    }

    #[test]
    fn large_value_stays_absolute() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("LDA", Some(number("1234", 16)));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 3), vec![0xad, 0x34, 0x12]);
    }

    #[test]
    fn small_value_without_zp_row_uses_absolute() {
        // JMP has no zero-page form
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("JMP", Some(number("10", 16)));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 3), vec![0x4c, 0x10, 0x00]);
    }

    #[test]
    fn resolved_low_label_narrows_to_zero_page() {
        let mut image = ObjectImage::new();
        assert!(image.define_label_at(0x0080, "PTR", span()));
        image.set_cursor(0x0600);
        let op = opcode("LDA", Some(identifier("PTR")));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 2), vec![0xa5, 0x80]);
    }

    #[test]
    fn unresolved_label_reserves_absolute_width() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("LDA", Some(identifier("LATER")));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        // placeholder word, even though LATER may turn out below $100
        assert_eq!(image.cursor(), 0x0603);
        assert!(image.define_label_at(0x0010, "LATER", span()));
        assert_eq!(image.bytes_at(0x0600, 3), vec![0xad, 0x10, 0x00]);
    }

    #[test]
    fn immediate_identifier_resolves_to_byte() {
        let mut image = ObjectImage::new();
        assert!(image.define_label_at(0x0007, "COUNT", span()));
        image.set_cursor(0x0600);
        let operand = Token::new(
            TokenKind::Immediate(Box::new(identifier("COUNT"))),
            span(),
        );
        let op = opcode("LDX", Some(operand));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 2), vec![0xa2, 0x07]);
    }

    #[test]
    fn indexed_modes_encode() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode(
            "STA",
            Some(Token::new(
                TokenKind::Address(AddressingKind::AbsoluteX, Box::new(number("0200", 16))),
                span(),
            )),
        );
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 3), vec![0x9d, 0x00, 0x02]);
    }

    #[test]
    fn zero_page_indexed_narrows() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode(
            "STA",
            Some(Token::new(
                TokenKind::Address(AddressingKind::AbsoluteX, Box::new(number("10", 16))),
                span(),
            )),
        );
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 2), vec![0x95, 0x10]);
    }

    #[test]
    fn indirect_modes_encode() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let jmp = opcode(
            "JMP",
            Some(Token::new(
                TokenKind::Address(AddressingKind::Indirect, Box::new(number("1234", 16))),
                span(),
            )),
        );
        assert_eq!(emit(&jmp, &mut image), EmitOutcome::Emitted);
        let lda = opcode(
            "LDA",
            Some(Token::new(
                TokenKind::Address(AddressingKind::IndirectY, Box::new(number("40", 16))),
                span(),
            )),
        );
        assert_eq!(emit(&lda, &mut image), EmitOutcome::Emitted);
        assert_eq!(
            image.bytes_at(0x0600, 5),
            vec![0x6c, 0x34, 0x12, 0xb1, 0x40]
        );
    }

    #[test]
    fn wrapped_plain_operand_encodes_like_a_bare_one() {
        let wrap = |t: Token| {
            Token::new(
                TokenKind::Address(AddressingKind::Absolute, Box::new(t)),
                span(),
            )
        };
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let lsr = opcode("LSR", Some(wrap(identifier("A"))));
        assert_eq!(emit(&lsr, &mut image), EmitOutcome::Emitted);
        let bne = opcode("BNE", Some(wrap(number("0600", 16))));
        assert_eq!(emit(&bne, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 3), vec![0x4a, 0xd0, 0xfd]);
    }

    #[test]
    fn branch_encodes_relative_displacement() {
        let mut image = ObjectImage::new();
        image.set_cursor(0x0600);
        let op = opcode("BNE", Some(number("0600", 16)));
        assert_eq!(emit(&op, &mut image), EmitOutcome::Emitted);
        assert_eq!(image.bytes_at(0x0600, 2), vec![0xd0, 0xfe]);
    }

    #[test]
    fn immediate_on_store_has_no_encoding() {
        let mut image = ObjectImage::new();
        let operand = Token::new(
            TokenKind::Immediate(Box::new(number("10", 16))),
            span(),
        );
        let op = opcode("STA", Some(operand));
        assert_eq!(emit(&op, &mut image), EmitOutcome::NoMatchingEncoding);
        assert!(image.is_empty());
    }

    #[test]
    fn indirect_jump_on_non_jmp_has_no_encoding() {
        let mut image = ObjectImage::new();
        let op = opcode(
            "LDA",
            Some(Token::new(
                TokenKind::Address(AddressingKind::Indirect, Box::new(number("1234", 16))),
                span(),
            )),
        );
        assert_eq!(emit(&op, &mut image), EmitOutcome::NoMatchingEncoding);
    }

    #[test]
    fn syntax_error_operand_reports_syntax_error() {
        let mut image = ObjectImage::new();
        let operand = Token::syntax_error("invalid offset specifier", "Z", span());
        let op = opcode("LDA", Some(operand));
        assert_eq!(emit(&op, &mut image), EmitOutcome::SyntaxError);
        assert!(image.is_empty());
    }
}
