// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The resolution pipeline: an ordered sequence of total stream-to-stream
//! rewrite passes that progressively disambiguate raw lexical units into
//! semantically typed tokens.
//!
//! Every pass consumes its input front-to-back via `take`, using peek-only
//! lookahead, and produces a new output stream. Passes are order-preserving
//! and each may assume the invariants established by earlier passes (the
//! operand pass, for example, relies on mnemonics already being opcode
//! tokens). Syntax-error tokens pass through untouched: they are terminal.

use crate::opcodes;
use crate::stream::TokenStream;
use crate::token::{AddressingKind, OpcodeToken, Token, TokenKind};

/// Apply all nine passes in their fixed order.
pub fn run_pipeline(stream: TokenStream) -> TokenStream {
    let stream = remove_comments(stream);
    tracing::trace!(len = stream.len(), "comments removed");
    let stream = resolve_assignments(stream);
    let stream = find_opcodes(stream);
    let stream = resolve_immediates(stream);
    let stream = resolve_indirects(stream);
    let stream = resolve_absolutes(stream);
    let stream = resolve_operands(stream);
    let stream = resolve_labels(stream);
    let stream = remove_unwanted(stream);
    tracing::trace!(len = stream.len(), "pipeline complete");
    stream
}

/// Pass 1: drop comment units.
pub fn remove_comments(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        let at_eof = t.is_eof();
        if !matches!(t.kind, TokenKind::Comment(_)) {
            out.push(t);
        }
        if at_eof {
            break;
        }
    }
    TokenStream::new(out)
}

/// Pass 2: `identifier = value` becomes a label definition with a fixed
/// address; `* = value` repositions the output cursor.
pub fn resolve_assignments(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        let assignable = matches!(t.kind, TokenKind::Identifier(_) | TokenKind::Star);
        if !(assignable && matches!(input.peek().kind, TokenKind::Assign)) {
            out.push(t);
            continue;
        }
        let _assign = input.take();
        let missing = {
            let next = input.peek();
            matches!(next.kind, TokenKind::LineEnd | TokenKind::Eof)
                .then(|| (next.describe(), next.span))
        };
        input.reset_peek();
        if let Some((text, span)) = missing {
            // leave the terminator in place so the next line still
            // starts fresh for label resolution
            out.push(Token::syntax_error("invalid assignment value", text, span));
            continue;
        }
        let value = input.take();
        match (&t.kind, value.word_value()) {
            (TokenKind::Star, Some(addr)) => {
                out.push(Token::new(TokenKind::CursorAssign(addr), t.span));
            }
            (TokenKind::Identifier(name), Some(addr)) => {
                out.push(Token::new(
                    TokenKind::LabelDef {
                        name: name.clone(),
                        addr: Some(addr),
                    },
                    t.span,
                ));
            }
            _ => {
                out.push(Token::syntax_error(
                    "invalid assignment value",
                    value.describe(),
                    value.span,
                ));
            }
        }
    }
    TokenStream::new(out)
}

/// Pass 3: identifiers matching a 6502 mnemonic (case-insensitive, exact)
/// become opcode tokens; `BYTE` becomes a pragma. Everything else passes
/// through unchanged.
pub fn find_opcodes(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        match &t.kind {
            TokenKind::Identifier(name) => {
                let upper = name.to_ascii_uppercase();
                if upper == "BYTE" {
                    out.push(Token::new(
                        TokenKind::Pragma {
                            keyword: upper,
                            params: Vec::new(),
                        },
                        t.span,
                    ));
                } else if opcodes::is_mnemonic(&upper) {
                    let requires_operand = opcodes::requires_operand(&upper);
                    out.push(Token::new(
                        TokenKind::Opcode(OpcodeToken {
                            mnemonic: upper,
                            operand: None,
                            requires_operand,
                        }),
                        t.span,
                    ));
                } else {
                    out.push(t);
                }
            }
            _ => out.push(t),
        }
    }
    TokenStream::new(out)
}

/// Pass 4: the unit following a `#` marker wraps into an immediate; any
/// non-value unit there is a syntax error.
pub fn resolve_immediates(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        if !matches!(t.kind, TokenKind::Hash) {
            out.push(t);
            continue;
        }
        let missing = {
            let next = input.peek();
            matches!(next.kind, TokenKind::LineEnd | TokenKind::Eof)
                .then(|| (next.describe(), next.span))
        };
        input.reset_peek();
        if let Some((text, span)) = missing {
            out.push(Token::syntax_error("invalid immediate value", text, span));
            continue;
        }
        let value = input.take();
        if value.is_value_unit() {
            let span = t.span.merge(value.span);
            out.push(Token::new(TokenKind::Immediate(Box::new(value)), span));
        } else {
            out.push(Token::syntax_error(
                "invalid immediate value",
                value.describe(),
                value.span,
            ));
        }
    }
    TokenStream::new(out)
}

/// Pass 5: recognize the three indirect shapes `(a)`, `(a,X)` and `(a),Y`
/// by lookahead after `(`. Any other combination is a syntax error.
pub fn resolve_indirects(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    'outer: loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        if !matches!(t.kind, TokenKind::OpenParen) {
            out.push(t);
            continue;
        }

        let addr = input.take();
        if !addr.is_value_unit() {
            let addr_eof = addr.is_eof();
            out.push(Token::syntax_error(
                "malformed indirect address",
                addr.describe(),
                addr.span,
            ));
            if addr_eof {
                out.push(addr);
                break;
            }
            continue;
        }

        let next = input.take();
        match &next.kind {
            TokenKind::CloseParen => {
                // (a)  --  or  (a),Y
                if matches!(input.peek().kind, TokenKind::Comma) {
                    let index_name = match &input.peek().kind {
                        TokenKind::Identifier(name) => Some(name.clone()),
                        _ => None,
                    };
                    if let Some(index_name) = index_name {
                        let _comma = input.take();
                        let index = input.take();
                        if index_name.eq_ignore_ascii_case("Y") {
                            let span = t.span.merge(index.span);
                            out.push(Token::new(
                                TokenKind::Address(AddressingKind::IndirectY, Box::new(addr)),
                                span,
                            ));
                        } else {
                            out.push(Token::syntax_error(
                                "invalid offset specifier",
                                index_name,
                                index.span,
                            ));
                        }
                        continue;
                    }
                }
                let span = t.span.merge(next.span);
                out.push(Token::new(
                    TokenKind::Address(AddressingKind::Indirect, Box::new(addr)),
                    span,
                ));
            }
            TokenKind::Comma => {
                // (a,X)
                let index = input.take();
                let index_name = match &index.kind {
                    TokenKind::Identifier(name) => name.clone(),
                    _ => {
                        let index_eof = index.is_eof();
                        out.push(Token::syntax_error(
                            "malformed indirect address",
                            index.describe(),
                            index.span,
                        ));
                        if index_eof {
                            out.push(index);
                            break 'outer;
                        }
                        continue;
                    }
                };
                if !index_name.eq_ignore_ascii_case("X") {
                    out.push(Token::syntax_error(
                        "invalid offset specifier",
                        index_name,
                        index.span,
                    ));
                    continue;
                }
                let close = input.take();
                if matches!(close.kind, TokenKind::CloseParen) {
                    let span = t.span.merge(close.span);
                    out.push(Token::new(
                        TokenKind::Address(AddressingKind::IndirectX, Box::new(addr)),
                        span,
                    ));
                } else {
                    let close_eof = close.is_eof();
                    out.push(Token::syntax_error(
                        "malformed indirect address",
                        close.describe(),
                        close.span,
                    ));
                    if close_eof {
                        out.push(close);
                        break;
                    }
                }
            }
            _ => {
                let next_eof = next.is_eof();
                out.push(Token::syntax_error(
                    "malformed indirect address",
                    next.describe(),
                    next.span,
                ));
                if next_eof {
                    out.push(next);
                    break;
                }
            }
        }
    }
    TokenStream::new(out)
}

/// Pass 6: an address unit followed by `,X` or `,Y` becomes an indexed
/// absolute wrapper; any other index letter is a syntax error.
///
/// Everything after a pragma keyword up to the line end is a parameter
/// list, so its commas never start an indexed form.
pub fn resolve_absolutes(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    let mut in_pragma = false;
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        match &t.kind {
            TokenKind::Pragma { .. } => in_pragma = true,
            TokenKind::LineEnd => in_pragma = false,
            _ => {}
        }
        if in_pragma || !t.is_value_unit() || !matches!(input.peek().kind, TokenKind::Comma) {
            out.push(t);
            continue;
        }
        let index_name = match &input.peek().kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            _ => None,
        };
        let Some(index_name) = index_name else {
            // comma followed by a non-identifier is not an indexed form
            out.push(t);
            continue;
        };
        let _comma = input.take();
        let index = input.take();
        let span = t.span.merge(index.span);
        if index_name.eq_ignore_ascii_case("X") {
            out.push(Token::new(
                TokenKind::Address(AddressingKind::AbsoluteX, Box::new(t)),
                span,
            ));
        } else if index_name.eq_ignore_ascii_case("Y") {
            out.push(Token::new(
                TokenKind::Address(AddressingKind::AbsoluteY, Box::new(t)),
                span,
            ));
        } else {
            out.push(Token::syntax_error(
                "invalid offset specifier",
                index_name,
                index.span,
            ));
        }
    }
    TokenStream::new(out)
}

/// Pass 7: attach the single following token to each opcode that expects
/// an operand, and collect pragma parameter lists up to the line end.
///
/// A plain value unit in operand position becomes a direct-address
/// wrapper. A line terminator is never attached, so accumulator-default
/// mnemonics written bare still reach the emitter without an operand.
pub fn resolve_operands(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        let span = t.span;
        match t.kind {
            TokenKind::Opcode(op) if op.requires_operand => {
                let terminated = matches!(
                    input.peek().kind,
                    TokenKind::LineEnd | TokenKind::Eof
                );
                if terminated {
                    out.push(Token::new(TokenKind::Opcode(op), span));
                } else {
                    let operand = input.take();
                    let span = span.merge(operand.span);
                    let operand = if operand.is_value_unit() {
                        let inner_span = operand.span;
                        Token::new(
                            TokenKind::Address(AddressingKind::Absolute, Box::new(operand)),
                            inner_span,
                        )
                    } else {
                        operand
                    };
                    out.push(Token::new(
                        TokenKind::Opcode(OpcodeToken {
                            operand: Some(Box::new(operand)),
                            ..op
                        }),
                        span,
                    ));
                }
            }
            TokenKind::Pragma { keyword, .. } => {
                let mut params = Vec::new();
                loop {
                    if matches!(input.peek().kind, TokenKind::LineEnd | TokenKind::Eof) {
                        break;
                    }
                    input.reset_peek();
                    let param = input.take();
                    if !matches!(param.kind, TokenKind::Comma) {
                        params.push(param);
                    }
                }
                out.push(Token::new(TokenKind::Pragma { keyword, params }, span));
            }
            kind => out.push(Token::new(kind, span)),
        }
    }
    TokenStream::new(out)
}

/// Pass 8: an identifier appearing first on a line becomes a label
/// definition bound to the output cursor (no fixed address).
pub fn resolve_labels(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    let mut at_line_start = true;
    loop {
        let t = input.take();
        if t.is_eof() {
            out.push(t);
            break;
        }
        match &t.kind {
            TokenKind::LineEnd => {
                at_line_start = true;
                out.push(t);
            }
            TokenKind::Identifier(name) if at_line_start => {
                at_line_start = false;
                out.push(Token::new(
                    TokenKind::LabelDef {
                        name: name.clone(),
                        addr: None,
                    },
                    t.span,
                ));
            }
            _ => {
                at_line_start = false;
                out.push(t);
            }
        }
    }
    TokenStream::new(out)
}

/// Pass 9: strip line-end markers, leaving the flat emission stream.
pub fn remove_unwanted(mut input: TokenStream) -> TokenStream {
    let mut out = Vec::new();
    loop {
        let t = input.take();
        let at_eof = t.is_eof();
        if !t.is_line_end() {
            out.push(t);
        }
        if at_eof {
            break;
        }
    }
    TokenStream::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use crate::token::{AddressingKind, TokenKind};

    fn pipeline(source: &str) -> Vec<Token> {
        run_pipeline(TokenStream::new(scan(source))).into_tokens()
    }

    #[test]
    fn comments_are_removed() {
        let tokens = pipeline("NOP ; advance\n");
        assert!(!tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Comment(_))));
    }

    #[test]
    fn assignment_becomes_fixed_label() {
        let tokens = pipeline("SCREEN = $0400");
        match &tokens[0].kind {
            TokenKind::LabelDef { name, addr } => {
                assert_eq!(name, "SCREEN");
                assert_eq!(*addr, Some(0x0400));
            }
            other => panic!("expected label definition, got {other:?}"),
        }
    }

    #[test]
    fn star_assignment_becomes_cursor_assignment() {
        let tokens = pipeline("* = $C000");
        assert!(matches!(tokens[0].kind, TokenKind::CursorAssign(0xC000)));
    }

    #[test]
    fn assignment_without_value_is_error() {
        let tokens = pipeline("X = )");
        assert!(matches!(tokens[0].kind, TokenKind::SyntaxError { .. }));
    }

    #[test]
    fn dangling_assignment_keeps_the_line_boundary() {
        let tokens = pipeline("V =\nSTART NOP\n");
        assert!(
            matches!(&tokens[0].kind, TokenKind::SyntaxError { message, .. } if message == "invalid assignment value")
        );
        assert!(
            matches!(&tokens[1].kind, TokenKind::LabelDef { name, addr } if name == "START" && addr.is_none())
        );
    }

    #[test]
    fn mnemonics_become_opcodes_case_insensitively() {
        let tokens = pipeline("lda #$10");
        match &tokens[0].kind {
            TokenKind::Opcode(op) => {
                assert_eq!(op.mnemonic, "LDA");
                assert!(op.requires_operand);
                assert!(op.operand.is_some());
            }
            other => panic!("expected opcode, got {other:?}"),
        }
    }

    #[test]
    fn non_mnemonic_identifier_passes_through_to_label_pass() {
        let tokens = pipeline("START NOP");
        assert!(
            matches!(&tokens[0].kind, TokenKind::LabelDef { name, addr } if name == "START" && addr.is_none())
        );
        assert!(matches!(tokens[1].kind, TokenKind::Opcode(_)));
    }

    #[test]
    fn immediate_wraps_number_char_and_identifier() {
        for src in ["CMP #$10", "CMP #'A'", "CMP #LIMIT"] {
            let tokens = pipeline(src);
            match &tokens[0].kind {
                TokenKind::Opcode(op) => {
                    let operand = op.operand.as_ref().expect("operand");
                    assert!(
                        matches!(operand.kind, TokenKind::Immediate(_)),
                        "source {src}"
                    );
                }
                other => panic!("expected opcode, got {other:?}"),
            }
        }
    }

    #[test]
    fn immediate_without_value_is_error() {
        let tokens = pipeline("LDA #)");
        match &tokens[0].kind {
            TokenKind::Opcode(op) => {
                let operand = op.operand.as_ref().expect("operand");
                assert!(
                    matches!(&operand.kind, TokenKind::SyntaxError { message, .. } if message == "invalid immediate value")
                );
            }
            other => panic!("expected opcode, got {other:?}"),
        }
    }

    #[test]
    fn dangling_immediate_marker_keeps_the_line_boundary() {
        let tokens = pipeline("LDA #\nSTART NOP\n");
        assert!(
            matches!(&operand_of(&tokens).kind, TokenKind::SyntaxError { message, .. } if message == "invalid immediate value")
        );
        assert!(
            matches!(&tokens[1].kind, TokenKind::LabelDef { name, addr } if name == "START" && addr.is_none())
        );
    }

    fn operand_of(tokens: &[Token]) -> &Token {
        match &tokens[0].kind {
            TokenKind::Opcode(op) => op.operand.as_ref().expect("operand"),
            other => panic!("expected opcode, got {other:?}"),
        }
    }

    #[test]
    fn three_indirect_shapes_route_to_distinct_kinds() {
        let tokens = pipeline("JMP ($1234)");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::Indirect, _)
        ));

        let tokens = pipeline("LDA ($10,X)");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::IndirectX, _)
        ));

        let tokens = pipeline("LDA ($10),Y");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::IndirectY, _)
        ));
    }

    #[test]
    fn indirect_with_y_inside_parens_is_rejected() {
        let tokens = pipeline("LDA ($10,Y)");
        assert!(
            matches!(&operand_of(&tokens).kind, TokenKind::SyntaxError { message, .. } if message == "invalid offset specifier")
        );
    }

    #[test]
    fn indexed_absolute_wrappers() {
        let tokens = pipeline("LDA $1234,X");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::AbsoluteX, _)
        ));

        let tokens = pipeline("LDA TABLE,Y");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::AbsoluteY, _)
        ));
    }

    #[test]
    fn plain_address_operand_gets_a_direct_wrapper() {
        let tokens = pipeline("LDA $1234");
        assert!(matches!(
            operand_of(&tokens).kind,
            TokenKind::Address(AddressingKind::Absolute, _)
        ));
    }

    #[test]
    fn bad_index_letter_is_error() {
        let tokens = pipeline("LDA $1234,Z");
        assert!(
            matches!(&operand_of(&tokens).kind, TokenKind::SyntaxError { message, .. } if message == "invalid offset specifier")
        );
    }

    #[test]
    fn bare_accumulator_mnemonic_keeps_operand_slot_empty() {
        let tokens = pipeline("ASL\n");
        match &tokens[0].kind {
            TokenKind::Opcode(op) => {
                assert_eq!(op.mnemonic, "ASL");
                assert!(op.operand.is_none());
            }
            other => panic!("expected opcode, got {other:?}"),
        }
    }

    #[test]
    fn implied_mnemonic_never_consumes() {
        let tokens = pipeline("NOP RTS");
        assert!(matches!(&tokens[0].kind, TokenKind::Opcode(op) if op.operand.is_none()));
        assert!(matches!(&tokens[1].kind, TokenKind::Opcode(op) if op.mnemonic == "RTS"));
    }

    #[test]
    fn pragma_collects_params_up_to_line_end() {
        let tokens = pipeline("BYTE $01, $02, \"AB\"\nNOP");
        match &tokens[0].kind {
            TokenKind::Pragma { keyword, params } => {
                assert_eq!(keyword, "BYTE");
                assert_eq!(params.len(), 3);
                assert!(matches!(params[2].kind, TokenKind::StringLiteral(_)));
            }
            other => panic!("expected pragma, got {other:?}"),
        }
        assert!(matches!(tokens[1].kind, TokenKind::Opcode(_)));
    }

    #[test]
    fn pragma_params_keep_identifiers_after_commas() {
        let tokens = pipeline("BYTE $01, V\n");
        match &tokens[0].kind {
            TokenKind::Pragma { params, .. } => {
                assert_eq!(params.len(), 2);
                assert!(
                    matches!(&params[1].kind, TokenKind::Identifier(name) if name == "V")
                );
            }
            other => panic!("expected pragma, got {other:?}"),
        }
    }

    #[test]
    fn label_only_recognized_at_line_start() {
        let tokens = pipeline("JMP LOOP\nLOOP NOP");
        // operand position never becomes a label definition
        assert!(matches!(tokens[0].kind, TokenKind::Opcode(_)));
        assert!(
            matches!(&tokens[1].kind, TokenKind::LabelDef { name, addr } if name == "LOOP" && addr.is_none())
        );
    }

    #[test]
    fn line_ends_are_stripped_last() {
        let tokens = pipeline("NOP\nRTS\n");
        assert!(!tokens.iter().any(|t| t.is_line_end()));
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn syntax_errors_pass_through_untouched() {
        let tokens = pipeline("NOP @\nRTS");
        assert!(tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::SyntaxError { .. })));
        assert!(tokens
            .iter()
            .any(|t| matches!(&t.kind, TokenKind::Opcode(op) if op.mnemonic == "RTS")));
    }
}
