// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Lexical units for 6502 assembly source.
//!
//! Tokens start out as raw lexical units from the scanner and are
//! progressively rewritten by the resolution passes into semantically
//! typed units (opcodes with attached operands, addressing-mode wrappers,
//! label definitions). Every token carries a span for diagnostics.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    pub fn new(line: u32, start: usize, end: usize) -> Self {
        Self {
            line,
            col_start: start,
            col_end: end,
        }
    }

    /// Span covering two adjacent spans, for tokens built from a run.
    pub fn merge(self, other: Span) -> Span {
        Span {
            line: self.line,
            col_start: self.col_start,
            col_end: other.col_end,
        }
    }
}

/// A numeric literal with its radix. Covers bare decimal and `$`-prefixed
/// hex literals; the stored text holds digits only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub text: String,
    pub base: u32,
}

impl NumberLiteral {
    pub fn value(&self) -> Option<u32> {
        u32::from_str_radix(&self.text, self.base).ok()
    }
}

/// Addressing-mode shape attached to an address token by the resolution
/// passes. The wrapper delegates byte/word/label capability to the wrapped
/// token rather than redefining it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingKind {
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

/// An instruction token. The operand slot is populated exactly once, by
/// the operand-attachment pass, as a rewrite producing a new token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeToken {
    pub mnemonic: String,
    pub operand: Option<Box<Token>>,
    pub requires_operand: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(NumberLiteral),
    Identifier(String),
    CharLiteral(u8),
    StringLiteral(String),
    Comment(String),
    LineEnd,
    Eof,
    Assign,
    Comma,
    OpenParen,
    CloseParen,
    Hash,
    Star,
    /// Terminal: no later pass reinterprets a syntax error.
    SyntaxError {
        message: String,
        text: String,
    },
    Opcode(OpcodeToken),
    Address(AddressingKind, Box<Token>),
    Immediate(Box<Token>),
    LabelDef {
        name: String,
        addr: Option<u16>,
    },
    CursorAssign(u16),
    Pragma {
        keyword: String,
        params: Vec<Token>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn syntax_error(message: impl Into<String>, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind: TokenKind::SyntaxError {
                message: message.into(),
                text: text.into(),
            },
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_line_end(&self) -> bool {
        matches!(self.kind, TokenKind::LineEnd)
    }

    /// Resolvable right now as an 8-bit value.
    pub fn provides_byte(&self) -> bool {
        self.byte_value().is_some()
    }

    /// Resolvable right now as a 16-bit value.
    pub fn provides_word(&self) -> bool {
        self.word_value().is_some()
    }

    /// Is, or wraps, a symbolic name needing later resolution.
    pub fn provides_label(&self) -> bool {
        self.label_name().is_some()
    }

    pub fn byte_value(&self) -> Option<u8> {
        match &self.kind {
            TokenKind::Number(num) => match num.value() {
                Some(v) if v < 0x100 => Some(v as u8),
                _ => None,
            },
            TokenKind::CharLiteral(b) => Some(*b),
            TokenKind::Address(_, inner) | TokenKind::Immediate(inner) => inner.byte_value(),
            _ => None,
        }
    }

    pub fn word_value(&self) -> Option<u16> {
        match &self.kind {
            TokenKind::Number(num) => match num.value() {
                Some(v) if v <= 0xffff => Some(v as u16),
                _ => None,
            },
            TokenKind::CharLiteral(b) => Some(*b as u16),
            TokenKind::Address(_, inner) | TokenKind::Immediate(inner) => inner.word_value(),
            _ => None,
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            TokenKind::Address(_, inner) | TokenKind::Immediate(inner) => inner.label_name(),
            _ => None,
        }
    }

    /// A raw unit that can stand as an address or immediate payload.
    pub fn is_value_unit(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number(_) | TokenKind::CharLiteral(_) | TokenKind::Identifier(_)
        )
    }

    /// Short description of the token for diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Number(num) => num.text.clone(),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::CharLiteral(b) => (*b as char).to_string(),
            TokenKind::StringLiteral(text) => text.clone(),
            TokenKind::Comment(_) => "comment".to_string(),
            TokenKind::LineEnd => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Assign => "=".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::OpenParen => "(".to_string(),
            TokenKind::CloseParen => ")".to_string(),
            TokenKind::Hash => "#".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::SyntaxError { text, .. } => text.clone(),
            TokenKind::Opcode(op) => op.mnemonic.clone(),
            TokenKind::Address(_, inner) => inner.describe(),
            TokenKind::Immediate(inner) => format!("#{}", inner.describe()),
            TokenKind::LabelDef { name, .. } => name.clone(),
            TokenKind::CursorAssign(addr) => format!("* = {addr:04x}"),
            TokenKind::Pragma { keyword, .. } => keyword.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(1, 1, 2)
    }

    #[test]
    fn number_capabilities_follow_value() {
        let small = Token::new(
            TokenKind::Number(NumberLiteral {
                text: "10".to_string(),
                base: 16,
            }),
            span(),
        );
        assert_eq!(small.byte_value(), Some(0x10));
        assert_eq!(small.word_value(), Some(0x10));
        assert!(!small.provides_label());

        let wide = Token::new(
            TokenKind::Number(NumberLiteral {
                text: "1234".to_string(),
                base: 16,
            }),
            span(),
        );
        assert_eq!(wide.byte_value(), None);
        assert_eq!(wide.word_value(), Some(0x1234));
    }

    #[test]
    fn wrappers_delegate_capabilities() {
        let inner = Token::new(
            TokenKind::Number(NumberLiteral {
                text: "42".to_string(),
                base: 10,
            }),
            span(),
        );
        let wrapped = Token::new(
            TokenKind::Address(AddressingKind::AbsoluteX, Box::new(inner)),
            span(),
        );
        assert_eq!(wrapped.byte_value(), Some(42));
        assert_eq!(wrapped.word_value(), Some(42));

        let label = Token::new(TokenKind::Identifier("loop".to_string()), span());
        let imm = Token::new(TokenKind::Immediate(Box::new(label)), span());
        assert_eq!(imm.label_name(), Some("loop"));
        assert!(!imm.provides_byte());
    }

    #[test]
    fn char_literal_is_byte_and_word() {
        let ch = Token::new(TokenKind::CharLiteral(b'A'), span());
        assert_eq!(ch.byte_value(), Some(0x41));
        assert_eq!(ch.word_value(), Some(0x41));
    }

    #[test]
    fn overflowing_number_has_no_word() {
        let too_big = Token::new(
            TokenKind::Number(NumberLiteral {
                text: "12345".to_string(),
                base: 16,
            }),
            span(),
        );
        assert_eq!(too_big.word_value(), None);
    }
}
