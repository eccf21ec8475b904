// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Character-level finite-state scanner for 6502 assembly source.
//!
//! The scanner walks the full source once and produces the flat token
//! sequence in scan order, including explicit line-end markers and a single
//! terminal `Eof` sentinel. A pending multi-character unit is always
//! finalized before the character that triggered finalization is rescanned;
//! single-character tokens are emitted and consumed in one step.

use crate::token::{NumberLiteral, Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Identifier,
    Comment,
    HexNumber,
    Number,
    /// Carries the opening quote in `Scanner::quote`; a `'` run finalizes
    /// as a char literal, a `"` run as a string literal.
    StringLiteral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Digit,
    Letter,
    Hash,
    Dollar,
    Comma,
    OpenParen,
    CloseParen,
    DoubleQuote,
    SingleQuote,
    Assign,
    Star,
    Whitespace,
    LineEnd,
    Semicolon,
    Other,
}

fn classify(c: u8) -> CharClass {
    match c {
        b'0'..=b'9' => CharClass::Digit,
        b'_' => CharClass::Letter,
        c if (c as char).is_ascii_alphabetic() => CharClass::Letter,
        b'#' => CharClass::Hash,
        b'$' => CharClass::Dollar,
        b',' => CharClass::Comma,
        b'(' => CharClass::OpenParen,
        b')' => CharClass::CloseParen,
        b'"' => CharClass::DoubleQuote,
        b'\'' => CharClass::SingleQuote,
        b'=' => CharClass::Assign,
        b'*' => CharClass::Star,
        b' ' | b'\t' | b'\r' => CharClass::Whitespace,
        b'\n' => CharClass::LineEnd,
        b';' => CharClass::Semicolon,
        _ => CharClass::Other,
    }
}

fn is_hex_digit(c: u8) -> bool {
    (c as char).is_ascii_hexdigit()
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: usize,
    state: State,
    pending: String,
    start_line: u32,
    start_col: usize,
    quote: u8,
    out: Vec<Token>,
}

/// Scan the full source text into an eagerly produced token sequence.
pub fn scan(source: &str) -> Vec<Token> {
    let mut scanner = Scanner {
        input: source.as_bytes(),
        pos: 0,
        line: 1,
        col: 1,
        state: State::Initial,
        pending: String::new(),
        start_line: 1,
        start_col: 1,
        quote: 0,
        out: Vec::new(),
    };
    scanner.run();
    tracing::trace!(tokens = scanner.out.len(), "scan complete");
    scanner.out
}

impl<'a> Scanner<'a> {
    fn run(&mut self) {
        while self.pos < self.input.len() {
            let c = self.input[self.pos];
            let consumed = self.step(c);
            if consumed {
                self.advance(c);
            }
        }
        self.finalize_at_eof();
        self.out.push(Token::new(
            TokenKind::Eof,
            Span::new(self.line, self.col, self.col),
        ));
    }

    /// Process one character in the current state. Returns whether the
    /// character was consumed; `false` reprocesses it after finalization.
    fn step(&mut self, c: u8) -> bool {
        let class = classify(c);
        match self.state {
            State::Initial => self.step_initial(c, class),
            State::Number => match class {
                CharClass::Digit => {
                    self.pending.push(c as char);
                    true
                }
                _ => {
                    self.finish_number(10);
                    false
                }
            },
            State::HexNumber => {
                // Secondary classification: hex-digit membership is only
                // consulted when the primary class has no transition here.
                if is_hex_digit(c) {
                    self.pending.push(c.to_ascii_uppercase() as char);
                    true
                } else {
                    self.finish_hex_number();
                    false
                }
            }
            State::Identifier => match class {
                CharClass::Digit | CharClass::Letter => {
                    self.pending.push(c as char);
                    true
                }
                _ => {
                    self.finish_pending(|text| TokenKind::Identifier(text));
                    false
                }
            },
            State::Comment => match class {
                CharClass::LineEnd => {
                    self.finish_pending(|text| TokenKind::Comment(text));
                    false
                }
                _ => {
                    self.pending.push(c as char);
                    true
                }
            },
            State::StringLiteral => {
                if c == self.quote {
                    self.finish_quoted();
                    true
                } else if class == CharClass::LineEnd {
                    self.finish_unterminated();
                    false
                } else {
                    self.pending.push(c as char);
                    true
                }
            }
        }
    }

    fn step_initial(&mut self, c: u8, class: CharClass) -> bool {
        match class {
            CharClass::Digit => {
                self.begin(State::Number);
                self.pending.push(c as char);
                true
            }
            CharClass::Letter => {
                self.begin(State::Identifier);
                self.pending.push(c as char);
                true
            }
            CharClass::Dollar => {
                self.begin(State::HexNumber);
                true
            }
            CharClass::Semicolon => {
                self.begin(State::Comment);
                true
            }
            CharClass::DoubleQuote => {
                self.begin(State::StringLiteral);
                self.quote = b'"';
                true
            }
            CharClass::SingleQuote => {
                self.begin(State::StringLiteral);
                self.quote = b'\'';
                true
            }
            CharClass::Hash => self.single(TokenKind::Hash),
            CharClass::Comma => self.single(TokenKind::Comma),
            CharClass::OpenParen => self.single(TokenKind::OpenParen),
            CharClass::CloseParen => self.single(TokenKind::CloseParen),
            CharClass::Assign => self.single(TokenKind::Assign),
            CharClass::Star => self.single(TokenKind::Star),
            CharClass::Whitespace => true,
            CharClass::LineEnd => {
                self.out.push(Token::new(
                    TokenKind::LineEnd,
                    Span::new(self.line, self.col, self.col),
                ));
                true
            }
            CharClass::Other => {
                self.out.push(Token::syntax_error(
                    "unexpected character",
                    (c as char).to_string(),
                    Span::new(self.line, self.col, self.col + 1),
                ));
                true
            }
        }
    }

    fn begin(&mut self, state: State) {
        self.state = state;
        self.pending.clear();
        self.start_line = self.line;
        self.start_col = self.col;
    }

    fn single(&mut self, kind: TokenKind) -> bool {
        self.out.push(Token::new(
            kind,
            Span::new(self.line, self.col, self.col + 1),
        ));
        true
    }

    fn pending_span(&self) -> Span {
        Span::new(self.start_line, self.start_col, self.col)
    }

    fn finish_pending(&mut self, make: impl FnOnce(String) -> TokenKind) {
        let text = std::mem::take(&mut self.pending);
        let span = self.pending_span();
        self.out.push(Token::new(make(text), span));
        self.state = State::Initial;
    }

    fn finish_number(&mut self, base: u32) {
        self.finish_pending(|text| TokenKind::Number(NumberLiteral { text, base }));
    }

    fn finish_hex_number(&mut self) {
        if self.pending.is_empty() {
            let span = self.pending_span();
            self.out
                .push(Token::syntax_error("invalid hex literal", "$", span));
            self.state = State::Initial;
        } else {
            self.finish_number(16);
        }
    }

    fn finish_quoted(&mut self) {
        let text = std::mem::take(&mut self.pending);
        let span = Span::new(self.start_line, self.start_col, self.col + 1);
        let token = if self.quote == b'\'' {
            match text.as_bytes() {
                [b] => Token::new(TokenKind::CharLiteral(*b), span),
                _ => Token::syntax_error("invalid char literal", text, span),
            }
        } else {
            Token::new(TokenKind::StringLiteral(text), span)
        };
        self.out.push(token);
        self.state = State::Initial;
    }

    fn finish_unterminated(&mut self) {
        let text = std::mem::take(&mut self.pending);
        let span = self.pending_span();
        self.out
            .push(Token::syntax_error("unterminated string literal", text, span));
        self.state = State::Initial;
    }

    fn finalize_at_eof(&mut self) {
        match self.state {
            State::Initial => {}
            State::Number => self.finish_number(10),
            State::HexNumber => self.finish_hex_number(),
            State::Identifier => self.finish_pending(TokenKind::Identifier),
            State::Comment => self.finish_pending(TokenKind::Comment),
            State::StringLiteral => self.finish_unterminated(),
        }
    }

    fn advance(&mut self, c: u8) {
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::scan;
    use crate::token::TokenKind;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_identifier_and_numbers() {
        let tokens = scan("LDA $10 5");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "LDA"));
        match &tokens[1].kind {
            TokenKind::Number(num) => {
                assert_eq!(num.base, 16);
                assert_eq!(num.text, "10");
            }
            other => panic!("expected hex number, got {other:?}"),
        }
        match &tokens[2].kind {
            TokenKind::Number(num) => {
                assert_eq!(num.base, 10);
                assert_eq!(num.text, "5");
            }
            other => panic!("expected decimal number, got {other:?}"),
        }
        assert!(matches!(tokens[3].kind, TokenKind::Eof));
    }

    #[test]
    fn scans_single_char_tokens() {
        let tokens = kinds("#(),=*");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Hash,
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::Comma,
                TokenKind::Assign,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hex_letters_are_identifier_letters_outside_hex_state() {
        let tokens = scan("FACE $FACE");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "FACE"));
        assert!(matches!(tokens[1].kind, TokenKind::Number(ref n) if n.text == "FACE"));
    }

    #[test]
    fn comment_runs_to_line_end() {
        let tokens = scan("NOP ; do nothing\nRTS");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(_)));
        assert!(matches!(tokens[1].kind, TokenKind::Comment(ref c) if c == " do nothing"));
        assert!(matches!(tokens[2].kind, TokenKind::LineEnd));
        assert!(matches!(tokens[3].kind, TokenKind::Identifier(ref s) if s == "RTS"));
    }

    #[test]
    fn unterminated_string_is_error_and_scanning_continues() {
        let tokens = scan("BYTE \"abc\nNOP");
        let err = tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::SyntaxError { .. }))
            .expect("expected a syntax error token");
        match &err.kind {
            TokenKind::SyntaxError { message, text } => {
                assert_eq!(message, "unterminated string literal");
                assert_eq!(text, "abc");
            }
            _ => unreachable!(),
        }
        assert!(tokens
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Identifier(ref s) if s == "NOP")));
    }

    #[test]
    fn char_literal_single_byte() {
        let tokens = scan("'A' 'AB'");
        assert!(matches!(tokens[0].kind, TokenKind::CharLiteral(b'A')));
        assert!(matches!(tokens[1].kind, TokenKind::SyntaxError { .. }));
    }

    #[test]
    fn unknown_char_yields_error_and_is_discarded() {
        let tokens = scan("NOP @ RTS");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(_)));
        assert!(
            matches!(&tokens[1].kind, TokenKind::SyntaxError { text, .. } if text == "@")
        );
        assert!(matches!(tokens[2].kind, TokenKind::Identifier(ref s) if s == "RTS"));
    }

    #[test]
    fn bare_dollar_is_error() {
        let tokens = scan("$ NOP");
        assert!(
            matches!(&tokens[0].kind, TokenKind::SyntaxError { message, .. } if message == "invalid hex literal")
        );
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = scan("NOP\n  RTS");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.col_start, 1);
        assert!(matches!(tokens[1].kind, TokenKind::LineEnd));
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.col_start, 3);
    }

    #[test]
    fn exactly_one_eof_sentinel() {
        let tokens = scan("NOP\nRTS\n");
        let eofs = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Eof))
            .count();
        assert_eq!(eofs, 1);
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn pending_unit_finalized_at_eof() {
        let tokens = scan("LOOP");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "LOOP"));
        assert!(matches!(tokens[1].kind, TokenKind::Eof));
    }
}
