// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token stream with a consuming `take` cursor and an independent,
//! auto-resetting `peek` cursor.
//!
//! The peek cursor always starts at the take position and advances on each
//! `peek` call without consuming anything; any `take` resets it. Reads past
//! the end return the end-of-stream sentinel instead of failing, so passes
//! can probe arbitrarily far ahead without bounds checks.

use crate::token::{Span, Token, TokenKind};

#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    take_pos: usize,
    peek_pos: usize,
    eof: Token,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = tokens
            .iter()
            .find(|t| t.is_eof())
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, Span::default()));
        Self {
            tokens,
            take_pos: 0,
            peek_pos: 0,
            eof,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume and return the next token; past the end the sentinel is
    /// returned. Resets the peek cursor to the post-take position.
    pub fn take(&mut self) -> Token {
        let token = match self.tokens.get(self.take_pos) {
            Some(token) => {
                self.take_pos += 1;
                token.clone()
            }
            None => self.eof.clone(),
        };
        self.peek_pos = self.take_pos;
        token
    }

    /// Look at the next unpeeked token without consuming; each call moves
    /// the peek cursor one further.
    pub fn peek(&mut self) -> &Token {
        let idx = self.peek_pos;
        if idx < self.tokens.len() {
            self.peek_pos += 1;
            &self.tokens[idx]
        } else {
            &self.eof
        }
    }

    pub fn reset_peek(&mut self) {
        self.peek_pos = self.take_pos;
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::TokenStream;
    use crate::scanner::scan;
    use crate::token::TokenKind;

    #[test]
    fn take_consumes_in_order() {
        let mut stream = TokenStream::new(scan("( )"));
        assert!(matches!(stream.take().kind, TokenKind::OpenParen));
        assert!(matches!(stream.take().kind, TokenKind::CloseParen));
        assert!(matches!(stream.take().kind, TokenKind::Eof));
    }

    #[test]
    fn peek_does_not_consume_and_take_resets_it() {
        let mut stream = TokenStream::new(scan("( , )"));
        assert!(matches!(stream.peek().kind, TokenKind::OpenParen));
        assert!(matches!(stream.peek().kind, TokenKind::Comma));
        assert!(matches!(stream.peek().kind, TokenKind::CloseParen));
        // take resets peek back to the post-take position
        assert!(matches!(stream.take().kind, TokenKind::OpenParen));
        assert!(matches!(stream.peek().kind, TokenKind::Comma));
    }

    #[test]
    fn reads_past_end_return_sentinel() {
        let mut stream = TokenStream::new(scan(""));
        assert!(matches!(stream.take().kind, TokenKind::Eof));
        assert!(matches!(stream.take().kind, TokenKind::Eof));
        assert!(matches!(stream.peek().kind, TokenKind::Eof));
    }

    #[test]
    fn reset_peek_rewinds_to_take_position() {
        let mut stream = TokenStream::new(scan("( )"));
        let _ = stream.peek();
        let _ = stream.peek();
        stream.reset_peek();
        assert!(matches!(stream.peek().kind, TokenKind::OpenParen));
    }
}
