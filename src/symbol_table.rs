// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Case-insensitive label table, kept in definition order.

use std::fmt::Write;

#[derive(Debug, Clone)]
struct Symbol {
    name: String,
    addr: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTableResult {
    Ok,
    Duplicate,
}

/// Labels are few per source file, so a linear scan over a vector is fine
/// and keeps the dump in definition order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First definition wins; a second binding of the same name (any case)
    /// is rejected.
    pub fn define(&mut self, name: &str, addr: u16) -> SymbolTableResult {
        if self.resolve(name).is_some() {
            return SymbolTableResult::Duplicate;
        }
        self.symbols.push(Symbol {
            name: name.to_string(),
            addr,
        });
        SymbolTableResult::Ok
    }

    pub fn resolve(&self, name: &str) -> Option<u16> {
        self.symbols
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.addr)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// One `NAME = $hhhh` line per symbol, in definition order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for symbol in &self.symbols {
            let _ = writeln!(out, "{} = ${:04x}", symbol.name, symbol.addr);
        }
        out
    }
}
