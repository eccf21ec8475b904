// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use std::fmt;

use crate::token::Span;

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    Cli,
    Emit,
    Io,
    Scanner,
    Symbol,
    Syntax,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AsmError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic message anchored to a source span.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) span: Span,
    pub(crate) severity: Severity,
    pub(crate) error: AsmError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            span,
            severity: Severity::Error,
            error: AsmError::new(kind, message),
            file: None,
        }
    }

    pub fn warning(kind: AsmErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(kind, message, span)
        }
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn format(&self) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        format!("{}: {sev} - {}", self.span.line, self.error.message())
    }

    /// Multi-line rendering with the offending source line and a caret
    /// marker under the span.
    pub fn format_with_context(&self, lines: &[String]) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev}", self.span.line),
            None => format!("{}: {sev}", self.span.line),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        let line_idx = self.span.line.saturating_sub(1) as usize;
        match lines.get(line_idx) {
            Some(line) => {
                out.push_str(&format!("{:>5} | {}\n", self.span.line, line));
                let pad = self.span.col_start.saturating_sub(1);
                let width = self.span.col_end.saturating_sub(self.span.col_start).max(1);
                out.push_str(&format!(
                    "      | {}{}\n",
                    " ".repeat(pad),
                    "^".repeat(width)
                ));
            }
            None => out.push_str(&format!("{:>5} | <source unavailable>\n", self.span.line)),
        }
        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }
}

/// Report from an assembly run that produced output.
pub struct AsmRunReport {
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunReport {
    pub fn new(diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            diagnostics,
            source_lines,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Error from a run that could not produce output at all.
#[derive(Debug)]
pub struct AsmRunError {
    error: AsmError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            error,
            diagnostics,
            source_lines,
        }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

impl fmt::Display for AsmRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for AsmRunError {}
