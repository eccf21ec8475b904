// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for forge6502.

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match forge6502::assembler::run() {
        Ok(report) => {
            for diag in report.diagnostics() {
                eprintln!("{}", diag.format_with_context(report.source_lines()));
            }
        }
        Err(err) => {
            for diag in err.diagnostics() {
                eprintln!("{}", diag.format_with_context(err.source_lines()));
            }
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
