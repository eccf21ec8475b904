// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Library entry exposing assembler modules.
pub mod assembler;
pub mod emitter;
pub mod error;
pub mod opcodes;
pub mod passes;
pub mod scanner;
pub mod sink;
pub mod stream;
pub mod symbol_table;
pub mod token;
