// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instruction sequence scanners
//!
//! This module provides forward scans over instruction sequences recognizing
//! compiler generated idioms:
//!
//! * the [prologue] scanner determines where a function's prologue ends and
//!   where it saves the caller's registers,
//! * the [epilogue] scanner decides whether an address lies within a
//!   function's tear-down sequence and
//! * the [atomic] sequence scanner finds the addresses at which a
//!   load-reserved/store-conditional sequence may safely be interrupted.
//!
//! All scans are bounded by an instruction or address budget taken from the
//! [`DebugConfig`].

pub mod atomic;
pub mod epilogue;
pub mod error;
pub mod prologue;

#[cfg(test)]
mod tests;

pub use atomic::atomic_sequence_breakpoints;
pub use epilogue::{Epilogue, is_in_epilogue, scan_epilogue};
pub use error::Error;
pub use prologue::{PrologueCache, scan_prologue};

use crate::arch::Architecture;
use crate::config::DebugConfig;
use crate::target::{Memory, Symbols};

/// Determine the limit of a prologue scan for the function at `start`
///
/// The limit is the end of the prologue according to line information if
/// known, or `start` moved by the configured prologue limit otherwise. It never
/// exceeds `end`, e.g. the current pc of a frame.
pub fn limit<S: Symbols>(config: &DebugConfig, symbols: &mut S, start: u64, end: u64) -> u64 {
    symbols
        .prologue_end(start)
        .unwrap_or_else(|| start.saturating_add(config.prologue_limit))
        .min(end)
}

/// Skip the prologue of the function at `pc`
///
/// Returns the first address after the prologue of the function starting at
/// `pc`. If line information knows the prologue's end, the result is that
/// address but never below `pc`. Otherwise the function's prologue is scanned,
/// bounded by the function's end if known.
pub fn skip_prologue<A, M, S>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    symbols: &mut S,
    pc: u64,
) -> Result<u64, Error<M::Error>>
where
    A: Architecture,
    M: Memory,
    S: Symbols,
{
    let function = symbols.find_function(pc);
    let start = function.as_ref().map(|f| f.start).unwrap_or(pc);
    if let Some(end) = symbols.prologue_end(start) {
        log::debug!("Prologue of {start:#x} ends at {end:#x} according to line information");
        return Ok(end.max(pc));
    }

    let end = function.map(|f| f.end).unwrap_or(u64::MAX);
    let limit = start.saturating_add(config.prologue_limit).min(end);
    scan_prologue(arch, config, memory, start, limit, None).map(|e| e.max(pc))
}
