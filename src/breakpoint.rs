// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Software breakpoint instructions
//!
//! A breakpoint replaces the instruction at its address with either `ebreak`
//! or, where the C extension may be present, the 16bit `c.ebreak`. Replacing a
//! compressed instruction with a full width `ebreak` would clobber the
//! following instruction.

#[cfg(test)]
mod tests;

use crate::config::{CompressedBreakpoints, DebugConfig};
use crate::instruction::Size;
use crate::target::Memory;

/// Encoding of `ebreak`
pub const EBREAK: [u8; 4] = [0x73, 0x00, 0x10, 0x00];

/// Encoding of `c.ebreak`
pub const C_EBREAK: [u8; 2] = [0x02, 0x90];

/// Kind of breakpoint, identified by the width of its instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `c.ebreak`
    Compressed = 2,
    /// `ebreak`
    Normal = 4,
}

impl Kind {
    /// Width of the breakpoint instruction in bytes
    pub const fn width(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Kind {
    type Error = usize;

    fn try_from(kind: usize) -> Result<Self, Self::Error> {
        match kind {
            2 => Ok(Self::Compressed),
            4 => Ok(Self::Normal),
            other => Err(other),
        }
    }
}

/// Determine the kind of breakpoint to place at `pc`
///
/// In [`CompressedBreakpoints::Auto`] mode, a compressed breakpoint is used
/// for addresses only 2-byte aligned and where the instruction at `pc` is
/// compressed. If the instruction cannot be read, a normal breakpoint is
/// chosen and the failure is left to the actual insertion.
pub fn breakpoint_kind<M: Memory>(config: &DebugConfig, memory: &mut M, pc: u64) -> Kind {
    match config.compressed_breakpoints {
        CompressedBreakpoints::On => Kind::Compressed,
        CompressedBreakpoints::Off => Kind::Normal,
        CompressedBreakpoints::Auto if pc & 0x2 != 0 => {
            log::debug!("Using c.ebreak for breakpoint at unaligned {pc:#x}");
            Kind::Compressed
        }
        CompressedBreakpoints::Auto => {
            let mut byte = [0u8];
            let size = memory
                .read_memory(pc, &mut byte)
                .ok()
                .map(|_| Size::from_low_byte(byte[0]));
            let kind = if size == Some(Size::Compressed) {
                Kind::Compressed
            } else {
                Kind::Normal
            };
            log::debug!("Using {kind:?} breakpoint at {pc:#x} (instruction size {size:?})");
            kind
        }
    }
}

/// Retrieve the instruction bytes of a breakpoint of the given kind
pub fn breakpoint_bytes(kind: Kind) -> &'static [u8] {
    match kind {
        Kind::Compressed => &C_EBREAK,
        Kind::Normal => &EBREAK,
    }
}
