// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Utilities for dissecting a bunch of bytes into instruction [`Bits`]

use core::fmt;

use super::Size;

/// Bits from which [`Instruction`][super::Instruction]s can be decoded
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bits {
    Bit16(u16),
    Bit32(u32),
    Bit48(u64),
    Bit64(u64),
}

impl Bits {
    /// Extract [`Bits`] from a raw byte slice
    ///
    /// Try to extract [`Bits`] from the beginning of the given slice, honoring
    /// the Base Instruction-Length Encoding specified in Section 1.5 of The
    /// RISC-V Instruction Set Manual Volume I.
    ///
    /// Returns a tuple containing the [`Bits`] and the remaining part of the
    /// slice if successful. Returns `None` if the slice does not contain
    /// enough bytes.
    pub fn extract(data: &[u8]) -> Option<(Self, &[u8])> {
        let size = Size::from_low_byte(*data.first()?);
        let (insn, rest) = data.split_at_checked(size.bytes())?;
        Some((Self::from_le_bytes(insn), rest))
    }

    /// Assemble [`Bits`] from up to eight little endian bytes
    ///
    /// The variant is chosen solely based on the number of bytes.
    pub fn from_le_bytes(data: &[u8]) -> Self {
        let value = data
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        match data.len() {
            0..=2 => Self::Bit16(value as u16),
            3..=4 => Self::Bit32(value as u32),
            5..=6 => Self::Bit48(value),
            _ => Self::Bit64(value),
        }
    }

    /// Retrieve this instruction's [`Size`]
    pub fn size(self) -> Size {
        match self {
            Self::Bit16(_) => Size::Compressed,
            Self::Bit32(_) => Size::Normal,
            Self::Bit48(_) => Size::Wide,
            Self::Bit64(_) => Size::ExtraWide,
        }
    }

    /// Write the little endian representation to the beginning of a buffer
    ///
    /// Returns the number of bytes written, or [`None`] if the buffer is too
    /// small.
    pub fn write_le_bytes(self, buf: &mut [u8]) -> Option<usize> {
        let len = self.size().bytes();
        let value = match self {
            Self::Bit16(v) => v.into(),
            Self::Bit32(v) => v.into(),
            Self::Bit48(v) | Self::Bit64(v) => v,
        };
        buf.get_mut(..len)?
            .copy_from_slice(&value.to_le_bytes()[..len]);
        Some(len)
    }
}

impl Default for Bits {
    fn default() -> Self {
        Self::Bit32(0)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit16(v) => write!(f, "{v:04x}"),
            Self::Bit32(v) => write!(f, "{v:08x}"),
            Self::Bit48(v) => write!(f, "{v:012x}"),
            Self::Bit64(v) => write!(f, "{v:016x}"),
        }
    }
}
