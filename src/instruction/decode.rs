// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instruction decode

use crate::config::Features;

use super::bits::Bits;
use super::table::{self, Entry};
use super::{Instruction, Operands, Size};

/// Decode for [`Instruction`]s
pub trait Decode {
    /// Decode a 16bit ("compressed") [`Instruction`]
    fn decode_16(&self, insn: u16) -> Instruction;

    /// Decode a 32bit ("normal") [`Instruction`]
    fn decode_32(&self, insn: u32) -> Instruction;

    /// Decode a 48bit [`Instruction`]
    fn decode_48(&self, _insn: u64) -> Instruction {
        Instruction::unknown(Size::Wide)
    }

    /// Decode a 64bit [`Instruction`]
    fn decode_64(&self, _insn: u64) -> Instruction {
        Instruction::unknown(Size::ExtraWide)
    }

    /// Decode an [`Instruction`] from [`Bits`]
    fn decode_bits(&self, bits: Bits) -> Instruction {
        match bits {
            Bits::Bit16(bits) => self.decode_16(bits),
            Bits::Bit32(bits) => self.decode_32(bits),
            Bits::Bit48(bits) => self.decode_48(bits),
            Bits::Bit64(bits) => self.decode_64(bits),
        }
    }
}

impl<D: Decode + ?Sized> Decode for &D {
    fn decode_16(&self, insn: u16) -> Instruction {
        D::decode_16(self, insn)
    }

    fn decode_32(&self, insn: u32) -> Instruction {
        D::decode_32(self, insn)
    }

    fn decode_48(&self, insn: u64) -> Instruction {
        D::decode_48(self, insn)
    }

    fn decode_64(&self, insn: u64) -> Instruction {
        D::decode_64(self, insn)
    }
}

/// Table driven RISC-V [`Decode`]
///
/// Decodes instructions according to the encoding [table]. Which entries are
/// considered depends on the register width and on whether Zcmp is present,
/// since Zcmp reuses encodings of compressed floating point stores.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoder {
    xlen: u8,
    zcmp: bool,
}

impl Decoder {
    /// Create a new decoder for the given register width in bytes
    pub const fn new(xlen: u8) -> Self {
        Self { xlen, zcmp: false }
    }

    /// Create a new decoder for the given [`Features`]
    pub const fn from_features(features: &Features) -> Self {
        Self {
            xlen: features.xlen,
            zcmp: features.zcmp,
        }
    }

    /// Decode Zcmp push and pop instructions
    pub const fn with_zcmp(self, zcmp: bool) -> Self {
        Self { zcmp, ..self }
    }

    /// Find the [`Entry`] an instruction decodes according to
    pub fn entry(&self, bits: Bits) -> Option<&'static Entry> {
        let (entries, insn) = match bits {
            Bits::Bit16(insn) => (table::COMPRESSED, insn.into()),
            Bits::Bit32(insn) => (table::NORMAL, insn),
            _ => return None,
        };
        entries
            .iter()
            .filter(|e| e.gate.admits(self.xlen, self.zcmp))
            .find(|e| e.matches(insn))
    }

    /// Encode an [`Instruction`]
    ///
    /// Finds an encoding of the given [`Size`] decoding to the exact same
    /// [`Instruction`]. Returns [`None`] if there is no such encoding.
    pub fn encode(&self, insn: &Instruction) -> Option<Bits> {
        let entries = match insn.size {
            Size::Compressed => table::COMPRESSED,
            Size::Normal => table::NORMAL,
            _ => return None,
        };
        entries
            .iter()
            .filter(|e| e.opcode == insn.opcode && e.gate.admits(self.xlen, self.zcmp))
            .filter_map(|e| e.shape.insert(&insn.operands).map(|f| f | e.value))
            .map(|raw| match insn.size {
                Size::Compressed => Bits::Bit16(raw as u16),
                _ => Bits::Bit32(raw),
            })
            .find(|bits| self.decode_bits(*bits) == *insn)
    }

    fn decode_with(&self, bits: Bits, insn: u32) -> Instruction {
        let size = bits.size();
        self.entry(bits)
            .map(|e| Instruction {
                size,
                opcode: e.opcode,
                operands: e.shape.extract(insn),
            })
            .unwrap_or(Instruction::unknown(size))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::from_features(&Features::default())
    }
}

impl Decode for Decoder {
    fn decode_16(&self, insn: u16) -> Instruction {
        self.decode_with(Bits::Bit16(insn), insn.into())
    }

    fn decode_32(&self, insn: u32) -> Instruction {
        self.decode_with(Bits::Bit32(insn), insn)
    }
}

impl Instruction {
    /// Create an [`Instruction`] of the given [`Size`] not known to the decoder
    pub const fn unknown(size: Size) -> Self {
        Self {
            size,
            opcode: super::Opcode::Other,
            operands: Operands::None,
        }
    }
}
