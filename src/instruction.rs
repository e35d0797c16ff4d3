// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Instructions
//!
//! This module provides the [`Instruction`] type, which holds the canonical
//! operation and operands of a decoded RISC-V instruction, together with the
//! table driven [`Decoder`][decode::Decoder] producing them. Compressed
//! instructions are canonicalized into their full-width equivalents, e.g.
//! `c.addi16sp` decodes to an `addi` with `sp` as destination and source
//! register. The original [`Size`] is preserved.
//!
//! # Example
//!
//! ```
//! use riscv_debug_arch::instruction::{Instruction, Opcode, decode::Decoder};
//!
//! let decoder = Decoder::new(8);
//! let data = b"\x01\x11\x06\xec";
//! let (first, rest) = Instruction::extract(data, &decoder).unwrap();
//! let (second, _) = Instruction::extract(rest, &decoder).unwrap();
//! assert_eq!(first.opcode, Opcode::Addi);
//! assert_eq!(first.imm(), Some(-32));
//! assert_eq!(second.opcode, Opcode::Sd);
//! assert_eq!(second.rs2(), Some(1));
//! ```

pub mod bits;
pub mod decode;
pub mod format;
pub mod opcode;
pub mod table;

#[cfg(test)]
mod tests;

use core::fmt;

pub use opcode::Opcode;

use crate::target::Memory;

use bits::Bits;
use decode::Decode;
use format::Register;

/// A decoded instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Size of the encoded instruction
    pub size: Size,
    /// Canonical operation
    pub opcode: Opcode,
    /// Canonical operands
    pub operands: Operands,
}

impl Instruction {
    /// Create a new instruction
    pub const fn new(size: Size, opcode: Opcode, operands: Operands) -> Self {
        Self {
            size,
            opcode,
            operands,
        }
    }

    /// Extract an [`Instruction`] from a raw byte slice
    ///
    /// Try to extract [`Bits`] from the beginning of the given slice, then
    /// decode them using the given [`Decode`]. Returns the [`Instruction`] and
    /// the remaining part of the slice if successful.
    pub fn extract<'d, D: Decode>(data: &'d [u8], decoder: &D) -> Option<(Self, &'d [u8])> {
        Bits::extract(data).map(|(bits, rest)| (decoder.decode_bits(bits), rest))
    }

    /// Fetch an [`Instruction`] from [`Memory`]
    ///
    /// The first 16bit parcel is read to determine the instruction's length,
    /// then the remaining parcels are read. Instructions are always stored in
    /// little endian parcels.
    pub fn fetch<M: Memory, D: Decode>(
        memory: &mut M,
        address: u64,
        decoder: &D,
    ) -> Result<Self, M::Error> {
        let mut buf = [0u8; 8];
        memory.read_memory(address, &mut buf[..2])?;
        let len = Size::from_low_byte(buf[0]).bytes();
        if len > 2 {
            memory.read_memory(address.wrapping_add(2), &mut buf[2..len])?;
        }
        Ok(decoder.decode_bits(Bits::from_le_bytes(&buf[..len])))
    }

    /// Retrieve the destination register, if there is one
    pub fn rd(&self) -> Option<Register> {
        match self.operands {
            Operands::R(r) => Some(r.rd),
            Operands::I(i) => Some(i.rd),
            Operands::U(u) => Some(u.rd),
            Operands::J(j) => Some(j.rd),
            _ => None,
        }
    }

    /// Retrieve source register 1, if there is one
    pub fn rs1(&self) -> Option<Register> {
        match self.operands {
            Operands::R(r) => Some(r.rs1),
            Operands::I(i) => Some(i.rs1),
            Operands::S(s) => Some(s.rs1),
            Operands::B(b) => Some(b.rs1),
            _ => None,
        }
    }

    /// Retrieve source register 2, if there is one
    pub fn rs2(&self) -> Option<Register> {
        match self.operands {
            Operands::R(r) => Some(r.rs2),
            Operands::S(s) => Some(s.rs2),
            Operands::B(b) => Some(b.rs2),
            _ => None,
        }
    }

    /// Retrieve the immediate, if there is one
    pub fn imm(&self) -> Option<i64> {
        match self.operands {
            Operands::I(i) => Some(i.imm.into()),
            Operands::S(s) => Some(s.imm.into()),
            Operands::B(b) => Some(b.imm.into()),
            Operands::U(u) => Some(u.imm.into()),
            Operands::J(j) => Some(j.imm.into()),
            _ => None,
        }
    }

    /// Check whether this instruction has no effect at all
    pub fn is_nop(&self) -> bool {
        match (self.opcode, self.operands) {
            (Opcode::Addi, Operands::I(i)) => i.rd == 0 || (i.rd == i.rs1 && i.imm == 0),
            (Opcode::Add | Opcode::Or | Opcode::Xor, Operands::R(r)) => r.rd == 0,
            _ => false,
        }
    }

    /// Check whether this instruction is a return from a function
    pub fn is_return(&self) -> bool {
        match (self.opcode, self.operands) {
            (Opcode::Jalr, Operands::I(i)) => i.rd == 0 && i.rs1 == 1 && i.imm == 0,
            (Opcode::CmPopret | Opcode::CmPopretz, _) => true,
            _ => false,
        }
    }

    /// Check whether this instruction is a function call
    pub fn is_call(&self) -> bool {
        matches!(
            (self.opcode, self.rd()),
            (Opcode::Jal | Opcode::Jalr, Some(1 | 5))
        )
    }

    /// Check whether this instruction may transfer control elsewhere than to
    /// the next instruction
    pub fn is_control_transfer(&self) -> bool {
        matches!(
            self.opcode,
            Opcode::Jal
                | Opcode::Jalr
                | Opcode::Ecall
                | Opcode::Ebreak
                | Opcode::CmPopret
                | Opcode::CmPopretz
        ) || self.opcode.is_branch()
    }

    /// Determine the target of a conditional branch or direct jump
    ///
    /// Returns [`None`] for other instructions, including indirect jumps.
    pub fn branch_target(&self, pc: u64) -> Option<u64> {
        match self.operands {
            Operands::B(b) if self.opcode.is_branch() => {
                Some(pc.wrapping_add_signed(b.imm.into()))
            }
            Operands::J(j) if self.opcode == Opcode::Jal => {
                Some(pc.wrapping_add_signed(j.imm.into()))
            }
            _ => None,
        }
    }

    /// Address of the instruction following this one
    pub fn next_address(&self, pc: u64) -> u64 {
        pc.wrapping_add(self.size.bytes() as u64)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode;
        match self.operands {
            Operands::None => write!(f, "{op}"),
            Operands::R(r) => write!(f, "{op} x{}, x{}, x{}", r.rd, r.rs1, r.rs2),
            Operands::I(i) if op.load_width().is_some() || op == Opcode::Jalr => {
                write!(f, "{op} x{}, {}(x{})", i.rd, i.imm, i.rs1)
            }
            Operands::I(i) => write!(f, "{op} x{}, x{}, {}", i.rd, i.rs1, i.imm),
            Operands::S(s) => write!(f, "{op} x{}, {}(x{})", s.rs2, s.imm, s.rs1),
            Operands::B(b) => write!(f, "{op} x{}, x{}, {}", b.rs1, b.rs2, b.imm),
            Operands::U(u) => write!(f, "{op} x{}, {:#x}", u.rd, (u.imm as u32) >> 12),
            Operands::J(j) => write!(f, "{op} x{}, {}", j.rd, j.imm),
            Operands::P(p) => write!(f, "{op} {{{}}}, {}", p.rlist, p.spimm),
        }
    }
}

/// Canonical operands of an [`Instruction`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    /// No operands of interest
    None,
    R(format::TypeR),
    I(format::TypeI),
    S(format::TypeS),
    B(format::TypeB),
    U(format::TypeU),
    J(format::TypeJ),
    /// Zcmp register list and stack adjustment
    P(format::TypeP),
}

/// Instruction size
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Size {
    Compressed = 2,
    Normal = 4,
    Wide = 6,
    ExtraWide = 8,
}

impl Size {
    /// Determine the size of an instruction from its lowest byte
    ///
    /// Follows the Base Instruction-Length Encoding specified in Section 1.5
    /// of The RISC-V Instruction Set Manual Volume I. Encodings of
    /// instructions longer than 64bit are reported as [`Size::Compressed`],
    /// which will decode to an unknown instruction.
    pub const fn from_low_byte(byte: u8) -> Self {
        if byte & 0b11 != 0b11 {
            Self::Compressed
        } else if byte & 0b11100 != 0b11100 {
            Self::Normal
        } else if byte & 0x3f == 0x1f {
            Self::Wide
        } else if byte & 0x7f == 0x3f {
            Self::ExtraWide
        } else {
            Self::Compressed
        }
    }

    /// Number of bytes of an instruction of this size
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<Size> for u64 {
    fn from(size: Size) -> Self {
        size as u64
    }
}
