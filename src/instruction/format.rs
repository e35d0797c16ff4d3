// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Variable instruction fields
//!
//! This module provides data types holding variable fields of instruction
//! encoding variants as defined by The RISC-V Instruction Set Manual Volume I
//! [^spec] sections 2.2 Base Instruction Formats and 2.3 Immediate Encoding
//! Variants. Each type can be extracted from a 32bit instruction via its
//! [`From`] impl and placed back into an instruction via its `encode` fn.
//!
//! Compressed instructions are canonicalized into these types as well. Their
//! fields are gathered by the [table][super::table] of encodings.
//!
//! The extracted values reflect the fields' semantics: for immediates, we
//! extract the immediate value rather than the bit-patters as present in the
//! encoded instruction.
//!
//! [^spec]: found here: <https://riscv.org/specifications/ratified/>

/// Variable fields in R-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeR {
    /// Destination register
    pub rd: Register,
    /// Source register 1
    pub rs1: Register,
    /// Source register 2
    pub rs2: Register,
}

impl TypeR {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        rd_into(self.rd) | rs1_into(self.rs1) | rs2_into(self.rs2)
    }
}

impl From<u32> for TypeR {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
        }
    }
}

/// Variable fields in I-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeI {
    /// Destination register
    pub rd: Register,
    /// Source register 1
    pub rs1: Register,
    /// Immediate
    ///
    /// The immediate is sign-extended from the 12bit-wide field in encoded
    /// 32bit instruction. It is thus in the range `-2048..=2047`. For shifts,
    /// it holds the shift amount.
    pub imm: i32,
}

impl TypeI {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        rd_into(self.rd) | rs1_into(self.rs1) | ((self.imm as u32 & 0xfff) << 20)
    }
}

impl From<u32> for TypeI {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            rs1: rs1_from(insn),
            imm: (insn as i32) >> 20,
        }
    }
}

/// Variable fields in S-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeS {
    /// Source register 1, holding the base address
    pub rs1: Register,
    /// Source register 2, holding the value stored
    pub rs2: Register,
    /// Immediate
    ///
    /// The immediate is assembled from the fields in encoded 32bit
    /// instructions, which are 12bit in total, and then sign-extended. It is
    /// thus in the range `-2048..=2047`.
    pub imm: i32,
}

impl TypeS {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        let imm = self.imm as u32;
        rs1_into(self.rs1) | rs2_into(self.rs2) | ((imm & 0x01f) << 7) | ((imm & 0xfe0) << 20)
    }
}

impl From<u32> for TypeS {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> 7) & 0x01f) | ((insn >> (25 - 5)) & 0xfe0);

        Self {
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
            imm: sign_extend(imm, 11),
        }
    }
}

/// Variable fields in B-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeB {
    /// Source register 1
    pub rs1: Register,
    /// Source register 2
    pub rs2: Register,
    /// Immediate
    ///
    /// The immediate is assembled from the fields in the encoded 32bit
    /// instruction, which are 12bit in total, and then sign-extended. Since the
    /// lowest bit is not encoded in the instruction but defined as `0`, the
    /// value is a multiple of two in the range `-4096..=4094`.
    ///
    /// For 16bit instrucitons, the range is `-256..=254`.
    pub imm: i32,
}

impl TypeB {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        let imm = self.imm as u32;
        rs1_into(self.rs1)
            | rs2_into(self.rs2)
            | ((imm & 0x001e) << 7)
            | ((imm & 0x07e0) << (25 - 5))
            | ((imm & 0x0800) >> (11 - 7))
            | ((imm & 0x1000) << (31 - 12))
    }
}

impl From<u32> for TypeB {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> 7) & 0x001e)
            | ((insn >> (25 - 5)) & 0x07e0)
            | ((insn << (11 - 7)) & 0x0800)
            | ((insn >> (31 - 12)) & 0x1000);
        Self {
            rs1: rs1_from(insn),
            rs2: rs2_from(insn),
            imm: sign_extend(imm, 12),
        }
    }
}

/// Variable fields in U-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeU {
    /// Destination register
    pub rd: Register,
    /// Immediate
    ///
    /// The immediate is extracted from the upper 20 bits of 32bit instructions,
    /// as the upper 20 bits of the immediate. Thus, the lower 12 bits are
    /// always zero.
    ///
    /// For `c.lui`, the lower bits are also zero, but the overall value is
    /// sign-extended from the 6 bits of the immediate. The range is thus
    /// `-131072..=126976`.
    pub imm: i32,
}

impl TypeU {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        rd_into(self.rd) | (self.imm as u32 & 0xfffff000)
    }
}

impl From<u32> for TypeU {
    fn from(insn: u32) -> Self {
        Self {
            rd: rd_from(insn),
            imm: (insn & 0xfffff000) as i32,
        }
    }
}

/// Variable fields in J-type instructions
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeJ {
    /// Destination register
    pub rd: Register,
    /// Immediate
    ///
    /// The immediate is assembled from the fields in encoded 32bit
    /// instructions, which are 20bit in total, and then sign-extended. Since
    /// the lowest bit is not encoded in the instruction but defined as `0`, the
    /// value is a multiple of two in the range `-1048576..=1048574`.
    ///
    /// For 16bit instructions, the range is `-2048..=2046`.
    pub imm: i32,
}

impl TypeJ {
    /// Place the fields into an otherwise empty 32bit instruction
    pub const fn encode(self) -> u32 {
        let imm = self.imm as u32;
        rd_into(self.rd)
            | ((imm & 0x0007fe) << (21 - 1))
            | ((imm & 0x000800) << (20 - 11))
            | (imm & 0x0ff000)
            | ((imm & 0x100000) << (31 - 20))
    }
}

impl From<u32> for TypeJ {
    fn from(insn: u32) -> Self {
        let imm = ((insn >> (21 - 1)) & 0x0007fe)
            | ((insn >> (20 - 11)) & 0x000800)
            | (insn & 0x0ff000)
            | ((insn >> (31 - 20)) & 0x100000);
        Self {
            rd: rd_from(insn),
            imm: sign_extend(imm, 20),
        }
    }
}

/// Variable fields in Zcmp push/pop instructions
///
/// These instructions save or restore a list of registers starting with `ra`
/// and adjust the stack pointer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeP {
    /// Encoded register list
    ///
    /// Values below `4` are reserved.
    pub rlist: u8,
    /// Additional stack adjustment in units of 16 bytes
    pub spimm: u8,
}

impl TypeP {
    /// Retrieve the registers in the list, in the order of ascending addresses
    ///
    /// Returns an empty slice for reserved register lists.
    pub fn registers(self) -> &'static [Register] {
        const LIST: [Register; 13] = [1, 8, 9, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27];
        match self.rlist {
            0..=3 => &[],
            4..=14 => &LIST[..usize::from(self.rlist - 3)],
            _ => &LIST,
        }
    }

    /// Compute the stack adjustment in bytes for the given register width
    pub fn stack_adjustment(self, xlen: u8) -> u64 {
        let saved = (self.registers().len() as u64) * u64::from(xlen);
        saved.next_multiple_of(16) + 16 * u64::from(self.spimm)
    }

    /// Place the fields into an otherwise empty 16bit instruction
    pub const fn encode(self) -> u16 {
        (((self.rlist & 0xf) as u16) << 4) | (((self.spimm & 0x3) as u16) << 2)
    }
}

impl From<u16> for TypeP {
    fn from(insn: u16) -> Self {
        Self {
            rlist: ((insn >> 4) & 0xf) as u8,
            spimm: ((insn >> 2) & 0x3) as u8,
        }
    }
}

/// Register number
pub type Register = u8;

/// Extract the destination register form a 32bit instruction
pub(super) const fn rd_from(insn: u32) -> u8 {
    (insn >> 7) as u8 & REG_MASK
}

/// Extract source register 1 form a 32bit instruction
pub(super) const fn rs1_from(insn: u32) -> u8 {
    (insn >> 15) as u8 & REG_MASK
}

/// Extract source register 2 form a 32bit instruction
pub(super) const fn rs2_from(insn: u32) -> u8 {
    (insn >> 20) as u8 & REG_MASK
}

const fn rd_into(reg: Register) -> u32 {
    ((reg & REG_MASK) as u32) << 7
}

const fn rs1_into(reg: Register) -> u32 {
    ((reg & REG_MASK) as u32) << 15
}

const fn rs2_into(reg: Register) -> u32 {
    ((reg & REG_MASK) as u32) << 20
}

/// Convert an [`u32`] to an [`i32`], sign extending it from a given bit
pub(super) const fn sign_extend(value: u32, pos: u8) -> i32 {
    let shift = 31 - pos as u32;
    ((value << shift) as i32) >> shift
}

const REG_MASK: u8 = 0x1f;
