// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Canonical operations

use core::fmt;

/// Canonical operation of a decoded [`Instruction`][super::Instruction]
///
/// Compressed instructions decode to the operation of their full-width
/// equivalent. For example, both `c.mv` and `add` decode to [`Opcode::Add`].
/// Operations not relevant for debugging decode to [`Opcode::Other`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Opcode {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Ld,
    Lbu,
    Lhu,
    Lwu,
    Sb,
    Sh,
    Sw,
    Sd,
    Flw,
    Fld,
    Fsw,
    Fsd,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Addiw,
    Slliw,
    Srliw,
    Sraiw,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Addw,
    Subw,
    Sllw,
    Srlw,
    Sraw,
    LrW,
    LrD,
    ScW,
    ScD,
    /// Any atomic memory operation
    Amo,
    Fence,
    Ecall,
    Ebreak,
    /// Zcmp `cm.push`
    CmPush,
    /// Zcmp `cm.pop`
    CmPop,
    /// Zcmp `cm.popret`
    CmPopret,
    /// Zcmp `cm.popretz`
    CmPopretz,
    /// Any operation not listed
    Other,
}

impl Opcode {
    /// Check whether this is a conditional branch
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu
        )
    }

    /// Retrieve the width of memory accessed by a load, if this is one
    pub const fn load_width(self) -> Option<u8> {
        match self {
            Self::Lb | Self::Lbu => Some(1),
            Self::Lh | Self::Lhu => Some(2),
            Self::Lw | Self::Lwu | Self::Flw => Some(4),
            Self::Ld | Self::Fld => Some(8),
            _ => None,
        }
    }

    /// Retrieve the width of memory accessed by a store, if this is one
    pub const fn store_width(self) -> Option<u8> {
        match self {
            Self::Sb => Some(1),
            Self::Sh => Some(2),
            Self::Sw | Self::Fsw => Some(4),
            Self::Sd | Self::Fsd => Some(8),
            _ => None,
        }
    }

    /// Check whether the data register of this load or store is a floating
    /// point register
    pub const fn is_float_access(self) -> bool {
        matches!(self, Self::Flw | Self::Fld | Self::Fsw | Self::Fsd)
    }

    /// Check whether this is an integer operation without side effects
    /// besides writing its destination register
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Lui
                | Self::Auipc
                | Self::Addi
                | Self::Slti
                | Self::Sltiu
                | Self::Xori
                | Self::Ori
                | Self::Andi
                | Self::Slli
                | Self::Srli
                | Self::Srai
                | Self::Addiw
                | Self::Slliw
                | Self::Srliw
                | Self::Sraiw
                | Self::Add
                | Self::Sub
                | Self::Sll
                | Self::Slt
                | Self::Sltu
                | Self::Xor
                | Self::Srl
                | Self::Sra
                | Self::Or
                | Self::And
                | Self::Addw
                | Self::Subw
                | Self::Sllw
                | Self::Srlw
                | Self::Sraw
        )
    }

    /// Retrieve the mnemonic of the full-width instruction
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lui => "lui",
            Self::Auipc => "auipc",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Ld => "ld",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Lwu => "lwu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
            Self::Sd => "sd",
            Self::Flw => "flw",
            Self::Fld => "fld",
            Self::Fsw => "fsw",
            Self::Fsd => "fsd",
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Addiw => "addiw",
            Self::Slliw => "slliw",
            Self::Srliw => "srliw",
            Self::Sraiw => "sraiw",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Sll => "sll",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Xor => "xor",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
            Self::Addw => "addw",
            Self::Subw => "subw",
            Self::Sllw => "sllw",
            Self::Srlw => "srlw",
            Self::Sraw => "sraw",
            Self::LrW => "lr.w",
            Self::LrD => "lr.d",
            Self::ScW => "sc.w",
            Self::ScD => "sc.d",
            Self::Amo => "amo",
            Self::Fence => "fence",
            Self::Ecall => "ecall",
            Self::Ebreak => "ebreak",
            Self::CmPush => "cm.push",
            Self::CmPop => "cm.pop",
            Self::CmPopret => "cm.popret",
            Self::CmPopretz => "cm.popretz",
            Self::Other => "unknown",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
