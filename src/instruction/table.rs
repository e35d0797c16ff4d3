// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Table of instruction encodings
//!
//! Decoding is driven by ordered lists of [`Entry`]s, one for 16bit and one for
//! 32bit instructions. An instruction decodes according to the first admitted
//! entry whose fixed bits it matches. The entry's [`Shape`] determines how the
//! variable fields are gathered into canonical [`Operands`], and how they are
//! placed back into an instruction.
//!
//! Compressed entries map to the [`Opcode`] of their full-width equivalent.
//! Entries for reserved encodings that overlap with valid ones map to
//! [`Opcode::Other`] and precede them.

use super::Operands;
use super::format::{self, Register, TypeB, TypeI, TypeJ, TypeP, TypeR, TypeS, TypeU};
use super::opcode::Opcode;

/// Encoding pattern for a single instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Mask selecting the fixed bits
    pub mask: u32,
    /// Value of the fixed bits
    pub value: u32,
    /// Operation the entry decodes to
    pub opcode: Opcode,
    /// Layout of the variable fields
    pub shape: Shape,
    /// Condition under which the entry is considered
    pub gate: Gate,
}

impl Entry {
    const fn new(mask: u32, value: u32, opcode: Opcode, shape: Shape) -> Self {
        Self {
            mask,
            value,
            opcode,
            shape,
            gate: Gate::Any,
        }
    }

    const fn gated(self, gate: Gate) -> Self {
        Self { gate, ..self }
    }

    /// Check whether the given instruction matches this entry's fixed bits
    pub const fn matches(&self, insn: u32) -> bool {
        insn & self.mask == self.value
    }
}

/// Condition for considering an [`Entry`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Always considered
    Any,
    /// Only considered for RV32
    Rv32,
    /// Only considered for RV64
    Rv64,
    /// Only considered if Zcmp is present
    Zcmp,
    /// Only considered if Zcmp is absent
    NoZcmp,
}

impl Gate {
    /// Check whether the gate admits an entry for the given target
    pub const fn admits(self, xlen: u8, zcmp: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Rv32 => xlen == 4,
            Self::Rv64 => xlen == 8,
            Self::Zcmp => zcmp,
            Self::NoZcmp => !zcmp,
        }
    }
}

/// Layout of the variable fields of an encoding
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// No variable fields of interest
    None,
    R,
    I,
    /// I-type with a shift amount instead of an immediate
    Shamt,
    S,
    B,
    U,
    J,
    /// `c.addi4spn`
    CAddi4spn,
    /// `c.lw`, `c.flw`
    CLoadW,
    /// `c.ld`, `c.fld`
    CLoadD,
    /// `c.sw`, `c.fsw`
    CStoreW,
    /// `c.sd`, `c.fsd`
    CStoreD,
    /// `c.addi`, `c.addiw`
    CAddi,
    /// `c.li`
    CLi,
    /// `c.addi16sp`
    CAddi16sp,
    /// `c.lui`
    CLui,
    /// `c.srli`, `c.srai`
    CShift,
    /// `c.andi`
    CAndi,
    /// `c.sub`, `c.xor`, `c.or`, `c.and`, `c.subw`, `c.addw`
    CArith,
    /// `c.j`
    CJump,
    /// `c.jal`
    CJumpLink,
    /// `c.beqz`, `c.bnez`
    CBranch,
    /// `c.slli`
    CSlli,
    /// `c.lwsp`, `c.flwsp`
    CLoadSpW,
    /// `c.ldsp`, `c.fldsp`
    CLoadSpD,
    /// `c.swsp`, `c.fswsp`
    CStoreSpW,
    /// `c.sdsp`, `c.fsdsp`
    CStoreSpD,
    /// `c.jr`
    CJr,
    /// `c.jalr`
    CJalr,
    /// `c.mv`
    CMv,
    /// `c.add`
    CAdd,
    /// Zcmp push and pop
    CPushPop,
}

impl Shape {
    /// Gather the variable fields of an instruction into [`Operands`]
    pub fn extract(self, insn: u32) -> Operands {
        let rd = format::rd_from(insn);
        let rs2 = c_rs2(insn);
        let high = c_prime(insn, 7);
        let low = c_prime(insn, 2);
        match self {
            Self::None => Operands::None,
            Self::R => Operands::R(TypeR::from(insn)),
            Self::I => Operands::I(TypeI::from(insn)),
            Self::Shamt => Operands::I(TypeI {
                imm: ((insn >> 20) & 0x3f) as i32,
                ..TypeI::from(insn)
            }),
            Self::S => Operands::S(TypeS::from(insn)),
            Self::B => Operands::B(TypeB::from(insn)),
            Self::U => Operands::U(TypeU::from(insn)),
            Self::J => Operands::J(TypeJ::from(insn)),
            Self::CAddi4spn => i_type(low, 2, unsigned(insn, CIW)),
            Self::CLoadW => i_type(low, high, unsigned(insn, CL_W)),
            Self::CLoadD => i_type(low, high, unsigned(insn, CL_D)),
            Self::CStoreW => s_type(high, low, unsigned(insn, CL_W)),
            Self::CStoreD => s_type(high, low, unsigned(insn, CL_D)),
            Self::CAddi => i_type(rd, rd, signed(insn, CI, 5)),
            Self::CLi => i_type(rd, 0, signed(insn, CI, 5)),
            Self::CAddi16sp => i_type(2, 2, signed(insn, CI_16SP, 9)),
            Self::CLui => Operands::U(TypeU {
                rd,
                imm: signed(insn, CI_LUI, 17),
            }),
            Self::CShift => i_type(high, high, unsigned(insn, CI)),
            Self::CAndi => i_type(high, high, signed(insn, CI, 5)),
            Self::CArith => Operands::R(TypeR {
                rd: high,
                rs1: high,
                rs2: low,
            }),
            Self::CJump => Operands::J(TypeJ {
                rd: 0,
                imm: signed(insn, CJ, 11),
            }),
            Self::CJumpLink => Operands::J(TypeJ {
                rd: 1,
                imm: signed(insn, CJ, 11),
            }),
            Self::CBranch => Operands::B(TypeB {
                rs1: high,
                rs2: 0,
                imm: signed(insn, CB, 8),
            }),
            Self::CSlli => i_type(rd, rd, unsigned(insn, CI)),
            Self::CLoadSpW => i_type(rd, 2, unsigned(insn, CI_LWSP)),
            Self::CLoadSpD => i_type(rd, 2, unsigned(insn, CI_LDSP)),
            Self::CStoreSpW => s_type(2, rs2, unsigned(insn, CSS_W)),
            Self::CStoreSpD => s_type(2, rs2, unsigned(insn, CSS_D)),
            Self::CJr => i_type(0, rd, 0),
            Self::CJalr => i_type(1, rd, 0),
            Self::CMv => Operands::R(TypeR { rd, rs1: 0, rs2 }),
            Self::CAdd => Operands::R(TypeR { rd, rs1: rd, rs2 }),
            Self::CPushPop => Operands::P(TypeP::from(insn as u16)),
        }
    }

    /// Place [`Operands`] into the variable fields of an otherwise empty
    /// instruction
    ///
    /// Returns [`None`] if the kind of [`Operands`] does not fit this shape.
    /// Fields not representable in the shape are silently truncated or
    /// dropped, e.g. a compressed register outside `x8..=x15`. Callers need to
    /// verify the result by decoding it.
    pub fn insert(self, operands: &Operands) -> Option<u32> {
        let res = match (self, *operands) {
            (Self::None, Operands::None) => 0,
            (Self::R, Operands::R(r)) => r.encode(),
            (Self::I, Operands::I(i)) => i.encode(),
            (Self::Shamt, Operands::I(i)) => TypeI { imm: i.imm & 0x3f, ..i }.encode(),
            (Self::S, Operands::S(s)) => s.encode(),
            (Self::B, Operands::B(b)) => b.encode(),
            (Self::U, Operands::U(u)) => u.encode(),
            (Self::J, Operands::J(j)) => j.encode(),
            (Self::CAddi4spn, Operands::I(i)) => prime_into(i.rd, 2) | scatter(i.imm, CIW),
            (Self::CLoadW, Operands::I(i)) => {
                prime_into(i.rd, 2) | prime_into(i.rs1, 7) | scatter(i.imm, CL_W)
            }
            (Self::CLoadD, Operands::I(i)) => {
                prime_into(i.rd, 2) | prime_into(i.rs1, 7) | scatter(i.imm, CL_D)
            }
            (Self::CStoreW, Operands::S(s)) => {
                prime_into(s.rs2, 2) | prime_into(s.rs1, 7) | scatter(s.imm, CL_W)
            }
            (Self::CStoreD, Operands::S(s)) => {
                prime_into(s.rs2, 2) | prime_into(s.rs1, 7) | scatter(s.imm, CL_D)
            }
            (Self::CAddi | Self::CLi, Operands::I(i)) => full_into(i.rd, 7) | scatter(i.imm, CI),
            (Self::CAddi16sp, Operands::I(i)) => full_into(2, 7) | scatter(i.imm, CI_16SP),
            (Self::CLui, Operands::U(u)) => full_into(u.rd, 7) | scatter(u.imm, CI_LUI),
            (Self::CShift | Self::CAndi, Operands::I(i)) => {
                prime_into(i.rd, 7) | scatter(i.imm, CI)
            }
            (Self::CArith, Operands::R(r)) => prime_into(r.rd, 7) | prime_into(r.rs2, 2),
            (Self::CJump | Self::CJumpLink, Operands::J(j)) => scatter(j.imm, CJ),
            (Self::CBranch, Operands::B(b)) => prime_into(b.rs1, 7) | scatter(b.imm, CB),
            (Self::CSlli, Operands::I(i)) => full_into(i.rd, 7) | scatter(i.imm, CI),
            (Self::CLoadSpW, Operands::I(i)) => full_into(i.rd, 7) | scatter(i.imm, CI_LWSP),
            (Self::CLoadSpD, Operands::I(i)) => full_into(i.rd, 7) | scatter(i.imm, CI_LDSP),
            (Self::CStoreSpW, Operands::S(s)) => full_into(s.rs2, 2) | scatter(s.imm, CSS_W),
            (Self::CStoreSpD, Operands::S(s)) => full_into(s.rs2, 2) | scatter(s.imm, CSS_D),
            (Self::CJr | Self::CJalr, Operands::I(i)) => full_into(i.rs1, 7),
            (Self::CMv | Self::CAdd, Operands::R(r)) => full_into(r.rd, 7) | full_into(r.rs2, 2),
            (Self::CPushPop, Operands::P(p)) => p.encode().into(),
            _ => return None,
        };
        Some(res)
    }
}

/// Entries for 16bit instructions
pub const COMPRESSED: &[Entry] = &[
    // Quadrant 0
    Entry::new(0xffff, 0x0000, Opcode::Other, Shape::None),
    Entry::new(0xe003, 0x0000, Opcode::Addi, Shape::CAddi4spn),
    Entry::new(0xe003, 0x2000, Opcode::Fld, Shape::CLoadD),
    Entry::new(0xe003, 0x4000, Opcode::Lw, Shape::CLoadW),
    Entry::new(0xe003, 0x6000, Opcode::Flw, Shape::CLoadW).gated(Gate::Rv32),
    Entry::new(0xe003, 0x6000, Opcode::Ld, Shape::CLoadD).gated(Gate::Rv64),
    Entry::new(0xe003, 0xa000, Opcode::Fsd, Shape::CStoreD),
    Entry::new(0xe003, 0xc000, Opcode::Sw, Shape::CStoreW),
    Entry::new(0xe003, 0xe000, Opcode::Fsw, Shape::CStoreW).gated(Gate::Rv32),
    Entry::new(0xe003, 0xe000, Opcode::Sd, Shape::CStoreD).gated(Gate::Rv64),
    // Quadrant 1
    Entry::new(0xe003, 0x0001, Opcode::Addi, Shape::CAddi),
    Entry::new(0xe003, 0x2001, Opcode::Jal, Shape::CJumpLink).gated(Gate::Rv32),
    Entry::new(0xe003, 0x2001, Opcode::Addiw, Shape::CAddi).gated(Gate::Rv64),
    Entry::new(0xe003, 0x4001, Opcode::Addi, Shape::CLi),
    Entry::new(0xef83, 0x6101, Opcode::Addi, Shape::CAddi16sp),
    Entry::new(0xe003, 0x6001, Opcode::Lui, Shape::CLui),
    Entry::new(0xec03, 0x8001, Opcode::Srli, Shape::CShift),
    Entry::new(0xec03, 0x8401, Opcode::Srai, Shape::CShift),
    Entry::new(0xec03, 0x8801, Opcode::Andi, Shape::CAndi),
    Entry::new(0xfc63, 0x8c01, Opcode::Sub, Shape::CArith),
    Entry::new(0xfc63, 0x8c21, Opcode::Xor, Shape::CArith),
    Entry::new(0xfc63, 0x8c41, Opcode::Or, Shape::CArith),
    Entry::new(0xfc63, 0x8c61, Opcode::And, Shape::CArith),
    Entry::new(0xfc63, 0x9c01, Opcode::Subw, Shape::CArith).gated(Gate::Rv64),
    Entry::new(0xfc63, 0x9c21, Opcode::Addw, Shape::CArith).gated(Gate::Rv64),
    Entry::new(0xe003, 0xa001, Opcode::Jal, Shape::CJump),
    Entry::new(0xe003, 0xc001, Opcode::Beq, Shape::CBranch),
    Entry::new(0xe003, 0xe001, Opcode::Bne, Shape::CBranch),
    // Quadrant 2
    Entry::new(0xe003, 0x0002, Opcode::Slli, Shape::CSlli),
    Entry::new(0xe003, 0x2002, Opcode::Fld, Shape::CLoadSpD),
    Entry::new(0xe003, 0x4002, Opcode::Lw, Shape::CLoadSpW),
    Entry::new(0xe003, 0x6002, Opcode::Flw, Shape::CLoadSpW).gated(Gate::Rv32),
    Entry::new(0xe003, 0x6002, Opcode::Ld, Shape::CLoadSpD).gated(Gate::Rv64),
    Entry::new(0xffff, 0x8002, Opcode::Other, Shape::None),
    Entry::new(0xf07f, 0x8002, Opcode::Jalr, Shape::CJr),
    Entry::new(0xf003, 0x8002, Opcode::Add, Shape::CMv),
    Entry::new(0xffff, 0x9002, Opcode::Ebreak, Shape::None),
    Entry::new(0xf07f, 0x9002, Opcode::Jalr, Shape::CJalr),
    Entry::new(0xf003, 0x9002, Opcode::Add, Shape::CAdd),
    Entry::new(0xff03, 0xb802, Opcode::CmPush, Shape::CPushPop).gated(Gate::Zcmp),
    Entry::new(0xff03, 0xba02, Opcode::CmPop, Shape::CPushPop).gated(Gate::Zcmp),
    Entry::new(0xff03, 0xbc02, Opcode::CmPopretz, Shape::CPushPop).gated(Gate::Zcmp),
    Entry::new(0xff03, 0xbe02, Opcode::CmPopret, Shape::CPushPop).gated(Gate::Zcmp),
    Entry::new(0xe003, 0xa002, Opcode::Fsd, Shape::CStoreSpD).gated(Gate::NoZcmp),
    Entry::new(0xe003, 0xc002, Opcode::Sw, Shape::CStoreSpW),
    Entry::new(0xe003, 0xe002, Opcode::Fsw, Shape::CStoreSpW).gated(Gate::Rv32),
    Entry::new(0xe003, 0xe002, Opcode::Sd, Shape::CStoreSpD).gated(Gate::Rv64),
];

/// Entries for 32bit instructions
pub const NORMAL: &[Entry] = &[
    Entry::new(0x0000007f, 0x00000037, Opcode::Lui, Shape::U),
    Entry::new(0x0000007f, 0x00000017, Opcode::Auipc, Shape::U),
    Entry::new(0x0000007f, 0x0000006f, Opcode::Jal, Shape::J),
    Entry::new(0x0000707f, 0x00000067, Opcode::Jalr, Shape::I),
    Entry::new(0x0000707f, 0x00000063, Opcode::Beq, Shape::B),
    Entry::new(0x0000707f, 0x00001063, Opcode::Bne, Shape::B),
    Entry::new(0x0000707f, 0x00004063, Opcode::Blt, Shape::B),
    Entry::new(0x0000707f, 0x00005063, Opcode::Bge, Shape::B),
    Entry::new(0x0000707f, 0x00006063, Opcode::Bltu, Shape::B),
    Entry::new(0x0000707f, 0x00007063, Opcode::Bgeu, Shape::B),
    Entry::new(0x0000707f, 0x00000003, Opcode::Lb, Shape::I),
    Entry::new(0x0000707f, 0x00001003, Opcode::Lh, Shape::I),
    Entry::new(0x0000707f, 0x00002003, Opcode::Lw, Shape::I),
    Entry::new(0x0000707f, 0x00003003, Opcode::Ld, Shape::I).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x00004003, Opcode::Lbu, Shape::I),
    Entry::new(0x0000707f, 0x00005003, Opcode::Lhu, Shape::I),
    Entry::new(0x0000707f, 0x00006003, Opcode::Lwu, Shape::I).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x00000023, Opcode::Sb, Shape::S),
    Entry::new(0x0000707f, 0x00001023, Opcode::Sh, Shape::S),
    Entry::new(0x0000707f, 0x00002023, Opcode::Sw, Shape::S),
    Entry::new(0x0000707f, 0x00003023, Opcode::Sd, Shape::S).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x00002007, Opcode::Flw, Shape::I),
    Entry::new(0x0000707f, 0x00003007, Opcode::Fld, Shape::I),
    Entry::new(0x0000707f, 0x00002027, Opcode::Fsw, Shape::S),
    Entry::new(0x0000707f, 0x00003027, Opcode::Fsd, Shape::S),
    Entry::new(0x0000707f, 0x00000013, Opcode::Addi, Shape::I),
    Entry::new(0x0000707f, 0x00002013, Opcode::Slti, Shape::I),
    Entry::new(0x0000707f, 0x00003013, Opcode::Sltiu, Shape::I),
    Entry::new(0x0000707f, 0x00004013, Opcode::Xori, Shape::I),
    Entry::new(0x0000707f, 0x00006013, Opcode::Ori, Shape::I),
    Entry::new(0x0000707f, 0x00007013, Opcode::Andi, Shape::I),
    Entry::new(0xfe00707f, 0x00001013, Opcode::Slli, Shape::Shamt).gated(Gate::Rv32),
    Entry::new(0xfe00707f, 0x00005013, Opcode::Srli, Shape::Shamt).gated(Gate::Rv32),
    Entry::new(0xfe00707f, 0x40005013, Opcode::Srai, Shape::Shamt).gated(Gate::Rv32),
    Entry::new(0xfc00707f, 0x00001013, Opcode::Slli, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0xfc00707f, 0x00005013, Opcode::Srli, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0xfc00707f, 0x40005013, Opcode::Srai, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x0000001b, Opcode::Addiw, Shape::I).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x0000101b, Opcode::Slliw, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x0000501b, Opcode::Srliw, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x4000501b, Opcode::Sraiw, Shape::Shamt).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x00000033, Opcode::Add, Shape::R),
    Entry::new(0xfe00707f, 0x40000033, Opcode::Sub, Shape::R),
    Entry::new(0xfe00707f, 0x00001033, Opcode::Sll, Shape::R),
    Entry::new(0xfe00707f, 0x00002033, Opcode::Slt, Shape::R),
    Entry::new(0xfe00707f, 0x00003033, Opcode::Sltu, Shape::R),
    Entry::new(0xfe00707f, 0x00004033, Opcode::Xor, Shape::R),
    Entry::new(0xfe00707f, 0x00005033, Opcode::Srl, Shape::R),
    Entry::new(0xfe00707f, 0x40005033, Opcode::Sra, Shape::R),
    Entry::new(0xfe00707f, 0x00006033, Opcode::Or, Shape::R),
    Entry::new(0xfe00707f, 0x00007033, Opcode::And, Shape::R),
    Entry::new(0xfe00707f, 0x0000003b, Opcode::Addw, Shape::R).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x4000003b, Opcode::Subw, Shape::R).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x0000103b, Opcode::Sllw, Shape::R).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x0000503b, Opcode::Srlw, Shape::R).gated(Gate::Rv64),
    Entry::new(0xfe00707f, 0x4000503b, Opcode::Sraw, Shape::R).gated(Gate::Rv64),
    Entry::new(0xf9f0707f, 0x1000202f, Opcode::LrW, Shape::R),
    Entry::new(0xf9f0707f, 0x1000302f, Opcode::LrD, Shape::R).gated(Gate::Rv64),
    Entry::new(0xf800707f, 0x1800202f, Opcode::ScW, Shape::R),
    Entry::new(0xf800707f, 0x1800302f, Opcode::ScD, Shape::R).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x0000202f, Opcode::Amo, Shape::R),
    Entry::new(0x0000707f, 0x0000302f, Opcode::Amo, Shape::R).gated(Gate::Rv64),
    Entry::new(0x0000707f, 0x0000000f, Opcode::Fence, Shape::None),
    Entry::new(0xffffffff, 0x00000073, Opcode::Ecall, Shape::None),
    Entry::new(0xffffffff, 0x00100073, Opcode::Ebreak, Shape::None),
];

/// Immediate layout
///
/// Each item holds the lowest bit of a field in the instruction, the field's
/// width and the lowest bit of the immediate it holds.
type Layout = &'static [(u8, u8, u8)];

const CIW: Layout = &[(11, 2, 4), (7, 4, 6), (6, 1, 2), (5, 1, 3)];
const CL_W: Layout = &[(10, 3, 3), (6, 1, 2), (5, 1, 6)];
const CL_D: Layout = &[(10, 3, 3), (5, 2, 6)];
const CI: Layout = &[(2, 5, 0), (12, 1, 5)];
const CI_16SP: Layout = &[(12, 1, 9), (6, 1, 4), (5, 1, 6), (3, 2, 7), (2, 1, 5)];
const CI_LUI: Layout = &[(12, 1, 17), (2, 5, 12)];
const CI_LWSP: Layout = &[(12, 1, 5), (4, 3, 2), (2, 2, 6)];
const CI_LDSP: Layout = &[(12, 1, 5), (5, 2, 3), (2, 3, 6)];
const CSS_W: Layout = &[(9, 4, 2), (7, 2, 6)];
const CSS_D: Layout = &[(10, 3, 3), (7, 3, 6)];
const CJ: Layout = &[
    (12, 1, 11),
    (11, 1, 4),
    (9, 2, 8),
    (8, 1, 10),
    (7, 1, 6),
    (6, 1, 7),
    (3, 3, 1),
    (2, 1, 5),
];
const CB: Layout = &[(12, 1, 8), (10, 2, 3), (5, 2, 6), (3, 2, 1), (2, 1, 5)];

/// Gather an unsigned immediate
fn unsigned(insn: u32, layout: Layout) -> i32 {
    layout.iter().fold(0, |acc, &(at, width, to)| {
        acc | (((insn >> at) & ((1 << width) - 1)) << to)
    }) as i32
}

/// Gather an immediate, sign-extending it from the given bit
fn signed(insn: u32, layout: Layout, sign: u8) -> i32 {
    format::sign_extend(unsigned(insn, layout) as u32, sign)
}

/// Scatter an immediate into the fields of an instruction
fn scatter(imm: i32, layout: Layout) -> u32 {
    let imm = imm as u32;
    layout.iter().fold(0, |acc, &(at, width, to)| {
        acc | (((imm >> to) & ((1 << width) - 1)) << at)
    })
}

/// Extract a compressed register field (`x8..=x15`) at the given bit
const fn c_prime(insn: u32, at: u8) -> Register {
    ((insn >> at) & 0x7) as Register + 8
}

/// Extract the full rs2 field of a 16bit instruction
const fn c_rs2(insn: u32) -> Register {
    ((insn >> 2) & 0x1f) as Register
}

const fn prime_into(reg: Register, at: u8) -> u32 {
    ((reg.wrapping_sub(8) & 0x7) as u32) << at
}

const fn full_into(reg: Register, at: u8) -> u32 {
    ((reg & 0x1f) as u32) << at
}

const fn i_type(rd: Register, rs1: Register, imm: i32) -> Operands {
    Operands::I(TypeI { rd, rs1, imm })
}

const fn s_type(rs1: Register, rs2: Register, imm: i32) -> Operands {
    Operands::S(TypeS { rs1, rs2, imm })
}
