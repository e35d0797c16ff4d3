// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! RISC-V [`Architecture`]

use crate::config::Features;
use crate::instruction::decode::Decoder;
use crate::instruction::{Instruction, Opcode, Operands};
use crate::registers::riscv::{self as regs, FP, SP};
use crate::registers::{RegNum, RegisterModel};
use crate::target::Memory;

use super::{Architecture, AtomicStep, Effect, EpilogueStep, RecognitionError};

/// RISC-V [`Architecture`]
///
/// Combines the table driven [`Decoder`] and the RISC-V [`RegisterModel`] for
/// a target with specific [`Features`].
#[derive(Clone, Debug)]
pub struct Riscv {
    features: Features,
    decoder: Decoder,
    registers: RegisterModel,
}

impl Riscv {
    /// Create a new RISC-V architecture for the given [`Features`]
    pub fn new(features: Features) -> Self {
        Self {
            features,
            decoder: Decoder::from_features(&features),
            registers: regs::model(&features),
        }
    }

    /// Create a new RISC-V architecture, rejecting unsupported [`Features`]
    pub fn try_new(features: Features) -> Result<Self, RecognitionError> {
        if !matches!(features.xlen, 4 | 8) {
            Err(RecognitionError::UnsupportedXlen(features.xlen))
        } else if features.abi_flen > features.flen {
            Err(RecognitionError::FloatAbi {
                required: features.abi_flen,
                available: features.flen,
            })
        } else {
            Ok(Self::new(features))
        }
    }

    /// Create a new RISC-V architecture for running a program on a target
    ///
    /// The ABI is taken from the `program`'s [`Features`], which may e.g. be
    /// derived from an object file, while the registers are those of the
    /// `target`. A program built for a narrower floating point ABI than the
    /// target supports is accepted.
    pub fn for_target(program: &Features, target: &Features) -> Result<Self, RecognitionError> {
        if program.xlen != target.xlen {
            return Err(RecognitionError::XlenMismatch {
                program: program.xlen,
                target: target.xlen,
            });
        }
        if program.abi_flen > target.flen {
            return Err(RecognitionError::FloatAbi {
                required: program.abi_flen,
                available: target.flen,
            });
        }
        Self::try_new(Features {
            abi_flen: program.abi_flen,
            embedded: program.embedded || target.embedded,
            ..*target
        })
    }

    /// Retrieve the target's [`Features`]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Retrieve the [`Decoder`]
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    fn xlen(&self) -> u8 {
        self.features.xlen
    }
}

/// See [`Features::default`]
impl Default for Riscv {
    fn default() -> Self {
        Self::new(Features::default())
    }
}

impl Architecture for Riscv {
    type Instruction = Instruction;

    fn registers(&self) -> &RegisterModel {
        &self.registers
    }

    fn decode<M: Memory>(&self, memory: &mut M, address: u64) -> Result<Instruction, M::Error> {
        Instruction::fetch(memory, address, &self.decoder)
    }

    fn length(&self, insn: &Instruction) -> u64 {
        insn.size.into()
    }

    fn insn_alignment(&self) -> u64 {
        self.features.insn_alignment()
    }

    fn is_compact_branch(&self, insn: &Instruction) -> bool {
        insn.is_control_transfer()
    }

    fn is_control_transfer(&self, insn: &Instruction) -> bool {
        insn.is_control_transfer()
    }

    fn is_return(&self, insn: &Instruction) -> bool {
        insn.is_return()
    }

    fn prologue_effect(&self, insn: &Instruction, pc: u64) -> Effect {
        if insn.is_nop() {
            return Effect::Nop;
        }
        if insn.is_control_transfer() {
            return Effect::ControlTransfer;
        }

        let opcode = insn.opcode;
        if let (Some(width), Operands::I(i)) = (opcode.load_width(), insn.operands) {
            return if opcode.is_float_access() {
                Effect::Other {
                    dst: Some(regs::f(i.rd)),
                }
            } else {
                Effect::Load {
                    dst: i.rd.into(),
                    base: i.rs1.into(),
                    offset: i.imm.into(),
                    width,
                }
            };
        }
        if let (Some(width), Operands::S(s)) = (opcode.store_width(), insn.operands) {
            let base = RegNum::from(s.rs1);
            if base != SP && base != FP {
                return Effect::Other { dst: None };
            }
            let src = if opcode.is_float_access() {
                regs::f(s.rs2)
            } else {
                regs::x(s.rs2)
            };
            return Effect::Store {
                src,
                base,
                offset: s.imm.into(),
                width,
            };
        }

        match (opcode, insn.operands) {
            (Opcode::Addi | Opcode::Addiw, Operands::I(i)) => Effect::AddImm {
                dst: i.rd.into(),
                src: i.rs1.into(),
                imm: i.imm.into(),
            },
            (Opcode::Add | Opcode::Addw, Operands::R(r)) => Effect::Add {
                dst: r.rd.into(),
                lhs: r.rs1.into(),
                rhs: r.rs2.into(),
            },
            (Opcode::Sub | Opcode::Subw, Operands::R(r)) => Effect::Sub {
                dst: r.rd.into(),
                lhs: r.rs1.into(),
                rhs: r.rs2.into(),
            },
            (Opcode::Lui, Operands::U(u)) => Effect::Constant {
                dst: u.rd.into(),
                value: i64::from(u.imm) as u64,
            },
            (Opcode::Auipc, Operands::U(u)) => Effect::Constant {
                dst: u.rd.into(),
                value: pc.wrapping_add_signed(u.imm.into()),
            },
            (Opcode::CmPush, Operands::P(p)) => Effect::Push {
                registers: p.registers(),
                slot: self.xlen(),
                adjust: p.stack_adjustment(self.xlen()),
            },
            (Opcode::CmPop, _) => Effect::Other { dst: Some(SP) },
            _ => Effect::Other {
                dst: insn.rd().filter(|r| *r != 0).map(RegNum::from),
            },
        }
    }

    fn epilogue_step(&self, insn: &Instruction) -> EpilogueStep {
        if let Operands::P(p) = insn.operands {
            return match insn.opcode {
                Opcode::CmPopret | Opcode::CmPopretz => EpilogueStep::Return {
                    release: p.stack_adjustment(self.xlen()),
                },
                Opcode::CmPop => EpilogueStep::Release(p.stack_adjustment(self.xlen())),
                _ => EpilogueStep::Other,
            };
        }
        if insn.is_return() {
            return EpilogueStep::Return { release: 0 };
        }
        if insn.is_nop() {
            return EpilogueStep::Nop;
        }

        let opcode = insn.opcode;
        if let (Some(_), Operands::I(i)) = (opcode.load_width(), insn.operands) {
            let base = RegNum::from(i.rs1);
            if base != SP && base != FP {
                return EpilogueStep::Other;
            }
            let dst = if opcode.is_float_access() {
                regs::f(i.rd)
            } else {
                regs::x(i.rd)
            };
            return EpilogueStep::Reload { dst };
        }

        match (opcode, insn.operands) {
            (Opcode::Addi | Opcode::Addiw, Operands::I(i)) if RegNum::from(i.rd) == SP => {
                match RegNum::from(i.rs1) {
                    SP if i.imm > 0 => EpilogueStep::Release(i.imm as u64),
                    FP => EpilogueStep::RestoreSp,
                    _ => EpilogueStep::Other,
                }
            }
            (Opcode::Add, Operands::R(r)) if RegNum::from(r.rd) == SP => {
                match (RegNum::from(r.rs1), RegNum::from(r.rs2)) {
                    (FP, 0) | (0, FP) => EpilogueStep::RestoreSp,
                    _ => EpilogueStep::Other,
                }
            }
            _ => EpilogueStep::Other,
        }
    }

    fn atomic_step(&self, insn: &Instruction, pc: u64) -> AtomicStep {
        match insn.opcode {
            Opcode::LrW => AtomicStep::LoadReserved { width: 4 },
            Opcode::LrD => AtomicStep::LoadReserved { width: 8 },
            Opcode::ScW => AtomicStep::StoreConditional { width: 4 },
            Opcode::ScD => AtomicStep::StoreConditional { width: 8 },
            Opcode::Jal => AtomicStep::Branch {
                target: insn.branch_target(pc),
                conditional: false,
            },
            op if op.is_branch() => AtomicStep::Branch {
                target: insn.branch_target(pc),
                conditional: true,
            },
            op if op.is_arithmetic() => AtomicStep::Arithmetic,
            _ => AtomicStep::Other,
        }
    }

    fn stack_pointer(&self) -> RegNum {
        SP
    }

    fn frame_pointer(&self) -> Option<RegNum> {
        Some(FP)
    }

    fn return_address(&self) -> RegNum {
        regs::RA
    }

    fn program_counter(&self) -> RegNum {
        regs::PC
    }

    fn zero_register(&self) -> Option<RegNum> {
        Some(regs::ZERO)
    }

    fn address_size(&self) -> u8 {
        self.xlen()
    }
}
