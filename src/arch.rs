// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Architecture capabilities
//!
//! The analyses in this crate are generic over the instruction set. They only
//! interact with it through the [`Architecture`] trait, which provides
//! instruction decoding, classification and the translation of individual
//! instructions into the abstract steps understood by the [scanners][crate::scan].
//! An [`Architecture`] is selected once, e.g. when a target is recognized,
//! and stays fixed for a debug session.
//!
//! This module also provides the RISC-V implementation [`Riscv`].

#[cfg(feature = "elf")]
pub mod elf;
pub mod riscv;

#[cfg(test)]
mod tests;

use core::fmt;

use crate::registers::{RegNum, RegisterModel};
use crate::target::Memory;

pub use riscv::Riscv;

/// Capabilities of an instruction set architecture
pub trait Architecture {
    /// Type of decoded instructions
    type Instruction: Copy + fmt::Debug + fmt::Display;

    /// Retrieve the [`RegisterModel`]
    fn registers(&self) -> &RegisterModel;

    /// Fetch and decode the instruction at the given address
    fn decode<M: Memory>(
        &self,
        memory: &mut M,
        address: u64,
    ) -> Result<Self::Instruction, M::Error>;

    /// Length of an instruction in bytes
    fn length(&self, insn: &Self::Instruction) -> u64;

    /// Minimum alignment of instructions in bytes
    fn insn_alignment(&self) -> u64;

    /// Check whether the instruction following this one executes as part of
    /// it, regardless of whether control is transferred
    fn has_delay_slot(&self, _insn: &Self::Instruction) -> bool {
        false
    }

    /// Check whether this is a control transfer without a delay slot
    fn is_compact_branch(&self, insn: &Self::Instruction) -> bool;

    /// Check whether this instruction may transfer control elsewhere than to
    /// the next instruction
    fn is_control_transfer(&self, insn: &Self::Instruction) -> bool;

    /// Check whether this instruction returns from a function
    fn is_return(&self, insn: &Self::Instruction) -> bool;

    /// Determine the effect of an instruction at `pc` on the register and stack
    /// state tracked during a prologue scan
    fn prologue_effect(&self, insn: &Self::Instruction, pc: u64) -> Effect;

    /// Classify an instruction encountered while scanning for an epilogue
    fn epilogue_step(&self, insn: &Self::Instruction) -> EpilogueStep;

    /// Classify an instruction at `pc` encountered in an atomic sequence
    fn atomic_step(&self, insn: &Self::Instruction, pc: u64) -> AtomicStep;

    /// The stack pointer
    fn stack_pointer(&self) -> RegNum;

    /// The frame pointer, if the ABI designates one
    fn frame_pointer(&self) -> Option<RegNum>;

    /// The register holding the return address on function entry
    fn return_address(&self) -> RegNum;

    /// The program counter
    fn program_counter(&self) -> RegNum;

    /// A register always reading as zero, if there is one
    fn zero_register(&self) -> Option<RegNum> {
        None
    }

    /// Width of addresses in bytes
    fn address_size(&self) -> u8;

    /// Alignment of the stack pointer at calls
    fn stack_alignment(&self) -> u64 {
        16
    }
}

/// Effect of an instruction within a prologue
///
/// Register operands are register numbers in the architecture's
/// [`RegisterModel`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// `dst = src + imm`
    AddImm { dst: RegNum, src: RegNum, imm: i64 },
    /// `dst = lhs + rhs`
    Add {
        dst: RegNum,
        lhs: RegNum,
        rhs: RegNum,
    },
    /// `dst = lhs - rhs`
    Sub {
        dst: RegNum,
        lhs: RegNum,
        rhs: RegNum,
    },
    /// `dst = value`
    Constant { dst: RegNum, value: u64 },
    /// Load of `width` bytes at `base + offset` into `dst`
    Load {
        dst: RegNum,
        base: RegNum,
        offset: i64,
        width: u8,
    },
    /// Store of `width` bytes of `src` at `base + offset`
    Store {
        src: RegNum,
        base: RegNum,
        offset: i64,
        width: u8,
    },
    /// Spill of multiple registers followed by a stack pointer decrement
    ///
    /// The registers are stored in `slot` sized slots just below the current
    /// stack pointer with the last one at the highest address. The stack
    /// pointer is then decremented by `adjust`.
    Push {
        registers: &'static [u8],
        slot: u8,
        adjust: u64,
    },
    /// No effect at all
    Nop,
    /// Control may be transferred elsewhere
    ControlTransfer,
    /// Any other instruction, clobbering `dst` if given
    Other { dst: Option<RegNum> },
}

/// Classification of an instruction within an epilogue
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EpilogueStep {
    /// Stack pointer increment by the given number of bytes
    Release(u64),
    /// Reload of a register from a stack or frame pointer relative slot
    Reload { dst: RegNum },
    /// Stack pointer restored from the frame pointer
    RestoreSp,
    /// No effect
    Nop,
    /// Return, releasing the given number of bytes as part of it
    Return { release: u64 },
    /// Any instruction not expected in an epilogue
    Other,
}

/// Classification of an instruction within an atomic sequence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AtomicStep {
    /// Load-reserved of the given width
    LoadReserved { width: u8 },
    /// Store-conditional of the given width
    StoreConditional { width: u8 },
    /// Branch or jump with a statically known target
    Branch { target: Option<u64>, conditional: bool },
    /// Arithmetic or logic without side effects
    Arithmetic,
    /// Any other instruction
    Other,
}

/// Error rejecting a target
///
/// Such errors are detected when an [`Architecture`] is selected for a target,
/// never during later operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecognitionError {
    /// The object file is not for the architecture
    WrongMachine(u16),
    /// The byte order is not supported
    UnsupportedEndianess,
    /// The register width in bytes is not supported
    UnsupportedXlen(u8),
    /// The program's register width differs from the target's
    XlenMismatch { program: u8, target: u8 },
    /// The program's floating point ABI requires wider floating point
    /// registers than the target has
    FloatAbi { required: u8, available: u8 },
}

impl core::error::Error for RecognitionError {}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongMachine(m) => write!(f, "Unsupported machine {m:#x}"),
            Self::UnsupportedEndianess => write!(f, "Unsupported byte order"),
            Self::UnsupportedXlen(x) => write!(f, "Unsupported register width {x}"),
            Self::XlenMismatch { program, target } => write!(
                f,
                "Program requires xlen {program}, but target has xlen {target}"
            ),
            Self::FloatAbi {
                required,
                available,
            } => write!(
                f,
                "Program requires flen {required}, but target has flen {available}"
            ),
        }
    }
}
