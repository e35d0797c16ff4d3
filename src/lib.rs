// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

//! # RISC-V debugger architecture backend
//!
//! This crate implements the architecture specific parts of a source-level
//! debugger for RISC-V targets: the knowledge needed to single-step, build
//! backtraces, set breakpoints and perform inferior function calls. It is not
//! concerned with how target memory and registers are accessed or where
//! symbols come from. Those are supplied by the user through the collaborator
//! traits in [`target`].
//!
//! The crate is split into the following parts:
//!
//! * an [instruction] decoder driven by a table of encoding patterns,
//!   canonicalizing compressed forms into their full-width equivalents,
//! * an [`Architecture`][arch::Architecture] capability trait together with the
//!   RISC-V implementation [`Riscv`][arch::Riscv],
//! * instruction sequence [scan]ners for prologues, epilogues and atomic
//!   load-reserved/store-conditional sequences,
//! * a frame [unwind]er computing frame identities and saved register
//!   locations,
//! * the [call]ing convention engine for argument placement and return values,
//! * the [registers] model, including pseudo registers composed from raw ones,
//! * [breakpoint] instruction selection.
//!
//! # no_std
//! This crate is not dependent on the standard library. It only uses the Core
//! Library and [`alloc`], and can therefore be used in embedded debug probes.
//!
//! # Example
//!
//! The following example analyses a small RV64 function prologue and unwinds
//! the return address of the innermost frame.
//!
//! ```
//! use riscv_debug_arch::arch::{Architecture, Riscv};
//! use riscv_debug_arch::config::{DebugConfig, Features};
//! use riscv_debug_arch::registers::RegisterFile;
//! use riscv_debug_arch::target::{self, Memory};
//! use riscv_debug_arch::unwind::{RegisterLocation, Session, Unwinder};
//!
//! // addi sp,sp,-32; sd ra,24(sp); sd s0,16(sp); addi s0,sp,32; nop
//! let code = b"\x13\x01\x01\xfe\x23\x3c\x11\x00\x23\x38\x81\x00\x13\x04\x01\x02\x13\x00\x00\x00";
//! let memory = (
//!     target::from_segment(code).with_offset(0x1000),
//!     target::from_segment_mut(vec![0u8; 0x100]).with_offset(0x7fff_ff00),
//! );
//! let symbols = target::from_functions([(0x1000u64, 0x1014u64, "main")]);
//!
//! let arch = Riscv::new(Features::RV64GC);
//! let mut regs = RegisterFile::new(arch.registers());
//! regs.set(arch.registers().find("pc").unwrap(), 0x1010).unwrap();
//! regs.set(arch.registers().find("sp").unwrap(), 0x7fff_ffc0).unwrap();
//! regs.set(arch.registers().find("s0").unwrap(), 0x7fff_ffe0).unwrap();
//!
//! let session = Session::new(arch, DebugConfig::default());
//! let mut unwinder = Unwinder::new(&session, memory, regs, symbols);
//! let ra = session.arch().registers().find("ra").unwrap();
//! assert_eq!(
//!     unwinder.unwind_register(0, ra).unwrap(),
//!     RegisterLocation::Address(0x7fff_ffd8),
//! );
//! ```
#![no_std]

extern crate alloc;

pub mod arch;
pub mod breakpoint;
pub mod call;
pub mod config;
pub mod instruction;
pub mod registers;
pub mod scan;
pub mod target;
pub mod unwind;

#[cfg(test)]
mod tests;

pub use arch::{Architecture, Riscv};
pub use instruction::Instruction;
