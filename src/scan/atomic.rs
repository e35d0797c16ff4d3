// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Atomic sequence detection
//!
//! Single-stepping through a load-reserved/store-conditional sequence would
//! clear the reservation on every step, causing the store-conditional to fail
//! forever. Instead, breakpoints are placed at every exit of the sequence and
//! the sequence is run as a whole.

use alloc::vec::Vec;

use crate::arch::{Architecture, AtomicStep};
use crate::config::DebugConfig;
use crate::target::Memory;

/// Determine the breakpoint addresses for stepping over an atomic sequence
///
/// If `pc` is the address of a load-reserved instruction starting a sequence
/// we can step over as a whole, this fn returns the addresses at which
/// breakpoints need to be placed: the target of the sequence's conditional
/// branch if it leaves the sequence, followed by the address after the
/// store-conditional. Otherwise, an empty list is returned and the caller
/// should fall back to ordinary single-stepping.
///
/// The sequence may only contain arithmetic instructions and at most one
/// forward conditional branch, and must be terminated by a store-conditional
/// of the load-reserved's width within the configured number of instructions.
pub fn atomic_sequence_breakpoints<A: Architecture, M: Memory>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    pc: u64,
) -> Vec<u64> {
    scan(arch, config, memory, pc).unwrap_or_default()
}

fn scan<A: Architecture, M: Memory>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    pc: u64,
) -> Option<Vec<u64>> {
    let insn = arch.decode(memory, pc).ok()?;
    let AtomicStep::LoadReserved { width } = arch.atomic_step(&insn, pc) else {
        return None;
    };

    let mut address = pc.checked_add(arch.length(&insn))?;
    let mut branch = None;
    for _ in 1..config.atomic_limit {
        let insn = arch.decode(memory, address).ok()?;
        let next = address.checked_add(arch.length(&insn))?;
        match arch.atomic_step(&insn, address) {
            AtomicStep::Arithmetic => (),
            AtomicStep::Branch {
                target: Some(target),
                conditional: true,
            } if branch.is_none() && target > address => branch = Some(target),
            AtomicStep::StoreConditional { width: w } if w == width => {
                let mut breakpoints: Vec<_> =
                    branch.filter(|t| !(pc..next).contains(t)).into_iter().collect();
                breakpoints.push(next);
                log::debug!("Atomic sequence at {pc:#x}, breakpoints at {breakpoints:x?}");
                return Some(breakpoints);
            }
            step => {
                log::trace!("{address:#x}: {insn} ({step:?}) not allowed in atomic sequence");
                return None;
            }
        }
        address = next;
    }
    log::trace!("No store-conditional in atomic sequence at {pc:#x}");
    None
}
