// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Heuristic search for function starts

use crate::arch::{Architecture, Effect};
use crate::config::DebugConfig;
use crate::target::Memory;

/// Search backwards from `pc` for the start of the function containing it
///
/// The search walks back in steps of the instruction alignment, but not
/// further than the configured fence. A function starts at an instruction
/// allocating stack space or after the return of the preceding function,
/// skipping any padding nops.
pub fn find_start<A: Architecture, M: Memory>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    pc: u64,
) -> Option<u64> {
    if config.heuristic_fence == 0 {
        return None;
    }
    let fence = pc.saturating_sub(config.heuristic_fence);
    let sp = arch.stack_pointer();

    let mut address = pc;
    loop {
        let insn = arch.decode(memory, address).ok()?;
        match arch.prologue_effect(&insn, address) {
            Effect::AddImm { dst, src, imm } if dst == sp && src == sp && imm < 0 => {
                log::debug!("Stack allocation at {address:#x} starts function of {pc:#x}");
                return Some(address);
            }
            Effect::Push { .. } => return Some(address),
            _ if address < pc && arch.is_return(&insn) => {
                let start = address.checked_add(arch.length(&insn))?;
                return Some(skip_nops(arch, memory, start, pc));
            }
            _ => (),
        }
        address = address
            .checked_sub(arch.insn_alignment())
            .filter(|a| *a >= fence)?;
    }
}

fn skip_nops<A: Architecture, M: Memory>(arch: &A, memory: &mut M, start: u64, pc: u64) -> u64 {
    let mut address = start;
    while address < pc {
        let Ok(insn) = arch.decode(memory, address) else {
            break;
        };
        if arch.prologue_effect(&insn, address) != Effect::Nop {
            break;
        }
        address = address.saturating_add(arch.length(&insn));
    }
    log::debug!("Return ahead of {address:#x} ends preceding function");
    address
}
