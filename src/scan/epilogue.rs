// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Epilogue detection

use crate::arch::{Architecture, EpilogueStep};
use crate::config::DebugConfig;
use crate::target::Memory;

/// An epilogue found ahead of some address
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Epilogue {
    /// Number of bytes still to be released from the stack before returning
    ///
    /// This is [`None`] if the stack pointer is restored from the frame pointer
    /// ahead, in which case the release cannot be determined statically.
    pub release: Option<u64>,
    /// Address of the return instruction
    pub ret: u64,
}

/// Scan for an epilogue starting at `pc`
///
/// Returns an [`Epilogue`] if a return is reached within the configured
/// number of instructions, passing only stack releases, register reloads,
/// stack pointer restores and nops. Fetch failures are treated like
/// unrecognized instructions.
pub fn scan_epilogue<A: Architecture, M: Memory>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    pc: u64,
) -> Option<Epilogue> {
    let mut release = Some(0u64);
    let mut address = pc;
    for _ in 0..config.epilogue_limit {
        let insn = arch.decode(memory, address).ok()?;
        let step = arch.epilogue_step(&insn);
        log::trace!("{address:#x}: {insn} ({step:?})");
        match step {
            EpilogueStep::Release(bytes) => release = release.map(|r| r.wrapping_add(bytes)),
            EpilogueStep::Reload { .. } | EpilogueStep::Nop => (),
            EpilogueStep::RestoreSp => release = None,
            EpilogueStep::Return { release: bytes } => {
                return Some(Epilogue {
                    release: release.map(|r| r.wrapping_add(bytes)),
                    ret: address,
                });
            }
            EpilogueStep::Other => return None,
        }
        address = address.checked_add(arch.length(&insn))?;
    }
    None
}

/// Check whether `pc` lies within a function's epilogue
///
/// See [`scan_epilogue`] for details.
pub fn is_in_epilogue<A: Architecture, M: Memory>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    pc: u64,
) -> bool {
    scan_epilogue(arch, config, memory, pc).is_some()
}
