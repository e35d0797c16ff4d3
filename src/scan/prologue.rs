// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Prologue analysis
//!
//! The prologue scanner walks forward from a function's entry and tracks the
//! contents of registers and stack slots as symbolic [`Value`]s relative to
//! the registers' contents on function entry. A register counts as saved once
//! its entry value is stored in a stack slot. Only the first save of a
//! register is recorded.
//!
//! The scan ends at a control transfer, at the scan limit or once more
//! instructions not recognized as part of a prologue were encountered than the
//! [`DebugConfig`] tolerates. The end of the prologue is the address following
//! the last recognized instruction.

use alloc::collections::BTreeMap;

use crate::arch::{Architecture, Effect};
use crate::config::DebugConfig;
use crate::registers::RegNum;
use crate::target::Memory;

use super::Error;

/// Symbolic value of a register or stack slot
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Nothing is known about the value
    Unknown,
    /// A known constant
    Constant(u64),
    /// The contents of a register on function entry plus an offset
    Register { reg: RegNum, offset: i64 },
}

impl Value {
    /// The contents of a register on function entry
    pub const fn entry(reg: RegNum) -> Self {
        Self::Register { reg, offset: 0 }
    }

    /// Symbolic addition
    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Constant(l), Self::Constant(r)) => Self::Constant(l.wrapping_add(r)),
            (Self::Register { reg, offset }, Self::Constant(c))
            | (Self::Constant(c), Self::Register { reg, offset }) => Self::Register {
                reg,
                offset: offset.wrapping_add(c as i64),
            },
            _ => Self::Unknown,
        }
    }

    /// Symbolic subtraction
    ///
    /// The difference of two values relative to the same register is a
    /// constant.
    pub fn sub(self, other: Self) -> Self {
        match (self, other) {
            (Self::Constant(l), Self::Constant(r)) => Self::Constant(l.wrapping_sub(r)),
            (Self::Register { reg, offset }, Self::Constant(c)) => Self::Register {
                reg,
                offset: offset.wrapping_sub(c as i64),
            },
            (Self::Register { reg: l, offset: a }, Self::Register { reg: r, offset: b })
                if l == r =>
            {
                Self::Constant(a.wrapping_sub(b) as u64)
            }
            _ => Self::Unknown,
        }
    }

    /// Retrieve the offset from the entry contents of the given register
    pub fn offset_from(self, reg: RegNum) -> Option<i64> {
        match self {
            Self::Register { reg: r, offset } if r == reg => Some(offset),
            _ => None,
        }
    }
}

/// Results of a prologue scan
///
/// The frame base is the stack pointer's contents on function entry. It is
/// computed from the current contents of [`base_register`][Self::base_register]
/// by adding [`base_offset`][Self::base_offset]. Saved register locations are
/// given relative to the frame base.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrologueCache {
    /// Register the frame base is derived from
    pub base_register: RegNum,
    /// Offset of the frame base from the base register's contents
    pub base_offset: i64,
    /// Offsets of the slots holding saved registers from the frame base
    pub saved: BTreeMap<RegNum, i64>,
    /// Number of bytes the stack pointer was decremented by
    pub frame_size: u64,
    /// Whether the stack pointer was moved by an amount not known statically
    pub dynamic: bool,
    /// Address following the last instruction recognized as part of the
    /// prologue
    pub end: u64,
}

impl PrologueCache {
    /// Retrieve the offset of a saved register's slot from the frame base
    pub fn saved(&self, reg: RegNum) -> Option<i64> {
        self.saved.get(&reg).copied()
    }

    /// Retrieve the offset of a saved register's slot from the stack pointer
    /// as it is after the prologue
    pub fn sp_offset(&self, reg: RegNum) -> Option<i64> {
        self.saved(reg)
            .map(|o| o.wrapping_add(self.frame_size as i64))
    }
}

/// Scan a function's prologue
///
/// Scans the instructions from `start` up to `limit` and returns the address
/// following the last instruction recognized as part of the prologue. If a
/// [`PrologueCache`] is supplied, it is filled with the scan's results.
///
/// Only failing to fetch the very first instruction is an error. Later fetch
/// failures end the scan.
pub fn scan_prologue<A, M>(
    arch: &A,
    config: &DebugConfig,
    memory: &mut M,
    start: u64,
    limit: u64,
    cache: Option<&mut PrologueCache>,
) -> Result<u64, Error<M::Error>>
where
    A: Architecture,
    M: Memory,
{
    let mut scan = Scan::new(arch, false);
    let end = match scan.run(config, memory, start, limit)? {
        Some(end) => end,
        None => {
            log::debug!("Restarting prologue scan at {start:#x} assuming a static stack pointer");
            scan = Scan::new(arch, true);
            scan.run(config, memory, start, limit)?.unwrap_or(start)
        }
    };
    log::debug!("Prologue of {start:#x} ends at {end:#x}");

    if let Some(cache) = cache {
        *cache = scan.commit(end);
        log::debug!(
            "Frame base is {:?}{:+}, saved registers: {:?}",
            cache.base_register,
            cache.base_offset,
            cache.saved,
        );
    }
    Ok(end)
}

/// Outcome of processing a single instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Step {
    Recognized,
    Tolerated,
    Stop,
    Restart,
}

/// State of a single scan
struct Scan<'a, A> {
    arch: &'a A,
    sp: RegNum,
    zero: Option<RegNum>,
    /// Registers not holding their entry contents
    regs: BTreeMap<RegNum, Value>,
    /// Stack slots by offset from the entry stack pointer
    stack: BTreeMap<i64, (u8, Value)>,
    saved: BTreeMap<RegNum, i64>,
    dynamic: bool,
    /// Assume that the stack pointer is never moved by unknown amounts
    static_sp: bool,
}

impl<'a, A: Architecture> Scan<'a, A> {
    fn new(arch: &'a A, static_sp: bool) -> Self {
        Self {
            arch,
            sp: arch.stack_pointer(),
            zero: arch.zero_register(),
            regs: Default::default(),
            stack: Default::default(),
            saved: Default::default(),
            dynamic: false,
            static_sp,
        }
    }

    /// Run the scan, returning [`None`] if it needs to be restarted
    fn run<M: Memory>(
        &mut self,
        config: &DebugConfig,
        memory: &mut M,
        start: u64,
        limit: u64,
    ) -> Result<Option<u64>, Error<M::Error>> {
        let mut pc = start;
        let mut end = start;
        let mut tolerated = 0u8;
        let mut delay_slot = false;

        while pc < limit {
            let insn = match self.arch.decode(memory, pc) {
                Ok(insn) => insn,
                Err(e) if pc == start => return Err(Error::Memory(e, pc)),
                Err(_) => {
                    log::trace!("Cannot fetch instruction at {pc:#x}, ending scan");
                    break;
                }
            };
            let Some(next) = pc.checked_add(self.arch.length(&insn)) else {
                break;
            };

            let effect = self.arch.prologue_effect(&insn, pc);
            log::trace!("{pc:#x}: {insn} ({effect:?})");
            match self.apply(effect) {
                Step::Restart => return Ok(None),
                _ if delay_slot => break,
                Step::Recognized => end = next,
                Step::Tolerated => {
                    tolerated = tolerated.saturating_add(1);
                    if tolerated > config.prologue_tolerance {
                        break;
                    }
                }
                Step::Stop if self.arch.has_delay_slot(&insn) => delay_slot = true,
                Step::Stop => break,
            }
            pc = next;
        }

        Ok(Some(end))
    }

    fn apply(&mut self, effect: Effect) -> Step {
        match effect {
            Effect::AddImm { dst, src, imm } => {
                let value = self.get(src).add(Value::Constant(imm as u64));
                self.set(dst, value);
            }
            Effect::Add { dst, lhs, rhs } => {
                let value = self.get(lhs).add(self.get(rhs));
                self.set(dst, value);
            }
            Effect::Sub { dst, lhs, rhs } => {
                let value = self.get(lhs).sub(self.get(rhs));
                if dst == self.sp && value == Value::Unknown {
                    self.dynamic = true;
                    if self.static_sp {
                        return Step::Recognized;
                    }
                }
                self.set(dst, value);
            }
            Effect::Constant { dst, value } => self.set(dst, Value::Constant(value)),
            Effect::Load {
                dst,
                base,
                offset,
                width,
            } => {
                let value = self.load(self.stack_offset(base, offset), width);
                self.set(dst, value);
            }
            Effect::Store {
                src,
                base,
                offset,
                width,
            } => {
                let address = self.stack_offset(base, offset);
                if address.is_none()
                    && self.dynamic
                    && !self.static_sp
                    && Some(base) == self.arch.frame_pointer()
                {
                    return Step::Restart;
                }
                self.store(address, width, self.get(src));
            }
            Effect::Push {
                registers,
                slot,
                adjust,
            } => {
                let count = registers.len() as i64;
                for (n, reg) in registers.iter().enumerate() {
                    let offset = (n as i64 - count) * i64::from(slot);
                    let address = self.stack_offset(self.sp, offset);
                    self.store(address, slot, self.get(RegNum::from(*reg)));
                }
                let sp = self.get(self.sp).sub(Value::Constant(adjust));
                self.set(self.sp, sp);
            }
            Effect::Nop => (),
            Effect::ControlTransfer => return Step::Stop,
            Effect::Other { dst } => {
                if let Some(dst) = dst {
                    self.set(dst, Value::Unknown);
                }
                return Step::Tolerated;
            }
        }
        Step::Recognized
    }

    fn get(&self, reg: RegNum) -> Value {
        if Some(reg) == self.zero {
            return Value::Constant(0);
        }
        self.regs
            .get(&reg)
            .copied()
            .unwrap_or(Value::entry(reg))
    }

    fn set(&mut self, reg: RegNum, value: Value) {
        if Some(reg) != self.zero {
            self.regs.insert(reg, value);
        }
    }

    /// Determine the offset of `base + offset` from the entry stack pointer
    fn stack_offset(&self, base: RegNum, offset: i64) -> Option<i64> {
        self.get(base)
            .offset_from(self.sp)
            .map(|o| o.wrapping_add(offset))
    }

    fn load(&self, address: Option<i64>, width: u8) -> Value {
        address
            .and_then(|a| self.stack.get(&a))
            .filter(|(w, _)| *w == width)
            .map(|(_, v)| *v)
            .unwrap_or(Value::Unknown)
    }

    fn store(&mut self, address: Option<i64>, width: u8, value: Value) {
        let Some(address) = address else {
            // Could have hit any slot
            self.stack.clear();
            return;
        };

        let end = address.wrapping_add(width.into());
        self.stack
            .retain(|a, (w, _)| a.wrapping_add((*w).into()) <= address || end <= *a);
        self.stack.insert(address, (width, value));

        let Value::Register { reg, offset: 0 } = value else {
            return;
        };
        let full = self.arch.registers().width(reg) == Some(width.into());
        if reg != self.sp && full && !self.saved.contains_key(&reg) {
            log::trace!("Register {reg} saved at entry sp{address:+}");
            self.saved.insert(reg, address);
        }
    }

    fn commit(self, end: u64) -> PrologueCache {
        let sp = self.get(self.sp).offset_from(self.sp);
        let fp = self
            .arch
            .frame_pointer()
            .and_then(|fp| self.get(fp).offset_from(self.sp).map(|k| (fp, k)));
        let (base_register, base_offset) = match (fp, sp) {
            (Some((fp, k)), _) => (fp, k.wrapping_neg()),
            (None, Some(k)) => (self.sp, k.wrapping_neg()),
            (None, None) => (self.sp, 0),
        };

        PrologueCache {
            base_register,
            base_offset,
            saved: self.saved,
            frame_size: sp.map(|k| k.min(0).unsigned_abs()).unwrap_or(0),
            dynamic: self.dynamic,
            end,
        }
    }
}
