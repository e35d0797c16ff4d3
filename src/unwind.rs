// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Frame unwinding
//!
//! This module reconstructs the chain of call frames of a stopped target
//! without relying on debug information beyond function boundaries. An
//! [`Unwinder`] operates on a snapshot of the target's state, given by a
//! [`Memory`], the [`Registers`] of the innermost frame and [`Symbols`]. It
//! builds a [`FrameCache`] for every frame lazily, on first access, by scanning
//! the prologue of the frame's function up to the frame's pc.
//!
//! Frames are addressed by their level, with level `0` denoting the innermost
//! frame. The registers of frame `n + 1` are derived from those of frame `n`
//! through the [`RegisterLocation`]s reported by [`Unwinder::unwind_register`].
//!
//! The frame base of a frame is the stack pointer's value on entry of the
//! frame's function, i.e. the caller's stack pointer. A frame whose function
//! cannot be determined is the outermost frame. It has a frame base of `0`.
//!
//! [`FrameCache`]s are only valid as long as the target's state does not
//! change. After resuming the target, a new [`Unwinder`] needs to be created
//! or the existing one needs to be [invalidated][Unwinder::invalidate].

pub mod error;
mod heuristic;


use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::arch::Architecture;
use crate::config::DebugConfig;
use crate::registers::{MAX_WIDTH, RegNum};
use crate::scan::{self, Epilogue, PrologueCache};
use crate::target::{Memory, Registers, Symbols};

pub use error::Error;

/// A debug session
///
/// A session ties an [`Architecture`] to a [`DebugConfig`]. It outlives any
/// number of [`Unwinder`]s and remembers warnings already issued, such that
/// they are not repeated for every frame.
#[derive(Debug)]
pub struct Session<A> {
    arch: A,
    config: DebugConfig,
    warned: AtomicBool,
}

impl<A: Architecture> Session<A> {
    /// Create a new session
    pub fn new(arch: A, config: DebugConfig) -> Self {
        Self {
            arch,
            config,
            warned: AtomicBool::new(false),
        }
    }

    /// Retrieve the [`Architecture`]
    pub fn arch(&self) -> &A {
        &self.arch
    }

    /// Retrieve the [`DebugConfig`]
    pub fn config(&self) -> &DebugConfig {
        &self.config
    }

    /// Check whether a frame without a known function was encountered
    pub fn has_warned(&self) -> bool {
        self.warned.load(Ordering::Relaxed)
    }

    fn warn_no_function(&self, pc: u64) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            log::warn!("Cannot determine the function containing {pc:#x}, backtrace stops here");
        }
    }
}

/// Identity of a frame
///
/// Two frames are the same activation iff they agree on both frame base and
/// function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameId {
    /// Frame base, `0` for the outermost frame
    pub base: u64,
    /// Start address of the frame's function
    pub function: u64,
}

impl FrameId {
    /// Check whether this is the id of the outermost frame
    pub fn is_outermost(&self) -> bool {
        self.base == 0
    }
}

/// Location of a register's value in the calling frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegisterLocation {
    /// The value is not known
    Unknown,
    /// The value is held by the given register of the current frame
    Register(RegNum),
    /// The value is saved in memory at the given address
    Address(u64),
    /// The value is known
    Value(u64),
}

/// Analysis results for a single frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameCache {
    /// The frame's pc
    pub pc: u64,
    /// Start address of the frame's function
    pub function: Option<u64>,
    /// The frame base
    pub base: u64,
    /// Results of the prologue scan up to the frame's pc
    pub prologue: PrologueCache,
}

impl FrameCache {
    fn outermost(pc: u64) -> Self {
        Self {
            pc,
            function: None,
            base: 0,
            prologue: Default::default(),
        }
    }

    /// Retrieve this frame's [`FrameId`]
    pub fn id(&self) -> FrameId {
        FrameId {
            base: self.base,
            function: self.function.unwrap_or(0),
        }
    }

    /// Check whether this is the outermost frame
    pub fn is_outermost(&self) -> bool {
        self.base == 0
    }

    /// Determine where the caller's value of a register is found
    ///
    /// The caller's pc is the return address, wherever it was saved. The
    /// caller's stack pointer is the frame base. Registers not saved in the
    /// prologue still hold the caller's value.
    pub fn location<A: Architecture>(&self, arch: &A, regnum: RegNum) -> RegisterLocation {
        if self.is_outermost() {
            return RegisterLocation::Unknown;
        }
        let regnum = if regnum == arch.program_counter() {
            arch.return_address()
        } else {
            regnum
        };
        if regnum == arch.stack_pointer() {
            return RegisterLocation::Value(self.base);
        }
        match self.prologue.saved(regnum) {
            Some(offset) => RegisterLocation::Address(self.base.wrapping_add(offset as u64)),
            None => RegisterLocation::Register(regnum),
        }
    }
}

/// Frame unwinder over a snapshot of a stopped target
///
/// See the [module level][self] documentation for details.
pub struct Unwinder<'s, A, M, R, S> {
    session: &'s Session<A>,
    memory: M,
    registers: R,
    symbols: S,
    frames: Vec<FrameCache>,
}

impl<'s, A, M, R, S> Unwinder<'s, A, M, R, S>
where
    A: Architecture,
    M: Memory,
    R: Registers,
    S: Symbols,
{
    /// Create a new unwinder
    ///
    /// The `registers` hold the state of the innermost frame.
    pub fn new(session: &'s Session<A>, memory: M, registers: R, symbols: S) -> Self {
        Self {
            session,
            memory,
            registers,
            symbols,
            frames: Vec::new(),
        }
    }

    /// Retrieve the [`FrameCache`] of the frame at the given level
    ///
    /// This fn builds all frames up to the given level not built yet.
    pub fn frame(&mut self, level: usize) -> Result<&FrameCache, Error<M::Error, R::Error>> {
        if level >= self.session.config().max_depth {
            return Err(Error::DepthLimit(level));
        }
        while self.frames.len() <= level {
            if self.frames.last().is_some_and(FrameCache::is_outermost) {
                return Err(Error::NoFrame(level));
            }
            let frame = self.build(self.frames.len())?;
            self.frames.push(frame);
        }
        self.frames.get(level).ok_or(Error::NoFrame(level))
    }

    /// Retrieve the [`FrameId`] of the frame at the given level
    pub fn frame_id(&mut self, level: usize) -> Result<FrameId, Error<M::Error, R::Error>> {
        self.frame(level).map(FrameCache::id)
    }

    /// Retrieve the frame base of the frame at the given level
    pub fn frame_base(&mut self, level: usize) -> Result<u64, Error<M::Error, R::Error>> {
        self.frame(level).map(|f| f.base)
    }

    /// Determine where the caller of the frame at the given level finds a
    /// register's value
    pub fn unwind_register(
        &mut self,
        level: usize,
        regnum: RegNum,
    ) -> Result<RegisterLocation, Error<M::Error, R::Error>> {
        let session = self.session;
        self.frame(level).map(|f| f.location(session.arch(), regnum))
    }

    /// Retrieve the value a register has in the caller of the frame at the
    /// given level
    pub fn prev_register(
        &mut self,
        level: usize,
        regnum: RegNum,
    ) -> Result<u64, Error<M::Error, R::Error>> {
        let caller = level.checked_add(1).ok_or(Error::DepthLimit(level))?;
        self.register(caller, regnum)
    }

    /// Retrieve the value of a register in the frame at the given level
    ///
    /// If the value is not known, the error names the requested register, not
    /// the one it was last traced to.
    pub fn register(
        &mut self,
        level: usize,
        requested: RegNum,
    ) -> Result<u64, Error<M::Error, R::Error>> {
        let mut level = level;
        let mut regnum = requested;
        while let Some(callee) = level.checked_sub(1) {
            match self.unwind_register(callee, regnum)? {
                RegisterLocation::Register(r) => {
                    level = callee;
                    regnum = r;
                }
                RegisterLocation::Address(address) => return self.read_saved(regnum, address),
                RegisterLocation::Value(value) => return Ok(value),
                RegisterLocation::Unknown => return Err(Error::Unavailable(requested)),
            }
        }
        self.session
            .arch()
            .registers()
            .read_value(&mut self.registers, regnum)
            .map_err(Error::Registers)
    }

    /// Iterate over all frames, starting with the innermost one
    pub fn backtrace(&mut self) -> Backtrace<'_, 's, A, M, R, S> {
        Backtrace {
            unwinder: self,
            level: 0,
            last: None,
            done: false,
        }
    }

    /// Discard all [`FrameCache`]s
    pub fn invalidate(&mut self) {
        self.frames.clear();
    }

    /// Access the memory, discarding all [`FrameCache`]s
    pub fn memory_mut(&mut self) -> &mut M {
        self.invalidate();
        &mut self.memory
    }

    /// Access the registers of the innermost frame, discarding all
    /// [`FrameCache`]s
    pub fn registers_mut(&mut self) -> &mut R {
        self.invalidate();
        &mut self.registers
    }

    /// Dissolve this unwinder into its collaborators
    pub fn into_parts(self) -> (M, R, S) {
        (self.memory, self.registers, self.symbols)
    }

    fn build(&mut self, level: usize) -> Result<FrameCache, Error<M::Error, R::Error>> {
        let session = self.session;
        let arch = session.arch();
        let config = session.config();

        let pc = self.register(level, arch.program_counter())?;
        if level > 0 && pc == 0 {
            log::debug!("Frame {level} has a pc of zero");
            return Ok(FrameCache::outermost(pc));
        }
        // The pc of callers is a return address, which may lie past the end
        // of a function ending with a call.
        let lookup = if level == 0 { pc } else { pc.wrapping_sub(1) };
        let start = match self.symbols.find_function(lookup) {
            Some(function) => Some(function.start),
            None => heuristic::find_start(arch, config, &mut self.memory, pc),
        };
        let Some(start) = start else {
            session.warn_no_function(pc);
            return Ok(FrameCache::outermost(pc));
        };

        let limit = scan::limit(config, &mut self.symbols, start, pc);
        let mut prologue = PrologueCache::default();
        let res = scan::scan_prologue(
            arch,
            config,
            &mut self.memory,
            start,
            limit,
            Some(&mut prologue),
        );
        if let Err(e) = res {
            log::debug!("{e}, assuming {start:#x} has no prologue");
            prologue = PrologueCache {
                base_register: arch.stack_pointer(),
                end: start,
                ..Default::default()
            };
        }

        let base = match scan::scan_epilogue(arch, config, &mut self.memory, pc) {
            Some(Epilogue {
                release: Some(release),
                ..
            }) => self
                .register(level, arch.stack_pointer())?
                .wrapping_add(release),
            _ => self
                .register(level, prologue.base_register)?
                .wrapping_add(prologue.base_offset as u64),
        };
        log::debug!("Frame {level} at {pc:#x} in function {start:#x} has base {base:#x}");

        Ok(FrameCache {
            pc,
            function: Some(start),
            base,
            prologue,
        })
    }

    fn read_saved(
        &mut self,
        regnum: RegNum,
        address: u64,
    ) -> Result<u64, Error<M::Error, R::Error>> {
        let model = self.session.arch().registers();
        let width = model.width(regnum).unwrap_or(0).min(MAX_WIDTH);
        let mut buf = [0u8; MAX_WIDTH];
        let buf = &mut buf[..width];
        self.memory
            .read_memory(address, buf)
            .map_err(|e| Error::Memory(e, address))?;
        let endian = model.endian();
        Ok(endian.read(&buf[endian.low_bytes(width, 8)]))
    }
}

/// [`Iterator`] over the frames of an [`Unwinder`]
///
/// The iteration ends after the outermost frame, before a frame with a pc of
/// zero, or before a frame with the same [`FrameId`] as its callee. Reaching
/// the maximum depth yields [`Error::DepthLimit`].
pub struct Backtrace<'u, 's, A, M, R, S> {
    unwinder: &'u mut Unwinder<'s, A, M, R, S>,
    level: usize,
    last: Option<FrameId>,
    done: bool,
}

impl<A, M, R, S> Iterator for Backtrace<'_, '_, A, M, R, S>
where
    A: Architecture,
    M: Memory,
    R: Registers,
    S: Symbols,
{
    type Item = Result<FrameCache, Error<M::Error, R::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let frame = match self.unwinder.frame(self.level) {
            Ok(frame) => frame.clone(),
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let id = frame.id();
        if (self.level > 0 && frame.pc == 0) || self.last == Some(id) {
            log::debug!("Backtrace ends at frame {}", self.level);
            self.done = true;
            return None;
        }
        self.done = frame.is_outermost();
        self.last = Some(id);
        self.level += 1;
        Some(Ok(frame))
    }
}
