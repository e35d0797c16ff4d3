// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Access to the debugged target
//!
//! The analyses in this crate require access to the target's memory, its
//! registers and knowledge about the functions in the debugged program. This
//! module defines the collaborator traits used for that:
//!
//! * [`Memory`] for reading (and, for inferior calls, writing) target memory,
//! * [`Registers`] for reading and writing raw register contents and
//! * [`Symbols`] for looking up the function containing an address.
//!
//! In addition, it provides a number of types implementing those traits:
//!
//! * some [basic] [`Memory`]s such as adapters created through free fns such as
//!   [`from_fn`] and [`from_segment`],
//! * [combinators] that allow combining multiple memory areas such as a
//!   program image and a stack buffer,
//! * modifiers such as [`Offset`] that are usually created through provided fns
//!   of the [`Memory`] trait and
//! * feature-dependent types, e.g. for using [ELF][elf] files as [`Memory`] and
//!   [`Symbols`].
//!
//! # Combining [`Memory`]s
//!
//! [`Memory`]s used in [combinators] need to agree on the [`Memory::Error`]
//! type. Combinators such as [`Multi`] in particular also require the
//! [`Memory`]s themselves to be of the same type. The error type may be erased
//! through the provided method [`Memory::boxed`].
//!
//! # Example
//!
//! The following combines a read-only code image with a writable stack area.
//!
//! ```
//! use riscv_debug_arch::target::{self, Memory};
//!
//! # let code = b"\x13\x01\x01\xfe\x82\x80";
//! let mut memory = (
//!     target::from_segment(code).with_offset(0x1000),
//!     target::from_segment_mut([0u8; 64]).with_offset(0x8000),
//! );
//! memory.write_memory(0x8010, &[0xaa, 0xbb]).unwrap();
//!
//! let mut buf = [0u8; 2];
//! memory.read_memory(0x8010, &mut buf).unwrap();
//! assert_eq!(buf, [0xaa, 0xbb]);
//! memory.read_memory(0x1004, &mut buf).unwrap();
//! assert_eq!(buf, [0x82, 0x80]);
//! assert!(memory.write_memory(0x1000, &buf).is_err());
//! ```

pub mod basic;
pub mod boxed;
pub mod combinators;
#[cfg(feature = "elf")]
pub mod elf;
pub mod error;


use alloc::boxed::Box;
use alloc::string::String;

pub use basic::{
    Empty, NoSymbols, SymbolTable, from_fn, from_functions, from_segment, from_segment_mut,
};
pub use combinators::Multi;

use crate::registers::RegNum;

use error::Miss;

/// Memory of the debugged target
///
/// See the [module level][self] documentation for more details.
pub trait Memory {
    /// Error type returned by memory accesses
    type Error;

    /// Fill `buf` with the bytes starting at the given address
    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` to memory starting at the given address
    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error>;

    /// "Move" this memory by the given offset
    ///
    /// See [`Offset`] for more details.
    fn with_offset(self, offset: u64) -> Offset<Self>
    where
        Self: Sized,
        Self::Error: Miss,
    {
        Offset {
            inner: self,
            offset,
        }
    }

    /// Box this memory for dynamic dispatching
    ///
    /// This allows combining memories of different types with (originally)
    /// different [`Error`][Self::Error] types in [combinators].
    fn boxed<'a>(self) -> boxed::Memory<'a>
    where
        Self: Sized + 'a,
        Self::Error: error::MaybeMissError + 'static,
    {
        Box::new(boxed::BoxedError::new(self))
    }
}

/// [`Memory`] implementation for a tuple of two memories
///
/// This impl allows combining [`Memory`]s as long as they agree on their error
/// type. If the first [`Memory`] returns a "miss", the second one is consulted.
impl<A, B, E> Memory for (A, B)
where
    A: Memory<Error = E>,
    B: Memory<Error = E>,
    E: error::MaybeMiss,
{
    type Error = E;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        use error::MaybeMiss;

        let res = self.0.read_memory(address, buf);
        if res.is_miss() {
            self.1.read_memory(address, buf)
        } else {
            res
        }
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        use error::MaybeMiss;

        let res = self.0.write_memory(address, data);
        if res.is_miss() {
            self.1.write_memory(address, data)
        } else {
            res
        }
    }
}

impl<M> Memory for Option<M>
where
    M: Memory,
    M::Error: Miss,
{
    type Error = M::Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.as_mut()
            .map(|m| m.read_memory(address, buf))
            .unwrap_or_else(|| Miss::miss(address))
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        self.as_mut()
            .map(|m| m.write_memory(address, data))
            .unwrap_or_else(|| Miss::miss(address))
    }
}

impl<M: Memory + ?Sized> Memory for &mut M {
    type Error = M::Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        M::read_memory(self, address, buf)
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        M::write_memory(self, address, data)
    }
}

impl<M: Memory + ?Sized> Memory for Box<M> {
    type Error = M::Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        M::read_memory(self.as_mut(), address, buf)
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        M::write_memory(self.as_mut(), address, data)
    }
}

#[cfg(feature = "either")]
impl<L, R, E> Memory for either::Either<L, R>
where
    L: Memory<Error = E>,
    R: Memory<Error = E>,
{
    type Error = E;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        either::for_both!(self, m => m.read_memory(address, buf))
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        either::for_both!(self, m => m.write_memory(address, data))
    }
}

/// [`Memory`] moved by a fixed offset
///
/// Accesses will be mapped by subtracting the fixed offset from the address.
/// Accesses to addresses lower than the offset will result in a [miss][Miss].
#[derive(Copy, Clone, Debug)]
pub struct Offset<M> {
    inner: M,
    offset: u64,
}

impl<M> Offset<M> {
    /// Retrieve the inner [`Memory`]
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Retrieve the inner [`Memory`] mutably
    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.inner
    }

    /// Retrieve the offset
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl<M> Memory for Offset<M>
where
    M: Memory,
    M::Error: Miss,
{
    type Error = M::Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        address
            .checked_sub(self.offset)
            .ok_or(M::Error::miss(address))
            .and_then(|a| self.inner.read_memory(a, buf))
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        address
            .checked_sub(self.offset)
            .ok_or(M::Error::miss(address))
            .and_then(|a| self.inner.write_memory(a, data))
    }
}

/// Raw register access of the debugged target
///
/// Registers are identified by their [`RegNum`] in the architecture's
/// [`RegisterModel`][crate::registers::RegisterModel]. Only raw registers are
/// accessed through this trait. Buffers are exactly as wide as the register
/// and hold its contents in target byte order.
pub trait Registers {
    /// Error type returned by register accesses
    type Error;

    /// Fill `buf` with the contents of a raw register
    fn read_register(&mut self, regnum: RegNum, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Replace the contents of a raw register
    fn write_register(&mut self, regnum: RegNum, data: &[u8]) -> Result<(), Self::Error>;
}

impl<R: Registers + ?Sized> Registers for &mut R {
    type Error = R::Error;

    fn read_register(&mut self, regnum: RegNum, buf: &mut [u8]) -> Result<(), Self::Error> {
        R::read_register(self, regnum, buf)
    }

    fn write_register(&mut self, regnum: RegNum, data: &[u8]) -> Result<(), Self::Error> {
        R::write_register(self, regnum, data)
    }
}

impl<R: Registers + ?Sized> Registers for Box<R> {
    type Error = R::Error;

    fn read_register(&mut self, regnum: RegNum, buf: &mut [u8]) -> Result<(), Self::Error> {
        R::read_register(self.as_mut(), regnum, buf)
    }

    fn write_register(&mut self, regnum: RegNum, data: &[u8]) -> Result<(), Self::Error> {
        R::write_register(self.as_mut(), regnum, data)
    }
}

/// A function of the debugged program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    /// Address of the first instruction
    pub start: u64,
    /// Address past the last instruction
    pub end: u64,
    /// Symbol name, if known
    pub name: Option<String>,
}

impl Function {
    /// Check whether the function covers the given address
    pub fn contains(&self, address: u64) -> bool {
        (self.start..self.end).contains(&address)
    }
}

/// Symbol information of the debugged program
pub trait Symbols {
    /// Find the [`Function`] containing the given address
    fn find_function(&mut self, address: u64) -> Option<Function>;

    /// Retrieve the end of the prologue of the function starting at the given
    /// address, if known from line information
    fn prologue_end(&mut self, _function_start: u64) -> Option<u64> {
        None
    }
}

/// [`Symbols`] implementation for a tuple of two symbol sources
///
/// The second one is consulted if the first one does not know an address.
impl<A: Symbols, B: Symbols> Symbols for (A, B) {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        self.0
            .find_function(address)
            .or_else(|| self.1.find_function(address))
    }

    fn prologue_end(&mut self, function_start: u64) -> Option<u64> {
        self.0
            .prologue_end(function_start)
            .or_else(|| self.1.prologue_end(function_start))
    }
}

impl<S: Symbols> Symbols for Option<S> {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        self.as_mut().and_then(|s| s.find_function(address))
    }

    fn prologue_end(&mut self, function_start: u64) -> Option<u64> {
        self.as_mut().and_then(|s| s.prologue_end(function_start))
    }
}

impl<S: Symbols + ?Sized> Symbols for &mut S {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        S::find_function(self, address)
    }

    fn prologue_end(&mut self, function_start: u64) -> Option<u64> {
        S::prologue_end(self, function_start)
    }
}

#[cfg(feature = "either")]
impl<L: Symbols, R: Symbols> Symbols for either::Either<L, R> {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        either::for_both!(self, s => s.find_function(address))
    }

    fn prologue_end(&mut self, function_start: u64) -> Option<u64> {
        either::for_both!(self, s => s.prologue_end(function_start))
    }
}
