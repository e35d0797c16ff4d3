// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Register model
//!
//! A [`RegisterModel`] describes all registers of an architecture known to the
//! debugger: their names, widths, groups and, for pseudo registers, how their
//! contents are composed from raw registers. Raw registers are accessed
//! through the [`Registers`] collaborator. Pseudo registers are computed from
//! raw ones on every access according to their [`Composition`].
//!
//! Models are built once per recognized architecture, e.g. via
//! [`riscv::model`], and are not changed afterwards.
//!
//! # Example
//!
//! ```
//! use riscv_debug_arch::config::Features;
//! use riscv_debug_arch::registers::{RegisterFile, riscv};
//!
//! let model = riscv::model(&Features::RV64GC);
//! let mut regs = RegisterFile::new(&model);
//! regs.set(riscv::FCSR, 0xe3).unwrap();
//!
//! let frm = model.find("frm").unwrap();
//! assert_eq!(model.read_value(&mut regs, frm).unwrap(), 0x7);
//! assert_eq!(model.read_value(&mut regs, riscv::FFLAGS).unwrap(), 0x3);
//!
//! model.write_value(&mut regs, frm, 0x1).unwrap();
//! assert_eq!(regs.get(riscv::FCSR), Some(0x23));
//! ```

pub mod riscv;

#[cfg(test)]
mod tests;

use core::convert::Infallible;
use core::fmt;
use core::ops::Range;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::config::Endian;
use crate::target::Registers;

/// Register number
///
/// Raw registers are numbered first, followed by pseudo registers.
pub type RegNum = u16;

/// Largest register width supported, in bytes
pub const MAX_WIDTH: usize = 16;

/// Description of a single register
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    /// Primary name
    pub name: String,
    /// Alternative names
    pub aliases: Vec<String>,
    /// Width in bytes
    pub width: u8,
    /// Group the register is displayed in
    pub group: Group,
    /// Whether writes to the register are rejected
    pub read_only: bool,
    /// Whether the register is raw or composed from raw registers
    pub layout: Layout,
}

impl Register {
    /// Create a new raw register
    pub fn raw(name: &str, width: u8, group: Group) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            width,
            group,
            read_only: false,
            layout: Layout::Raw,
        }
    }

    /// Create a new pseudo register
    pub fn pseudo(name: &str, width: u8, group: Group, composition: Composition) -> Self {
        Self {
            layout: Layout::Pseudo(composition),
            ..Self::raw(name, width, group)
        }
    }

    /// Add an alternative name
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Mark the register as read-only
    pub fn read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    /// Check whether this register is known under the given name
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

/// Register group
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Group {
    /// General purpose registers and the program counter
    General,
    /// Floating point registers
    Float,
    /// Control and status registers
    System,
    /// Alternative views of other registers
    Pseudo,
}

/// Layout of a [`Register`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Directly accessible through [`Registers`]
    Raw,
    /// Composed from raw registers
    Pseudo(Composition),
}

/// Composition of a pseudo register from raw registers
///
/// Reads and writes of pseudo registers round-trip for every value
/// representable in the backing storage. Values not representable are
/// truncated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Composition {
    /// The least significant bytes of a wider raw register
    ///
    /// Writes extend the value to the raw register's width, either by sign or
    /// by zero extension.
    Truncate { raw: RegNum, signed: bool },
    /// One half of a raw register
    ///
    /// Writes leave the other half untouched.
    Half { raw: RegNum, high: bool },
    /// Two raw registers forming the less and more significant part
    Concat { low: RegNum, high: RegNum },
    /// A range of bits in a raw register
    Bitfield { raw: RegNum, shift: u8, bits: u8 },
}

/// Register model of an architecture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterModel {
    registers: Vec<Option<Register>>,
    raw: usize,
    endian: Endian,
    dwarf: Vec<(u16, RegNum, u16)>,
}

impl RegisterModel {
    /// Create a new, empty model for the given byte order
    pub fn new(endian: Endian) -> Self {
        Self {
            registers: Vec::new(),
            raw: 0,
            endian,
            dwarf: Vec::new(),
        }
    }

    /// Add a register, returning its number
    ///
    /// Raw registers need to be added before any pseudo register.
    pub fn push(&mut self, register: Register) -> RegNum {
        let is_raw = register.layout == Layout::Raw;
        self.insert(Some(register), is_raw)
    }

    /// Reserve the number of a raw register the target does not have
    pub fn push_absent(&mut self) -> RegNum {
        self.insert(None, true)
    }

    fn insert(&mut self, register: Option<Register>, is_raw: bool) -> RegNum {
        let regnum = self.registers.len() as RegNum;
        if is_raw && self.raw == self.registers.len() {
            self.raw += 1;
        }
        self.registers.push(register);
        regnum
    }

    /// Map a range of DWARF register numbers onto registers
    pub fn with_dwarf(mut self, first_dwarf: u16, first: RegNum, count: u16) -> Self {
        self.dwarf.push((first_dwarf, first, count));
        self
    }

    /// Number of raw registers
    pub fn raw_count(&self) -> usize {
        self.raw
    }

    /// Total number of registers, including pseudo registers
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Check whether the model contains no registers
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Byte order of register contents
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Retrieve a [`Register`]
    pub fn get(&self, regnum: RegNum) -> Option<&Register> {
        self.registers.get(usize::from(regnum))?.as_ref()
    }

    /// Find a register by one of its names
    pub fn find(&self, name: &str) -> Option<RegNum> {
        self.registers
            .iter()
            .position(|r| r.as_ref().is_some_and(|r| r.is_named(name)))
            .map(|n| n as RegNum)
    }

    /// Retrieve the primary name of a register
    pub fn name(&self, regnum: RegNum) -> Option<&str> {
        self.get(regnum).map(|r| r.name.as_str())
    }

    /// Retrieve the width of a register in bytes
    pub fn width(&self, regnum: RegNum) -> Option<usize> {
        self.get(regnum).map(|r| r.width.into())
    }

    /// Check whether a register is a pseudo register
    pub fn is_pseudo(&self, regnum: RegNum) -> bool {
        self.get(regnum)
            .is_some_and(|r| matches!(r.layout, Layout::Pseudo(_)))
    }

    /// Check whether a register cannot be written
    pub fn is_read_only(&self, regnum: RegNum) -> bool {
        self.get(regnum).is_some_and(|r| r.read_only)
    }

    /// Iterate over all registers in a [`Group`]
    pub fn group(&self, group: Group) -> impl Iterator<Item = (RegNum, &Register)> + '_ {
        self.registers
            .iter()
            .enumerate()
            .filter_map(|(n, r)| r.as_ref().map(|r| (n as RegNum, r)))
            .filter(move |(_, r)| r.group == group)
    }

    /// Map a DWARF register number to a register
    pub fn from_dwarf(&self, dwarf: u16) -> Option<RegNum> {
        self.dwarf
            .iter()
            .find(|(d, _, n)| (*d..d.saturating_add(*n)).contains(&dwarf))
            .map(|(d, first, _)| first + (dwarf - d))
            .filter(|r| self.get(*r).is_some())
    }

    /// Read the contents of a register
    ///
    /// The buffer needs to be exactly as wide as the register.
    pub fn read<R: Registers>(
        &self,
        regs: &mut R,
        regnum: RegNum,
        buf: &mut [u8],
    ) -> Result<(), Error<R::Error>> {
        let register = self.checked(regnum, buf.len())?;
        let Layout::Pseudo(composition) = register.layout else {
            return regs.read_register(regnum, buf).map_err(Error::Access);
        };

        let endian = self.endian;
        let mut raw = [0u8; MAX_WIDTH];
        match composition {
            Composition::Truncate { raw: r, .. } => {
                let raw = self.read_raw(regs, r, &mut raw)?;
                copy(regnum, buf, &raw[endian.low_bytes(raw.len(), buf.len())])?;
            }
            Composition::Half { raw: r, high } => {
                let raw = self.read_raw(regs, r, &mut raw)?;
                copy(regnum, buf, &raw[half(endian, raw.len(), high)])?;
            }
            Composition::Concat { low, high } => {
                let low_len = self.read_raw(regs, low, &mut raw)?.len();
                let (low_part, high_part) = split(endian, buf, low_len);
                copy(regnum, low_part, &raw[..low_len])?;
                let mut other = [0u8; MAX_WIDTH];
                copy(regnum, high_part, self.read_raw(regs, high, &mut other)?)?;
            }
            Composition::Bitfield { raw: r, shift, bits } => {
                let value = endian.read(self.read_raw(regs, r, &mut raw)?);
                endian.write((value >> shift) & mask(bits), buf, 0);
            }
        }
        Ok(())
    }

    /// Write the contents of a register
    ///
    /// The data needs to be exactly as wide as the register.
    pub fn write<R: Registers>(
        &self,
        regs: &mut R,
        regnum: RegNum,
        data: &[u8],
    ) -> Result<(), Error<R::Error>> {
        let register = self.checked(regnum, data.len())?;
        if register.read_only {
            return Err(Error::ReadOnly(regnum));
        }
        let Layout::Pseudo(composition) = register.layout else {
            return regs.write_register(regnum, data).map_err(Error::Access);
        };

        let endian = self.endian;
        let mut raw = [0u8; MAX_WIDTH];
        match composition {
            Composition::Truncate { raw: r, signed } => {
                let width = self.raw_width(r)?;
                let negative = signed
                    && data
                        .get(sign_byte(endian, data.len()))
                        .is_some_and(|b| b & 0x80 != 0);
                let raw = &mut raw[..width];
                raw.fill(if negative { 0xff } else { 0 });
                copy(regnum, &mut raw[endian.low_bytes(width, data.len())], data)?;
                regs.write_register(r, raw).map_err(Error::Access)
            }
            Composition::Half { raw: r, high } => {
                let raw = self.read_raw(regs, r, &mut raw)?;
                let len = raw.len();
                copy(regnum, &mut raw[half(endian, len, high)], data)?;
                regs.write_register(r, raw).map_err(Error::Access)
            }
            Composition::Concat { low, high } => {
                let low_len = self.raw_width(low)?;
                let mut buf = [0u8; MAX_WIDTH];
                let buf = &mut buf[..data.len()];
                buf.copy_from_slice(data);
                let (low_part, high_part) = split(endian, buf, low_len);
                if high_part.len() != self.raw_width(high)? {
                    return Err(Error::Width {
                        regnum,
                        expected: low_len + self.raw_width(high)?,
                        actual: data.len(),
                    });
                }
                regs.write_register(low, low_part).map_err(Error::Access)?;
                regs.write_register(high, high_part).map_err(Error::Access)
            }
            Composition::Bitfield { raw: r, shift, bits } => {
                let raw = self.read_raw(regs, r, &mut raw)?;
                let field = mask(bits) << shift;
                let value = (endian.read(raw) & !field) | ((endian.read(data) << shift) & field);
                endian.write(value, raw, 0);
                regs.write_register(r, raw).map_err(Error::Access)
            }
        }
    }

    /// Read a register as an unsigned value
    ///
    /// Only the least significant eight bytes are considered.
    pub fn read_value<R: Registers>(
        &self,
        regs: &mut R,
        regnum: RegNum,
    ) -> Result<u64, Error<R::Error>> {
        let mut buf = [0u8; MAX_WIDTH];
        let width = self.width(regnum).ok_or(Error::NoRegister(regnum))?;
        let buf = buf.get_mut(..width).ok_or(Error::NoRegister(regnum))?;
        self.read(regs, regnum, buf)?;
        Ok(self.endian.read(&buf[self.endian.low_bytes(width, 8)]))
    }

    /// Write an unsigned value to a register
    ///
    /// Bytes beyond the eighth are cleared.
    pub fn write_value<R: Registers>(
        &self,
        regs: &mut R,
        regnum: RegNum,
        value: u64,
    ) -> Result<(), Error<R::Error>> {
        let mut buf = [0u8; MAX_WIDTH];
        let width = self.width(regnum).ok_or(Error::NoRegister(regnum))?;
        let buf = buf.get_mut(..width).ok_or(Error::NoRegister(regnum))?;
        self.endian.write(value, buf, 0);
        self.write(regs, regnum, buf)
    }

    fn checked<E>(&self, regnum: RegNum, len: usize) -> Result<&Register, Error<E>> {
        let register = self.get(regnum).ok_or(Error::NoRegister(regnum))?;
        let expected = register.width.into();
        if len != expected || expected > MAX_WIDTH {
            return Err(Error::Width {
                regnum,
                expected,
                actual: len,
            });
        }
        Ok(register)
    }

    fn raw_width<E>(&self, regnum: RegNum) -> Result<usize, Error<E>> {
        self.get(regnum)
            .filter(|r| r.layout == Layout::Raw)
            .map(|r| usize::from(r.width).min(MAX_WIDTH))
            .ok_or(Error::NoRegister(regnum))
    }

    fn read_raw<'b, R: Registers>(
        &self,
        regs: &mut R,
        regnum: RegNum,
        buf: &'b mut [u8; MAX_WIDTH],
    ) -> Result<&'b mut [u8], Error<R::Error>> {
        let buf = &mut buf[..self.raw_width(regnum)?];
        regs.read_register(regnum, buf).map_err(Error::Access)?;
        Ok(buf)
    }
}

/// Copy between buffers of a register's parts, which need to agree in width
fn copy<E>(regnum: RegNum, dst: &mut [u8], src: &[u8]) -> Result<(), Error<E>> {
    if dst.len() != src.len() {
        return Err(Error::Width {
            regnum,
            expected: src.len(),
            actual: dst.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

/// Byte range of one half of a `width` wide register
fn half(endian: Endian, width: usize, high: bool) -> Range<usize> {
    let low = endian.low_bytes(width, width / 2);
    match (high, low.start) {
        (false, _) => low,
        (true, 0) => low.end..width,
        (true, start) => 0..start,
    }
}

/// Split a buffer into the `low_len` less significant bytes and the rest
fn split(endian: Endian, buf: &mut [u8], low_len: usize) -> (&mut [u8], &mut [u8]) {
    let low_len = low_len.min(buf.len());
    match endian {
        Endian::Little => buf.split_at_mut(low_len),
        Endian::Big => {
            let (high, low) = buf.split_at_mut(buf.len() - low_len);
            (low, high)
        }
    }
}

/// Index of the most significant byte in a `len` wide buffer
fn sign_byte(endian: Endian, len: usize) -> usize {
    match endian {
        Endian::Little => len.saturating_sub(1),
        Endian::Big => 0,
    }
}

const fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// In-memory file of raw registers
///
/// This [`Registers`] implementation holds the contents of all raw registers
/// of a [`RegisterModel`]. It may serve as a snapshot of a stopped target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    slots: Vec<Range<usize>>,
    data: Vec<u8>,
    endian: Endian,
}

impl RegisterFile {
    /// Create a new register file with all raw registers of a model cleared
    pub fn new(model: &RegisterModel) -> Self {
        let mut slots = Vec::with_capacity(model.raw_count());
        let mut len = 0;
        for regnum in 0..model.raw_count() {
            let width = model.width(regnum as RegNum).unwrap_or(0);
            slots.push(len..len + width);
            len += width;
        }
        Self {
            slots,
            data: alloc::vec![0; len],
            endian: model.endian(),
        }
    }

    /// Set a raw register to the given value
    pub fn set(&mut self, regnum: RegNum, value: u64) -> Result<(), Error<Infallible>> {
        let endian = self.endian;
        endian.write(value, self.slot_mut(regnum)?, 0);
        Ok(())
    }

    /// Retrieve the value of a raw register
    ///
    /// Only the least significant eight bytes are considered.
    pub fn get(&self, regnum: RegNum) -> Option<u64> {
        let slot = self.slot(regnum).ok()?;
        Some(self.endian.read(&slot[self.endian.low_bytes(slot.len(), 8)]))
    }

    fn slot(&self, regnum: RegNum) -> Result<&[u8], Error<Infallible>> {
        self.slots
            .get(usize::from(regnum))
            .filter(|s| !s.is_empty())
            .map(|s| &self.data[s.clone()])
            .ok_or(Error::NoRegister(regnum))
    }

    fn slot_mut(&mut self, regnum: RegNum) -> Result<&mut [u8], Error<Infallible>> {
        self.slots
            .get(usize::from(regnum))
            .filter(|s| !s.is_empty())
            .map(|s| &mut self.data[s.clone()])
            .ok_or(Error::NoRegister(regnum))
    }
}

impl Registers for RegisterFile {
    type Error = Error<Infallible>;

    fn read_register(&mut self, regnum: RegNum, buf: &mut [u8]) -> Result<(), Self::Error> {
        let slot = self.slot(regnum)?;
        if slot.len() != buf.len() {
            return Err(Error::Width {
                regnum,
                expected: slot.len(),
                actual: buf.len(),
            });
        }
        buf.copy_from_slice(slot);
        Ok(())
    }

    fn write_register(&mut self, regnum: RegNum, data: &[u8]) -> Result<(), Self::Error> {
        let slot = self.slot_mut(regnum)?;
        if slot.len() != data.len() {
            return Err(Error::Width {
                regnum,
                expected: slot.len(),
                actual: data.len(),
            });
        }
        slot.copy_from_slice(data);
        Ok(())
    }
}

/// Register access errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The register does not exist
    NoRegister(RegNum),
    /// A buffer does not match the register's width
    Width {
        regnum: RegNum,
        expected: usize,
        actual: usize,
    },
    /// The register cannot be written
    ReadOnly(RegNum),
    /// Accessing a raw register failed
    Access(E),
}

impl<E> core::error::Error for Error<E>
where
    E: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Access(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRegister(r) => write!(f, "No register {r}"),
            Self::Width {
                regnum,
                expected,
                actual,
            } => write!(
                f,
                "Register {regnum} is {expected} bytes wide, buffer holds {actual}"
            ),
            Self::ReadOnly(r) => write!(f, "Register {r} is read-only"),
            Self::Access(_) => write!(f, "Could not access raw register"),
        }
    }
}
