// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Calling convention
//!
//! This module implements the RISC-V psABI for inferior function calls: the
//! placement of arguments in registers and on the stack, and the access to
//! return values. Values are described by a [`Type`] and passed as raw bytes
//! in target byte order.
//!
//! A [`Convention`] is derived from the target's [`Features`] and the user's
//! [`AbiOverride`]. For each call, a fresh [`CallState`] tracks the registers
//! and memory consumed so far while the arguments are [located][CallState::locate]
//! in declaration order.
//!
//! Integral values are promoted to the width of an integer register, or two,
//! with sign or zero extension. Values wider than two integer registers are
//! passed by reference: they are copied to an area below the stack pointer and
//! their address is passed instead. Floating point values no wider than the
//! floating point ABI are passed in floating point registers, as are
//! structures consisting of up to two scalars of which at least one is a
//! floating point value.

pub mod error;
pub mod location;
pub mod types;


use alloc::vec;
use alloc::vec::Vec;

use crate::arch::{Architecture, Riscv};
use crate::config::{AbiOverride, DebugConfig, Endian, Features};
use crate::registers::riscv as regs;
use crate::registers::{self, MAX_WIDTH, RegNum, RegisterModel};
use crate::target::{Memory, Registers};

pub use error::Error;
pub use location::{ArgumentLocation, CallState, Location, Part};
pub use types::{Field, Struct, Type};

/// Alignment of the stack pointer at calls
const STACK_ALIGN: u64 = 16;

/// Maximum number of argument registers of either class
const ARG_REGS: u8 = 8;

type CallError<M, R> = Error<<M as Memory>::Error, <R as Registers>::Error>;

/// Argument of an inferior call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument<'v> {
    pub ty: Type,
    /// Value in target byte order, exactly as long as the type's size
    pub value: &'v [u8],
    /// Whether the argument is declared, i.e. not part of variadic arguments
    pub named: bool,
}

impl<'v> Argument<'v> {
    /// Create a declared argument
    pub fn new(ty: Type, value: &'v [u8]) -> Self {
        Self {
            ty,
            value,
            named: true,
        }
    }

    /// Create an argument matching a variadic function's ellipsis
    pub fn unnamed(ty: Type, value: &'v [u8]) -> Self {
        Self {
            ty,
            value,
            named: false,
        }
    }
}

/// Frame setup for an inferior call
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DummyCall {
    /// Stack pointer before the call
    pub sp: u64,
    /// Address the callee returns to, usually a breakpoint
    pub return_address: u64,
    /// Address of the buffer receiving a returned structure
    pub struct_return: Option<u64>,
}

/// Return value read from the target
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnValue {
    /// The value was returned in registers
    Registers(Vec<u8>),
    /// The value was returned in the buffer at the given address
    Memory { address: u64, value: Vec<u8> },
}

impl ReturnValue {
    /// Retrieve the bytes of the value
    pub fn value(&self) -> &[u8] {
        match self {
            Self::Registers(value) | Self::Memory { value, .. } => value,
        }
    }
}

/// Calling convention of a specific target
#[derive(Copy, Clone, Debug)]
pub struct Convention<'a> {
    model: &'a RegisterModel,
    xlen: usize,
    flen: usize,
    int_regs: u8,
    float_regs: u8,
}

impl<'a> Convention<'a> {
    /// Create a convention for a target with the given features
    pub fn new(model: &'a RegisterModel, features: &Features, abi: &AbiOverride) -> Self {
        let embedded = abi.embedded.unwrap_or(features.embedded);
        let default_int = if embedded { 6 } else { ARG_REGS };
        Self {
            model,
            xlen: features.xlen.into(),
            flen: abi.float_abi.unwrap_or(features.abi_flen).into(),
            int_regs: abi.int_arg_regs.unwrap_or(default_int).min(ARG_REGS),
            float_regs: abi.float_arg_regs.unwrap_or(ARG_REGS).min(ARG_REGS),
        }
    }

    /// Create the convention for an architecture and session configuration
    pub fn for_arch(arch: &'a Riscv, config: &DebugConfig) -> Self {
        Self::new(arch.registers(), arch.features(), &config.abi)
    }

    /// Create a fresh [`CallState`] for a single call
    pub fn call_state(&self) -> CallState {
        CallState::new(
            self.xlen,
            self.flen,
            (regs::A0, self.int_regs),
            (regs::FA0, self.float_regs),
        )
    }

    /// Set up the registers and stack for an inferior call
    ///
    /// Arguments are placed, `ra` is set to the return address and the new
    /// stack pointer is written to `sp` and returned.
    pub fn push_dummy_call<M: Memory, R: Registers>(
        &self,
        memory: &mut M,
        registers: &mut R,
        call: &DummyCall,
        arguments: &[Argument<'_>],
    ) -> Result<u64, CallError<M, R>> {
        let mut state = self.call_state();
        if let Some(buffer) = call.struct_return {
            let reg = state
                .reserve_int_register()
                .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
            self.model.write_value(registers, reg, buffer)?;
        }

        let sp = self.marshal_arguments(&mut state, memory, registers, call.sp, arguments)?;
        self.model
            .write_value(registers, regs::RA, call.return_address)?;
        self.model.write_value(registers, regs::SP, sp)?;
        Ok(sp)
    }

    /// Place arguments in registers and memory
    ///
    /// Returns the stack pointer below the memory used for the arguments.
    pub fn marshal_arguments<M: Memory, R: Registers>(
        &self,
        state: &mut CallState,
        memory: &mut M,
        registers: &mut R,
        sp: u64,
        arguments: &[Argument<'_>],
    ) -> Result<u64, CallError<M, R>> {
        let mut placed = Vec::with_capacity(arguments.len());
        for (n, argument) in arguments.iter().enumerate() {
            let location = state.locate(&argument.ty, argument.named);
            log::debug!("Argument {n} located at {location:?}");
            let value = self.abi_value::<M::Error, R::Error>(
                &argument.ty,
                argument.value,
                location.length,
            )?;
            placed.push((location, value));
        }

        let sp_refs = align_down(sp.wrapping_sub(state.ref_area() as u64));
        let sp_args = align_down(sp_refs.wrapping_sub(state.arg_area() as u64));
        log::debug!("Arguments at {sp_args:#x}, references at {sp_refs:#x}");

        for (location, value) in &placed {
            if let Location::Reference(offset) = location.first.location {
                let address = sp_refs.wrapping_add(offset as u64);
                memory
                    .write_memory(address, value)
                    .map_err(|e| Error::Memory(e, address))?;
                let pointer = location
                    .second
                    .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
                let mut buf = [0u8; 8];
                let buf = buf
                    .get_mut(..self.xlen)
                    .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
                self.model.endian().write(address, buf, 0);
                self.place(memory, registers, pointer.location, buf, sp_args)?;
            } else {
                for part in location.parts() {
                    let data = value
                        .get(part.offset..part.offset + part.length)
                        .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
                    self.place(memory, registers, part.location, data, sp_args)?;
                }
            }
        }
        Ok(sp_args)
    }

    /// Determine where a value of the given type is returned
    pub fn return_location(&self, ty: &Type) -> ArgumentLocation {
        self.call_state().locate(ty, true)
    }

    /// Read a returned value of the given type
    pub fn extract_return_value<M: Memory, R: Registers>(
        &self,
        memory: &mut M,
        registers: &mut R,
        ty: &Type,
    ) -> Result<ReturnValue, CallError<M, R>> {
        let location = self.return_location(ty);
        if location.is_by_ref() {
            let address = self.return_buffer::<M::Error, R>(registers, &location)?;
            let mut value = vec![0; ty.size()];
            memory
                .read_memory(address, &mut value)
                .map_err(|e| Error::Memory(e, address))?;
            return Ok(ReturnValue::Memory { address, value });
        }

        let mut value = vec![0; location.length.max(ty.size())];
        for part in location.parts() {
            let Location::Register(reg) = part.location else {
                return Err(Error::InvalidArgumentLocation);
            };
            let buf = value
                .get_mut(part.offset..part.offset + part.length)
                .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
            self.read_register::<M::Error, R>(registers, reg, buf)?;
        }
        // Promoted integers are returned with their declared size
        let range = self.model.endian().low_bytes(value.len(), ty.size());
        Ok(ReturnValue::Registers(value[range].to_vec()))
    }

    /// Set the value returned by the current function
    pub fn inject_return_value<M: Memory, R: Registers>(
        &self,
        memory: &mut M,
        registers: &mut R,
        ty: &Type,
        value: &[u8],
    ) -> Result<(), CallError<M, R>> {
        let location = self.return_location(ty);
        let value = self.abi_value::<M::Error, R::Error>(ty, value, location.length)?;
        if location.is_by_ref() {
            let address = self.return_buffer::<M::Error, R>(registers, &location)?;
            return memory
                .write_memory(address, &value)
                .map_err(|e| Error::Memory(e, address));
        }

        for part in location.parts() {
            let Location::Register(reg) = part.location else {
                return Err(Error::InvalidArgumentLocation);
            };
            let data = value
                .get(part.offset..part.offset + part.length)
                .ok_or(CallError::<M, R>::InvalidArgumentLocation)?;
            self.write_register::<M::Error, R>(registers, reg, data)?;
        }
        Ok(())
    }

    /// Retrieve the address of the buffer for a value returned by reference
    fn return_buffer<E, R: Registers>(
        &self,
        registers: &mut R,
        location: &ArgumentLocation,
    ) -> Result<u64, Error<E, R::Error>> {
        match location.second.map(|p| p.location) {
            Some(Location::Register(reg)) => Ok(self.model.read_value(registers, reg)?),
            _ => Err(Error::InvalidArgumentLocation),
        }
    }

    /// Convert a value to its representation at the call
    fn abi_value<E, F>(
        &self,
        ty: &Type,
        value: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, Error<E, F>> {
        let expected = ty.size();
        if value.len() != expected {
            return Err(Error::ValueLength {
                expected,
                actual: value.len(),
            });
        }
        let signed = match ty {
            Type::Int { signed, .. } => *signed,
            Type::Pointer { .. } => false,
            _ => return Ok(value.to_vec()),
        };

        let endian = self.model.endian();
        let sign = match endian {
            Endian::Little => value.last(),
            Endian::Big => value.first(),
        };
        let negative = signed && sign.is_some_and(|b| b & 0x80 != 0);
        let mut extended = vec![if negative { 0xff } else { 0 }; length.max(value.len())];
        let range = endian.low_bytes(extended.len(), value.len());
        extended[range].copy_from_slice(value);
        Ok(extended)
    }

    fn place<M: Memory, R: Registers>(
        &self,
        memory: &mut M,
        registers: &mut R,
        location: Location,
        data: &[u8],
        sp_args: u64,
    ) -> Result<(), CallError<M, R>> {
        match location {
            Location::Register(reg) => self.write_register(registers, reg, data),
            Location::Stack(offset) => {
                let address = sp_args.wrapping_add(offset as u64);
                memory
                    .write_memory(address, data)
                    .map_err(|e| Error::Memory(e, address))
            }
            Location::Reference(_) => Err(Error::InvalidArgumentLocation),
        }
    }

    /// Write the low bytes of a register
    ///
    /// The remaining bytes are cleared, or set for floating point registers
    /// (NaN-boxing).
    fn write_register<E, R: Registers>(
        &self,
        registers: &mut R,
        reg: RegNum,
        data: &[u8],
    ) -> Result<(), Error<E, R::Error>> {
        let Some(width) = self.model.width(reg).filter(|w| *w <= MAX_WIDTH) else {
            return Err(Error::Registers(registers::Error::NoRegister(reg)));
        };
        if data.len() > width {
            return Err(Error::InvalidArgumentLocation);
        }
        let mut buf = [0u8; MAX_WIDTH];
        let buf = &mut buf[..width];
        buf.fill(if is_float(reg) { 0xff } else { 0 });
        let endian = self.model.endian();
        buf[endian.low_bytes(width, data.len())].copy_from_slice(data);
        Ok(self.model.write(registers, reg, buf)?)
    }

    /// Read the low bytes of a register
    fn read_register<E, R: Registers>(
        &self,
        registers: &mut R,
        reg: RegNum,
        buf: &mut [u8],
    ) -> Result<(), Error<E, R::Error>> {
        let Some(width) = self.model.width(reg).filter(|w| *w <= MAX_WIDTH) else {
            return Err(Error::Registers(registers::Error::NoRegister(reg)));
        };
        if buf.len() > width {
            return Err(Error::InvalidArgumentLocation);
        }
        let mut raw = [0u8; MAX_WIDTH];
        let raw = &mut raw[..width];
        self.model.read(registers, reg, raw)?;
        let endian = self.model.endian();
        buf.copy_from_slice(&raw[endian.low_bytes(width, buf.len())]);
        Ok(())
    }
}

fn is_float(reg: RegNum) -> bool {
    (regs::F0..regs::F0 + 32).contains(&reg)
}

fn align_down(address: u64) -> u64 {
    address & !(STACK_ALIGN - 1)
}
