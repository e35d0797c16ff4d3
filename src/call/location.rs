// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Argument classification

use crate::registers::RegNum;

use super::types::{Struct, Type};

/// Location of (a part of) an argument
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// A register
    Register(RegNum),
    /// The given offset into the outgoing argument area on the stack
    Stack(usize),
    /// The given offset into the area holding values passed by reference
    Reference(usize),
}

/// Part of an argument placed in a single [`Location`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub location: Location,
    /// Number of bytes placed in the location
    pub length: usize,
    /// Offset of the first byte within the argument's value
    pub offset: usize,
}

/// Placement of a single argument
///
/// An argument occupies one or two [`Part`]s. For arguments passed by
/// reference, the first part refers to the copy of the value and the second
/// part holds the pointer to that copy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArgumentLocation {
    /// Length of the value after promotion
    pub length: usize,
    /// Alignment of the value after promotion
    pub align: usize,
    pub first: Part,
    pub second: Option<Part>,
}

impl ArgumentLocation {
    fn single(length: usize, align: usize, first: Part) -> Self {
        Self {
            length,
            align,
            first,
            second: None,
        }
    }

    /// Whether the value is passed by reference
    pub fn is_by_ref(&self) -> bool {
        matches!(self.first.location, Location::Reference(_))
    }

    /// Iterate over the parts
    pub fn parts(&self) -> impl Iterator<Item = Part> {
        core::iter::once(self.first).chain(self.second)
    }
}

/// Consecutive argument registers not yet consumed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ArgRegs {
    first: RegNum,
    next: RegNum,
    end: RegNum,
}

impl ArgRegs {
    fn new(first: RegNum, count: u8) -> Self {
        Self {
            first,
            next: first,
            end: first.saturating_add(count.into()),
        }
    }

    fn available(&self) -> usize {
        usize::from(self.end.saturating_sub(self.next))
    }

    fn take(&mut self) -> Option<RegNum> {
        let reg = self.next;
        (reg < self.end).then(|| {
            self.next += 1;
            reg
        })
    }

    fn is_odd(&self) -> bool {
        (self.next - self.first) & 1 == 1
    }
}

/// Running state of the placement of one call's arguments
///
/// A new state is needed for every call. Arguments need to be located in
/// declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallState {
    xlen: usize,
    flen: usize,
    int_regs: ArgRegs,
    float_regs: ArgRegs,
    arg_offset: usize,
    ref_offset: usize,
}

impl CallState {
    /// Create a new state
    ///
    /// Integer arguments are passed in the `int_regs` registers starting at
    /// `first_int`, floating point arguments no wider than `flen` in the
    /// `float_regs` registers starting at `first_float`.
    pub fn new(
        xlen: usize,
        flen: usize,
        (first_int, int_regs): (RegNum, u8),
        (first_float, float_regs): (RegNum, u8),
    ) -> Self {
        let float_regs = if flen == 0 { 0 } else { float_regs };
        Self {
            xlen,
            flen,
            int_regs: ArgRegs::new(first_int, int_regs),
            float_regs: ArgRegs::new(first_float, float_regs),
            arg_offset: 0,
            ref_offset: 0,
        }
    }

    /// Consume the next integer register, for passing a hidden argument
    pub fn reserve_int_register(&mut self) -> Option<RegNum> {
        self.int_regs.take()
    }

    /// Size of the outgoing argument area on the stack
    pub fn arg_area(&self) -> usize {
        self.arg_offset
    }

    /// Size of the area holding values passed by reference
    pub fn ref_area(&self) -> usize {
        self.ref_offset
    }

    /// Determine the location of the next argument
    ///
    /// Unnamed arguments are those matching the ellipsis of a variadic
    /// function.
    pub fn locate(&mut self, ty: &Type, named: bool) -> ArgumentLocation {
        let (length, align) = (ty.size(), ty.align());
        match ty {
            Type::Int { .. } | Type::Pointer { .. } => {
                let length = self.promoted(length);
                self.locate_int(length, length, named)
            }
            Type::Float { .. } => self.locate_float(length, align, named),
            Type::Complex { .. } => self
                .locate_complex(length, named)
                .unwrap_or_else(|| self.locate_int(length, align, named)),
            Type::Struct(s) => self
                .locate_struct(s, named)
                .unwrap_or_else(|| self.locate_int(length, align, named)),
            Type::Aggregate { .. } => self.locate_int(length, align, named),
            Type::Dynamic { .. } => self.locate_ref(length, align),
        }
    }

    /// Length of an integral value after promotion
    pub fn promoted(&self, length: usize) -> usize {
        if length <= self.xlen {
            self.xlen
        } else if length <= 2 * self.xlen {
            2 * self.xlen
        } else {
            length
        }
    }

    fn locate_int(&mut self, length: usize, align: usize, named: bool) -> ArgumentLocation {
        let xlen = self.xlen;
        if length > 2 * xlen {
            return self.locate_ref(length, align);
        }

        let first_len = length.min(xlen);
        let align = align.max(xlen);
        if !named && align == 2 * xlen && self.int_regs.is_odd() {
            self.int_regs.take();
        }

        let first = self
            .int_part(first_len, 0)
            .unwrap_or_else(|| self.stack_part(first_len, align, 0));
        let second = (first_len < length).then(|| {
            let rest = length - first_len;
            self.int_part(rest, xlen)
                .unwrap_or_else(|| self.stack_part(rest, xlen, xlen))
        });
        ArgumentLocation {
            length,
            align,
            first,
            second,
        }
    }

    fn locate_ref(&mut self, length: usize, align: usize) -> ArgumentLocation {
        let xlen = self.xlen;
        self.ref_offset = self.ref_offset.next_multiple_of(align.max(1));
        let first = Part {
            location: Location::Reference(self.ref_offset),
            length,
            offset: 0,
        };
        self.ref_offset += length;
        let pointer = self
            .int_part(xlen, 0)
            .unwrap_or_else(|| self.stack_part(xlen, xlen, 0));
        ArgumentLocation {
            length,
            align,
            first,
            second: Some(pointer),
        }
    }

    fn locate_float(&mut self, length: usize, align: usize, named: bool) -> ArgumentLocation {
        if length > self.flen || !named {
            return self.locate_int(length, align, named);
        }
        match self.float_part(length, 0) {
            Some(part) => ArgumentLocation::single(length, align, part),
            None => self.locate_int(length, align, named),
        }
    }

    fn locate_complex(&mut self, length: usize, named: bool) -> Option<ArgumentLocation> {
        let half = length / 2;
        if length > 2 * self.flen || self.float_regs.available() < 2 || !named {
            return None;
        }
        self.float_pair((0, half), (half, half), length, half)
    }

    /// Structures of up to two scalars may be passed in float registers
    ///
    /// Unnamed structures holding a single float or complex value follow the
    /// integer rules.
    fn locate_struct(&mut self, s: &Struct, named: bool) -> Option<ArgumentLocation> {
        if self.float_regs.available() == 0 {
            return None;
        }
        let (xlen, flen) = (self.xlen, self.flen);
        let fits_float = |ty: &Type| ty.is_float() && ty.size() <= flen;
        let fits_int = |ty: &Type| ty.is_integral() && ty.size() <= xlen;

        match s.flatten().as_slice() {
            [(offset, Type::Complex { size })] => {
                let half = size / 2;
                if !named || *size > 2 * flen || self.float_regs.available() < 2 {
                    return None;
                }
                self.float_pair((*offset, half), (offset + half, half), s.size, s.align)
            }
            [(offset, ty)] if named && fits_float(*ty) => {
                let part = self.float_part(ty.size(), *offset)?;
                Some(ArgumentLocation::single(s.size, s.align, part))
            }
            [(off0, ty0), (off1, ty1)] if fits_float(*ty0) && fits_float(*ty1) => {
                if self.float_regs.available() < 2 {
                    return None;
                }
                self.float_pair((*off0, ty0.size()), (*off1, ty1.size()), s.size, s.align)
            }
            [(off0, ty0), (off1, ty1)]
                if fits_float(*ty0) && fits_int(*ty1) && self.int_regs.available() > 0 =>
            {
                let first = self.float_part(ty0.size(), *off0)?;
                let second = self.int_part(ty1.size(), *off1)?;
                Some(ArgumentLocation {
                    length: s.size,
                    align: s.align,
                    first,
                    second: Some(second),
                })
            }
            [(off0, ty0), (off1, ty1)]
                if fits_int(*ty0) && fits_float(*ty1) && self.int_regs.available() > 0 =>
            {
                let first = self.int_part(ty0.size(), *off0)?;
                let second = self.float_part(ty1.size(), *off1)?;
                Some(ArgumentLocation {
                    length: s.size,
                    align: s.align,
                    first,
                    second: Some(second),
                })
            }
            _ => None,
        }
    }

    fn float_pair(
        &mut self,
        (off0, len0): (usize, usize),
        (off1, len1): (usize, usize),
        length: usize,
        align: usize,
    ) -> Option<ArgumentLocation> {
        let first = self.float_part(len0, off0)?;
        let second = self.float_part(len1, off1)?;
        Some(ArgumentLocation {
            length,
            align,
            first,
            second: Some(second),
        })
    }

    fn int_part(&mut self, length: usize, offset: usize) -> Option<Part> {
        self.int_regs.take().map(|reg| Part {
            location: Location::Register(reg),
            length,
            offset,
        })
    }

    fn float_part(&mut self, length: usize, offset: usize) -> Option<Part> {
        self.float_regs.take().map(|reg| Part {
            location: Location::Register(reg),
            length,
            offset,
        })
    }

    fn stack_part(&mut self, length: usize, align: usize, offset: usize) -> Part {
        let slot = self.arg_offset.next_multiple_of(align.max(1));
        self.arg_offset = slot + length;
        Part {
            location: Location::Stack(slot),
            length,
            offset,
        }
    }
}
