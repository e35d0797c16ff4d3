// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Description of values passed to and returned from functions

use alloc::vec::Vec;

/// Type of an argument or return value
///
/// Sizes and alignments are given in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// Integral scalar: integers, booleans, characters and enumerations
    Int { size: usize, signed: bool },
    /// Data or code pointer
    Pointer { size: usize },
    /// Floating point scalar
    Float { size: usize },
    /// Complex floating point value consisting of two halves of equal size
    Complex { size: usize },
    /// Structure with the given fields
    Struct(Struct),
    /// Any other aggregate, e.g. an array or a union
    Aggregate { size: usize, align: usize },
    /// Value whose size is only known at run time
    Dynamic { size: usize, align: usize },
}

impl Type {
    /// Signed integer of the given size
    pub const fn signed(size: usize) -> Self {
        Self::Int { size, signed: true }
    }

    /// Unsigned integer of the given size
    pub const fn unsigned(size: usize) -> Self {
        Self::Int {
            size,
            signed: false,
        }
    }

    /// Size of a value of this type
    pub fn size(&self) -> usize {
        match self {
            Self::Int { size, .. }
            | Self::Pointer { size }
            | Self::Float { size }
            | Self::Complex { size }
            | Self::Aggregate { size, .. }
            | Self::Dynamic { size, .. } => *size,
            Self::Struct(s) => s.size,
        }
    }

    /// Alignment of a value of this type
    pub fn align(&self) -> usize {
        let align = match self {
            Self::Int { size, .. } | Self::Pointer { size } | Self::Float { size } => *size,
            Self::Complex { size } => size / 2,
            Self::Struct(s) => s.align,
            Self::Aggregate { align, .. } | Self::Dynamic { align, .. } => *align,
        };
        align.max(1)
    }

    /// Whether this type is an integral scalar
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Int { .. })
    }

    /// Whether this type is a floating point scalar
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float { .. })
    }
}

impl From<Struct> for Type {
    fn from(s: Struct) -> Self {
        Self::Struct(s)
    }
}

/// Structure type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Struct {
    pub size: usize,
    pub align: usize,
    pub fields: Vec<Field>,
}

impl Struct {
    /// Create a structure with the given fields laid out like a C compiler
    ///
    /// Every field is placed at the next offset matching its alignment. The
    /// size is padded to a multiple of the largest alignment.
    pub fn new(fields: impl IntoIterator<Item = Type>) -> Self {
        let mut offset = 0usize;
        let mut align = 1usize;
        let fields = fields
            .into_iter()
            .map(|ty| {
                let field_align = ty.align();
                align = align.max(field_align);
                let field = Field {
                    offset: offset.next_multiple_of(field_align),
                    ty,
                };
                offset = field.offset + field.ty.size();
                field
            })
            .collect();
        Self {
            size: offset.next_multiple_of(align),
            align,
            fields,
        }
    }

    /// Collect the scalar leaves of this structure
    ///
    /// Nested structures are descended into. Leaves are returned with their
    /// offsets relative to the start of this structure. The collection stops
    /// after the third leaf: only up to two leaves are relevant for argument
    /// placement, a third one merely indicates that there are too many.
    pub fn flatten(&self) -> Vec<(usize, &Type)> {
        let mut leaves = Vec::with_capacity(3);
        self.collect(0, &mut leaves);
        leaves
    }

    fn collect<'a>(&'a self, base: usize, leaves: &mut Vec<(usize, &'a Type)>) {
        for field in &self.fields {
            if leaves.len() > 2 {
                return;
            }
            let offset = base + field.offset;
            match &field.ty {
                Type::Struct(inner) => inner.collect(offset, leaves),
                ty => leaves.push((offset, ty)),
            }
        }
    }
}

/// Member of a [`Struct`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Offset of the field from the start of the structure
    pub offset: usize,
    pub ty: Type,
}
