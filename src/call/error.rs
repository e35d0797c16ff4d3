// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use crate::registers;

/// Errors of inferior calls and return value access
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<M, R> {
    /// A value was assigned a location the calling convention cannot use
    InvalidArgumentLocation,
    /// Memory could not be accessed at the given address
    Memory(M, u64),
    /// A register could not be accessed
    Registers(registers::Error<R>),
    /// A value's length does not match its type
    ValueLength { expected: usize, actual: usize },
}

impl<M, R> From<registers::Error<R>> for Error<M, R> {
    fn from(inner: registers::Error<R>) -> Self {
        Self::Registers(inner)
    }
}

impl<M, R> core::error::Error for Error<M, R>
where
    M: fmt::Debug + core::error::Error + 'static,
    R: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Memory(inner, _) => Some(inner),
            Self::Registers(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<M, R> fmt::Display for Error<M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgumentLocation => write!(f, "Invalid argument location"),
            Self::Memory(_, addr) => write!(f, "Cannot access memory at {addr:#0x}"),
            Self::Registers(_) => write!(f, "Cannot access register"),
            Self::ValueLength { expected, actual } => {
                write!(f, "Expected a value of {expected} bytes, got {actual}")
            }
        }
    }
}
