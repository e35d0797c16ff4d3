// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use crate::registers::{self, RegNum};

/// Unwinding specific errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<M, R> {
    /// We could not read a saved register at the given address
    Memory(M, u64),
    /// We could not read a register of the innermost frame
    Registers(registers::Error<R>),
    /// The frame at the given level exceeds the configured maximum depth
    DepthLimit(usize),
    /// The frame at the given level lies beyond the outermost frame
    NoFrame(usize),
    /// The caller's value of the requested register is not known
    Unavailable(RegNum),
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
            Self::Memory(_, addr) => write!(f, "Cannot read saved register at {addr:#0x}"),
            Self::Registers(_) => write!(f, "Cannot read register"),
            Self::DepthLimit(level) => write!(f, "Frame {level} exceeds the maximum depth"),
            Self::NoFrame(level) => write!(f, "Frame {level} is beyond the outermost frame"),
            Self::Unavailable(reg) => write!(f, "Register {reg} is not available in the caller"),
        }
    }
}
