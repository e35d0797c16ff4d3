// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

/// Scanning specific errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// We could not fetch the instruction at the given address
    Memory(E, u64),
}

impl<E> core::error::Error for Error<E>
where
    E: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Memory(inner, _) => Some(inner),
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(_, addr) => write!(f, "Cannot fetch the instruction at {addr:#0x}"),
        }
    }
}
