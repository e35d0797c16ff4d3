// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! [`Memory`] with type-erased errors

use alloc::boxed::Box;

use super::error::MaybeMissError;

/// Boxed, dynamically dispatched [`Memory`][super::Memory]
pub type Memory<'a> = Box<dyn super::Memory<Error = Box<dyn MaybeMissError>> + 'a>;

/// [`Memory`][super::Memory] returning a boxed, dynamically dispatched `Error`
///
/// This adapter boxes and type-erases errors returned by the wrapped memory.
/// This allows dynamically dispatching memories with different error types.
#[derive(Copy, Clone, Debug)]
pub struct BoxedError<M> {
    inner: M,
}

impl<M> BoxedError<M> {
    /// Create a new [`Memory`][super::Memory] wrapping another one
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> From<M> for BoxedError<M> {
    fn from(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> super::Memory for BoxedError<M>
where
    M: super::Memory,
    M::Error: MaybeMissError + 'static,
{
    type Error = Box<dyn MaybeMissError>;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.inner
            .read_memory(address, buf)
            .map_err(|e| -> Box<dyn MaybeMissError> { Box::new(e) })
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        self.inner
            .write_memory(address, data)
            .map_err(|e| -> Box<dyn MaybeMissError> { Box::new(e) })
    }
}
