// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Basic [`Memory`]s, [`Symbols`] and adapters

use alloc::string::ToString;

use super::error;
use super::{Function, Memory, Symbols};

/// [`Memory`] adapter for an [`FnMut`]
///
/// This forwards reads to the wrapped [`FnMut`]. Writes always result in a
/// [miss][error::Miss].
#[derive(Copy, Clone, Default, Debug)]
pub struct Func<F: FnMut(u64, &mut [u8]) -> Result<(), E>, E> {
    func: F,
    phantom: core::marker::PhantomData<E>,
}

impl<F: FnMut(u64, &mut [u8]) -> Result<(), E>, E> Func<F, E> {
    /// Create a new [`Memory`] from an [`FnMut`]
    fn new(func: F) -> Self {
        Self {
            func,
            phantom: Default::default(),
        }
    }
}

impl<F, E> Memory for Func<F, E>
where
    F: FnMut(u64, &mut [u8]) -> Result<(), E>,
    E: error::Miss,
{
    type Error = E;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        (self.func)(address, buf)
    }

    fn write_memory(&mut self, address: u64, _data: &[u8]) -> Result<(), Self::Error> {
        Err(E::miss(address))
    }
}

/// Create a read-only [`Func`] [`Memory`] from an [`FnMut`]
pub fn from_fn<F: FnMut(u64, &mut [u8]) -> Result<(), E>, E>(func: F) -> Func<F, E> {
    Func::new(func)
}

/// Read-only [`Memory`] consisting of a single segment
///
/// This [`Memory`] serves a single buffer starting from address `0`. Accesses
/// need to be covered by the buffer completely.
///
/// # Example
///
/// The following example builds a segment at a specific offset:
///
/// ```
/// use riscv_debug_arch::target::{self, Memory};
///
/// let bootrom = b"\x97\x02\x00\x00\x67\x80\x02\x00";
/// let mut bootrom = target::from_segment(bootrom).with_offset(0x1000);
///
/// let mut buf = [0u8; 4];
/// assert_eq!(bootrom.read_memory(0x1004, &mut buf), Ok(()));
/// assert_eq!(buf, [0x67, 0x80, 0x02, 0x00]);
/// assert!(bootrom.read_memory(0x1006, &mut buf).is_err());
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Segment<T: AsRef<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]>> Segment<T> {
    /// Create a new read-only [`Memory`] serving the given data
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: AsRef<[u8]>> Memory for Segment<T> {
    type Error = error::SegmentError;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        let range = covered(address, buf.len(), self.data.as_ref().len())?;
        buf.copy_from_slice(&self.data.as_ref()[range]);
        Ok(())
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        covered(address, data.len(), self.data.as_ref().len())?;
        Err(Self::Error::ReadOnly)
    }
}

/// Create a read-only [`Segment`] [`Memory`] from some `AsRef<[u8]>`
pub fn from_segment<T: AsRef<[u8]>>(data: T) -> Segment<T> {
    Segment::new(data)
}

/// Writable [`Memory`] consisting of a single segment
///
/// Like a [`Segment`], but allows writing, e.g. for stack areas used by
/// inferior calls.
#[derive(Copy, Clone, Debug)]
pub struct SegmentMut<T: AsRef<[u8]> + AsMut<[u8]>> {
    data: T,
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> SegmentMut<T> {
    /// Create a new writable [`Memory`] serving the given data
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Retrieve the backing data
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Memory for SegmentMut<T> {
    type Error = error::SegmentError;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        let range = covered(address, buf.len(), self.data.as_ref().len())?;
        buf.copy_from_slice(&self.data.as_ref()[range]);
        Ok(())
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        let range = covered(address, data.len(), self.data.as_ref().len())?;
        self.data.as_mut()[range].copy_from_slice(data);
        Ok(())
    }
}

/// Create a writable [`SegmentMut`] [`Memory`] from some `AsMut<[u8]>`
pub fn from_segment_mut<T: AsRef<[u8]> + AsMut<[u8]>>(data: T) -> SegmentMut<T> {
    SegmentMut::new(data)
}

/// Determine the range of an access of `len` bytes at `address` within a
/// segment of `size` bytes
fn covered(
    address: u64,
    len: usize,
    size: usize,
) -> Result<core::ops::Range<usize>, error::SegmentError> {
    let start: usize = address
        .try_into()
        .map_err(error::SegmentError::ExceededHostUSize)?;
    start
        .checked_add(len)
        .filter(|end| *end <= size)
        .map(|end| start..end)
        .ok_or(error::SegmentError::AddressNotCovered)
}

/// A [`Memory`] that does not cover any address
#[derive(Copy, Clone, Default, Debug)]
pub struct Empty;

impl Memory for Empty {
    type Error = error::Unmapped;

    fn read_memory(&mut self, address: u64, _buf: &mut [u8]) -> Result<(), Self::Error> {
        Err(error::Unmapped(address))
    }

    fn write_memory(&mut self, address: u64, _data: &[u8]) -> Result<(), Self::Error> {
        Err(error::Unmapped(address))
    }
}

/// [`Symbols`] defined by a set of functions
///
/// This [`Symbols`] is backed by a slice of `(start, end, name)` triples
/// sorted by start address. It is meant for small programs and tests.
#[derive(Copy, Clone, Default, Debug)]
pub struct SymbolTable<T, N>
where
    T: AsRef<[(u64, u64, N)]>,
    N: AsRef<str>,
{
    inner: T,
    phantom: core::marker::PhantomData<N>,
}

impl<T, N> SymbolTable<T, N>
where
    T: AsRef<[(u64, u64, N)]>,
    N: AsRef<str>,
{
    /// Create new [`Symbols`] from a container holding a sorted slice
    ///
    /// Returns [`None`] if the slice is not sorted by start address.
    pub fn from_sorted(inner: T) -> Option<Self> {
        inner
            .as_ref()
            .is_sorted_by_key(|(s, _, _)| *s)
            .then_some(Self {
                inner,
                phantom: Default::default(),
            })
    }
}

impl<T, N> Symbols for SymbolTable<T, N>
where
    T: AsRef<[(u64, u64, N)]>,
    N: AsRef<str>,
{
    fn find_function(&mut self, address: u64) -> Option<Function> {
        let map = self.inner.as_ref();
        let index = map.partition_point(|(s, _, _)| *s <= address);
        map[..index]
            .iter()
            .rev()
            .find(|(s, e, _)| (*s..*e).contains(&address))
            .map(|(start, end, name)| Function {
                start: *start,
                end: *end,
                name: Some(name.as_ref().to_string()),
            })
    }
}

/// Create [`SymbolTable`] [`Symbols`] from `(start, end, name)` triples
pub fn from_functions<T, N>(mut inner: T) -> SymbolTable<T, N>
where
    T: AsRef<[(u64, u64, N)]> + AsMut<[(u64, u64, N)]>,
    N: AsRef<str>,
{
    inner.as_mut().sort_unstable_by_key(|(s, _, _)| *s);
    SymbolTable {
        inner,
        phantom: Default::default(),
    }
}

/// [`Symbols`] not knowing any function
#[derive(Copy, Clone, Default, Debug)]
pub struct NoSymbols;

impl Symbols for NoSymbols {
    fn find_function(&mut self, _: u64) -> Option<Function> {
        None
    }
}
