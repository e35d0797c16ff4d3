// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! ELF related utilities

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;

use elf::ElfBytes;
use elf::endian::EndianParse;

use super::{Function, Memory, Symbols, basic, error};

/// Static ELF [`Memory`]
///
/// This [`Memory`] serves the contents of `LOAD` segments found in
/// [`ElfBytes`] based on virtual address mapping. Neither decompression nor
/// dynamic linking are supported. Only the file-backed part of a segment is
/// served and the memory is read-only.
#[derive(Copy, Clone)]
pub struct Elf<'d, E, P>
where
    E: Borrow<ElfBytes<'d, P>>,
    P: EndianParse,
{
    elf: E,
    last_segment: (u64, &'d [u8]),
    phantom: core::marker::PhantomData<P>,
}

impl<'d, E, P> Elf<'d, E, P>
where
    E: Borrow<ElfBytes<'d, P>>,
    P: EndianParse,
{
    /// Create a new ELF [`Memory`]
    pub fn new(elf: E) -> Self {
        Self {
            elf,
            last_segment: (u64::MAX, &[]),
            phantom: Default::default(),
        }
    }

    /// Retrieve the inner [`ElfBytes`]
    pub fn inner(&self) -> &ElfBytes<'d, P> {
        self.elf.borrow()
    }
}

impl<'d, E, P> Memory for Elf<'d, E, P>
where
    E: Borrow<ElfBytes<'d, P>>,
    P: EndianParse,
{
    type Error = Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        // Iterator over all relevant segments' offset and data
        let segments = self
            .elf
            .borrow()
            .segments()
            .into_iter()
            .flat_map(|s| s.iter())
            .filter(|s| s.p_type == elf::abi::PT_LOAD)
            .map(|s| {
                self.elf
                    .borrow()
                    .segment_data(&s)
                    .map(|d| (s.p_vaddr, d))
                    .map_err(Error::CouldNotRetrieveData)
            });

        // Find the relevant data, starting with the last segment used since
        // that's most likely to be the relevant one.
        let (data, segment) = core::iter::once(Ok(self.last_segment))
            .chain(segments)
            .map(|s| {
                let (base, data) = s?;
                let Some(offset) = address.checked_sub(base) else {
                    return Ok(None);
                };
                let start: usize = offset.try_into().map_err(Error::ExceededHostUSize)?;
                let res = start
                    .checked_add(buf.len())
                    .and_then(|end| data.get(start..end))
                    .map(|d| (d, (base, data)));
                Ok(res)
            })
            .find_map(Result::transpose)
            .ok_or(Error::NoSegmentFound)??;

        self.last_segment = segment;
        buf.copy_from_slice(data);
        Ok(())
    }

    fn write_memory(&mut self, address: u64, _data: &[u8]) -> Result<(), Self::Error> {
        Err(Error::ReadOnly(address))
    }
}

/// ELF function symbols
///
/// [`Symbols`] built from the `FUNC` symbols of an ELF file's static and
/// dynamic symbol tables. Symbols without a size extend up to the next symbol.
#[derive(Clone, Debug, Default)]
pub struct ElfSymbols {
    table: basic::SymbolTable<Vec<(u64, u64, String)>, String>,
}

impl ElfSymbols {
    /// Collect the function symbols of the given ELF file
    pub fn new<P: EndianParse>(elf: &ElfBytes<'_, P>) -> Result<Self, Error> {
        let mut functions = Vec::new();

        let tables = [
            elf.symbol_table().map_err(Error::CouldNotRetrieveData)?,
            elf.dynamic_symbol_table()
                .map_err(Error::CouldNotRetrieveData)?,
        ];
        for (symbols, strings) in tables.into_iter().flatten() {
            for symbol in symbols.iter() {
                if symbol.st_symtype() != elf::abi::STT_FUNC || symbol.is_undefined() {
                    continue;
                }
                let name = strings
                    .get(symbol.st_name as usize)
                    .map_err(Error::CouldNotRetrieveData)?;
                let end = symbol.st_value.saturating_add(symbol.st_size);
                functions.push((symbol.st_value, end, name.to_string()));
            }
        }

        functions.sort_unstable_by_key(|(s, _, _)| *s);
        functions.dedup_by_key(|(s, _, _)| *s);
        let starts: Vec<_> = functions.iter().map(|(s, _, _)| *s).collect();
        for (n, (start, end, _)) in functions.iter_mut().enumerate() {
            if *end == *start {
                *end = starts.get(n + 1).copied().unwrap_or(*start + 1);
            }
        }

        Ok(Self {
            table: basic::from_functions(functions),
        })
    }
}

impl Symbols for ElfSymbols {
    fn find_function(&mut self, address: u64) -> Option<Function> {
        self.table.find_function(address)
    }
}

/// ELF specific error type
#[derive(Debug)]
pub enum Error {
    /// No segment was found containing the address range
    NoSegmentFound,
    /// The data for a segment could not be retrieved
    CouldNotRetrieveData(elf::parse::ParseError),
    /// Could not use an address or offset because it is too big for the host
    ExceededHostUSize(core::num::TryFromIntError),
    /// An attempt was made to write to the given address
    ReadOnly(u64),
}

impl error::Miss for Error {
    fn miss(_: u64) -> Self {
        Self::NoSegmentFound
    }
}

impl error::MaybeMiss for Error {
    fn is_miss(&self) -> bool {
        matches!(self, Self::NoSegmentFound | Self::ReadOnly(_))
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::CouldNotRetrieveData(e) => Some(e),
            Self::ExceededHostUSize(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSegmentFound => write!(f, "Could not find segment for address"),
            Self::CouldNotRetrieveData(_) => write!(f, "Could not retrieve data for segment"),
            Self::ExceededHostUSize(_) => write!(f, "Segment offset exceeds host usize"),
            Self::ReadOnly(addr) => write!(f, "Cannot write ELF image at {addr:#x}"),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NoSegmentFound, Self::NoSegmentFound) => true,
            (Self::CouldNotRetrieveData(_), Self::CouldNotRetrieveData(_)) => true,
            (Self::ExceededHostUSize(l), Self::ExceededHostUSize(r)) => l == r,
            (Self::ReadOnly(l), Self::ReadOnly(r)) => l == r,
            _ => false,
        }
    }
}
