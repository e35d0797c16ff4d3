// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Target access related error types and traits

use alloc::boxed::Box;
use core::fmt;

/// Error types that can report an unmapped address
///
/// Combinators such as [`Option`] or [`Offset`][super::Offset] need to fail
/// accesses they cannot forward.
pub trait Miss: MaybeMiss {
    /// Report that nothing is mapped at `address`
    fn miss(address: u64) -> Self;
}

impl<T, E: Miss> Miss for Result<T, E> {
    fn miss(address: u64) -> Self {
        Err(<E as Miss>::miss(address))
    }
}

impl Miss for Box<dyn MaybeMissError> {
    fn miss(address: u64) -> Self {
        Box::new(Unmapped(address))
    }
}

/// Distinguishes unmapped addresses from other access failures
///
/// Target memory is usually assembled from pieces: the program image, a
/// stack buffer, a debug probe. Only an unmapped address lets a combinator
/// try the next piece.
pub trait MaybeMiss {
    /// Whether the access failed because the address is not mapped
    fn is_miss(&self) -> bool;
}

impl<T, E: MaybeMiss> MaybeMiss for Result<T, E> {
    fn is_miss(&self) -> bool {
        match self {
            Ok(_) => false,
            Err(e) => e.is_miss(),
        }
    }
}

impl<E: MaybeMiss + ?Sized> MaybeMiss for Box<E> {
    fn is_miss(&self) -> bool {
        E::is_miss(self.as_ref())
    }
}

#[cfg(feature = "either")]
impl<L: MaybeMiss, R: MaybeMiss> MaybeMiss for either::Either<L, R> {
    fn is_miss(&self) -> bool {
        either::for_both!(self, e => e.is_miss())
    }
}

/// Error type of [boxed][super::Memory::boxed] memories
pub trait MaybeMissError: MaybeMiss + core::error::Error + Sync + Send {}

impl<T: MaybeMiss + core::error::Error + Sync + Send + ?Sized> MaybeMissError for T {}

/// Access errors of [`Segment`][super::basic::Segment]s
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// The access is not contained in the segment
    AddressNotCovered,
    /// An offset into the segment does not fit a `usize`
    ExceededHostUSize(core::num::TryFromIntError),
    /// Write to an immutable segment
    ReadOnly,
}

impl Miss for SegmentError {
    fn miss(_: u64) -> Self {
        Self::AddressNotCovered
    }
}

impl MaybeMiss for SegmentError {
    fn is_miss(&self) -> bool {
        matches!(self, Self::AddressNotCovered)
    }
}

impl core::error::Error for SegmentError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::ExceededHostUSize(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressNotCovered => write!(f, "Access outside of segment"),
            Self::ExceededHostUSize(_) => write!(f, "Segment offset exceeds host usize"),
            Self::ReadOnly => write!(f, "Memory is read-only"),
        }
    }
}

/// Nothing is mapped at the contained address
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Unmapped(pub u64);

impl Miss for Unmapped {
    fn miss(address: u64) -> Self {
        Unmapped(address)
    }
}

impl MaybeMiss for Unmapped {
    fn is_miss(&self) -> bool {
        true
    }
}

impl core::error::Error for Unmapped {}

impl fmt::Display for Unmapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No memory mapped at {:#x}", self.0)
    }
}
