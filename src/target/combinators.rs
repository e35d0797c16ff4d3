// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Combination of multiple [`Memory`]s

use core::borrow::BorrowMut;

use super::Memory;
use super::error::{MaybeMiss, Miss};

/// Set of [`Memory`]s acting as a single [`Memory`]
///
/// Accesses are forwarded to the first [`Memory`] not reporting a miss. The
/// [`Memory`] that served the last access is consulted first.
#[derive(Copy, Clone, Default, Debug)]
pub struct Multi<C: BorrowMut<[M]>, M> {
    mems: C,
    last: usize,
    phantom: core::marker::PhantomData<M>,
}

impl<C: BorrowMut<[M]>, M> Multi<C, M> {
    /// Create a new [`Memory`] combining all `mems`
    pub fn new(mems: C) -> Self {
        Self {
            mems,
            last: 0,
            phantom: Default::default(),
        }
    }

    /// Forward an access to the [`Memory`] covering it
    fn dispatch<E: Miss>(
        &mut self,
        address: u64,
        mut access: impl FnMut(&mut M) -> Result<(), E>,
    ) -> Result<(), E> {
        let mems = self.mems.borrow_mut();
        let res = mems
            .get_mut(self.last)
            .map(&mut access)
            .filter(|r| !r.is_miss());
        if let Some(res) = res {
            return res;
        }

        let res = mems
            .iter_mut()
            .enumerate()
            .filter(|(n, _)| *n != self.last)
            .map(|(n, m)| (n, access(m)))
            .find(|(_, r)| !r.is_miss());
        if let Some((current, res)) = res {
            self.last = current;
            res
        } else {
            Miss::miss(address)
        }
    }
}

impl<C: BorrowMut<[M]>, M> From<C> for Multi<C, M> {
    fn from(mems: C) -> Self {
        Self::new(mems)
    }
}

impl<C: BorrowMut<[M]> + FromIterator<M>, M> FromIterator<M> for Multi<C, M> {
    fn from_iter<T: IntoIterator<Item = M>>(iter: T) -> Self {
        C::from_iter(iter).into()
    }
}

impl<C: BorrowMut<[M]> + Extend<M>, M> Extend<M> for Multi<C, M> {
    fn extend<T: IntoIterator<Item = M>>(&mut self, iter: T) {
        self.mems.extend(iter)
    }
}

impl<C, M> Memory for Multi<C, M>
where
    C: BorrowMut<[M]>,
    M: Memory,
    M::Error: Miss,
{
    type Error = M::Error;

    fn read_memory(&mut self, address: u64, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.dispatch(address, |m| m.read_memory(address, buf))
    }

    fn write_memory(&mut self, address: u64, data: &[u8]) -> Result<(), Self::Error> {
        self.dispatch(address, |m| m.write_memory(address, data))
    }
}
