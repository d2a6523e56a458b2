// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Bounded free lists that recycle integer and rational storage.
//!
//! A checked-out cell is an [`Uninit`] handle: it owns allocated storage
//! whose contents are meaningless, and the only way to turn it into a value
//! is one of its `write` methods.

use crate::errors::{TowerError, TowerResult};
use crate::value::{BoxedValue, Integer, Rational};
use mpt_config::{
    validate_cache_size, validate_max_cached_limbs, DEFAULT_CACHE_SIZE, DEFAULT_MAX_CACHED_LIMBS,
};
use num::BigRational;
use num_bigint::BigInt;
use std::marker::PhantomData;
use strum::Display;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CacheKind {
    Integer,
    Rational,
}

/// Value kinds whose storage the cache recycles.
pub trait Cached: Sized {
    type Storage: Default;
    const KIND: CacheKind;
}

impl Cached for Integer {
    type Storage = BigInt;
    const KIND: CacheKind = CacheKind::Integer;
}

impl Cached for Rational {
    type Storage = (BigInt, BigInt);
    const KIND: CacheKind = CacheKind::Rational;
}

/// Allocated but logically undefined storage for a `T`.
#[derive(Debug)]
pub struct Uninit<T: Cached> {
    storage: T::Storage,
    _kind: PhantomData<T>,
}

impl<T: Cached> Uninit<T> {
    fn new(storage: T::Storage) -> Self {
        Self {
            storage,
            _kind: PhantomData,
        }
    }
}

impl Uninit<Integer> {
    /// Initializes the cell with a copy of `value`, reusing its allocation.
    pub fn write(self, value: &BigInt) -> Integer {
        let mut storage = self.storage;
        storage.clone_from(value);
        Integer::new(storage)
    }
}

impl Uninit<Rational> {
    /// Initializes the cell with `num / den`, canonicalized.
    pub fn write(self, num: &BigInt, den: &BigInt) -> TowerResult<Rational> {
        let (mut n, mut d) = self.storage;
        n.clone_from(num);
        d.clone_from(den);
        Rational::new(n, d)
    }

    /// Initializes the cell with an already canonical ratio.
    pub fn write_ratio(self, value: &BigRational) -> Rational {
        let (mut n, mut d) = self.storage;
        n.clone_from(value.numer());
        d.clone_from(value.denom());
        Rational::from_big_rational(BigRational::new_raw(n, d))
    }
}

/// Number of 64-bit limbs a magnitude occupies.
fn limbs(value: &BigInt) -> usize {
    value.bits().div_ceil(64) as usize
}

/// Per-kind free lists bounded by `cache_size` entries and
/// `max_cached_limbs` limbs per entry.
#[derive(Debug)]
pub struct ValueCache {
    integers: Vec<BigInt>,
    rationals: Vec<(BigInt, BigInt)>,
    cache_size: usize,
    max_cached_limbs: usize,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE, DEFAULT_MAX_CACHED_LIMBS)
    }
}

impl ValueCache {
    pub fn new(cache_size: usize, max_cached_limbs: usize) -> Self {
        Self {
            integers: Vec::with_capacity(cache_size),
            rationals: Vec::with_capacity(cache_size),
            cache_size,
            max_cached_limbs,
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn max_cached_limbs(&self) -> usize {
        self.max_cached_limbs
    }

    /// Entries currently held for `kind`.
    pub fn len(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::Integer => self.integers.len(),
            CacheKind::Rational => self.rationals.len(),
        }
    }

    pub fn is_empty(&self, kind: CacheKind) -> bool {
        self.len(kind) == 0
    }

    /// Shrinking truncates both free lists.
    pub fn set_cache_size(&mut self, cache_size: usize) -> TowerResult<()> {
        validate_cache_size(cache_size).map_err(|err| TowerError::value(err.to_string()))?;
        debug!(cache_size, "set cache size");
        self.cache_size = cache_size;
        self.integers.truncate(cache_size);
        self.rationals.truncate(cache_size);
        Ok(())
    }

    /// Entries above the new ceiling are dropped.
    pub fn set_max_cached_limbs(&mut self, max_cached_limbs: usize) -> TowerResult<()> {
        validate_max_cached_limbs(max_cached_limbs)
            .map_err(|err| TowerError::value(err.to_string()))?;
        debug!(max_cached_limbs, "set cached limb ceiling");
        self.max_cached_limbs = max_cached_limbs;
        self.integers.retain(|v| limbs(v) <= max_cached_limbs);
        self.rationals
            .retain(|(n, d)| limbs(n) <= max_cached_limbs && limbs(d) <= max_cached_limbs);
        Ok(())
    }

    pub fn checkout_integer(&mut self) -> Uninit<Integer> {
        Uninit::new(self.integers.pop().unwrap_or_default())
    }

    pub fn checkout_rational(&mut self) -> Uninit<Rational> {
        Uninit::new(self.rationals.pop().unwrap_or_default())
    }

    /// Offers an integer's storage back; returns whether it was kept.
    pub fn checkin_integer(&mut self, value: Integer) -> bool {
        let storage = value.into_inner();
        if self.integers.len() >= self.cache_size {
            trace!(kind = %CacheKind::Integer, "cache full, discarding");
            return false;
        }
        if limbs(&storage) > self.max_cached_limbs {
            trace!(kind = %CacheKind::Integer, limbs = limbs(&storage), "oversized, discarding");
            return false;
        }
        self.integers.push(storage);
        true
    }

    /// Offers a rational's storage back; returns whether it was kept.
    pub fn checkin_rational(&mut self, value: Rational) -> bool {
        let (num, den) = value.into_big_rational().into_raw();
        if self.rationals.len() >= self.cache_size {
            trace!(kind = %CacheKind::Rational, "cache full, discarding");
            return false;
        }
        let size = limbs(&num).max(limbs(&den));
        if size > self.max_cached_limbs {
            trace!(kind = %CacheKind::Rational, limbs = size, "oversized, discarding");
            return false;
        }
        self.rationals.push((num, den));
        true
    }

    /// Returns the storage of a value the host no longer references.
    pub fn recycle(&mut self, value: BoxedValue) {
        match value {
            BoxedValue::Integer(v) => {
                self.checkin_integer(v);
            }
            BoxedValue::Rational(v) => {
                self.checkin_rational(v);
            }
            BoxedValue::Float(_) | BoxedValue::Complex(_) => {}
        }
    }
}
