// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! The implicit per-thread tower used by host bindings.
//!
//! Each thread owns one [`Tower`]. It is created on first use from
//! [`TowerConfig::load`]; a configuration that fails to load or validate is
//! logged and replaced by the defaults. Calls must not nest: the closure
//! passed to [`with_tower`] may not itself call into this module.

use crate::context::Flags;
use crate::dispatch::Tower;
use crate::errors::TowerResult;
use mpt_backend::RoundingMode;
use mpt_config::{TowerConfig, Traps};
use std::cell::RefCell;
use tracing::{debug, info, warn};

thread_local! {
    /// `None` until the first call on this thread.
    static TOWER: RefCell<Option<Tower>> = const { RefCell::new(None) };
}

fn activate() -> Tower {
    let config = match TowerConfig::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not load tower configuration, using defaults");
            return Tower::new();
        }
    };
    match Tower::from_config(&config) {
        Ok(tower) => {
            info!(
                precision = config.precision,
                rounding = %config.rounding,
                cache_size = config.cache_size,
                "activated thread tower"
            );
            tower
        }
        Err(err) => {
            warn!(error = %err, "invalid tower configuration, using defaults");
            Tower::new()
        }
    }
}

/// Runs `f` with this thread's tower, activating it first if needed.
pub fn with_tower<R>(f: impl FnOnce(&mut Tower) -> R) -> R {
    TOWER.with(|cell| {
        let mut slot = cell.borrow_mut();
        f(slot.get_or_insert_with(activate))
    })
}

/// Whether this thread's tower has been activated.
pub fn is_active() -> bool {
    TOWER.with(|cell| cell.borrow().is_some())
}

/// Installs `tower` for this thread and returns the previous one.
pub fn replace(tower: Tower) -> Option<Tower> {
    debug!("replaced thread tower");
    TOWER.with(|cell| cell.borrow_mut().replace(tower))
}

/// Drops this thread's tower; the next call activates a fresh one.
pub fn reset() {
    debug!("reset thread tower");
    TOWER.with(|cell| cell.borrow_mut().take());
}

pub fn precision() -> u32 {
    with_tower(|t| t.context().precision())
}

pub fn set_precision(precision: u32) -> TowerResult<()> {
    with_tower(|t| t.context_mut().set_precision(precision))
}

pub fn min_precision() -> u32 {
    with_tower(|t| t.context().min_precision())
}

pub fn set_min_precision(min_precision: u32) -> TowerResult<()> {
    with_tower(|t| t.context_mut().set_min_precision(min_precision))
}

pub fn rounding() -> RoundingMode {
    with_tower(|t| t.context().rounding())
}

pub fn set_rounding(rounding: RoundingMode) {
    with_tower(|t| t.context_mut().set_rounding(rounding))
}

/// `(emin, emax)`
pub fn exponent_range() -> (i64, i64) {
    with_tower(|t| t.context().exponent_range())
}

pub fn set_exponent_range(emin: i64, emax: i64) -> TowerResult<()> {
    with_tower(|t| t.context_mut().set_exponent_range(emin, emax))
}

pub fn traps() -> Traps {
    with_tower(|t| t.context().traps())
}

pub fn set_traps(traps: Traps) {
    with_tower(|t| t.context_mut().set_traps(traps))
}

pub fn allow_complex() -> bool {
    with_tower(|t| t.context().allow_complex())
}

pub fn set_allow_complex(allow_complex: bool) {
    with_tower(|t| t.context_mut().set_allow_complex(allow_complex))
}

pub fn flags() -> Flags {
    with_tower(|t| t.context().flags())
}

pub fn clear_flags() {
    with_tower(|t| t.context_mut().clear_flags())
}

pub fn cache_size() -> usize {
    with_tower(|t| t.cache().cache_size())
}

pub fn set_cache_size(cache_size: usize) -> TowerResult<()> {
    with_tower(|t| t.cache_mut().set_cache_size(cache_size))
}

pub fn max_cached_limbs() -> usize {
    with_tower(|t| t.cache().max_cached_limbs())
}

pub fn set_max_cached_limbs(max_cached_limbs: usize) -> TowerResult<()> {
    with_tower(|t| t.cache_mut().set_max_cached_limbs(max_cached_limbs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::errors::ErrorKind;
    use std::thread;

    #[test]
    fn test_first_use_activates() {
        reset();
        assert!(!is_active());
        let precision = precision();
        assert!(is_active());
        assert!(precision >= min_precision());
    }

    #[test]
    fn test_setters_persist_and_validate() {
        replace(Tower::new());
        set_precision(113).unwrap();
        assert_eq!(precision(), 113);
        assert_eq!(set_precision(1).unwrap_err().kind(), ErrorKind::ValueError);
        assert_eq!(precision(), 113);

        set_rounding(RoundingMode::TowardZero);
        assert_eq!(rounding(), RoundingMode::TowardZero);
        set_exponent_range(-100, 100).unwrap();
        assert_eq!(exponent_range(), (-100, 100));
        assert!(set_exponent_range(10, 100).is_err());

        set_cache_size(10).unwrap();
        assert_eq!(cache_size(), 10);
        assert!(set_cache_size(1001).is_err());
        assert!(set_max_cached_limbs(16385).is_err());

        reset();
        replace(Tower::new());
        assert_eq!(precision(), 53);
    }

    #[test]
    fn test_flags_accumulate_until_cleared() {
        replace(Tower::new());
        let sum = with_tower(|t| t.add(&0.1f64, &0.2f64)).unwrap();
        assert!(sum.as_float().is_some());
        assert!(flags().inexact);
        with_tower(|t| t.add(&1i64, &2i64)).unwrap();
        assert!(flags().inexact);
        clear_flags();
        assert!(flags().is_clear());
    }

    #[test]
    fn test_threads_are_isolated() {
        let mut context = Context::new();
        context.set_precision(64).unwrap();
        replace(Tower::with_context(context));
        let other = thread::spawn(|| {
            replace(Tower::new());
            set_precision(200).unwrap();
            precision()
        })
        .join()
        .unwrap();
        assert_eq!(other, 200);
        assert_eq!(precision(), 64);
    }
}
