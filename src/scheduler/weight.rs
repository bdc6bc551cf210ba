//! Weight and timeslice calculation
//!
//! A foreground task's weight is the inverse of its share of the run queue's
//! recent page writes, in tenths:
//!
//! ```text
//! total'  = total - old_wcounts + wcounts
//! bucket  = ceil(total' / 10)
//! share   = wcounts / bucket          (0..=10)
//! weight  = 10 - share, or 1 when share == 10
//! slice   = base_timeslice * weight
//! ```
//!
//! A task with no writes keeps the maximum weight. Background tasks bypass
//! all of this and get the fixed background slice.

use crate::config::RasConfig;

use super::classify::TaskClass;
use super::types::{RAS_MAX_WEIGHT, RAS_MIN_WEIGHT};

/// Outcome of one weight computation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceUpdate {
    /// `None` for background tasks, whose weight is left untouched
    pub weight: Option<u32>,
    pub time_slice: u32,
    /// New snapshot of the task's write count (unchanged for background tasks)
    pub old_wcounts: u64,
    /// New run queue aggregate
    pub total_wcounts: u64,
}

/// Swap a task's previous write-count snapshot for its current count in the
/// run queue aggregate.
#[inline]
pub fn rebalance_total(total_wcounts: u64, old_wcounts: u64, wcounts: u64) -> u64 {
    total_wcounts.saturating_sub(old_wcounts).saturating_add(wcounts)
}

/// Weight for a task contributing `wcounts` out of `total_wcounts` writes.
///
/// `total_wcounts` must already include `wcounts`.
pub fn calc_weight(wcounts: u64, total_wcounts: u64) -> u32 {
    if wcounts == 0 {
        return RAS_MAX_WEIGHT;
    }

    // total >= wcounts > 0 keeps the bucket non-zero; max() guards callers
    // that break that precondition
    let bucket = total_wcounts.max(wcounts).div_ceil(RAS_MAX_WEIGHT as u64);
    let share = (wcounts / bucket).min(RAS_MAX_WEIGHT as u64) as u32;

    if share == RAS_MAX_WEIGHT {
        RAS_MIN_WEIGHT
    } else {
        RAS_MAX_WEIGHT - share
    }
}

/// Recompute a task's slice from its current write count.
pub fn calc_time_slice(
    config: &RasConfig,
    class: TaskClass,
    wcounts: u64,
    old_wcounts: u64,
    total_wcounts: u64,
) -> SliceUpdate {
    match class {
        TaskClass::Background => SliceUpdate {
            weight: None,
            time_slice: config.bg_timeslice,
            old_wcounts,
            total_wcounts,
        },
        TaskClass::Foreground => {
            let total_wcounts = rebalance_total(total_wcounts, old_wcounts, wcounts);
            let weight = calc_weight(wcounts, total_wcounts);
            SliceUpdate {
                weight: Some(weight),
                time_slice: config.foreground_timeslice(weight),
                old_wcounts: wcounts,
                total_wcounts,
            }
        }
    }
}
