//! Placement on wake-up and fork
//!
//! Picks the run queue with the smallest aggregate write count among the
//! CPUs a task may use. Loads are read without taking any run queue lock, so
//! a decision can be based on a value that is one operation stale.

use super::percpu::PerCpuRas;
use super::types::{CpuId, CpuMask, TaskId, WakeReason};

/// Everything the selector needs to know about the task being placed
#[derive(Clone, Copy, Debug)]
pub struct PlacementQuery {
    pub task: TaskId,
    /// CPU the task last ran on (`task_cpu`)
    pub task_cpu: CpuId,
    pub cpus_allowed: CpuMask,
    pub online: CpuMask,
    pub reason: WakeReason,
}

/// Read-only view of per-CPU aggregate write counts
pub trait RqLoadView {
    fn total_wcounts(&self, cpu: CpuId) -> u64;
}

impl RqLoadView for [u64] {
    #[inline]
    fn total_wcounts(&self, cpu: CpuId) -> u64 {
        self.get(cpu as usize).copied().unwrap_or(u64::MAX)
    }
}

impl RqLoadView for [PerCpuRas] {
    #[inline]
    fn total_wcounts(&self, cpu: CpuId) -> u64 {
        self.get(cpu as usize)
            .map(PerCpuRas::total_wcounts)
            .unwrap_or(u64::MAX)
    }
}

impl<const N: usize> RqLoadView for [u64; N] {
    #[inline]
    fn total_wcounts(&self, cpu: CpuId) -> u64 {
        self[..].total_wcounts(cpu)
    }
}

impl<const N: usize> RqLoadView for [PerCpuRas; N] {
    #[inline]
    fn total_wcounts(&self, cpu: CpuId) -> u64 {
        self[..].total_wcounts(cpu)
    }
}

/// Choose the CPU a waking or forked task should be enqueued on.
///
/// - one allowed CPU: that CPU, no comparison
/// - any reason other than wake/fork: stay on `task_cpu`
/// - otherwise the allowed, online CPU with the least `total_wcounts`;
///   ties go to `task_cpu`, then to the lowest CPU number
pub fn select_task_rq<L: RqLoadView + ?Sized>(query: &PlacementQuery, loads: &L) -> CpuId {
    let prev = query.task_cpu;

    if query.cpus_allowed.count() == 1 {
        return query
            .cpus_allowed
            .first_set()
            .map(|cpu| cpu as CpuId)
            .unwrap_or(prev);
    }

    if !query.reason.runs_placement() {
        return prev;
    }

    let candidates = query.cpus_allowed.intersect(&query.online);

    // Start from the task's own CPU so an equal load never moves it
    let (mut best_cpu, mut min_load) = if candidates.is_set(prev as usize) {
        (prev, loads.total_wcounts(prev))
    } else {
        match candidates.first_set() {
            Some(cpu) => (cpu as CpuId, loads.total_wcounts(cpu as CpuId)),
            None => return prev,
        }
    };

    for cpu in candidates.iter_set() {
        let load = loads.total_wcounts(cpu as CpuId);
        if load < min_load {
            min_load = load;
            best_cpu = cpu as CpuId;
        }
    }

    best_cpu
}
