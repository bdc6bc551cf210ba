//! Statistics and debugging functions

use core::sync::atomic::Ordering;

use super::classify::TaskClass;
use super::entity::RasEntityTable;
use super::percpu::{PerCpuRas, RasRunQueue};
use super::types::CpuId;

/// Point-in-time view of one CPU's RAS run queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasRqStats {
    pub cpu_id: CpuId,
    pub online: bool,
    pub nr_running: usize,
    pub total_wcounts: u64,
    pub curr: Option<u32>,
    pub enqueues: u64,
    pub dequeues: u64,
    pub requeues: u64,
    pub ticks: u64,
    pub resched_requests: u64,
    pub migrations_in: u64,
}

impl PerCpuRas {
    /// Snapshot counters and queue state (takes the run queue lock)
    pub fn stats(&self) -> RasRqStats {
        let (nr_running, total_wcounts, curr) = {
            let state = self.run_queue.lock();
            (state.ras.len(), state.ras.total_wcounts(), state.curr.map(|task| task.raw()))
        };

        RasRqStats {
            cpu_id: self.cpu_id,
            online: self.is_online(),
            nr_running,
            total_wcounts,
            curr,
            enqueues: self.enqueues.load(Ordering::Relaxed),
            dequeues: self.dequeues.load(Ordering::Relaxed),
            requeues: self.requeues.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            resched_requests: self.resched_requests.load(Ordering::Relaxed),
            migrations_in: self.migrations_in.load(Ordering::Relaxed),
        }
    }
}

fn class_str(class: TaskClass) -> &'static str {
    match class {
        TaskClass::Foreground => "fg",
        TaskClass::Background => "bg",
    }
}

/// Dump a run list, head first
pub fn list_runqueue(rq: &RasRunQueue, tasks: &RasEntityTable) {
    crate::kinfo!(
        "=== RAS Run Queue CPU {} (nr={}, total_wcounts={}) ===",
        rq.cpu(),
        rq.len(),
        rq.total_wcounts()
    );
    crate::kinfo!(
        "{:<6} {:<5} {:<6} {:<6} {:<12} {:<12}",
        "TASK", "CLASS", "WEIGHT", "SLICE", "OLD_WCOUNTS", "EXEC_NS"
    );

    for task in rq.iter(tasks) {
        let Some(entity) = tasks.get(task) else { continue };
        crate::kinfo!(
            "{:<6} {:<5} {:<6} {:<6} {:<12} {:<12}",
            task.raw(),
            class_str(entity.class()),
            entity.weight(),
            entity.time_slice(),
            entity.old_wcounts(),
            entity.sum_exec_runtime()
        );
    }
}

/// Print per-CPU statistics for every online CPU
pub fn list_percpu_stats(cpus: &[PerCpuRas]) {
    let online = cpus.iter().filter(|cpu| cpu.is_online()).count();

    crate::kinfo!("=== RAS Per-CPU Statistics ({} CPUs online) ===", online);
    crate::kinfo!(
        "{:<4} {:<4} {:<12} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "CPU", "NR", "WCOUNTS", "Enq", "Deq", "Requeue", "Ticks", "Resched", "MigIn"
    );

    for cpu in cpus.iter().filter(|cpu| cpu.is_online()) {
        let stats = cpu.stats();
        crate::kinfo!(
            "{:<4} {:<4} {:<12} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
            stats.cpu_id,
            stats.nr_running,
            stats.total_wcounts,
            stats.enqueues,
            stats.dequeues,
            stats.requeues,
            stats.ticks,
            stats.resched_requests,
            stats.migrations_in
        );
    }
}
