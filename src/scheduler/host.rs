//! Services the RAS class consumes from the host kernel
//!
//! The host owns tasks, clocks, cgroups and the page-write tracer. The class
//! only reads through these hooks and notifies back; every call happens with
//! the relevant CPU's run queue lock held, so implementations must not block
//! or re-enter the scheduler.

use super::classify::GroupPath;
use super::types::{CpuId, Pid, TaskId};

pub trait RasHost {
    /// Page writes observed for `task` since its trace was last started.
    fn write_count(&self, task: TaskId) -> u64;

    /// cgroup path of the task's group. Empty when unknown.
    fn group_path(&self, _task: TaskId) -> GroupPath {
        GroupPath::empty()
    }

    /// Per-CPU task clock; expected to be non-decreasing.
    fn clock_task(&self, cpu: CpuId) -> u64;

    /// Ask the host to call `pick_next_task` at the next safe point.
    fn request_reschedule(&self, task: TaskId);

    /// The CPU-wide runnable count (`rq->nr_running`) changed.
    fn inc_nr_running(&self, cpu: CpuId);
    fn dec_nr_running(&self, cpu: CpuId);

    /// Executed time charged to a task (cpuacct, group runtime, ...).
    fn charge_exec_runtime(&self, _task: TaskId, _delta: u64) {}
}

/// Pid-keyed source of write counts, implemented by the page-write tracer.
pub trait WriteCountSource {
    /// `None` when the pid is unknown.
    fn write_count(&self, pid: Pid) -> Option<u64>;
}
