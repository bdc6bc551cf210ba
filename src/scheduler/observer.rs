//! Post-operation hooks
//!
//! Every run queue operation reports what it did after all of its mutations
//! are done. The default observer logs a line per operation at DEBUG level;
//! tests plug in their own to record events.

use crate::kdebug;

use super::types::{CpuId, TaskId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasOp {
    Enqueue,
    Dequeue,
    Requeue,
    Tick,
}

impl RasOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            RasOp::Enqueue => "enqueue_task_ras",
            RasOp::Dequeue => "dequeue_task_ras",
            RasOp::Requeue => "requeue_task_ras",
            RasOp::Tick => "task_tick_ras",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasEvent {
    /// State of a run queue right after an operation on `task`
    RunQueue {
        op: RasOp,
        cpu: CpuId,
        task: TaskId,
        wcounts: u64,
        total_wcounts: u64,
        time_slice: u32,
        nr_running: usize,
    },
    /// Placement decision at wake-up or fork
    Placement {
        task: TaskId,
        prev_cpu: CpuId,
        new_cpu: CpuId,
    },
}

pub trait RasObserver {
    fn on_event(&self, event: &RasEvent);
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RasObserver for NullObserver {
    #[inline]
    fn on_event(&self, _event: &RasEvent) {}
}

/// Logs each event through the kernel log at DEBUG level
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl RasObserver for LogObserver {
    fn on_event(&self, event: &RasEvent) {
        match *event {
            RasEvent::RunQueue {
                op,
                cpu,
                task,
                wcounts,
                total_wcounts,
                time_slice,
                nr_running,
            } => kdebug!(
                "{}:: cpu: {}, task: {}, wcounts: {}, total_wcounts: {}, time_slice: {}, nr: {}",
                op.as_str(),
                cpu,
                task.raw(),
                wcounts,
                total_wcounts,
                time_slice,
                nr_running
            ),
            RasEvent::Placement {
                task,
                prev_cpu,
                new_cpu,
            } => kdebug!(
                "select_task_rq_ras:: task: {}, pre_cpu: {}, new_cpu: {}",
                task.raw(),
                prev_cpu,
                new_cpu
            ),
        }
    }
}

impl<O: RasObserver + ?Sized> RasObserver for &O {
    #[inline]
    fn on_event(&self, event: &RasEvent) {
        (**self).on_event(event)
    }
}
