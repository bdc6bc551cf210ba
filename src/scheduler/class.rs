//! The RAS scheduling class
//!
//! [`SchedClass`] is the hook set a host scheduler core dispatches through
//! for every task state transition. Events a class does not care about have
//! default no-op bodies so every class answers every event.
//!
//! [`RasSchedClass`] implements it with one FIFO run list per CPU. Each
//! operation runs with the CPU's run queue lock held by the caller, which is
//! expressed here by the [`Rq`] borrow: everything an operation may touch is
//! reachable through it, and nothing else is.

use crate::config::RasConfig;
use crate::error::RasError;
use crate::{ktrace, kwarn};

use super::classify::{classify_path, TaskClass};
use super::entity::RasEntityTable;
use super::host::RasHost;
use super::observer::{LogObserver, RasEvent, RasObserver, RasOp};
use super::percpu::RasRunQueue;
use super::types::{CpuId, DequeueFlags, EnqueueFlags, SchedPolicy, TaskId, TickOutcome};
use super::weight::calc_time_slice;

#[cfg(feature = "smp")]
use super::smp::{self, PlacementQuery, RqLoadView};
#[cfg(feature = "smp")]
use super::types::CpuMask;

/// A locked run queue as seen by a scheduling class
pub struct Rq<'a> {
    pub ras: &'a mut RasRunQueue,
    pub tasks: &'a mut RasEntityTable,
    /// Task currently executing on this CPU, if it belongs to this class
    pub curr: Option<TaskId>,
}

impl<'a> Rq<'a> {
    pub fn new(ras: &'a mut RasRunQueue, tasks: &'a mut RasEntityTable, curr: Option<TaskId>) -> Self {
        Self { ras, tasks, curr }
    }

    #[inline]
    pub fn cpu(&self) -> CpuId {
        self.ras.cpu()
    }
}

pub trait SchedClass {
    fn policy(&self) -> SchedPolicy;

    fn name(&self) -> &'static str {
        self.policy().name()
    }

    fn enqueue_task(&self, rq: &mut Rq<'_>, task: TaskId, flags: EnqueueFlags) -> Result<(), RasError>;
    fn dequeue_task(&self, rq: &mut Rq<'_>, task: TaskId, flags: DequeueFlags) -> Result<(), RasError>;
    fn yield_task(&self, rq: &mut Rq<'_>);

    fn check_preempt_curr(&self, _rq: &mut Rq<'_>, _task: TaskId, _flags: EnqueueFlags) {}

    fn pick_next_task(&self, rq: &mut Rq<'_>) -> Option<TaskId>;
    fn put_prev_task(&self, rq: &mut Rq<'_>, prev: TaskId);

    #[cfg(feature = "smp")]
    fn select_task_rq(&self, query: &PlacementQuery, loads: &dyn RqLoadView) -> CpuId;
    #[cfg(feature = "smp")]
    fn set_cpus_allowed(&self, _task: TaskId, _new_mask: &CpuMask) {}
    #[cfg(feature = "smp")]
    fn rq_online(&self, _rq: &mut Rq<'_>) {}
    #[cfg(feature = "smp")]
    fn rq_offline(&self, _rq: &mut Rq<'_>) {}
    #[cfg(feature = "smp")]
    fn pre_schedule(&self, _rq: &mut Rq<'_>, _prev: TaskId) {}
    #[cfg(feature = "smp")]
    fn post_schedule(&self, _rq: &mut Rq<'_>) {}
    #[cfg(feature = "smp")]
    fn task_woken(&self, _rq: &mut Rq<'_>, _task: TaskId) {}

    fn set_curr_task(&self, rq: &mut Rq<'_>);
    fn task_tick(&self, rq: &mut Rq<'_>, curr: TaskId, queued: bool) -> TickOutcome;

    /// Round-robin interval reported to `sched_rr_get_interval`, in ticks
    fn get_rr_interval(&self, rq: &Rq<'_>, task: TaskId) -> u32;

    fn prio_changed(&self, _rq: &mut Rq<'_>, _task: TaskId, _old_prio: i32) {}
    fn switched_from(&self, _rq: &mut Rq<'_>, _task: TaskId) {}
    fn switched_to(&self, rq: &mut Rq<'_>, task: TaskId);
}

pub struct RasSchedClass<H: RasHost, O: RasObserver = LogObserver> {
    host: H,
    config: RasConfig,
    observer: O,
}

impl<H: RasHost> RasSchedClass<H, LogObserver> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, RasConfig::new())
    }

    pub fn with_config(host: H, config: RasConfig) -> Self {
        Self {
            host,
            config,
            observer: LogObserver,
        }
    }
}

impl<H: RasHost, O: RasObserver> RasSchedClass<H, O> {
    /// Replace the observer that receives post-operation events
    pub fn with_observer<P: RasObserver>(self, observer: P) -> RasSchedClass<H, P> {
        RasSchedClass {
            host: self.host,
            config: self.config,
            observer,
        }
    }

    #[inline]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[inline]
    pub fn config(&self) -> &RasConfig {
        &self.config
    }

    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Slice length a task's current weight is worth: `weight * base`.
    pub fn get_timeslice_quantum(&self, tasks: &RasEntityTable, task: TaskId) -> Option<u32> {
        tasks
            .get(task)
            .map(|entity| self.config.foreground_timeslice(entity.weight()))
    }

    /// Charge the running task with the time since its last accounting point.
    fn update_curr(&self, rq: &mut Rq<'_>) {
        if let Some(curr) = rq.curr {
            self.account(rq, curr);
        }
    }

    fn account(&self, rq: &mut Rq<'_>, task: TaskId) {
        let now = self.host.clock_task(rq.cpu());
        if let Some(entity) = rq.tasks.get_mut(task) {
            let delta = entity.account_exec(now);
            self.host.charge_exec_runtime(task, delta);
        }
    }

    /// Reclassify the task and recompute its weight and slice against this
    /// run queue. The task must be linked here so that the aggregate it
    /// folds its write count into is the one that holds its snapshot.
    fn update_time_slice(&self, rq: &mut Rq<'_>, task: TaskId) -> Result<(), RasError> {
        let path = self.host.group_path(task);
        let class = classify_path(path.as_str(), self.config.background_marker);
        let wcounts = self.host.write_count(task);

        let total_wcounts = rq.ras.total_wcounts();
        let entity = rq.tasks.lookup_mut(task)?;
        let update = calc_time_slice(&self.config, class, wcounts, entity.old_wcounts, total_wcounts);

        entity.class = class;
        if let Some(weight) = update.weight {
            entity.weight = weight;
        }
        entity.time_slice = update.time_slice;
        entity.old_wcounts = update.old_wcounts;
        rq.ras.set_total_wcounts(update.total_wcounts);

        if class == TaskClass::Background {
            ktrace!("ras: task {} in background group {}", task.raw(), path.as_str());
        }
        Ok(())
    }

    /// Move a queued task to the head or tail of its run list.
    /// Returns false if the task is not on this run queue.
    pub fn requeue_task(&self, rq: &mut Rq<'_>, task: TaskId, head: bool) -> bool {
        let moved = rq.ras.move_to(rq.tasks, task, head);
        if moved {
            self.notify(rq, RasOp::Requeue, task);
        }
        moved
    }

    fn notify(&self, rq: &Rq<'_>, op: RasOp, task: TaskId) {
        let (wcounts, time_slice) = rq
            .tasks
            .get(task)
            .map(|entity| (entity.old_wcounts, entity.time_slice))
            .unwrap_or((0, 0));

        self.observer.on_event(&RasEvent::RunQueue {
            op,
            cpu: rq.cpu(),
            task,
            wcounts,
            total_wcounts: rq.ras.total_wcounts(),
            time_slice,
            nr_running: rq.ras.len(),
        });
    }
}

impl<H: RasHost, O: RasObserver> SchedClass for RasSchedClass<H, O> {
    fn policy(&self) -> SchedPolicy {
        SchedPolicy::Ras
    }

    fn enqueue_task(&self, rq: &mut Rq<'_>, task: TaskId, flags: EnqueueFlags) -> Result<(), RasError> {
        rq.ras.link(rq.tasks, task, flags.contains(EnqueueFlags::HEAD))?;

        // A fresh enqueue contributes nothing until its count is folded in
        rq.tasks.lookup_mut(task)?.old_wcounts = 0;
        self.update_time_slice(rq, task)?;

        self.host.inc_nr_running(rq.cpu());
        self.notify(rq, RasOp::Enqueue, task);
        Ok(())
    }

    fn dequeue_task(&self, rq: &mut Rq<'_>, task: TaskId, _flags: DequeueFlags) -> Result<(), RasError> {
        if !rq.ras.contains(rq.tasks, task) {
            rq.tasks.lookup(task)?;
            return Err(RasError::NotQueued);
        }

        self.update_curr(rq);
        rq.ras.unlink(rq.tasks, task)?;

        self.host.dec_nr_running(rq.cpu());
        self.notify(rq, RasOp::Dequeue, task);
        Ok(())
    }

    fn yield_task(&self, rq: &mut Rq<'_>) {
        if let Some(curr) = rq.curr {
            self.requeue_task(rq, curr, false);
        }
    }

    fn pick_next_task(&self, rq: &mut Rq<'_>) -> Option<TaskId> {
        let next = rq.ras.first()?;
        let now = self.host.clock_task(rq.cpu());
        if let Some(entity) = rq.tasks.get_mut(next) {
            entity.exec_start = now;
        }
        Some(next)
    }

    fn put_prev_task(&self, rq: &mut Rq<'_>, prev: TaskId) {
        self.account(rq, prev);
    }

    #[cfg(feature = "smp")]
    fn select_task_rq(&self, query: &PlacementQuery, loads: &dyn RqLoadView) -> CpuId {
        let cpu = smp::select_task_rq(query, loads);
        self.observer.on_event(&RasEvent::Placement {
            task: query.task,
            prev_cpu: query.task_cpu,
            new_cpu: cpu,
        });
        cpu
    }

    fn set_curr_task(&self, rq: &mut Rq<'_>) {
        let Some(curr) = rq.curr else { return };
        let now = self.host.clock_task(rq.cpu());
        if let Some(entity) = rq.tasks.get_mut(curr) {
            entity.exec_start = now;
        }
    }

    fn task_tick(&self, rq: &mut Rq<'_>, curr: TaskId, _queued: bool) -> TickOutcome {
        self.account(rq, curr);

        // Only a task linked on this run queue owns a slice here
        if !rq.ras.contains(rq.tasks, curr) {
            return TickOutcome::Running;
        }

        let remaining = match rq.tasks.get_mut(curr) {
            Some(entity) => {
                entity.time_slice = entity.time_slice.saturating_sub(1);
                entity.time_slice
            }
            None => return TickOutcome::Running,
        };

        if remaining > 0 {
            self.notify(rq, RasOp::Tick, curr);
            return TickOutcome::Running;
        }

        if let Err(err) = self.update_time_slice(rq, curr) {
            kwarn!("ras: tick could not refill task {}: {}", curr.raw(), err);
            return TickOutcome::Running;
        }

        let outcome = if rq.ras.len() > 1 {
            self.requeue_task(rq, curr, false);
            self.host.request_reschedule(curr);
            TickOutcome::Requeued
        } else {
            TickOutcome::Refilled
        };

        self.notify(rq, RasOp::Tick, curr);
        outcome
    }

    fn get_rr_interval(&self, rq: &Rq<'_>, task: TaskId) -> u32 {
        self.get_timeslice_quantum(&*rq.tasks, task).unwrap_or(0)
    }

    fn switched_to(&self, rq: &mut Rq<'_>, task: TaskId) {
        if !rq.ras.contains(rq.tasks, task) {
            return;
        }

        if rq.curr == Some(task) {
            self.host.request_reschedule(task);
        } else {
            self.check_preempt_curr(rq, task, EnqueueFlags::empty());
        }
    }
}
