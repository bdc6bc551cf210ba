//! Per-CPU RAS scheduler
//!
//! [`RasScheduler`] is the piece a kernel embeds: one locked run queue per
//! CPU, one entity table for all RAS tasks, and the [`RasSchedClass`] that
//! operates on them. Each entry point takes the target CPU's run queue lock
//! for the whole operation, then the entity table lock.
//!
//! ## Lock Order
//!
//! 1. `PerCpuRas::run_queue` (at most one CPU at a time)
//! 2. `RasScheduler::tasks`
//!
//! Placement reads the published per-CPU aggregates and takes no lock.

use core::sync::atomic::Ordering;

use spin::Mutex;

use crate::error::RasError;
use crate::{kdebug, kinfo};

use super::class::{RasSchedClass, Rq, SchedClass};
use super::entity::{RasEntity, RasEntityTable};
use super::host::RasHost;
use super::observer::{LogObserver, RasObserver};
use super::percpu::{PerCpuRas, RasRunQueue, RqState};
use super::stats::{list_percpu_stats, list_runqueue, RasRqStats};
use super::types::{CpuId, CpuMask, DequeueFlags, EnqueueFlags, TaskId, TickOutcome, MAX_CPUS, MAX_RAS_TASKS};

#[cfg(feature = "smp")]
use super::smp::PlacementQuery;
#[cfg(feature = "smp")]
use super::types::WakeReason;

pub struct RasScheduler<H: RasHost, O: RasObserver = LogObserver> {
    class: RasSchedClass<H, O>,
    cpus: [PerCpuRas; MAX_CPUS],
    tasks: Mutex<RasEntityTable>,
}

impl<H: RasHost> RasScheduler<H, LogObserver> {
    pub fn new(host: H) -> Self {
        Self::with_class(RasSchedClass::new(host))
    }
}

impl<H: RasHost, O: RasObserver> RasScheduler<H, O> {
    pub fn with_class(class: RasSchedClass<H, O>) -> Self {
        kinfo!(
            "RAS scheduler initialized ({} max tasks, {} CPUs, {} ticks base slice, {} ticks background slice)",
            MAX_RAS_TASKS,
            MAX_CPUS,
            class.config().base_timeslice,
            class.config().bg_timeslice
        );

        Self {
            class,
            cpus: core::array::from_fn(|cpu| PerCpuRas::new(cpu as CpuId)),
            tasks: Mutex::new(RasEntityTable::new()),
        }
    }

    #[inline]
    pub fn class(&self) -> &RasSchedClass<H, O> {
        &self.class
    }

    #[inline]
    pub fn cpus(&self) -> &[PerCpuRas] {
        &self.cpus
    }

    fn percpu(&self, cpu: CpuId) -> Result<&PerCpuRas, RasError> {
        self.cpus.get(cpu as usize).ok_or(RasError::InvalidCpu)
    }

    fn online_percpu(&self, cpu: CpuId) -> Result<&PerCpuRas, RasError> {
        let percpu = self.percpu(cpu)?;
        if !percpu.is_online() {
            return Err(RasError::InvalidCpu);
        }
        Ok(percpu)
    }

    /// Run `f` against a locked run queue and republish its aggregate.
    /// Offline CPUs are still reachable so their tasks can be drained.
    fn with_rq<R>(
        &self,
        cpu: CpuId,
        f: impl FnOnce(&RasSchedClass<H, O>, &mut Rq<'_>) -> R,
    ) -> Result<R, RasError> {
        let percpu = self.percpu(cpu)?;
        let mut state = percpu.run_queue.lock();
        let mut tasks = self.tasks.lock();

        let RqState { ras, curr } = &mut *state;
        let mut rq = Rq::new(ras, &mut tasks, *curr);
        let result = f(&self.class, &mut rq);

        *curr = rq.curr;
        percpu.publish(rq.ras.total_wcounts());
        Ok(result)
    }

    // ------------------------------------------------------------------------
    // CPU lifecycle
    // ------------------------------------------------------------------------

    /// Bring up a CPU's run queue. Refused while tasks are still linked on it.
    pub fn init_cpu(&self, cpu: CpuId) -> Result<(), RasError> {
        let percpu = self.percpu(cpu)?;
        if !percpu.run_queue.lock().ras.is_empty() {
            return Err(RasError::StillQueued);
        }

        percpu.init();
        #[cfg(feature = "smp")]
        self.with_rq(cpu, |class, rq| class.rq_online(rq))?;

        kdebug!("RAS run queue for CPU {} initialized", cpu);
        Ok(())
    }

    /// Mark an initialized CPU online or offline. Tasks still queued on an
    /// offline CPU stay there until the host dequeues them for migration;
    /// only enqueue and placement refuse an offline CPU.
    pub fn set_cpu_online(&self, cpu: CpuId, online: bool) -> Result<(), RasError> {
        let percpu = self.percpu(cpu)?;
        if percpu.is_online() == online {
            return Ok(());
        }

        if online {
            percpu.set_online(true);
            #[cfg(feature = "smp")]
            self.with_rq(cpu, |class, rq| class.rq_online(rq))?;
        } else {
            #[cfg(feature = "smp")]
            self.with_rq(cpu, |class, rq| class.rq_offline(rq))?;
            percpu.set_online(false);
        }

        kdebug!("RAS CPU {} {}", cpu, if online { "online" } else { "offline" });
        Ok(())
    }

    pub fn online_mask(&self) -> CpuMask {
        let mut mask = CpuMask::empty();
        for percpu in self.cpus.iter().filter(|percpu| percpu.is_online()) {
            mask.set(percpu.cpu_id as usize);
        }
        mask
    }

    // ------------------------------------------------------------------------
    // Task lifecycle
    // ------------------------------------------------------------------------

    /// Create the RAS entity for a task switching into this class
    pub fn attach_task(&self, task: TaskId) -> Result<(), RasError> {
        self.tasks.lock().attach(task)
    }

    /// Destroy a task's entity; it must be dequeued first
    pub fn detach_task(&self, task: TaskId) -> Result<RasEntity, RasError> {
        self.tasks.lock().detach(task)
    }

    /// Copy of a task's entity
    pub fn entity(&self, task: TaskId) -> Option<RasEntity> {
        self.tasks.lock().get(task).copied()
    }

    // ------------------------------------------------------------------------
    // Run queue operations
    // ------------------------------------------------------------------------

    /// Pick the CPU a waking or forked task should be enqueued on
    #[cfg(feature = "smp")]
    pub fn select_cpu(&self, task: TaskId, task_cpu: CpuId, cpus_allowed: CpuMask, reason: WakeReason) -> CpuId {
        let query = PlacementQuery {
            task,
            task_cpu,
            cpus_allowed,
            online: self.online_mask(),
            reason,
        };
        let cpu = self.class.select_task_rq(&query, &self.cpus);

        if cpu != task_cpu {
            if let Ok(percpu) = self.percpu(cpu) {
                percpu.migrations_in.fetch_add(1, Ordering::Relaxed);
            }
        }
        cpu
    }

    pub fn enqueue(&self, cpu: CpuId, task: TaskId, flags: EnqueueFlags) -> Result<(), RasError> {
        self.online_percpu(cpu)?;
        self.with_rq(cpu, |class, rq| class.enqueue_task(rq, task, flags))??;
        self.cpus[cpu as usize].enqueues.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn dequeue(&self, cpu: CpuId, task: TaskId, flags: DequeueFlags) -> Result<(), RasError> {
        self.with_rq(cpu, |class, rq| class.dequeue_task(rq, task, flags))??;
        self.cpus[cpu as usize].dequeues.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Move a queued task to the head or tail of its run list.
    /// Returns whether the task was on this CPU's queue.
    pub fn requeue(&self, cpu: CpuId, task: TaskId, head: bool) -> Result<bool, RasError> {
        let moved = self.with_rq(cpu, |class, rq| class.requeue_task(rq, task, head))?;
        if moved {
            self.cpus[cpu as usize].requeues.fetch_add(1, Ordering::Relaxed);
        }
        Ok(moved)
    }

    /// The current task gives up the CPU and goes to the back of the line
    pub fn yield_current(&self, cpu: CpuId) -> Result<(), RasError> {
        let moved = self.with_rq(cpu, |class, rq| {
            let Some(curr) = rq.curr else { return false };
            let queued = rq.ras.contains(rq.tasks, curr);
            class.yield_task(rq);
            queued
        })?;
        if moved {
            self.cpus[cpu as usize].requeues.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Head of the CPU's run list, or `None` to fall through to the next class
    pub fn pick_next(&self, cpu: CpuId) -> Result<Option<TaskId>, RasError> {
        self.with_rq(cpu, |class, rq| class.pick_next_task(rq))
    }

    pub fn put_prev(&self, cpu: CpuId, prev: TaskId) -> Result<(), RasError> {
        self.with_rq(cpu, |class, rq| class.put_prev_task(rq, prev))
    }

    /// Install `task` as the CPU's running RAS task (or clear it)
    pub fn set_curr(&self, cpu: CpuId, task: Option<TaskId>) -> Result<(), RasError> {
        self.with_rq(cpu, |class, rq| {
            if let Some(task) = task {
                rq.tasks.lookup(task)?;
            }
            rq.curr = task;
            class.set_curr_task(rq);
            Ok(())
        })?
    }

    /// Currently installed RAS task
    pub fn current(&self, cpu: CpuId) -> Option<TaskId> {
        self.percpu(cpu).ok().and_then(|percpu| percpu.run_queue.lock().curr)
    }

    /// Periodic tick for the CPU's current task. `None` when no RAS task is
    /// running there.
    pub fn tick(&self, cpu: CpuId) -> Result<Option<TickOutcome>, RasError> {
        let outcome = self.with_rq(cpu, |class, rq| {
            let curr = rq.curr?;
            Some(class.task_tick(rq, curr, false))
        })?;

        let percpu = &self.cpus[cpu as usize];
        if outcome.is_some() {
            percpu.ticks.fetch_add(1, Ordering::Relaxed);
        }
        if outcome == Some(TickOutcome::Requeued) {
            percpu.requeues.fetch_add(1, Ordering::Relaxed);
            percpu.resched_requests.fetch_add(1, Ordering::Relaxed);
        }
        Ok(outcome)
    }

    /// A task on `cpu` just switched into the RAS class
    pub fn switched_to(&self, cpu: CpuId, task: TaskId) -> Result<(), RasError> {
        self.with_rq(cpu, |class, rq| class.switched_to(rq, task))
    }

    /// `weight * base_timeslice` for a task, without touching any run queue
    pub fn get_rr_interval(&self, task: TaskId) -> Option<u32> {
        let tasks = self.tasks.lock();
        self.class.get_timeslice_quantum(&tasks, task)
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Published aggregate write count, readable without locking
    pub fn total_wcounts(&self, cpu: CpuId) -> u64 {
        self.percpu(cpu).map(PerCpuRas::total_wcounts).unwrap_or(0)
    }

    pub fn stats(&self, cpu: CpuId) -> Option<RasRqStats> {
        self.percpu(cpu).ok().map(PerCpuRas::stats)
    }

    /// Run `f` with a CPU's run queue and the entity table locked
    pub fn inspect<R>(&self, cpu: CpuId, f: impl FnOnce(&RasRunQueue, &RasEntityTable) -> R) -> Result<R, RasError> {
        let percpu = self.percpu(cpu)?;
        let state = percpu.run_queue.lock();
        let tasks = self.tasks.lock();
        Ok(f(&state.ras, &tasks))
    }

    /// Check a run queue's list against its counters
    pub fn validate(&self, cpu: CpuId) -> Result<(), &'static str> {
        self.inspect(cpu, |ras, tasks| ras.validate(tasks))
            .map_err(RasError::as_str)?
    }

    pub fn dump_runqueue(&self, cpu: CpuId) -> Result<(), RasError> {
        self.inspect(cpu, list_runqueue)
    }

    pub fn dump_stats(&self) {
        list_percpu_stats(&self.cpus);
    }
}
