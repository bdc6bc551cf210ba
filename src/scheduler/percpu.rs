//! Per-CPU RAS Run Queues
//!
//! Each CPU owns a FIFO list of runnable RAS entities together with two
//! aggregates that must always agree with the list:
//! - `nr_running`: number of linked entities
//! - `total_wcounts`: sum of the linked entities' `old_wcounts` snapshots
//!
//! Both are maintained incrementally by the same calls that link and unlink
//! entities, so no caller can change one without the other.
//!
//! ## Lock Hierarchy
//!
//! 1. Per-CPU run queue (`PerCpuRas::run_queue`)
//! 2. Entity table
//! 3. Published aggregates and statistics (atomics, no lock)
//!
//! The published `total_wcounts` copy is what other CPUs read during
//! placement; it may lag the locked value by one operation.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use spin::Mutex;

use crate::error::RasError;

use super::entity::{RasEntityTable, RunLink};
use super::types::{CpuId, TaskId};

// ============================================================================
// Run Queue
// ============================================================================

pub struct RasRunQueue {
    cpu: CpuId,
    head: Option<TaskId>,
    tail: Option<TaskId>,
    nr_running: usize,
    total_wcounts: u64,
}

impl RasRunQueue {
    pub const fn new(cpu: CpuId) -> Self {
        Self {
            cpu,
            head: None,
            tail: None,
            nr_running: 0,
            total_wcounts: 0,
        }
    }

    /// Reset to an empty queue. Only valid while no entity is linked here.
    pub fn init(&mut self, cpu: CpuId) {
        self.cpu = cpu;
        self.head = None;
        self.tail = None;
        self.nr_running = 0;
        self.total_wcounts = 0;
    }

    #[inline]
    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nr_running
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nr_running == 0
    }

    #[inline]
    pub fn total_wcounts(&self) -> u64 {
        self.total_wcounts
    }

    #[inline]
    pub(crate) fn set_total_wcounts(&mut self, total: u64) {
        self.total_wcounts = total;
    }

    /// Entity at the head of the list (next to run)
    #[inline]
    pub fn first(&self) -> Option<TaskId> {
        self.head
    }

    #[inline]
    pub fn last(&self) -> Option<TaskId> {
        self.tail
    }

    /// Check if a task is linked into this run queue
    pub fn contains(&self, tasks: &RasEntityTable, task: TaskId) -> bool {
        tasks
            .get(task)
            .and_then(|entity| entity.queued_on())
            .is_some_and(|cpu| cpu == self.cpu)
    }

    /// Walk the run list from head to tail
    pub fn iter<'a>(&self, tasks: &'a RasEntityTable) -> RunListIter<'a> {
        RunListIter {
            tasks,
            next: self.head,
            remaining: self.nr_running,
        }
    }

    /// Link an unqueued entity at the head or tail and count it.
    ///
    /// The entity's `old_wcounts` is not added to the aggregate here; the
    /// caller resets the snapshot and folds the fresh count in.
    pub(crate) fn link(&mut self, tasks: &mut RasEntityTable, task: TaskId, at_head: bool) -> Result<(), RasError> {
        if tasks.lookup(task)?.is_queued() {
            return Err(RasError::AlreadyQueued);
        }

        self.attach(tasks, task, at_head);
        self.nr_running += 1;
        Ok(())
    }

    /// Unlink an entity from this queue, dropping its snapshot from the
    /// aggregate. Returns the snapshot that was removed.
    pub(crate) fn unlink(&mut self, tasks: &mut RasEntityTable, task: TaskId) -> Result<u64, RasError> {
        let entity = tasks.lookup(task)?;
        if entity.queued_on() != Some(self.cpu) {
            return Err(RasError::NotQueued);
        }
        let old_wcounts = entity.old_wcounts;

        self.detach(tasks, task);
        self.nr_running -= 1;
        self.total_wcounts = self.total_wcounts.saturating_sub(old_wcounts);
        Ok(old_wcounts)
    }

    /// Move a linked entity to the head or tail without touching the
    /// counters. Returns false (and does nothing) if it is not on this queue.
    pub(crate) fn move_to(&mut self, tasks: &mut RasEntityTable, task: TaskId, at_head: bool) -> bool {
        if !self.contains(tasks, task) {
            return false;
        }

        let already_there = if at_head {
            self.head == Some(task)
        } else {
            self.tail == Some(task)
        };
        if !already_there {
            self.detach(tasks, task);
            self.attach(tasks, task, at_head);
        }
        true
    }

    fn attach(&mut self, tasks: &mut RasEntityTable, task: TaskId, at_head: bool) {
        let (prev, next) = if at_head { (None, self.head) } else { (self.tail, None) };

        if let Some(entity) = tasks.get_mut(task) {
            entity.link = Some(RunLink {
                cpu: self.cpu,
                prev,
                next,
            });
        }

        match next {
            Some(next) => set_prev(tasks, next, Some(task)),
            None => self.tail = Some(task),
        }
        match prev {
            Some(prev) => set_next(tasks, prev, Some(task)),
            None => self.head = Some(task),
        }
    }

    fn detach(&mut self, tasks: &mut RasEntityTable, task: TaskId) {
        let Some(link) = tasks.get_mut(task).and_then(|entity| entity.link.take()) else {
            return;
        };

        match link.prev {
            Some(prev) => set_next(tasks, prev, link.next),
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => set_prev(tasks, next, link.prev),
            None => self.tail = link.prev,
        }
    }

    /// Walk the list and check it against the counters.
    pub fn validate(&self, tasks: &RasEntityTable) -> Result<(), &'static str> {
        let mut count = 0usize;
        let mut sum = 0u64;
        let mut prev: Option<TaskId> = None;
        let mut cursor = self.head;

        while let Some(task) = cursor {
            if count == self.nr_running {
                return Err("run list longer than nr_running");
            }
            let entity = tasks.get(task).ok_or("linked task has no entity")?;
            let link = entity.link.ok_or("entity on run list is not linked")?;
            if link.cpu != self.cpu {
                return Err("entity linked to another cpu");
            }
            if link.prev != prev {
                return Err("broken prev link");
            }
            count += 1;
            sum = sum.saturating_add(entity.old_wcounts);
            prev = Some(task);
            cursor = link.next;
        }

        if self.tail != prev {
            return Err("tail does not match last entity");
        }
        if count != self.nr_running {
            return Err("nr_running does not match run list");
        }
        if sum != self.total_wcounts {
            return Err("total_wcounts does not match linked snapshots");
        }
        Ok(())
    }
}

fn set_prev(tasks: &mut RasEntityTable, task: TaskId, prev: Option<TaskId>) {
    if let Some(link) = tasks.get_mut(task).and_then(|entity| entity.link.as_mut()) {
        link.prev = prev;
    }
}

fn set_next(tasks: &mut RasEntityTable, task: TaskId, next: Option<TaskId>) {
    if let Some(link) = tasks.get_mut(task).and_then(|entity| entity.link.as_mut()) {
        link.next = next;
    }
}

pub struct RunListIter<'a> {
    tasks: &'a RasEntityTable,
    next: Option<TaskId>,
    remaining: usize,
}

impl Iterator for RunListIter<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        if self.remaining == 0 {
            return None;
        }
        let task = self.next?;
        self.remaining -= 1;
        self.next = self
            .tasks
            .get(task)
            .and_then(|entity| entity.link)
            .and_then(|link| link.next);
        Some(task)
    }
}

// ============================================================================
// Per-CPU Scheduler State
// ============================================================================

/// Locked part of a CPU's RAS state
pub struct RqState {
    pub ras: RasRunQueue,
    /// RAS task the host has made current on this CPU
    pub curr: Option<TaskId>,
}

/// Per-CPU RAS data, cache-line aligned to keep CPUs from false sharing.
#[repr(C, align(64))]
pub struct PerCpuRas {
    /// Run queue and current task (protected by local lock)
    pub run_queue: Mutex<RqState>,

    /// Copy of `total_wcounts` for lock-free reads from other CPUs
    total_wcounts: AtomicU64,

    online: AtomicBool,

    pub enqueues: AtomicU64,
    pub dequeues: AtomicU64,
    pub requeues: AtomicU64,
    pub ticks: AtomicU64,
    pub resched_requests: AtomicU64,

    /// Tasks placed here from another CPU
    pub migrations_in: AtomicU64,

    pub cpu_id: CpuId,
}

impl PerCpuRas {
    pub const fn new(cpu_id: CpuId) -> Self {
        Self {
            run_queue: Mutex::new(RqState {
                ras: RasRunQueue::new(cpu_id),
                curr: None,
            }),
            total_wcounts: AtomicU64::new(0),
            online: AtomicBool::new(false),
            enqueues: AtomicU64::new(0),
            dequeues: AtomicU64::new(0),
            requeues: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            resched_requests: AtomicU64::new(0),
            migrations_in: AtomicU64::new(0),
            cpu_id,
        }
    }

    /// Initialize per-CPU RAS data and mark the CPU online
    pub fn init(&self) {
        {
            let mut state = self.run_queue.lock();
            state.ras.init(self.cpu_id);
            state.curr = None;
        }
        self.total_wcounts.store(0, Ordering::Relaxed);
        self.enqueues.store(0, Ordering::Relaxed);
        self.dequeues.store(0, Ordering::Relaxed);
        self.requeues.store(0, Ordering::Relaxed);
        self.ticks.store(0, Ordering::Relaxed);
        self.resched_requests.store(0, Ordering::Relaxed);
        self.migrations_in.store(0, Ordering::Relaxed);
        self.online.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }

    /// Last published aggregate write count; may be momentarily stale.
    #[inline]
    pub fn total_wcounts(&self) -> u64 {
        self.total_wcounts.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn publish(&self, total_wcounts: u64) {
        self.total_wcounts.store(total_wcounts, Ordering::Relaxed);
    }
}
