//! Scheduler type definitions
//!
//! This module contains all type definitions shared by the RAS scheduling
//! class and its host glue.

use bitflags::bitflags;

/// Process identifier as seen by userspace and the tracing syscalls
pub type Pid = u64;

/// CPU index
pub type CpuId = u16;

/// Maximum number of CPUs a scheduler instance can drive (one bit per CPU in
/// [`CpuMask`])
pub const MAX_CPUS: usize = 64;

/// Number of slots in the RAS entity table
pub const MAX_RAS_TASKS: usize = 512;

/// Weight bounds; the timeslice is `weight * base_timeslice`
pub const RAS_MAX_WEIGHT: u32 = 10;
pub const RAS_MIN_WEIGHT: u32 = 1;

/// Linux policy number for SCHED_RAS
pub const SCHED_RAS: i32 = 6;

/// Stable handle of a task's scheduling entity (its slot in the entity table).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl TaskId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Scheduling policies known to the host, numbered like `sched_setscheduler`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedPolicy {
    Normal,
    Fifo,
    RoundRobin,
    Batch,
    Idle,
    Ras,
}

impl SchedPolicy {
    pub const fn from_raw(policy: i32) -> Option<Self> {
        match policy {
            0 => Some(SchedPolicy::Normal),
            1 => Some(SchedPolicy::Fifo),
            2 => Some(SchedPolicy::RoundRobin),
            3 => Some(SchedPolicy::Batch),
            5 => Some(SchedPolicy::Idle),
            SCHED_RAS => Some(SchedPolicy::Ras),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> i32 {
        match self {
            SchedPolicy::Normal => 0,
            SchedPolicy::Fifo => 1,
            SchedPolicy::RoundRobin => 2,
            SchedPolicy::Batch => 3,
            SchedPolicy::Idle => 5,
            SchedPolicy::Ras => SCHED_RAS,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SchedPolicy::Normal => "SCHED_NORMAL",
            SchedPolicy::Fifo => "SCHED_FIFO",
            SchedPolicy::RoundRobin => "SCHED_RR",
            SchedPolicy::Batch => "SCHED_BATCH",
            SchedPolicy::Idle => "SCHED_IDLE",
            SchedPolicy::Ras => "SCHED_RAS",
        }
    }
}

bitflags! {
    /// Flags passed by the host with `enqueue_task`
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EnqueueFlags: u32 {
        const WAKEUP = 0x01;
        /// Insert at the front of the run list instead of the back
        const HEAD = 0x02;
        const WAKING = 0x04;
    }

    /// Flags passed by the host with `dequeue_task`
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DequeueFlags: u32 {
        const SLEEP = 0x01;
    }
}

/// Why the host is asking for a CPU in `select_task_rq`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeReason {
    Wake,
    Fork,
    Exec,
    Balance,
}

impl WakeReason {
    /// Only wake-ups and forks go through the placement heuristic.
    #[inline]
    pub const fn runs_placement(self) -> bool {
        matches!(self, WakeReason::Wake | WakeReason::Fork)
    }
}

/// Result of a scheduler tick on the running entity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Slice not used up yet
    Running,
    /// Slice used up and recomputed; the task was the only runnable one and
    /// keeps the CPU
    Refilled,
    /// Slice used up and recomputed; the task moved to the tail and a
    /// reschedule was requested
    Requeued,
}

/// CPU affinity mask, one bit per CPU (CPU 0 is bit 0)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CpuMask(u64);

impl CpuMask {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(u64::MAX)
    }

    pub const fn from_u64(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn from_u32(bits: u32) -> Self {
        Self(bits as u64)
    }

    /// Mask with exactly `cpu` set
    pub const fn single(cpu: CpuId) -> Self {
        if (cpu as usize) < MAX_CPUS {
            Self(1u64 << cpu)
        } else {
            Self(0)
        }
    }

    #[inline]
    pub const fn bits(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn set(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 |= 1u64 << cpu;
        }
    }

    #[inline]
    pub fn clear(&mut self, cpu: usize) {
        if cpu < MAX_CPUS {
            self.0 &= !(1u64 << cpu);
        }
    }

    #[inline]
    pub const fn is_set(&self, cpu: usize) -> bool {
        cpu < MAX_CPUS && (self.0 & (1u64 << cpu)) != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    pub const fn first_set(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    #[inline]
    pub const fn intersect(&self, other: &CpuMask) -> CpuMask {
        CpuMask(self.0 & other.0)
    }

    /// Iterate set CPUs in ascending order
    pub fn iter_set(&self) -> CpuMaskIter {
        CpuMaskIter { remaining: self.0 }
    }
}

pub struct CpuMaskIter {
    remaining: u64,
}

impl Iterator for CpuMaskIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let cpu = self.remaining.trailing_zeros() as usize;
        self.remaining &= self.remaining - 1;
        Some(cpu)
    }
}
