//! Scheduler subsystem
//!
//! This module provides the Race-Averse Scheduling (RAS) class. Timeslices
//! are handed out in inverse proportion to a task's share of its CPU's recent
//! page writes, so write-heavy tasks rotate off the CPU sooner.
//!
//! ## RAS Key Features:
//! - **FIFO run lists**: no priority levels inside the class
//! - **Write-count weight**: 1..=10, from the task's share of `total_wcounts`
//! - **Background groups**: fixed slice, no weight computation
//! - **Least-written placement**: wake-ups and forks go to the CPU with the
//!   smallest aggregate write count
//!
//! ## Per-CPU Architecture
//!
//! Each CPU owns a run queue behind its own lock:
//! - Entities live in one table indexed by task id; run lists link indices
//! - `nr_running` and `total_wcounts` are updated with every link/unlink
//! - The aggregate is published to an atomic for lock-free placement reads
//!
//! ## Module Organization
//!
//! - `types`: Task ids, policies, flags, CPU masks, limits
//! - `entity`: Scheduling entity and the entity table
//! - `percpu`: Per-CPU run lists and scheduler state
//! - `classify`: Foreground/background classification from cgroup paths
//! - `weight`: Weight and timeslice calculation
//! - `class`: Scheduling class trait and the RAS implementation
//! - `host`: Services consumed from the host kernel
//! - `observer`: Post-operation events and debug logging
//! - `smp`: Wake-up/fork placement
//! - `core`: Locked per-CPU composition used by a kernel
//! - `stats`: Statistics and debugging functions

mod class;
mod classify;
mod core;
mod entity;
mod host;
mod observer;
pub mod percpu;
#[cfg(feature = "smp")]
mod smp;
mod stats;
mod types;
mod weight;

// Re-export types for external use
pub use types::{
    CpuId, CpuMask, CpuMaskIter, DequeueFlags, EnqueueFlags, Pid, SchedPolicy, TaskId, TickOutcome, WakeReason,
};
pub use types::{MAX_CPUS, MAX_RAS_TASKS, RAS_MAX_WEIGHT, RAS_MIN_WEIGHT, SCHED_RAS};

// Entities and run queues
pub use entity::{RasEntity, RasEntityTable};
pub use percpu::{PerCpuRas, RasRunQueue, RqState, RunListIter};

// Classification and weights
pub use classify::{classify_path, GroupPath, TaskClass, GROUP_PATH_MAX};
pub use weight::{calc_time_slice, calc_weight, rebalance_total, SliceUpdate};

// Scheduling class
pub use class::{RasSchedClass, Rq, SchedClass};
pub use host::{RasHost, WriteCountSource};
pub use observer::{LogObserver, NullObserver, RasEvent, RasObserver, RasOp};

// SMP placement
#[cfg(feature = "smp")]
pub use smp::{select_task_rq, PlacementQuery, RqLoadView};

// Composition and statistics
pub use self::core::RasScheduler;
pub use stats::{list_percpu_stats, list_runqueue, RasRqStats};
