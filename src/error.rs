use core::fmt;

use crate::posix::errno;

/// Errors surfaced by the scheduling class and the tracing facility.
///
/// Run-queue operations only return these for violated preconditions; a
/// failed operation leaves every run queue and entity untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasError {
    /// Pid lookup failed (the task no longer exists).
    NoSuchProcess,
    /// `start_trace` on a task that is already being traced.
    AlreadyTracing,
    /// Task id outside the entity table.
    InvalidTask,
    /// No scheduling entity attached for this task.
    NoEntity,
    AlreadyAttached,
    AlreadyQueued,
    NotQueued,
    /// Entity still linked into a run queue.
    StillQueued,
    InvalidCpu,
    TableFull,
}

impl RasError {
    pub const fn as_str(self) -> &'static str {
        match self {
            RasError::NoSuchProcess => "no such process",
            RasError::AlreadyTracing => "task is already being traced",
            RasError::InvalidTask => "task id out of range",
            RasError::NoEntity => "task has no RAS entity",
            RasError::AlreadyAttached => "RAS entity already attached",
            RasError::AlreadyQueued => "entity already on a run queue",
            RasError::NotQueued => "entity not on a run queue",
            RasError::StillQueued => "entity still on a run queue",
            RasError::InvalidCpu => "cpu id out of range or offline",
            RasError::TableFull => "table full",
        }
    }

    pub const fn errno(self) -> i32 {
        match self {
            RasError::NoSuchProcess | RasError::NoEntity => errno::ESRCH,
            RasError::AlreadyTracing
            | RasError::InvalidTask
            | RasError::AlreadyQueued
            | RasError::NotQueued
            | RasError::InvalidCpu => errno::EINVAL,
            RasError::AlreadyAttached => errno::EEXIST,
            RasError::StillQueued => errno::EBUSY,
            RasError::TableFull => errno::ENOMEM,
        }
    }
}

impl fmt::Display for RasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
