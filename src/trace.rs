//! Page-write tracing
//!
//! Counts write faults per traced pid. The page fault handler calls
//! [`TraceTable::record_page_write`] for every write fault it services; only
//! pids with tracing switched on are counted. The scheduler reads the counts
//! back through [`WriteCountSource`].
//!
//! `start_trace` zeroes the count, `stop_trace` freezes it. Starting twice
//! without a stop in between is refused.

use spin::Mutex;

use crate::error::RasError;
use crate::kdebug;
use crate::scheduler::{Pid, WriteCountSource};

/// Maximum number of pids the table can hold
pub const MAX_TRACED_PIDS: usize = 512;

#[derive(Clone, Copy, Debug)]
struct TraceEntry {
    pid: Pid,
    tracing: bool,
    wcounts: u64,
}

pub struct TraceTable {
    entries: Mutex<[Option<TraceEntry>; MAX_TRACED_PIDS]>,
}

impl TraceTable {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new([None; MAX_TRACED_PIDS]),
        }
    }

    /// Make a pid known to the tracer (task creation)
    pub fn register(&self, pid: Pid) -> Result<(), RasError> {
        let mut entries = self.entries.lock();
        if entries.iter().flatten().any(|entry| entry.pid == pid) {
            return Err(RasError::AlreadyAttached);
        }

        let slot = entries
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(RasError::TableFull)?;
        *slot = Some(TraceEntry {
            pid,
            tracing: false,
            wcounts: 0,
        });
        Ok(())
    }

    /// Forget a pid (task exit)
    pub fn unregister(&self, pid: Pid) -> Result<(), RasError> {
        let mut entries = self.entries.lock();
        let slot = entries
            .iter_mut()
            .find(|slot| slot.is_some_and(|entry| entry.pid == pid))
            .ok_or(RasError::NoSuchProcess)?;
        *slot = None;
        Ok(())
    }

    fn with_entry<R>(&self, pid: Pid, f: impl FnOnce(&mut TraceEntry) -> R) -> Result<R, RasError> {
        let mut entries = self.entries.lock();
        entries
            .iter_mut()
            .flatten()
            .find(|entry| entry.pid == pid)
            .map(f)
            .ok_or(RasError::NoSuchProcess)
    }

    /// Reset the pid's count and start counting
    pub fn start_trace(&self, pid: Pid) -> Result<(), RasError> {
        self.with_entry(pid, |entry| {
            if entry.tracing {
                return Err(RasError::AlreadyTracing);
            }
            entry.tracing = true;
            entry.wcounts = 0;
            Ok(())
        })??;

        kdebug!("trace: started for pid {}", pid);
        Ok(())
    }

    /// Stop counting; the count is kept. Stopping twice is fine.
    pub fn stop_trace(&self, pid: Pid) -> Result<(), RasError> {
        self.with_entry(pid, |entry| entry.tracing = false)?;
        kdebug!("trace: stopped for pid {}", pid);
        Ok(())
    }

    pub fn get_trace(&self, pid: Pid) -> Result<u64, RasError> {
        self.with_entry(pid, |entry| entry.wcounts)
    }

    pub fn is_tracing(&self, pid: Pid) -> Result<bool, RasError> {
        self.with_entry(pid, |entry| entry.tracing)
    }

    /// Count one write fault. Returns whether it was counted.
    pub fn record_page_write(&self, pid: Pid) -> bool {
        self.with_entry(pid, |entry| {
            if entry.tracing {
                entry.wcounts = entry.wcounts.saturating_add(1);
            }
            entry.tracing
        })
        .unwrap_or(false)
    }

    /// Number of registered pids
    pub fn len(&self) -> usize {
        self.entries.lock().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TraceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteCountSource for TraceTable {
    fn write_count(&self, pid: Pid) -> Option<u64> {
        self.get_trace(pid).ok()
    }
}
