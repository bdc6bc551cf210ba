//! Syscall subsystem
//!
//! Control surface for the page-write tracer:
//!
//! - `numbers`: Syscall number constants
//! - `trace`: start_trace, stop_trace, get_trace
//!
//! Every handler returns `0` on success or `-errno` on failure.

use crate::kdebug;
use crate::posix::{self, errno};
use crate::trace::TraceTable;

mod numbers;
mod trace;

// Re-export syscall numbers for external use
pub use numbers::*;

pub use trace::{sys_get_trace, sys_start_trace, sys_stop_trace};

/// Arguments decoded by the architecture entry stub
#[derive(Debug)]
pub enum SyscallArgs<'a> {
    /// `pid` only
    Pid(i64),
    /// `pid` plus the caller's result slot
    PidOut(i64, &'a mut u64),
}

impl SyscallArgs<'_> {
    fn pid(&self) -> i64 {
        match self {
            SyscallArgs::Pid(pid) | SyscallArgs::PidOut(pid, _) => *pid,
        }
    }
}

/// Route a tracing syscall to its handler
pub fn syscall_dispatch(table: &TraceTable, nr: u64, args: SyscallArgs<'_>) -> i64 {
    let result = match (nr, args) {
        (SYS_START_TRACE, args) => sys_start_trace(table, args.pid()),
        (SYS_STOP_TRACE, args) => sys_stop_trace(table, args.pid()),
        (SYS_GET_TRACE, SyscallArgs::PidOut(pid, out)) => sys_get_trace(table, pid, out),
        (SYS_GET_TRACE, SyscallArgs::Pid(_)) => posix::errno_return(errno::EINVAL),
        _ => posix::errno_return(errno::ENOSYS),
    };

    if result < 0 {
        kdebug!("[syscall_dispatch] nr={} failed: {}", nr, result);
    }
    result
}
