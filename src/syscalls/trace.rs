//! Page-write tracing syscalls

use crate::error::RasError;
use crate::ktrace;
use crate::posix;
use crate::scheduler::Pid;
use crate::trace::TraceTable;

fn to_pid(pid: i64) -> Result<Pid, RasError> {
    if pid < 0 {
        return Err(RasError::NoSuchProcess);
    }
    Ok(pid as Pid)
}

#[inline]
fn to_return(result: Result<(), RasError>) -> i64 {
    match result {
        Ok(()) => 0,
        Err(err) => posix::errno_return(err.errno()),
    }
}

/// Zero the pid's write count and start counting.
///
/// `-ESRCH` for an unknown pid, `-EINVAL` if tracing is already on.
pub fn sys_start_trace(table: &TraceTable, pid: i64) -> i64 {
    ktrace!("[SYS_START_TRACE] pid={}", pid);
    to_return(to_pid(pid).and_then(|pid| table.start_trace(pid)))
}

/// Stop counting for the pid; already stopped is not an error.
pub fn sys_stop_trace(table: &TraceTable, pid: i64) -> i64 {
    ktrace!("[SYS_STOP_TRACE] pid={}", pid);
    to_return(to_pid(pid).and_then(|pid| table.stop_trace(pid)))
}

/// Store the pid's current write count in `out`.
pub fn sys_get_trace(table: &TraceTable, pid: i64, out: &mut u64) -> i64 {
    ktrace!("[SYS_GET_TRACE] pid={}", pid);
    match to_pid(pid).and_then(|pid| table.get_trace(pid)) {
        Ok(wcounts) => {
            *out = wcounts;
            0
        }
        Err(err) => posix::errno_return(err.errno()),
    }
}
