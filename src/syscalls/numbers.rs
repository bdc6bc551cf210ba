//! System call numbers for the page-write tracing interface
//!
//! Numbers follow the kernel this class was first built for, where they sit
//! right after the architecture's last generic syscall.

pub const SYS_START_TRACE: u64 = 361;
pub const SYS_STOP_TRACE: u64 = 362;
pub const SYS_GET_TRACE: u64 = 363;
