/// POSIX style error numbers (subset used by the scheduling class and the
/// tracing syscalls).
pub mod errno {
    pub const EPERM: i32 = 1; // Operation not permitted
    pub const ESRCH: i32 = 3; // No such process
    pub const ENOMEM: i32 = 12; // Out of memory
    pub const EBUSY: i32 = 16; // Device or resource busy
    pub const EEXIST: i32 = 17; // File exists
    pub const EINVAL: i32 = 22; // Invalid argument
    pub const ENOSYS: i32 = 38; // Function not implemented
}

/// Syscall return value for a failed call (`-errno`).
#[inline]
pub const fn errno_return(code: i32) -> i64 {
    -(code as i64)
}
