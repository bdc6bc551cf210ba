//! Race-Averse Scheduling (RAS)
//!
//! A scheduling class that hands out timeslices in inverse proportion to how
//! much of a CPU's recent page-write activity a task accounts for. Tasks that
//! write a lot (and so are more likely to race on shared cache lines) get
//! short slices and rotate off the CPU sooner; quiet tasks get long ones.
//!
//! The crate is the class itself: per-CPU FIFO run queues, the weight and
//! timeslice calculator, the enqueue/dequeue/tick state machine and the SMP
//! placement heuristic. Everything the class needs from the surrounding
//! kernel (clocks, write counts, cgroup paths, reschedule IPIs) comes in
//! through [`scheduler::RasHost`].
//!
//! Nothing in here allocates or blocks.

#![cfg_attr(not(test), no_std)]

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logger::log($level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! kfatal {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::FATAL, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::ERROR, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::WARN, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::INFO, $($arg)*);
    }};
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::DEBUG, $($arg)*);
    }};
}

#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::klog!($crate::logger::LogLevel::TRACE, $($arg)*);
    }};
}

pub mod config;
pub mod error;
pub mod logger;
pub mod posix;
pub mod scheduler;
pub mod syscalls;
pub mod trace;

pub use config::RasConfig;
pub use error::RasError;
