//! RAS scheduling class tests
//!
//! Drive the class through [`ras_sched::scheduler::RasScheduler`] with a mock
//! host and check run queue state after every step.


mod consistency;
mod runqueue;
mod weight;
