//! Background probing of monitors.
//!
//! [`scheduler::MonitorScheduler`] keeps one task per non-paused monitor,
//! each task runs [`probe::probe`] on the monitor's interval and hands the
//! result to the [`check_writer::CheckWriter`], which owns all check inserts.

pub mod check_writer;
pub mod probe;
pub mod scheduler;

pub use check_writer::CheckWriter;
pub use probe::{ProbeTarget, probe};
pub use scheduler::MonitorScheduler;
