//! Periodic polling: the fetch-and-notify cycle and its lifecycle-aware
//! scheduler.

mod cycle;
mod scheduler;

pub use cycle::{CycleReport, SyncCycle};
pub use scheduler::{PollingScheduler, DEFAULT_POLL_PERIOD};
