//! Recurring polling scheduler.
//!
//! One state machine (stopped, scheduled, running, back to scheduled) with a
//! single in-flight guard: a tick that fires while a cycle is still running
//! is skipped, not queued. On platforms without OS-level background
//! execution the timer is cancelled on pause and re-armed with an immediate
//! catch-up fetch on resume; until then delivery waits for the next
//! foreground session. That gap is a platform limitation, not a bug.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::SyncCycle;

/// Default polling period.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Lifecycle-aware recurring scheduler for the fetch-and-notify cycle.
pub struct PollingScheduler {
    cycle: Arc<SyncCycle>,
    period: Duration,
    background_capable: bool,
    in_flight: Arc<tokio::sync::Mutex<()>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    scheduled: Arc<AtomicBool>,
    ticks_skipped: Arc<AtomicU64>,
}

impl PollingScheduler {
    /// Create a scheduler.
    ///
    /// `background_capable` states whether the host platform keeps this
    /// process running while the app is not visible; when false the timer
    /// is suspended on pause.
    pub fn new(cycle: Arc<SyncCycle>, period: Duration, background_capable: bool) -> Self {
        Self {
            cycle,
            period,
            background_capable,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
            timer: Mutex::new(None),
            scheduled: Arc::new(AtomicBool::new(false)),
            ticks_skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether the recurring timer is armed.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Ticks skipped because a cycle was still in flight.
    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped.load(Ordering::Relaxed)
    }

    /// Arm the recurring timer. The first cycle runs immediately.
    ///
    /// Starting an already scheduled scheduler is a no-op.
    pub fn start(&self) {
        if self.scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let cycle = Arc::clone(&self.cycle);
        let in_flight = Arc::clone(&self.in_flight);
        let ticks_skipped = Arc::clone(&self.ticks_skipped);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                spawn_cycle(
                    Arc::clone(&cycle),
                    Arc::clone(&in_flight),
                    Arc::clone(&ticks_skipped),
                );
            }
        });

        *self.timer.lock().unwrap() = Some(handle);
        tracing::debug!(period_secs = self.period.as_secs(), "Polling scheduled");
    }

    /// Disarm the timer.
    ///
    /// Only future ticks are prevented; a cycle already in flight runs to
    /// completion, so notifications mid-dispatch are never dropped.
    pub fn stop(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
        tracing::debug!("Polling stopped");
    }

    /// Trigger one out-of-band cycle, sharing the in-flight guard with the
    /// scheduled ticks.
    pub fn run_now(&self) {
        spawn_cycle(
            Arc::clone(&self.cycle),
            Arc::clone(&self.in_flight),
            Arc::clone(&self.ticks_skipped),
        );
    }

    /// The host application moved to a paused/backgrounded state.
    pub fn on_pause(&self) {
        if self.background_capable {
            tracing::debug!("App paused, background facility keeps polling");
            return;
        }
        self.stop();
    }

    /// The host application resumed the foreground.
    ///
    /// Fires an immediate catch-up fetch and re-arms the timer, bounding
    /// the missed-gift window to the polling period while foregrounded.
    pub fn on_resume(&self) {
        if self.is_scheduled() {
            self.run_now();
            return;
        }
        // start() runs the first cycle immediately, which doubles as the
        // catch-up fetch.
        self.start();
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

/// Run one cycle unless another is still in flight; an overlapping run is
/// skipped, never queued.
fn spawn_cycle(
    cycle: Arc<SyncCycle>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
    ticks_skipped: Arc<AtomicU64>,
) {
    let Ok(guard) = Arc::clone(&in_flight).try_lock_owned() else {
        ticks_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Cycle still in flight, skipping tick");
        return;
    };

    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = cycle.run().await {
            tracing::warn!(error = %e, "Cycle failed, retrying on next tick");
        }
    });
}
