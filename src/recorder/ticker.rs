//! Repeating one-second tick
//!
//! At most one tick task exists per session. Starting replaces the previous
//! task and stopping aborts it, so start/stop cycles never pile up timers.

use super::clock::{SessionClock, TickReport};
use super::events::SessionEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Advance the clock by one tick and publish the result
pub fn advance(
    clock: &Mutex<SessionClock>,
    events: &broadcast::Sender<SessionEvent>,
) -> Option<TickReport> {
    let report = clock.lock().tick()?;
    tracing::debug!(
        "Tick: {}s elapsed, {} viewers",
        report.elapsed_secs,
        report.viewers
    );
    let _ = events.send(SessionEvent::Tick {
        elapsed_secs: report.elapsed_secs,
        viewers: report.viewers,
    });
    Some(report)
}

/// Owner of the tick task
#[derive(Debug, Default)]
pub struct Ticker {
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Start ticking every `period` on `runtime`, replacing any running task
    pub fn start(
        &mut self,
        runtime: &Handle,
        clock: Arc<Mutex<SessionClock>>,
        period: Duration,
        events: broadcast::Sender<SessionEvent>,
    ) {
        self.stop();

        self.task = Some(runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if advance(&clock, &events).is_none() {
                    break;
                }
            }
        }));
    }

    /// Cancel the tick task; no further ticks are delivered
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
