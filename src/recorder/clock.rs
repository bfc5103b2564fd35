//! Elapsed time and the synthetic viewer count
//!
//! The viewer count is a bounded random walk. It only illustrates a live
//! audience; nothing here tracks real viewers.

use super::state::SessionMode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest per-tick change of the viewer count
pub const VIEWER_STEP_MIN: i64 = -1;

/// Largest per-tick change of the viewer count
pub const VIEWER_STEP_MAX: i64 = 2;

/// Values after one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub elapsed_secs: u64,
    pub viewers: u32,
}

/// Apply one random-walk step, clamping at zero
pub fn perturb_viewers(viewers: u32, step: i64) -> u32 {
    (i64::from(viewers) + step).clamp(0, i64::from(u32::MAX)) as u32
}

/// Mode, elapsed seconds and viewer count, shared with the tick task
#[derive(Debug)]
pub struct SessionClock {
    mode: SessionMode,
    elapsed_secs: u64,
    viewers: u32,
    peak_viewers: u32,
    rng: StdRng,
}

impl SessionClock {
    pub fn new(rng: StdRng) -> Self {
        Self {
            mode: SessionMode::Idle,
            elapsed_secs: 0,
            viewers: 0,
            peak_viewers: 0,
            rng,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn viewers(&self) -> u32 {
        self.viewers
    }

    pub fn peak_viewers(&self) -> u32 {
        self.peak_viewers
    }

    /// Enter `mode` with the counters reset
    pub fn begin(&mut self, mode: SessionMode) {
        self.mode = mode;
        self.elapsed_secs = 0;
        self.viewers = if mode == SessionMode::Live { 1 } else { 0 };
        self.peak_viewers = self.viewers;
    }

    /// Return to idle. Elapsed time is kept for display until the next start.
    pub fn end(&mut self) {
        self.mode = SessionMode::Idle;
        self.viewers = 0;
    }

    /// Advance by one tick. Returns `None` while idle.
    pub fn tick(&mut self) -> Option<TickReport> {
        if !self.mode.is_active() {
            return None;
        }

        self.elapsed_secs += 1;
        if self.mode == SessionMode::Live {
            let step = self.rng.gen_range(VIEWER_STEP_MIN..=VIEWER_STEP_MAX);
            self.viewers = perturb_viewers(self.viewers, step);
            self.peak_viewers = self.peak_viewers.max(self.viewers);
        }

        Some(TickReport {
            elapsed_secs: self.elapsed_secs,
            viewers: self.viewers,
        })
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}
