//! Outbound flood control and loop suppression.
//!
//! The send history is private to the outbound worker, so no locking is
//! needed here. Time comes from `tokio::time::Instant` so tests can run
//! under a paused clock.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Base spacing between two sends.
pub const BASE_DELAY: Duration = Duration::from_millis(400);
/// Upper bound on the spacing, however long the previous line.
pub const MAX_DELAY: Duration = Duration::from_secs(3);
/// Bytes that cost nothing beyond the base spacing.
pub const FREE_BYTES: usize = 50;
/// Bytes per extra second of spacing.
pub const BYTES_PER_SECOND: f64 = 70.0;
/// Number of recent sends remembered.
pub const HISTORY_LEN: usize = 10;
/// How far back identical sends count as a loop.
pub const LOOP_WINDOW: Duration = Duration::from_secs(5);
/// Identical sends within the window that trigger a drop.
pub const LOOP_THRESHOLD: usize = 3;

/// Tracks recent sends for one connection.
#[derive(Debug, Default)]
pub struct FloodGuard {
    history: VecDeque<(Instant, Vec<u8>)>,
}

impl FloodGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required spacing after sending `line`.
    pub fn spacing(line: &[u8]) -> Duration {
        let penalty = line.len().saturating_sub(FREE_BYTES) as f64 / BYTES_PER_SECOND;
        (BASE_DELAY + Duration::from_secs_f64(penalty)).min(MAX_DELAY)
    }

    /// How long to wait before sending `line` at `now`.
    ///
    /// Zero when nothing was sent yet.
    pub fn delay(&self, line: &[u8], now: Instant) -> Duration {
        let Some((last, _)) = self.history.back() else {
            return Duration::ZERO;
        };
        Self::spacing(line).saturating_sub(now.saturating_duration_since(*last))
    }

    /// True if `line` was already sent [`LOOP_THRESHOLD`] times within
    /// [`LOOP_WINDOW`] of `now`.
    pub fn is_looping(&self, line: &[u8], now: Instant) -> bool {
        let repeats = self
            .history
            .iter()
            .rev()
            .take_while(|(at, _)| now.saturating_duration_since(*at) <= LOOP_WINDOW)
            .filter(|(_, sent)| sent.as_slice() == line)
            .count();
        repeats >= LOOP_THRESHOLD
    }

    /// Remember a successful send.
    pub fn record(&mut self, line: &[u8], now: Instant) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back((now, line.to_vec()));
    }
}
