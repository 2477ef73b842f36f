//! Exponential-backoff policy for the hub connection.
//!
//! Every redial, whether after a failed connect or after a session that
//! ended, waits out the current delay first. The delay only drops back to
//! [`ReconnectConfig::initial_delay`] once a session has stayed up for
//! [`ReconnectConfig::stable_after`]; a hub that accepts and immediately
//! drops the socket therefore sees the same growing delays as one that
//! refuses it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first redial.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// A session that lasted at least this long resets the backoff.
    pub stable_after: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            stable_after: Duration::from_secs(10),
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Backoff state for one push source.
#[derive(Debug)]
pub struct Backoff {
    config: ReconnectConfig,
    delay: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        let delay = config.initial_delay;
        Self {
            config,
            delay,
            attempt: 0,
        }
    }

    /// Number of redials since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Register a redial and return how long to wait before it.
    pub fn next_wait(&mut self) -> Duration {
        let wait = self.delay;
        self.attempt += 1;
        self.delay = next_delay(self.delay, &self.config);
        wait
    }

    /// Account for a finished session. Returns `true` when the session was
    /// long enough to reset the delay.
    pub fn session_ended(&mut self, lasted: Duration) -> bool {
        if lasted >= self.config.stable_after {
            self.delay = self.config.initial_delay;
            self.attempt = 0;
            true
        } else {
            false
        }
    }
}

/// Sleep for `delay` unless `cancel` fires first. Returns `false` when
/// cancelled.
pub async fn wait_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
