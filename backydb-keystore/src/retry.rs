//! Exponential backoff for transient failures (spec §4.1, §4.6).
//!
//! Shared by the Key Provider (3 attempts, 8s cap) and reused by
//! `backydb-core`'s Storage backends (5 attempts, 30s cap) since both are
//! "retry a fallible async op with doubling backoff" at heart.

use std::future::Future;
use std::time::Duration;

pub struct Backoff {
    pub attempts: u32,
    pub initial: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn new(attempts: u32, initial: Duration, cap: Duration) -> Self {
        Self { attempts, initial, cap }
    }

    /// The Key Provider's retry policy (spec §4.1: 3 attempts, 8s cap).
    pub fn keystore_policy() -> Self {
        Self::new(3, Duration::from_millis(250), Duration::from_secs(8))
    }

    /// Run `op`, retrying while `is_transient` returns true, doubling the
    /// delay each time up to `cap`. Returns the last error if all attempts
    /// are exhausted.
    pub async fn run<T, E, F, Fut>(&self, is_transient: impl Fn(&E) -> bool, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delay = self.initial;
        let mut last_err = None;
        for attempt in 0..self.attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt + 1 == self.attempts || !is_transient(&err) {
                        return Err(err);
                    }
                    tracing::warn!(attempt, ?delay, "transient failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.cap);
                    last_err = Some(err);
                }
            }
        }
        // Unreachable when attempts > 0, but keeps the compiler happy.
        Err(last_err.expect("at least one attempt always runs"))
    }
}
