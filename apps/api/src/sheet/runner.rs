//! Bounded concurrency runner for per-card fetch units.
//!
//! At most `limit` units are in flight; a finished unit immediately frees its
//! slot for the next queued one. Unit starts are spaced globally by
//! `min_delay` so the upstream image/text hosts see a steady request rate.
//! Results come back index-aligned with the input regardless of completion order.
//!
//! Everything runs cooperatively on the caller's task, so units may borrow
//! from the caller and need not be `'static`.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);

/// Runs every unit with at most `limit` in flight (a limit of 0 is treated as 1).
///
/// With a non-zero `min_delay`, every start except the first waits `min_delay`
/// and is also at least `min_delay` after the previous start across all workers.
pub async fn run_with_concurrency<T, F, Fut>(tasks: Vec<F>, limit: usize, min_delay: Duration) -> Vec<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    if tasks.is_empty() {
        return Vec::new();
    }

    let limit = limit.max(1);
    let gate = StartGate::new(min_delay);
    let gate = &gate;

    let mut finished: Vec<(usize, T)> = stream::iter(tasks.into_iter().enumerate())
        .map(|(index, task)| async move {
            gate.wait_turn(index).await;
            (index, task().await)
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    finished.sort_by_key(|(index, _)| *index);
    finished.into_iter().map(|(_, value)| value).collect()
}

/// Serializes unit starts so consecutive starts are at least `min_delay` apart.
struct StartGate {
    min_delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl StartGate {
    fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_start: Mutex::new(None),
        }
    }

    async fn wait_turn(&self, index: usize) {
        if self.min_delay.is_zero() {
            return;
        }
        if index > 0 {
            tokio::time::sleep(self.min_delay).await;
        }

        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            tokio::time::sleep_until(previous + self.min_delay).await;
        }
        *last_start = Some(Instant::now());
    }
}
