//! Periodic wall-clock ticks with an explicit teardown.

use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A background task calling `on_tick` with the current time once per period.
///
/// Call [`ClockSource::shutdown`] to stop it and wait until the task is gone.
/// Dropping the source aborts the task as well, without waiting.
#[derive(Debug)]
pub struct ClockSource {
    handle: Option<JoinHandle<()>>,
}

impl ClockSource {
    /// Start ticking. Must be called from within a tokio runtime.
    ///
    /// The first call to `on_tick` happens one `period` after spawning.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(DateTime<Local>) + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                on_tick(Local::now());
            }
        });

        tracing::debug!(?period, "clock source started");
        Self { handle: Some(handle) }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking. Once this returns `on_tick` will not be called again.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // JoinError::Cancelled is the expected outcome here.
            let _ = handle.await;
            tracing::debug!("clock source stopped");
        }
    }
}

impl Drop for ClockSource {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn counting_clock(period: Duration) -> (ClockSource, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let clock = ClockSource::spawn(period, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (clock, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (clock, ticks) = counting_clock(TICK_PERIOD);
        assert!(clock.is_running());

        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        clock.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_shutdown() {
        let (clock, ticks) = counting_clock(TICK_PERIOD);

        time::sleep(Duration::from_millis(1_500)).await;
        clock.shutdown().await;
        let seen = ticks.load(Ordering::SeqCst);

        time::sleep(TICK_PERIOD * 5).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_task() {
        let (clock, ticks) = counting_clock(TICK_PERIOD);
        drop(clock);

        time::sleep(TICK_PERIOD * 3).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
