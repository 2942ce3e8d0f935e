//! `TickSource` implementations.
//!
//! - [`IntervalTicks`] fires every `period` on a tokio timer, optionally
//!   stopping after a fixed number of ticks.  The first tick comes one
//!   period after creation, not immediately.
//! - [`ManualTicks`] fires whenever its [`TickHandle`] says so, and ends
//!   when every handle has been dropped.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::application::dashboard::TickSource;

pub struct IntervalTicks {
    interval: Interval,
    remaining: Option<u64>,
}

impl IntervalTicks {
    /// Ticks forever, every `period`.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            remaining: None,
        }
    }

    /// Ticks `count` times, every `period`.
    pub fn limited(period: Duration, count: u64) -> Self {
        Self {
            remaining: Some(count),
            ..Self::new(period)
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        match &mut self.remaining {
            Some(0) => return false,
            Some(n) => *n -= 1,
            None => {}
        }
        self.interval.tick().await;
        true
    }
}

/// Tick source driven by explicit [`TickHandle::tick`] calls.
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Sender half of [`ManualTicks`].
#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicks {
    pub fn channel() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, TickHandle { tx })
    }
}

impl TickHandle {
    /// Delivers one tick.  Returns `false` if the source is gone.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_limited_interval_stops_after_count() {
        let mut ticks = IntervalTicks::limited(Duration::from_secs(5), 3);
        let start = Instant::now();

        let mut fired = 0;
        while ticks.next_tick().await {
            fired += 1;
        }

        assert_eq!(fired, 3);
        assert!(Instant::now() - start >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_interval_tick_waits_one_period() {
        let mut ticks = IntervalTicks::new(Duration::from_secs(5));
        let start = Instant::now();

        assert!(ticks.next_tick().await);

        assert!(Instant::now() - start >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_manual_ticks_end_when_handle_dropped() {
        let (mut ticks, handle) = ManualTicks::channel();
        assert!(handle.tick());
        assert!(handle.tick());
        drop(handle);

        assert!(ticks.next_tick().await);
        assert!(ticks.next_tick().await);
        assert!(!ticks.next_tick().await);
    }
}
