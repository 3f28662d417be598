//! One-second ticker for the rest countdown
//!
//! A tokio task sends a tick per period over an unbounded channel. The
//! task is aborted on `stop()` and when the `Ticker` is dropped, so no
//! tick outlives the rest period that asked for it.

use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

pub const TICK: Duration = Duration::from_secs(1);

pub struct Ticker {
    rx: UnboundedReceiver<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// First tick arrives one `period` after spawning
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        debug!(?period, "ticker spawned");
        Self { rx, handle }
    }

    pub fn every_second() -> Self {
        Self::spawn(TICK)
    }

    /// Ticks received since the last call, without waiting
    pub fn drain(&mut self) -> usize {
        let mut ticks = 0;
        while self.rx.try_recv().is_ok() {
            ticks += 1;
        }
        ticks
    }

    /// Wait for the next tick. `None` once the task is gone.
    pub async fn next_tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    pub fn stop(&mut self) {
        self.handle.abort();
        debug!("ticker stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let mut ticker = Ticker::every_second();
        assert_eq!(ticker.drain(), 0);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticker.drain(), 3);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ticker.drain(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_tick_waits() {
        let mut ticker = Ticker::every_second();
        let started = Instant::now();
        assert_eq!(ticker.next_tick().await, Some(()));
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_ticks() {
        let mut ticker = Ticker::every_second();
        time::sleep(Duration::from_millis(1500)).await;
        ticker.stop();
        ticker.drain();

        // Channel closes once the aborted task drops its sender
        assert_eq!(ticker.next_tick().await, None);
        assert!(ticker.is_finished());
    }
}
