//! Background polling timers.
//!
//! A timer never touches app state. It only sends [`AppMessage::PollTick`]
//! into the loop, tagged with the generation it was started under.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::AppMessage;

/// Recurring tick for one module. Dropping it stops the ticks.
#[derive(Debug)]
pub struct PollTimer {
    module: String,
    handle: JoinHandle<()>,
}

impl PollTimer {
    pub fn start(
        module: impl Into<String>,
        generation: u64,
        interval: Duration,
        tx: mpsc::UnboundedSender<AppMessage>,
    ) -> Self {
        let module = module.into();
        let tick_module = module.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let tick = AppMessage::PollTick {
                    generation,
                    module: tick_module.clone(),
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(module = %module, generation, ?interval, "poll timer started");
        Self { module, handle }
    }

    pub fn module(&self) -> &str {
        &self.module
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _timer = PollTimer::start("queues", 7, Duration::from_secs(5), tx);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());

        let tick = rx.recv().await.unwrap();
        assert!(matches!(
            tick,
            AppMessage::PollTick { generation: 7, ref module } if module == "queues"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = PollTimer::start("queues", 1, Duration::from_secs(1), tx);
        drop(timer);

        tokio::time::sleep(Duration::from_secs(3)).await;
        // The aborted task dropped its sender, closing the channel.
        assert!(rx.recv().await.is_none());
    }
}
