use crate::domain::ports::Ticker;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Wall-clock ticker. The first tick fires one full period after creation,
/// and ticks missed while a handler runs are delayed rather than bunched up.
pub struct IntervalTicker {
    interval: Interval,
    shutdown: watch::Receiver<bool>,
}

impl IntervalTicker {
    pub fn new(period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, shutdown }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        loop {
            if *self.shutdown.borrow() {
                return false;
            }

            tokio::select! {
                _ = self.interval.tick() => return true,
                changed = self.shutdown.changed() => {
                    // 發送端被丟掉也當作關機
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}

/// 測試用：每送一個 `()` 就觸發一次 tick，通道關閉就停止
pub struct ManualTicker {
    receiver: mpsc::UnboundedReceiver<()>,
}

impl ManualTicker {
    pub fn channel() -> (mpsc::UnboundedSender<()>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.receiver.recv().await.is_some()
    }
}
