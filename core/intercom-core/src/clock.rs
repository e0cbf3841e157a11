//! The supervisor's tick clock.

use intercom_types::Tick;
use std::time::Duration;

/// Counts loop iterations. Time in the core only moves through [`TickClock::tick`].
#[derive(Debug, Clone)]
pub struct TickClock {
    now: Tick,
    period: Duration,
}

impl TickClock {
    pub fn new(period: Duration) -> Self {
        Self {
            now: Tick::ZERO,
            period,
        }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Wall time of one tick.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Advances one tick and returns the new current tick.
    pub fn tick(&mut self) -> Tick {
        self.now = self.now.next();
        self.now
    }

    /// Sleeps one loop period.
    pub async fn sleep(&self) {
        tokio::time::sleep(self.period).await;
    }

    /// Sleeps one loop period, then advances.
    pub async fn advance(&mut self) -> Tick {
        self.sleep().await;
        self.tick()
    }

    /// Time since boot at the configured period.
    pub fn uptime(&self) -> Duration {
        self.now.as_duration(self.period)
    }
}
