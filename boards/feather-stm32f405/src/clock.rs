#![deny(unsafe_code)]
//! embassy-time backed clock

use embassy_time::{Instant, Timer};
use hal_abstractions::Clock;

/// Milliseconds since boot from the embassy time driver
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn delay_ms(&mut self, ms: u64) {
        Timer::after_millis(ms).await;
    }
}
