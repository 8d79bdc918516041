//! Bounded retry with exponential backoff

/// Retry budget for a bring-up step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Delays to wait between consecutive attempts
    pub fn backoff(&self) -> Backoff {
        Backoff {
            remaining: self.max_attempts.saturating_sub(1),
            next_delay_ms: self.initial_delay_ms.min(self.max_delay_ms),
            max_delay_ms: self.max_delay_ms,
        }
    }

    /// Sum of all delays; the worst-case time a step can wait
    pub fn total_delay_ms(&self) -> u64 {
        self.backoff().fold(0u64, |acc, d| acc.saturating_add(d))
    }
}

/// Iterator over backoff delays
///
/// Yields `max_attempts - 1` delays, doubling from the initial delay and
/// capped at the maximum. `None` means the budget is exhausted.
#[derive(Debug, Clone)]
pub struct Backoff {
    remaining: u32,
    next_delay_ms: u64,
    max_delay_ms: u64,
}

impl Iterator for Backoff {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.next_delay_ms;
        self.next_delay_ms = delay.saturating_mul(2).min(self.max_delay_ms);
        Some(delay)
    }
}
