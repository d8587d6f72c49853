use std::time::Duration;
use tokio::time::Instant;

/// Counts consecutive evaluation failures and suspends evaluation for a
/// cooldown once the threshold is reached. After the cooldown the next
/// failure reopens it straight away; a success closes it.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            open_until: None,
        }
    }

    pub fn is_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.open_until = None;
    }

    pub fn record_failure(&mut self, now: Instant) -> bool {
        if self.open_until.is_some_and(|until| now >= until) {
            // Half-open: one more failure is enough.
            self.open_until = None;
            self.consecutive_failures = self.threshold - 1;
        }
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.threshold && self.open_until.is_none() {
            self.open_until = Some(now + self.cooldown);
            return true;
        }
        false
    }
}
