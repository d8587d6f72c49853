use crate::{ErrorCode, WaveError, WaveResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch. Signed so that instants before an
/// event start produce negative elapsed times instead of wrapping.
pub type EpochMillis = i64;

pub fn now_epoch_millis() -> EpochMillis {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as EpochMillis
}

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> WaveResult<EpochMillis>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> WaveResult<EpochMillis> {
        let duration = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|err| {
            WaveError::new(
                ErrorCode::Unavailable,
                format!("system clock is before the epoch: {err}"),
            )
        })?;
        Ok(duration.as_millis() as EpochMillis)
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: EpochMillis) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: EpochMillis) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as EpochMillis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> WaveResult<EpochMillis> {
        Ok(self.now_ms.load(Ordering::SeqCst))
    }
}
