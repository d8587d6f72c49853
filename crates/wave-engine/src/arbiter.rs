use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use wave_config::EngineConfig;
use wave_core::{ErrorCode, WaveError, WaveResult};
use wave_geo::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Gps,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionState {
    pub position: Position,
    pub source: PositionSource,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbiterConfig {
    pub debounce: Duration,
    pub priority_window: Duration,
    pub epsilon_deg: f64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ArbiterConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            debounce: config.position_debounce,
            priority_window: config.priority_window,
            epsilon_deg: config.position_epsilon_deg,
        }
    }
}

#[derive(Debug, Default)]
struct ArbiterInner {
    authoritative: Option<PositionState>,
    generation: u64,
}

/// Single source of truth for the user's position.
///
/// Updates from a lower-ranked source are dropped while a higher-ranked one
/// has spoken within the priority window. Accepted updates go through a
/// trailing debounce and are published only when they move by at least the
/// epsilon, so subscribers see one deduplicated stream whatever the feeds.
#[derive(Debug)]
pub struct PositionArbiter {
    inner: Arc<Mutex<ArbiterInner>>,
    published: Arc<watch::Sender<Option<Position>>>,
    config: ArbiterConfig,
    runtime: Handle,
}

impl PositionArbiter {
    /// Must be called from inside a tokio runtime; the debounce timers run on it.
    pub fn new(config: ArbiterConfig) -> WaveResult<Self> {
        let runtime = Handle::try_current().map_err(|err| {
            WaveError::new(
                ErrorCode::Unavailable,
                format!("position arbiter needs a tokio runtime: {err}"),
            )
        })?;
        let (published, _) = watch::channel(None);
        Ok(Self {
            inner: Arc::new(Mutex::new(ArbiterInner::default())),
            published: Arc::new(published),
            config,
            runtime,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Position>> {
        self.published.subscribe()
    }

    pub fn current(&self) -> Option<Position> {
        *self.published.borrow()
    }

    pub fn authoritative(&self) -> Option<PositionState> {
        lock(&self.inner).authoritative
    }

    pub fn update_raw(&self, lat: f64, lng: f64, source: PositionSource) -> WaveResult<bool> {
        match Position::new(lat, lng) {
            Ok(position) => Ok(self.update(position, source)),
            Err(err) => {
                tracing::warn!(?source, lat, lng, error = %err, "Rejected invalid position");
                metrics::counter!("wave_positions_rejected_total", "reason" => "invalid")
                    .increment(1);
                Err(err)
            }
        }
    }

    /// Offers a position. Returns false when a higher-priority source holds
    /// the position and the update was dropped.
    pub fn update(&self, position: Position, source: PositionSource) -> bool {
        let now = Instant::now();
        let generation = {
            let mut inner = lock(&self.inner);
            if let Some(current) = inner.authoritative {
                if source < current.source
                    && now.duration_since(current.timestamp) < self.config.priority_window
                {
                    tracing::trace!(?source, holder = ?current.source, "Position update outranked");
                    metrics::counter!("wave_positions_rejected_total", "reason" => "priority")
                        .increment(1);
                    return false;
                }
                if current.source != source {
                    tracing::debug!(from = ?current.source, to = ?source, "Position source switched");
                }
            }
            inner.authoritative = Some(PositionState {
                position,
                source,
                timestamp: now,
            });
            inner.generation = inner.generation.wrapping_add(1);
            inner.generation
        };

        if self.config.debounce.is_zero() {
            publish(&self.published, position, self.config.epsilon_deg);
            return true;
        }

        let inner = Arc::clone(&self.inner);
        let published = Arc::clone(&self.published);
        let debounce = self.config.debounce;
        let epsilon = self.config.epsilon_deg;
        self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let settled = {
                let inner = lock(&inner);
                if inner.generation != generation {
                    return;
                }
                inner.authoritative.map(|state| state.position)
            };
            if let Some(position) = settled {
                publish(&published, position, epsilon);
            }
        });
        true
    }

    /// Gives up the authority of `source` so lower-ranked feeds are accepted
    /// right away, e.g. when a simulation stops.
    pub fn release(&self, source: PositionSource) {
        let mut inner = lock(&self.inner);
        if inner.authoritative.is_some_and(|state| state.source == source) {
            tracing::debug!(?source, "Position source released");
            inner.authoritative = None;
            inner.generation = inner.generation.wrapping_add(1);
        }
    }

    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        inner.authoritative = None;
        inner.generation = inner.generation.wrapping_add(1);
        self.published.send_replace(None);
    }
}

fn publish(sender: &watch::Sender<Option<Position>>, position: Position, epsilon: f64) {
    sender.send_if_modified(|current| match current {
        Some(previous) if previous.approx_eq(&position, epsilon) => false,
        _ => {
            *current = Some(position);
            true
        }
    });
}

fn lock(inner: &Mutex<ArbiterInner>) -> MutexGuard<'_, ArbiterInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn arbiter() -> PositionArbiter {
        PositionArbiter::new(ArbiterConfig::default()).unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn simulation_outranks_gps_inside_the_window() {
        let arbiter = arbiter();
        let simulated = pos(48.8566, 2.3522);
        assert!(arbiter.update(simulated, PositionSource::Simulation));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!arbiter.update(pos(40.0, -3.0), PositionSource::Gps));
        settle().await;
        assert_eq!(arbiter.current(), Some(simulated));
    }

    #[tokio::test(start_paused = true)]
    async fn gps_takes_over_once_the_window_expires() {
        let arbiter = arbiter();
        arbiter.update(pos(48.8566, 2.3522), PositionSource::Simulation);
        settle().await;
        let gps = pos(40.0, -3.0);
        assert!(arbiter.update(gps, PositionSource::Gps));
        settle().await;
        assert_eq!(arbiter.current(), Some(gps));
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_debounce_emits_only_the_last_value() {
        let arbiter = arbiter();
        let mut rx = arbiter.subscribe();
        for i in 0..5_u8 {
            arbiter.update(pos(10.0 + f64::from(i), 10.0), PositionSource::Gps);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(arbiter.current(), None);
        settle().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some(pos(14.0, 10.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_inside_epsilon_is_not_republished() {
        let arbiter = arbiter();
        let mut rx = arbiter.subscribe();
        arbiter.update(pos(10.0, 10.0), PositionSource::Gps);
        settle().await;
        rx.borrow_and_update();

        arbiter.update(pos(10.00004, 10.00003), PositionSource::Gps);
        settle().await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(arbiter.current(), Some(pos(10.0, 10.0)));

        arbiter.update(pos(10.001, 10.0), PositionSource::Gps);
        settle().await;
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_coordinates_never_reach_the_state() {
        let arbiter = arbiter();
        assert!(arbiter.update_raw(f64::NAN, 0.0, PositionSource::Gps).is_err());
        assert!(arbiter.update_raw(0.0, 190.0, PositionSource::Gps).is_err());
        assert!(arbiter.authoritative().is_none());
        assert!(arbiter.update_raw(1.0, 2.0, PositionSource::Gps).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn release_lets_gps_in_immediately() {
        let arbiter = arbiter();
        arbiter.update(pos(1.0, 1.0), PositionSource::Simulation);
        arbiter.release(PositionSource::Simulation);
        let gps = pos(2.0, 2.0);
        assert!(arbiter.update(gps, PositionSource::Gps));
        settle().await;
        assert_eq!(arbiter.current(), Some(gps));

        arbiter.clear();
        assert_eq!(arbiter.current(), None);
        assert!(arbiter.authoritative().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_debounce_publishes_synchronously() {
        let config = ArbiterConfig {
            debounce: Duration::ZERO,
            ..ArbiterConfig::default()
        };
        let arbiter = PositionArbiter::new(config).unwrap();
        arbiter.update(pos(3.0, 3.0), PositionSource::Gps);
        assert_eq!(arbiter.current(), Some(pos(3.0, 3.0)));
    }

    #[test]
    fn construction_outside_a_runtime_fails() {
        assert!(PositionArbiter::new(ArbiterConfig::default()).is_err());
    }
}
