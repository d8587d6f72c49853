use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use wave_config::SimulationConfig;
use wave_core::{Clock, EpochMillis, WaveError, WaveResult};

#[derive(Debug, Clone, Copy)]
struct Anchor {
    real_ms: EpochMillis,
    simulated_ms: EpochMillis,
    speed: f64,
}

/// Accelerated time for demos and tests. Simulated time starts at a chosen
/// instant and runs `speed` times faster than the underlying clock; changing
/// the speed re-anchors so simulated time never jumps.
pub struct Simulation {
    base: Arc<dyn Clock>,
    anchor: Mutex<Anchor>,
    looping: bool,
    speed_tx: watch::Sender<f64>,
}

impl Simulation {
    pub fn new(
        base: Arc<dyn Clock>,
        start_ms: EpochMillis,
        speed: f64,
        looping: bool,
    ) -> WaveResult<Self> {
        validate_speed(speed)?;
        let anchor = Anchor {
            real_ms: base.now_ms()?,
            simulated_ms: start_ms,
            speed,
        };
        let (speed_tx, _) = watch::channel(speed);
        Ok(Self {
            base,
            anchor: Mutex::new(anchor),
            looping,
            speed_tx,
        })
    }

    pub fn from_config(
        base: Arc<dyn Clock>,
        start_ms: EpochMillis,
        config: &SimulationConfig,
    ) -> WaveResult<Self> {
        Self::new(base, start_ms, config.speed, config.looping)
    }

    pub fn speed(&self) -> f64 {
        *self.speed_tx.borrow()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn subscribe_speed(&self) -> watch::Receiver<f64> {
        self.speed_tx.subscribe()
    }

    pub fn set_speed(&self, speed: f64) -> WaveResult<()> {
        validate_speed(speed)?;
        let real_now = self.base.now_ms()?;
        {
            let mut anchor = self.lock();
            let simulated_now = project(&anchor, real_now);
            *anchor = Anchor {
                real_ms: real_now,
                simulated_ms: simulated_now,
                speed,
            };
        }
        tracing::info!(speed, "Simulation speed changed");
        self.speed_tx.send_if_modified(|current| {
            if *current == speed {
                false
            } else {
                *current = speed;
                true
            }
        });
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Anchor> {
        self.anchor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for Simulation {
    fn now_ms(&self) -> WaveResult<EpochMillis> {
        let real_now = self.base.now_ms()?;
        Ok(project(&self.lock(), real_now))
    }
}

fn project(anchor: &Anchor, real_now: EpochMillis) -> EpochMillis {
    let real_elapsed = (real_now - anchor.real_ms) as f64;
    anchor.simulated_ms + (real_elapsed * anchor.speed).round() as EpochMillis
}

fn validate_speed(speed: f64) -> WaveResult<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(WaveError::Validation(vec![format!(
            "simulation speed must be a positive number, got {speed}"
        )]))
    }
}
