use crate::arbiter::{PositionArbiter, PositionSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use wave_core::{ErrorCode, WaveError, WaveResult};
use wave_geo::Position;

pub type PositionSink = Arc<dyn Fn(Position) + Send + Sync>;

pub trait PositionProvider: Send + Sync {
    fn kind(&self) -> PositionSource;
    fn start_updates(&self, sink: PositionSink);
    fn stop_updates(&self);
}

pub fn connect(arbiter: &Arc<PositionArbiter>, provider: &dyn PositionProvider) {
    let kind = provider.kind();
    let arbiter = Arc::clone(arbiter);
    provider.start_updates(Arc::new(move |position| {
        arbiter.update(position, kind);
    }));
}

/// Replays a fixed path, one point per interval. Loops over the path when
/// asked to, otherwise stops on its last point.
pub struct SimulatedPositionSource {
    path: Vec<Position>,
    interval: Duration,
    looping: bool,
    runtime: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedPositionSource {
    pub fn new(path: Vec<Position>, interval: Duration, looping: bool) -> WaveResult<Self> {
        if path.is_empty() {
            return Err(WaveError::invalid("simulated path needs at least one position"));
        }
        if interval.is_zero() {
            return Err(WaveError::invalid("simulated path interval must be positive"));
        }
        let runtime = Handle::try_current().map_err(|err| {
            WaveError::new(
                ErrorCode::Unavailable,
                format!("simulated position source needs a tokio runtime: {err}"),
            )
        })?;
        Ok(Self {
            path,
            interval,
            looping,
            runtime,
            task: Mutex::new(None),
        })
    }

    pub fn stationary(position: Position) -> WaveResult<Self> {
        Self::new(vec![position], Duration::from_secs(1), false)
    }

    pub fn is_running(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PositionProvider for SimulatedPositionSource {
    fn kind(&self) -> PositionSource {
        PositionSource::Simulation
    }

    fn start_updates(&self, sink: PositionSink) {
        let path = self.path.clone();
        let interval = self.interval;
        let looping = self.looping;
        let task = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut index = 0;
            loop {
                ticker.tick().await;
                sink(path[index]);
                index += 1;
                if index == path.len() {
                    if !looping {
                        break;
                    }
                    index = 0;
                }
            }
        });
        if let Some(previous) = self.slot().replace(task) {
            previous.abort();
        }
    }

    fn stop_updates(&self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedPositionSource {
    fn drop(&mut self) {
        self.stop_updates();
    }
}
