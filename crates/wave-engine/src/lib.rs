//! Wave observation engine: arbitrates the user's position, models how a
//! wave sweeps an event area over time and tells each observed event
//! whether the user is warming up, about to be hit, or has been hit.

pub mod arbiter;
pub mod breaker;
pub mod event;
pub mod model;
pub mod observer;
pub mod simulation;
pub mod source;
pub mod wave;

pub use arbiter::{ArbiterConfig, PositionArbiter, PositionSource, PositionState};
pub use breaker::CircuitBreaker;
pub use event::{AreaLoader, AreaSnapshot, EventArea, EventStatus, FileEventStore, WaveEvent};
pub use model::{WaveFront, WaveModel};
pub use observer::{EventObserver, ObserverState};
pub use simulation::Simulation;
pub use source::{connect, PositionProvider, PositionSink, SimulatedPositionSource};
pub use wave::{Direction, WarmingRule, WaveDefinition, WaveKind};
