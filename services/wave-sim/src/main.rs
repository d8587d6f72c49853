use std::sync::Arc;
use wave_config::{EngineConfig, ServiceConfig, SimulationConfig};
use wave_core::{now_epoch_millis, Clock, SystemClock};
use wave_engine::{
    connect, ArbiterConfig, EventObserver, FileEventStore, PositionArbiter, PositionProvider,
    SimulatedPositionSource, Simulation, WaveEvent,
};
use wave_geo::Position;
use wave_observability::{init, log_startup, ObservabilityConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env("wave-sim");
    let engine = EngineConfig::from_env();
    let handle = init(&ObservabilityConfig::from(&config));
    log_startup(&handle, &engine);

    let sim_config = SimulationConfig::from_env();

    let store = FileEventStore::new(&config.data_dir);
    let events: Vec<Arc<WaveEvent>> = store.load_events().await?.into_iter().map(Arc::new).collect();
    if events.is_empty() {
        tracing::warn!(data_dir = %config.data_dir, "No events to observe");
    }
    tracing::info!(events = events.len(), data_dir = %config.data_dir, "Events loaded");

    // Simulated time starts at the first event so a run shows something.
    let start_ms = events
        .iter()
        .map(|event| event.start_ms)
        .min()
        .unwrap_or_else(now_epoch_millis);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let simulation = Arc::new(Simulation::from_config(clock, start_ms, &sim_config)?);
    let arbiter = Arc::new(PositionArbiter::new(ArbiterConfig::from(&engine))?);

    for event in &events {
        let event = Arc::clone(event);
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(err) = event.load_area(&store).await {
                tracing::warn!(
                    event_id = %event.id,
                    error = %err,
                    "Observing without an area until it is reloaded"
                );
            }
        });
    }

    let mut observers = Vec::with_capacity(events.len());
    for event in &events {
        let observer = EventObserver::new(
            Arc::clone(event),
            &arbiter,
            simulation.clone(),
            engine.clone(),
        )
        .with_simulation(Arc::clone(&simulation));
        observer.start_observation()?;
        spawn_state_logger(&observer);
        observers.push(observer);
    }

    let source = match (sim_config.user_lat, sim_config.user_lng) {
        (Some(lat), Some(lng)) => {
            let source = SimulatedPositionSource::stationary(Position::new(lat, lng)?)?;
            connect(&arbiter, &source);
            Some(source)
        }
        _ => {
            tracing::warn!("WAVE_SIM_LAT/WAVE_SIM_LNG not set, observing without a position");
            None
        }
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {}", err);
    }
    tracing::info!("shutting down");

    if let Some(source) = &source {
        source.stop_updates();
    }
    for observer in &observers {
        observer.stop_observation().await;
    }
    Ok(())
}

fn spawn_state_logger(observer: &EventObserver) {
    let event_id = observer.event().id.clone();
    let mut states = observer.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::info!(
                event_id = %event_id,
                status = ?state.status,
                progression = state.progression,
                in_area = state.is_in_area,
                warming = state.is_warming,
                going_to_be_hit = state.is_going_to_be_hit,
                hit = state.has_been_hit,
                "Observer state"
            );
        }
    });
}
