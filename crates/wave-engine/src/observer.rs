use crate::arbiter::PositionArbiter;
use crate::breaker::CircuitBreaker;
use crate::event::{AreaSnapshot, EventStatus, WaveEvent};
use crate::model::WaveModel;
use crate::simulation::Simulation;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use wave_config::EngineConfig;
use wave_core::{Clock, EpochMillis, ErrorCode, WaveError, WaveResult};
use wave_geo::{BoundingBox, ContainmentCache, Position};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObserverState {
    pub progression: f64,
    pub status: EventStatus,
    pub is_in_area: bool,
    pub is_warming: bool,
    pub is_going_to_be_hit: bool,
    pub has_been_hit: bool,
    pub hit_at_ms: Option<EpochMillis>,
}

impl Default for ObserverState {
    fn default() -> Self {
        Self {
            progression: 0.0,
            status: EventStatus::Scheduled,
            is_in_area: false,
            is_warming: false,
            is_going_to_be_hit: false,
            has_been_hit: false,
            hit_at_ms: None,
        }
    }
}

/// Per-session evaluation state. Lives inside the observation task, so
/// evaluations for one event never overlap.
struct Evaluator {
    event: Arc<WaveEvent>,
    clock: Arc<dyn Clock>,
    looping: bool,
    epsilon_deg: f64,
    hit_lead: Duration,
    containment: ContainmentCache,
    model: Option<(BoundingBox, WaveModel)>,
    hit_at_ms: Option<EpochMillis>,
}

impl Evaluator {
    fn new(
        event: Arc<WaveEvent>,
        clock: Arc<dyn Clock>,
        looping: bool,
        config: &EngineConfig,
    ) -> Self {
        Self {
            event,
            clock,
            looping,
            epsilon_deg: config.position_epsilon_deg,
            hit_lead: config.hit_lead,
            containment: ContainmentCache::new(config.position_epsilon_deg),
            model: None,
            hit_at_ms: None,
        }
    }

    fn model_for(&mut self, bbox: BoundingBox) -> &WaveModel {
        let stale = self.model.as_ref().is_none_or(|(cached, _)| *cached != bbox);
        if stale {
            self.model = None;
        }
        let definition = &self.event.definition;
        &self
            .model
            .get_or_insert_with(|| (bbox, WaveModel::new(definition, &bbox)))
            .1
    }

    fn evaluate(
        &mut self,
        position: Option<Position>,
        area: &AreaSnapshot,
    ) -> WaveResult<ObserverState> {
        let now_ms = self.clock.now_ms()?;
        let event = Arc::clone(&self.event);
        let mut state = ObserverState {
            status: status_of(&event, self.looping, now_ms, None),
            has_been_hit: self.hit_at_ms.is_some(),
            hit_at_ms: self.hit_at_ms,
            ..ObserverState::default()
        };
        let Some(bbox) = event.bbox(area) else {
            return Ok(state);
        };

        let is_in_area = match position {
            Some(position) => {
                let hits = self.containment.hits();
                let result =
                    self.containment
                        .check(&position, Some(&bbox), &*area.area, area.version);
                if self.containment.hits() > hits {
                    metrics::counter!("wave_containment_cache_hits_total").increment(1);
                }
                result.is_inside()
            }
            None => false,
        };

        let (looping, epsilon_deg, hit_lead) = (self.looping, self.epsilon_deg, self.hit_lead);
        let model = self.model_for(bbox);
        let status = status_of(&event, looping, now_ms, Some(model.total_duration()));
        let elapsed_ms = model.wrap_elapsed(now_ms - event.start_ms, looping);
        state.status = status;
        state.progression = model.progression(elapsed_ms);
        state.is_in_area = is_in_area;

        let Some(position) = position.filter(|_| is_in_area) else {
            return Ok(state);
        };
        let reached = model.has_reached(&position, elapsed_ms, epsilon_deg);
        let warming = model.is_warming(&position, elapsed_ms, epsilon_deg);
        let lead = model.time_until_reached(&position, elapsed_ms);

        if self.hit_at_ms.is_none() && reached {
            self.hit_at_ms = Some(now_ms);
            tracing::info!(event_id = %event.id, at_ms = now_ms, "User hit by the wave");
        }
        state.has_been_hit = self.hit_at_ms.is_some();
        state.hit_at_ms = self.hit_at_ms;
        if !state.has_been_hit && status != EventStatus::Done {
            state.is_warming = status == EventStatus::Running && warming;
            state.is_going_to_be_hit = lead.is_some_and(|lead| lead <= hit_lead);
        }
        Ok(state)
    }
}

/// A looping simulation keeps a started event running. Otherwise the event
/// runs for its announced duration or its sweep, whichever is longer.
fn status_of(
    event: &WaveEvent,
    looping: bool,
    now_ms: EpochMillis,
    sweep: Option<Duration>,
) -> EventStatus {
    if looping && now_ms >= event.start_ms {
        return EventStatus::Running;
    }
    match sweep {
        Some(sweep) => event.status_with_sweep(now_ms, sweep),
        None => event.status_at(now_ms),
    }
}

/// Watches one event for one user.
///
/// A single task merges the periodic tick, arbiter position updates,
/// simulation speed changes and area replacements into one evaluation
/// stream, and publishes the resulting [`ObserverState`] only when it
/// differs from the last published one.
pub struct EventObserver {
    event: Arc<WaveEvent>,
    positions: watch::Receiver<Option<Position>>,
    clock: Arc<dyn Clock>,
    simulation: Option<Arc<Simulation>>,
    config: EngineConfig,
    state: Arc<watch::Sender<ObserverState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl EventObserver {
    pub fn new(
        event: Arc<WaveEvent>,
        arbiter: &PositionArbiter,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let (state, _) = watch::channel(ObserverState::default());
        Self {
            event,
            positions: arbiter.subscribe(),
            clock,
            simulation: None,
            config,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Runs the observer on simulated time: the simulation becomes the clock
    /// and its speed changes trigger re-evaluation.
    pub fn with_simulation(mut self, simulation: Arc<Simulation>) -> Self {
        self.clock = simulation.clone();
        self.simulation = Some(simulation);
        self
    }

    pub fn event(&self) -> &Arc<WaveEvent> {
        &self.event
    }

    pub fn subscribe(&self) -> watch::Receiver<ObserverState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ObserverState {
        *self.state.borrow()
    }

    pub fn is_observing(&self) -> bool {
        self.slot().as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Starts a new observation session. Does nothing if one is running.
    /// A new session forgets any earlier hit.
    pub fn start_observation(&self) -> WaveResult<()> {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }
        let runtime = Handle::try_current().map_err(|err| {
            WaveError::new(
                ErrorCode::Unavailable,
                format!("event observer needs a tokio runtime: {err}"),
            )
        })?;

        let looping = self.simulation.as_ref().is_some_and(|sim| sim.looping());
        let evaluator = Evaluator::new(
            Arc::clone(&self.event),
            Arc::clone(&self.clock),
            looping,
            &self.config,
        );
        let triggers = Triggers {
            positions: self.positions.clone(),
            speed: self.simulation.as_ref().map(|sim| sim.subscribe_speed()),
            area: self.event.area().subscribe(),
        };
        let breaker = CircuitBreaker::new(self.config.breaker_threshold, self.config.breaker_cooldown);
        *slot = Some(runtime.spawn(observe(
            evaluator,
            triggers,
            Arc::clone(&self.state),
            breaker,
            self.config.tick_interval,
        )));
        tracing::info!(event_id = %self.event.id, "Observation started");
        Ok(())
    }

    /// Cancels the session. Once this returns no further evaluation runs.
    pub async fn stop_observation(&self) {
        let task = self.slot().take();
        if let Some(task) = task {
            task.abort();
            // Evaluation never awaits, so the task can only stop between
            // evaluations; waiting for it closes the race with a tick.
            let _ = task.await;
            tracing::info!(event_id = %self.event.id, "Observation stopped");
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for EventObserver {
    fn drop(&mut self) {
        if let Some(task) = self.slot().take() {
            task.abort();
        }
    }
}

struct Triggers {
    positions: watch::Receiver<Option<Position>>,
    speed: Option<watch::Receiver<f64>>,
    area: watch::Receiver<AreaSnapshot>,
}

async fn speed_changed(speed: &mut Option<watch::Receiver<f64>>) -> Result<(), watch::error::RecvError> {
    match speed {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}

async fn observe(
    mut evaluator: Evaluator,
    mut triggers: Triggers,
    state: Arc<watch::Sender<ObserverState>>,
    mut breaker: CircuitBreaker,
    tick_interval: Duration,
) {
    let event_id = evaluator.event.id.clone();
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut positions_open = true;
    let mut speed_open = triggers.speed.is_some();
    let mut area_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = triggers.positions.changed(), if positions_open => {
                if changed.is_err() {
                    positions_open = false;
                    continue;
                }
            }
            changed = speed_changed(&mut triggers.speed), if speed_open => {
                if changed.is_err() {
                    speed_open = false;
                    continue;
                }
            }
            changed = triggers.area.changed(), if area_open => {
                if changed.is_err() {
                    area_open = false;
                    continue;
                }
            }
        }

        let now = Instant::now();
        if breaker.is_open(now) {
            continue;
        }
        let position = *triggers.positions.borrow_and_update();
        let area = triggers.area.borrow_and_update().clone();
        metrics::counter!("wave_evaluations_total").increment(1);

        match evaluator.evaluate(position, &area) {
            Ok(next) => {
                breaker.record_success();
                let changed = state.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
                if changed {
                    metrics::counter!("wave_state_changes_total").increment(1);
                    tracing::debug!(event_id = %event_id, state = ?next, "Observer state changed");
                }
            }
            Err(err) => {
                metrics::counter!("wave_evaluation_failures_total").increment(1);
                tracing::warn!(
                    event_id = %event_id,
                    failures = breaker.consecutive_failures() + 1,
                    error = %err,
                    "Evaluation failed"
                );
                if breaker.record_failure(now) {
                    metrics::counter!("wave_circuit_breaker_trips_total").increment(1);
                    tracing::error!(
                        event_id = %event_id,
                        failures = breaker.consecutive_failures(),
                        "Evaluation suspended after repeated failures"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::{ArbiterConfig, PositionSource};
    use crate::wave::{Direction, WarmingRule, WaveDefinition, WaveKind};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::time::timeout;
    use wave_core::ManualClock;
    use wave_geo::{Area, Polygon};

    const WAIT: Duration = Duration::from_millis(500);

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn equator_area() -> Area {
        Area::new(vec![
            Polygon::new(vec![pos(-0.5, 0.0), pos(-0.5, 1.0), pos(0.5, 1.0), pos(0.5, 0.0)])
                .unwrap(),
        ])
    }

    fn event(start_ms: EpochMillis) -> Arc<WaveEvent> {
        event_lasting(start_ms, Duration::from_secs(86_400))
    }

    /// East-bound wave at 10 m/s over a one-degree equator box, which takes
    /// about 11132 s to sweep whatever the announced duration.
    fn event_lasting(start_ms: EpochMillis, approx_duration: Duration) -> Arc<WaveEvent> {
        let definition = WaveDefinition::new(
            WaveKind::Linear {
                direction: Direction::East,
            },
            10.0,
            approx_duration,
            WarmingRule::Meters(100.0),
        )
        .unwrap();
        let event = WaveEvent::new("equator".parse().unwrap(), start_ms, definition);
        event.area().replace(equator_area());
        Arc::new(event)
    }

    fn arbiter() -> PositionArbiter {
        PositionArbiter::new(ArbiterConfig {
            debounce: Duration::ZERO,
            ..ArbiterConfig::default()
        })
        .unwrap()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            tick_interval: Duration::from_secs(1),
            ..EngineConfig::default()
        }
    }

    fn reach_ms() -> EpochMillis {
        reach_ms_at(0.5)
    }

    fn reach_ms_at(lng: f64) -> EpochMillis {
        (lng * wave_geo::meters_per_degree_lng(0.0) / 10.0 * 1_000.0) as EpochMillis
    }

    async fn wait_for(
        rx: &mut watch::Receiver<ObserverState>,
        predicate: impl FnMut(&ObserverState) -> bool,
    ) -> ObserverState {
        *timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("state not reached in time")
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn hit_is_latched_for_the_session() {
        let clock = Arc::new(ManualClock::new(0));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let observer = EventObserver::new(event(0), &arbiter, clock.clone(), config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        let first = wait_for(&mut rx, |s| s.is_in_area).await;
        assert_eq!(first.status, EventStatus::Running);
        assert!(!first.has_been_hit);

        clock.set(reach_ms() + 1_000);
        let hit = wait_for(&mut rx, |s| s.has_been_hit).await;
        assert_eq!(hit.hit_at_ms, Some(reach_ms() + 1_000));
        assert!(!hit.is_warming);
        assert!(!hit.is_going_to_be_hit);

        arbiter.update(pos(0.0, 5.0), PositionSource::Gps);
        clock.advance(Duration::from_secs(60));
        let left = wait_for(&mut rx, |s| !s.is_in_area).await;
        assert!(left.has_been_hit);
        assert_eq!(left.hit_at_ms, hit.hit_at_ms);
    }

    #[tokio::test(start_paused = true)]
    async fn warming_and_imminent_hit_ahead_of_the_front() {
        let clock = Arc::new(ManualClock::new(reach_ms() - 5_000));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let observer = EventObserver::new(event(0), &arbiter, clock.clone(), config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        let state = wait_for(&mut rx, |s| s.is_in_area).await;
        assert!(state.is_warming);
        assert!(state.is_going_to_be_hit);
        assert!(!state.has_been_hit);
        assert!(state.progression > 0.4 && state.progression < 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_outlasting_the_announced_duration_still_hits() {
        let clock = Arc::new(ManualClock::new(8_000_000));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let event = event_lasting(0, Duration::from_secs(600));
        let observer = EventObserver::new(event, &arbiter, clock.clone(), config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        let hit = wait_for(&mut rx, |s| s.is_in_area).await;
        assert!(hit.has_been_hit);
        assert_eq!(hit.hit_at_ms, Some(8_000_000));
        assert_eq!(hit.status, EventStatus::Running);
        assert!(hit.progression > 0.7 && hit.progression < 0.75);

        clock.set(reach_ms_at(1.0) + 2_000);
        let done = wait_for(&mut rx, |s| s.status == EventStatus::Done).await;
        assert_eq!(done.progression, 1.0);
        assert!(done.has_been_hit);
        assert_eq!(done.hit_at_ms, Some(8_000_000));
    }

    #[tokio::test(start_paused = true)]
    async fn warning_continues_past_the_announced_duration() {
        let clock = Arc::new(ManualClock::new(reach_ms_at(0.9) - 5_000));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.9), PositionSource::Gps);
        let event = event_lasting(0, Duration::from_secs(600));
        let observer = EventObserver::new(event, &arbiter, clock, config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        let state = wait_for(&mut rx, |s| s.is_in_area).await;
        assert_eq!(state.status, EventStatus::Running);
        assert!(state.is_warming);
        assert!(state.is_going_to_be_hit);
        assert!(!state.has_been_hit);
    }

    #[tokio::test(start_paused = true)]
    async fn looping_simulation_restarts_the_sweep() {
        let base = Arc::new(ManualClock::new(0));
        let simulation = Arc::new(Simulation::new(base.clone(), 0, 1.0, true).unwrap());
        let arbiter = arbiter();
        let event = event_lasting(0, Duration::from_secs(600));
        let observer = EventObserver::new(event, &arbiter, base.clone(), config())
            .with_simulation(simulation);
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();
        wait_for(&mut rx, |s| s.status == EventStatus::Running).await;

        // Past one full sweep and the announced duration.
        base.advance(Duration::from_secs(11_140));
        let state = wait_for(&mut rx, |s| s.progression > 0.0).await;
        assert_eq!(state.status, EventStatus::Running);
        assert!(state.progression < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_evaluations_are_not_republished() {
        let clock = Arc::new(ManualClock::new(1_000));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let observer = EventObserver::new(event(0), &arbiter, clock, config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        wait_for(&mut rx, |s| s.is_in_area).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!rx.has_changed().unwrap());
        assert!(observer.is_observing());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_published_after_stop() {
        let clock = Arc::new(ManualClock::new(0));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let observer = EventObserver::new(event(0), &arbiter, clock.clone(), config());
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();
        wait_for(&mut rx, |s| s.is_in_area).await;

        observer.stop_observation().await;
        assert!(!observer.is_observing());
        clock.set(reach_ms() + 1_000);
        arbiter.update(pos(0.0, 0.7), PositionSource::Gps);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!rx.has_changed().unwrap());
        let stale = observer.state();
        assert!(stale.is_in_area);
        assert!(!stale.has_been_hit);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_area_is_not_a_miss_and_loading_triggers_evaluation() {
        let definition = event(0).definition.clone();
        let event = Arc::new(WaveEvent::new("late".parse().unwrap(), 0, definition));
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let clock = Arc::new(ManualClock::new(1_000));
        let config = EngineConfig {
            tick_interval: Duration::from_secs(3_600),
            ..EngineConfig::default()
        };
        let observer = EventObserver::new(Arc::clone(&event), &arbiter, clock, config);
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        let before = wait_for(&mut rx, |s| s.status == EventStatus::Running).await;
        assert!(!before.is_in_area);
        assert_eq!(before.progression, 0.0);

        event.area().replace(equator_area());
        let after = *timeout(WAIT, rx.wait_for(|s| s.is_in_area))
            .await
            .expect("area replacement should trigger evaluation")
            .unwrap();
        assert!(after.progression > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_change_triggers_evaluation() {
        let base = Arc::new(ManualClock::new(0));
        let simulation = Arc::new(Simulation::new(base.clone(), 0, 1.0, false).unwrap());
        let arbiter = arbiter();
        let config = EngineConfig {
            tick_interval: Duration::from_secs(3_600),
            ..EngineConfig::default()
        };
        let observer = EventObserver::new(event(0), &arbiter, base.clone(), config)
            .with_simulation(Arc::clone(&simulation));
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();
        wait_for(&mut rx, |s| s.status == EventStatus::Running).await;

        base.advance(Duration::from_secs(60));
        simulation.set_speed(100.0).unwrap();
        let state = *timeout(WAIT, rx.wait_for(|s| s.progression > 0.0))
            .await
            .expect("speed change should trigger evaluation")
            .unwrap();
        assert!(state.progression < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn observers_share_one_arbiter() {
        let clock = Arc::new(ManualClock::new(1_000));
        let arbiter = arbiter();
        let running = EventObserver::new(event(0), &arbiter, clock.clone(), config());
        let scheduled = EventObserver::new(event(3_600_000), &arbiter, clock, config());
        let mut running_rx = running.subscribe();
        let mut scheduled_rx = scheduled.subscribe();
        running.start_observation().unwrap();
        scheduled.start_observation().unwrap();

        arbiter.update(pos(0.1, 0.5), PositionSource::Simulation);
        let a = wait_for(&mut running_rx, |s| s.is_in_area).await;
        let b = wait_for(&mut scheduled_rx, |s| s.is_in_area).await;
        assert_eq!(a.status, EventStatus::Running);
        assert_eq!(b.status, EventStatus::Scheduled);
        assert_eq!(b.progression, 0.0);
        assert!(!b.is_warming);
    }

    struct FlakyClock {
        failing: AtomicBool,
        calls: AtomicU32,
    }

    impl Clock for FlakyClock {
        fn now_ms(&self) -> WaveResult<EpochMillis> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(WaveError::new(ErrorCode::Unavailable, "clock offline"))
            } else {
                Ok(1_000)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_failures_suspend_evaluation_for_the_cooldown() {
        let clock = Arc::new(FlakyClock {
            failing: AtomicBool::new(true),
            calls: AtomicU32::new(0),
        });
        let arbiter = arbiter();
        arbiter.update(pos(0.0, 0.5), PositionSource::Gps);
        let config = EngineConfig {
            tick_interval: Duration::from_secs(1),
            breaker_threshold: 3,
            breaker_cooldown: Duration::from_secs(30),
            ..EngineConfig::default()
        };
        let observer = EventObserver::new(event(0), &arbiter, clock.clone(), config);
        let mut rx = observer.subscribe();
        observer.start_observation().unwrap();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(clock.calls.load(Ordering::SeqCst), 3);
        assert!(observer.is_observing());
        assert!(!rx.has_changed().unwrap());

        clock.failing.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(clock.calls.load(Ordering::SeqCst) > 3);
        let state = wait_for(&mut rx, |s| s.is_in_area).await;
        assert_eq!(state.status, EventStatus::Running);
    }

    #[tokio::test]
    async fn restarting_is_a_no_op_while_running() {
        let arbiter = arbiter();
        let observer = EventObserver::new(event(0), &arbiter, Arc::new(ManualClock::new(0)), config());
        observer.start_observation().unwrap();
        observer.start_observation().unwrap();
        assert!(observer.is_observing());
        observer.stop_observation().await;
        observer.stop_observation().await;
        assert!(!observer.is_observing());
    }
}
