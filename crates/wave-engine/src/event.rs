use crate::wave::WaveDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wave_core::{EpochMillis, ErrorCode, EventId, WaveError, WaveResult};
use wave_geo::{area_from_geojson, Area, BoundingBox};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Running,
    Done,
}

/// Polygon set as seen at one instant. The version moves on every
/// replacement, including replacements with an equal polygon set.
#[derive(Debug, Clone)]
pub struct AreaSnapshot {
    pub area: Arc<Area>,
    pub version: u64,
}

impl AreaSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.version > 0
    }
}

/// Holder of an event's polygons. Readers get either the old or the new set,
/// never a mix, and subscribers are woken on every replacement.
#[derive(Debug)]
pub struct EventArea {
    tx: watch::Sender<AreaSnapshot>,
}

impl Default for EventArea {
    fn default() -> Self {
        Self::new()
    }
}

impl EventArea {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AreaSnapshot {
            area: Arc::new(Area::empty()),
            version: 0,
        });
        Self { tx }
    }

    pub fn snapshot(&self) -> AreaSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AreaSnapshot> {
        self.tx.subscribe()
    }

    pub fn replace(&self, area: Area) -> u64 {
        let area = Arc::new(area);
        let mut version = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.area = area;
            version = snapshot.version;
        });
        version
    }
}

#[async_trait]
pub trait AreaLoader: Send + Sync {
    async fn load_area(&self, event_id: &EventId) -> WaveResult<Area>;
}

pub struct WaveEvent {
    pub id: EventId,
    pub start_ms: EpochMillis,
    pub definition: WaveDefinition,
    declared_bbox: Option<BoundingBox>,
    area: EventArea,
}

impl WaveEvent {
    pub fn new(id: EventId, start_ms: EpochMillis, definition: WaveDefinition) -> Self {
        Self {
            id,
            start_ms,
            definition,
            declared_bbox: None,
            area: EventArea::new(),
        }
    }

    /// A box known up front lets the cheap bbox rejection work before the
    /// polygons arrive.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.declared_bbox = Some(bbox);
        self
    }

    pub fn area(&self) -> &EventArea {
        &self.area
    }

    pub fn bbox(&self, snapshot: &AreaSnapshot) -> Option<BoundingBox> {
        self.declared_bbox.or_else(|| snapshot.area.bbox())
    }

    pub fn end_ms(&self) -> EpochMillis {
        self.start_ms + self.definition.approx_duration().as_millis() as EpochMillis
    }

    pub fn status_at(&self, now_ms: EpochMillis) -> EventStatus {
        self.status_until(now_ms, self.end_ms())
    }

    /// An event whose sweep outlasts the announced duration keeps running
    /// until the front has crossed the whole area.
    pub fn status_with_sweep(&self, now_ms: EpochMillis, sweep: Duration) -> EventStatus {
        let sweep_end = self.start_ms + (sweep.as_secs_f64() * 1_000.0).ceil() as EpochMillis;
        self.status_until(now_ms, self.end_ms().max(sweep_end))
    }

    fn status_until(&self, now_ms: EpochMillis, end_ms: EpochMillis) -> EventStatus {
        if now_ms < self.start_ms {
            EventStatus::Scheduled
        } else if now_ms < end_ms {
            EventStatus::Running
        } else {
            EventStatus::Done
        }
    }

    /// Fetches the polygons and swaps them in. On failure the current area
    /// is left untouched, so observers keep treating it as not yet known.
    pub async fn load_area(&self, loader: &dyn AreaLoader) -> WaveResult<u64> {
        match loader.load_area(&self.id).await {
            Ok(area) => {
                let polygons = area.len();
                let version = self.area.replace(area);
                tracing::info!(event_id = %self.id, polygons, version, "Event area loaded");
                Ok(version)
            }
            Err(err) => {
                tracing::warn!(event_id = %self.id, error = %err, "Event area failed to load");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for WaveEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveEvent")
            .field("id", &self.id)
            .field("start_ms", &self.start_ms)
            .field("definition", &self.definition)
            .field("area_version", &self.area.snapshot().version)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventDocument {
    id: EventId,
    start_ms: EpochMillis,
    wave: WaveDefinition,
    #[serde(default)]
    bbox: Option<BoundingBox>,
}

/// Event definitions under `<root>/events/<id>.json` and their polygons
/// under `<root>/areas/<id>.geojson`.
#[derive(Debug, Clone)]
pub struct FileEventStore {
    root: PathBuf,
}

impl FileEventStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn events_dir(&self) -> PathBuf {
        self.root.join("events")
    }

    fn area_path(&self, event_id: &EventId) -> PathBuf {
        self.root
            .join("areas")
            .join(format!("{}.geojson", event_id.as_str()))
    }

    pub async fn load_event(&self, event_id: &EventId) -> WaveResult<WaveEvent> {
        let path = self.events_dir().join(format!("{}.json", event_id.as_str()));
        parse_event(&path, &read(&path).await?)
    }

    pub async fn load_events(&self) -> WaveResult<Vec<WaveEvent>> {
        let dir = self.events_dir();
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| io_error(&dir, &err))?;
        let mut events = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| io_error(&dir, &err))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read(&path).await.and_then(|bytes| parse_event(&path, &bytes)) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping event definition");
                }
            }
        }
        events.sort_by_key(|event| event.start_ms);
        Ok(events)
    }
}

#[async_trait]
impl AreaLoader for FileEventStore {
    async fn load_area(&self, event_id: &EventId) -> WaveResult<Area> {
        let path = self.area_path(event_id);
        let bytes = read(&path).await?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|err| WaveError::invalid(format!("{}: {err}", path.display())))?;
        area_from_geojson(&document)
    }
}

async fn read(path: &Path) -> WaveResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|err| io_error(path, &err))
}

fn parse_event(path: &Path, bytes: &[u8]) -> WaveResult<WaveEvent> {
    let document: EventDocument = serde_json::from_slice(bytes)
        .map_err(|err| WaveError::invalid(format!("{}: {err}", path.display())))?;
    let mut event = WaveEvent::new(document.id, document.start_ms, document.wave);
    if let Some(bbox) = document.bbox {
        event = event.with_bbox(BoundingBox::new(bbox.sw, bbox.ne)?);
    }
    Ok(event)
}

fn io_error(path: &Path, err: &io::Error) -> WaveError {
    let code = if err.kind() == io::ErrorKind::NotFound {
        ErrorCode::NotFound
    } else {
        ErrorCode::Unavailable
    };
    WaveError::new(code, format!("{}: {err}", path.display()))
}
