use crate::bbox::BoundingBox;
use crate::polygon::PolygonSet;
use crate::position::{Position, POSITION_EPSILON_DEG};

/// Outcome of a containment query. `Unknown` means the polygons are not
/// loaded yet and the query has to be retried; it is never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Outside,
    Unknown,
}

impl Containment {
    pub fn is_inside(self) -> bool {
        matches!(self, Self::Inside)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    fn from_bool(inside: bool) -> Self {
        if inside { Self::Inside } else { Self::Outside }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedContainment {
    pub position: Position,
    pub result: bool,
}

/// Containment with a single-slot cache in front of the bounding-box test
/// and the ray casting.
///
/// A cache hit returns the cached entry untouched, so the anchor does not
/// creep along with small jitter. A position inside the box of an area that
/// has not been loaded yet yields [`Containment::Unknown`] and leaves the
/// cache as it was.
pub fn is_position_within<A: PolygonSet + ?Sized>(
    position: &Position,
    bbox: Option<&BoundingBox>,
    area: &A,
    cached: Option<CachedContainment>,
    epsilon: f64,
) -> (Containment, Option<CachedContainment>) {
    if let Some(entry) = cached {
        if entry.position.approx_eq(position, epsilon) {
            return (Containment::from_bool(entry.result), cached);
        }
    }

    let Some(bbox) = bbox else {
        return (Containment::Unknown, cached);
    };

    if !bbox.contains(position) {
        return (
            Containment::Outside,
            Some(CachedContainment {
                position: *position,
                result: false,
            }),
        );
    }

    if area.is_empty() {
        return (Containment::Unknown, cached);
    }

    let inside = area.contains(position);
    (
        Containment::from_bool(inside),
        Some(CachedContainment {
            position: *position,
            result: inside,
        }),
    )
}

/// Owner of the cache slot for one event area. The slot is dropped whenever
/// the area version moves, so a replaced polygon set is never answered from
/// a stale entry.
#[derive(Debug, Clone)]
pub struct ContainmentCache {
    slot: Option<CachedContainment>,
    area_version: Option<u64>,
    epsilon: f64,
    hits: u64,
}

impl Default for ContainmentCache {
    fn default() -> Self {
        Self::new(POSITION_EPSILON_DEG)
    }
}

impl ContainmentCache {
    pub fn new(epsilon: f64) -> Self {
        Self {
            slot: None,
            area_version: None,
            epsilon,
            hits: 0,
        }
    }

    pub fn check<A: PolygonSet + ?Sized>(
        &mut self,
        position: &Position,
        bbox: Option<&BoundingBox>,
        area: &A,
        area_version: u64,
    ) -> Containment {
        if self.area_version != Some(area_version) {
            self.slot = None;
            self.area_version = Some(area_version);
        }
        let before = self.slot;
        let (result, slot) = is_position_within(position, bbox, area, self.slot, self.epsilon);
        if before.is_some() && slot == before && result.is_known() {
            self.hits += 1;
        }
        self.slot = slot;
        result
    }

    pub fn cached(&self) -> Option<CachedContainment> {
        self.slot
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
