use crate::bbox::BoundingBox;
use crate::position::Position;
use serde::{Deserialize, Serialize};
use wave_core::{WaveError, WaveResult};

/// Distance, in degrees, under which a point counts as lying on an edge.
const BOUNDARY_TOLERANCE_DEG: f64 = 1e-12;

/// Closed ring of at least three vertices. A repeated closing vertex is
/// dropped on construction; the ring is always implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolygon", into = "RawPolygon")]
pub struct Polygon {
    vertices: Vec<Position>,
}

#[derive(Serialize, Deserialize)]
struct RawPolygon {
    vertices: Vec<Position>,
}

impl TryFrom<RawPolygon> for Polygon {
    type Error = WaveError;

    fn try_from(raw: RawPolygon) -> Result<Self, Self::Error> {
        Self::new(raw.vertices)
    }
}

impl From<Polygon> for RawPolygon {
    fn from(polygon: Polygon) -> Self {
        Self {
            vertices: polygon.vertices,
        }
    }
}

impl Polygon {
    pub fn new(mut vertices: Vec<Position>) -> WaveResult<Self> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(WaveError::invalid(format!(
                "polygon ring needs at least 3 distinct vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Position] {
        &self.vertices
    }

    pub fn contains(&self, point: &Position) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_positions(&self.vertices)
    }

    /// Shoelace area in square degrees; positive for counter-clockwise rings
    /// when longitude is x and latitude is y.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }
}

pub(crate) fn signed_area(ring: &[Position]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.lng() * b.lat() - b.lng() * a.lat()
        })
        .sum::<f64>()
        / 2.0
}

/// Ordered polygon set of an event. Empty until the geometry is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    polygons: Vec<Polygon>,
}

impl Area {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_positions(self.polygons.iter().flat_map(|p| p.vertices.iter()))
    }
}

/// Seam between the containment cache and the ray-casting it guards.
pub trait PolygonSet {
    fn is_empty(&self) -> bool;
    fn contains(&self, point: &Position) -> bool;
}

impl PolygonSet for Area {
    fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    fn contains(&self, point: &Position) -> bool {
        point_in_polygons(point, &self.polygons)
    }
}

/// Crossing-number test with longitude as x and latitude as y. Points on a
/// vertex or an edge are inside; rings with fewer than three vertices
/// contain nothing.
pub fn point_in_polygon(point: &Position, ring: &[Position]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let (px, py) = (point.lng(), point.lat());

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lng(), ring[i].lat());
        let (xj, yj) = (ring[j].lng(), ring[j].lat());

        if on_segment(px, py, xi, yi, xj, yj) {
            return true;
        }
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn point_in_polygons(point: &Position, polygons: &[Polygon]) -> bool {
    polygons.iter().any(|polygon| polygon.contains(point))
}

fn on_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> bool {
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return (px - ax).abs() <= BOUNDARY_TOLERANCE_DEG
            && (py - ay).abs() <= BOUNDARY_TOLERANCE_DEG;
    }
    let t = ((px - ax) * dx + (py - ay) * dy) / len_sq;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    let cross = (px - ax) * dy - (py - ay) * dx;
    cross.abs() / len_sq.sqrt() <= BOUNDARY_TOLERANCE_DEG
}
