use crate::position::{distance_m, Position};
use serde::{Deserialize, Serialize};
use wave_core::{WaveError, WaveResult};

/// Axis-aligned latitude/longitude rectangle. Boxes crossing the
/// antimeridian are not represented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub sw: Position,
    pub ne: Position,
}

impl BoundingBox {
    pub fn new(sw: Position, ne: Position) -> WaveResult<Self> {
        if sw.lat() > ne.lat() || sw.lng() > ne.lng() {
            return Err(WaveError::invalid(format!(
                "bounding box corners inverted: sw={sw:?} ne={ne:?}"
            )));
        }
        Ok(Self { sw, ne })
    }

    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let (mut south, mut west, mut north, mut east) =
            (first.lat(), first.lng(), first.lat(), first.lng());
        for position in iter {
            south = south.min(position.lat());
            north = north.max(position.lat());
            west = west.min(position.lng());
            east = east.max(position.lng());
        }
        let sw = Position::new(south, west).ok()?;
        let ne = Position::new(north, east).ok()?;
        Some(Self { sw, ne })
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.lat() >= self.sw.lat()
            && position.lat() <= self.ne.lat()
            && position.lng() >= self.sw.lng()
            && position.lng() <= self.ne.lng()
    }

    pub fn north(&self) -> f64 {
        self.ne.lat()
    }

    pub fn south(&self) -> f64 {
        self.sw.lat()
    }

    pub fn east(&self) -> f64 {
        self.ne.lng()
    }

    pub fn west(&self) -> f64 {
        self.sw.lng()
    }

    pub fn center(&self) -> Position {
        Self::midpoint(self.sw, self.ne)
    }

    pub fn mid_latitude(&self) -> f64 {
        (self.south() + self.north()) / 2.0
    }

    pub fn corners(&self) -> [Position; 4] {
        [
            self.sw,
            Self::corner(self.north(), self.west()),
            self.ne,
            Self::corner(self.south(), self.east()),
        ]
    }

    pub fn farthest_corner_m(&self, origin: &Position) -> f64 {
        self.corners()
            .iter()
            .map(|corner| distance_m(origin, corner))
            .fold(0.0, f64::max)
    }

    fn corner(lat: f64, lng: f64) -> Position {
        // Recombined from coordinates that were already validated.
        Position::from_valid(lat, lng)
    }

    fn midpoint(a: Position, b: Position) -> Position {
        Self::corner((a.lat() + b.lat()) / 2.0, (a.lng() + b.lng()) / 2.0)
    }
}
