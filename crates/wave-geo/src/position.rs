use serde::{Deserialize, Serialize};
use wave_core::{WaveError, WaveResult};

/// Per-axis tolerance, roughly ten metres at the equator.
pub const POSITION_EPSILON_DEG: f64 = 0.0001;

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Length of one degree of latitude (or of longitude on the equator).
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// WGS84 latitude/longitude in degrees. Only constructible through
/// [`Position::new`], so every value in circulation is finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition", into = "RawPosition")]
pub struct Position {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawPosition {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawPosition> for Position {
    type Error = WaveError;

    fn try_from(value: RawPosition) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lng)
    }
}

impl From<Position> for RawPosition {
    fn from(value: Position) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> WaveResult<Self> {
        let mut problems = Vec::new();
        if !lat.is_finite() {
            problems.push(format!("latitude must be finite, got {lat}"));
        } else if !(-90.0..=90.0).contains(&lat) {
            problems.push(format!("latitude {lat} outside [-90, 90]"));
        }
        if !lng.is_finite() {
            problems.push(format!("longitude must be finite, got {lng}"));
        } else if !(-180.0..=180.0).contains(&lng) {
            problems.push(format!("longitude {lng} outside [-180, 180]"));
        }
        if problems.is_empty() {
            Ok(Self { lat, lng })
        } else {
            Err(WaveError::Validation(problems))
        }
    }

    pub(crate) fn from_valid(lat: f64, lng: f64) -> Self {
        debug_assert!((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng));
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() < epsilon && (self.lng - other.lng).abs() < epsilon
    }

    /// Shifts the position by a number of metres east and north, clamping the
    /// result back into the valid coordinate range.
    pub fn offset_m(&self, east_m: f64, north_m: f64) -> Self {
        let lat = (self.lat + north_m / METERS_PER_DEGREE).clamp(-90.0, 90.0);
        let per_lng = meters_per_degree_lng(self.lat);
        let lng = if per_lng > f64::EPSILON {
            (self.lng + east_m / per_lng).clamp(-180.0, 180.0)
        } else {
            self.lng
        };
        Self { lat, lng }
    }
}

pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE * lat.to_radians().cos()
}

pub fn distance_m(a: &Position, b: &Position) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
