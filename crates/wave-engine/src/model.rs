use crate::wave::{Direction, WarmingRule, WaveDefinition, WaveKind};
use std::time::Duration;
use wave_core::EpochMillis;
use wave_geo::{
    circle_polygon, clip_to_convex, clip_to_meridian, distance_m, meters_per_degree_lng, Area,
    BoundingBox, MeridianSide, Polygon, Position, METERS_PER_DEGREE,
};

const CIRCLE_SEGMENTS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum WaveFront {
    Meridians(Vec<f64>),
    Circle { center: Position, radius_m: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    west: f64,
    east: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Geometry {
    Meridian {
        direction: Direction,
        bands: Vec<Band>,
        meters_per_degree: f64,
        band_width_m: f64,
    },
    Radial {
        center: Position,
        max_radius_m: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveModel {
    geometry: Geometry,
    speed_mps: f64,
    warming: WarmingRule,
    total_s: f64,
}

impl WaveModel {
    pub fn new(definition: &WaveDefinition, bbox: &BoundingBox) -> Self {
        let geometry = match definition.kind() {
            WaveKind::Linear { direction } => Self::meridian(direction, 1, bbox),
            WaveKind::LinearSplit { direction, splits } => {
                Self::meridian(direction, usize::from(splits.max(1)), bbox)
            }
            WaveKind::Deep => {
                let center = bbox.center();
                Geometry::Radial {
                    center,
                    max_radius_m: bbox.farthest_corner_m(&center),
                }
            }
        };
        let travel_m = match &geometry {
            Geometry::Meridian { band_width_m, .. } => *band_width_m,
            Geometry::Radial { max_radius_m, .. } => *max_radius_m,
        };
        Self {
            geometry,
            speed_mps: definition.speed_mps(),
            warming: definition.warming(),
            total_s: travel_m / definition.speed_mps(),
        }
    }

    fn meridian(direction: Direction, splits: usize, bbox: &BoundingBox) -> Geometry {
        let span = bbox.east() - bbox.west();
        let step = span / splits as f64;
        let bands = (0..splits)
            .map(|i| Band {
                west: bbox.west() + step * i as f64,
                east: if i + 1 == splits {
                    bbox.east()
                } else {
                    bbox.west() + step * (i + 1) as f64
                },
            })
            .collect();
        let meters_per_degree = meters_per_degree_lng(bbox.mid_latitude());
        Geometry::Meridian {
            direction,
            bands,
            meters_per_degree,
            band_width_m: step * meters_per_degree,
        }
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_s.max(0.0))
    }

    /// Folds the elapsed time back into one run of the wave when looping.
    pub fn wrap_elapsed(&self, elapsed_ms: EpochMillis, looping: bool) -> EpochMillis {
        let total_ms = (self.total_s * 1_000.0).round() as EpochMillis;
        if looping && total_ms > 0 && elapsed_ms >= 0 {
            elapsed_ms % total_ms
        } else {
            elapsed_ms
        }
    }

    /// Fraction of the sweep done, clamped to `[0, 1]` and exactly 1.0 once
    /// the total duration has passed.
    pub fn progression(&self, elapsed_ms: EpochMillis) -> f64 {
        if elapsed_ms <= 0 {
            return 0.0;
        }
        let elapsed_s = elapsed_ms as f64 / 1_000.0;
        if elapsed_s >= self.total_s {
            return 1.0;
        }
        (elapsed_s / self.total_s).clamp(0.0, 1.0)
    }

    fn advance_m(&self, elapsed_ms: EpochMillis) -> f64 {
        let elapsed_s = (elapsed_ms.max(0) as f64 / 1_000.0).min(self.total_s);
        elapsed_s * self.speed_mps
    }

    pub fn front(&self, elapsed_ms: EpochMillis) -> WaveFront {
        let advance = self.advance_m(elapsed_ms);
        match &self.geometry {
            Geometry::Meridian {
                direction,
                bands,
                meters_per_degree,
                ..
            } => WaveFront::Meridians(
                bands
                    .iter()
                    .map(|band| band_front(band, *direction, advance / meters_per_degree))
                    .collect(),
            ),
            Geometry::Radial { center, .. } => WaveFront::Circle {
                center: *center,
                radius_m: advance,
            },
        }
    }

    /// Metres the front still has to travel before it covers `position`;
    /// zero or negative once it has.
    fn gap_m(&self, position: &Position, elapsed_ms: EpochMillis) -> f64 {
        let advance = self.advance_m(elapsed_ms);
        self.reach_distance_m(position) - advance
    }

    fn reach_distance_m(&self, position: &Position) -> f64 {
        match &self.geometry {
            Geometry::Meridian {
                direction,
                bands,
                meters_per_degree,
                ..
            } => {
                let band = band_for(bands, position.lng());
                let origin = band_origin(&band, *direction);
                ((position.lng() - origin) * direction.sign()).max(0.0) * meters_per_degree
            }
            Geometry::Radial { center, .. } => distance_m(center, position),
        }
    }

    /// Whether the swept region includes `position`, with `epsilon_deg`
    /// of slack so users on the front line do not flap.
    pub fn has_reached(&self, position: &Position, elapsed_ms: EpochMillis, epsilon_deg: f64) -> bool {
        if elapsed_ms < 0 {
            return false;
        }
        self.gap_m(position, elapsed_ms) <= self.epsilon_m(epsilon_deg)
    }

    /// Time left before the front covers `position`, `None` if it never will.
    pub fn time_until_reached(&self, position: &Position, elapsed_ms: EpochMillis) -> Option<Duration> {
        let reach_s = self.reach_distance_m(position) / self.speed_mps;
        if !reach_s.is_finite() || reach_s > self.total_s + f64::EPSILON {
            return None;
        }
        let elapsed_s = elapsed_ms as f64 / 1_000.0;
        Some(Duration::from_secs_f64((reach_s - elapsed_s).max(0.0)))
    }

    pub fn is_warming(&self, position: &Position, elapsed_ms: EpochMillis, epsilon_deg: f64) -> bool {
        if elapsed_ms < 0 || self.has_reached(position, elapsed_ms, epsilon_deg) {
            return false;
        }
        match (self.warming, &self.geometry) {
            (WarmingRule::Meters(margin), _) => self.gap_m(position, elapsed_ms) <= margin,
            (
                WarmingRule::Longitude(cutoff),
                Geometry::Meridian {
                    direction, bands, ..
                },
            ) => {
                let band = band_for(bands, position.lng());
                let front = band_front(&band, *direction, self.advance_deg(elapsed_ms));
                let sign = direction.sign();
                (position.lng() - front) * sign > 0.0 && (cutoff - position.lng()) * sign >= 0.0
            }
            (WarmingRule::Longitude(_), Geometry::Radial { .. }) => false,
        }
    }

    fn advance_deg(&self, elapsed_ms: EpochMillis) -> f64 {
        match &self.geometry {
            Geometry::Meridian {
                meters_per_degree, ..
            } => self.advance_m(elapsed_ms) / meters_per_degree,
            Geometry::Radial { .. } => 0.0,
        }
    }

    fn epsilon_m(&self, epsilon_deg: f64) -> f64 {
        epsilon_deg * METERS_PER_DEGREE
    }

    pub fn swept_polygons(&self, area: &Area, elapsed_ms: EpochMillis) -> Vec<Polygon> {
        if elapsed_ms <= 0 {
            return Vec::new();
        }
        if self.progression(elapsed_ms) >= 1.0 {
            return area.polygons().to_vec();
        }
        match self.front(elapsed_ms) {
            WaveFront::Meridians(fronts) => {
                let Geometry::Meridian {
                    direction, bands, ..
                } = &self.geometry
                else {
                    return Vec::new();
                };
                area.polygons()
                    .iter()
                    .flat_map(|polygon| {
                        bands.iter().zip(fronts.iter()).filter_map(move |(band, front)| {
                            swept_band(polygon, band, *direction, *front, bands.len() > 1)
                        })
                    })
                    .collect()
            }
            WaveFront::Circle { center, radius_m } => {
                let Some(circle) = circle_polygon(&center, radius_m, CIRCLE_SEGMENTS) else {
                    return Vec::new();
                };
                area.polygons()
                    .iter()
                    .filter_map(|polygon| clip_to_convex(polygon, &circle))
                    .collect()
            }
        }
    }
}

fn band_origin(band: &Band, direction: Direction) -> f64 {
    match direction {
        Direction::East => band.west,
        Direction::West => band.east,
    }
}

fn band_front(band: &Band, direction: Direction, advance_deg: f64) -> f64 {
    let origin = band_origin(band, direction);
    let front = origin + advance_deg * direction.sign();
    front.clamp(band.west, band.east)
}

fn band_for(bands: &[Band], lng: f64) -> Band {
    bands
        .iter()
        .find(|band| lng >= band.west && lng <= band.east)
        .or_else(|| {
            if bands.first().is_some_and(|band| lng < band.west) {
                bands.first()
            } else {
                bands.last()
            }
        })
        .copied()
        .unwrap_or(Band { west: lng, east: lng })
}

fn swept_band(
    polygon: &Polygon,
    band: &Band,
    direction: Direction,
    front: f64,
    bounded: bool,
) -> Option<Polygon> {
    let (origin_side, front_side) = match direction {
        Direction::East => (MeridianSide::East, MeridianSide::West),
        Direction::West => (MeridianSide::West, MeridianSide::East),
    };
    let within_band = if bounded {
        clip_to_meridian(polygon, band_origin(band, direction), origin_side)?
    } else {
        polygon.clone()
    };
    clip_to_meridian(&within_band, front, front_side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_geo::PolygonSet;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn definition(kind: WaveKind, warming: WarmingRule) -> WaveDefinition {
        WaveDefinition::new(kind, 10.0, Duration::from_secs(3600), warming).unwrap()
    }

    fn sweep_ms(model: &WaveModel) -> EpochMillis {
        model.total_duration().as_millis() as EpochMillis + 1
    }

    fn east() -> WaveKind {
        WaveKind::Linear {
            direction: Direction::East,
        }
    }

    /// One degree of longitude on the equator, crossed in ~11132 s at 10 m/s.
    fn equator_box() -> BoundingBox {
        BoundingBox::new(pos(-0.5, 0.0), pos(0.5, 1.0)).unwrap()
    }

    fn square_area() -> Area {
        Area::new(vec![
            Polygon::new(vec![pos(-0.5, 0.0), pos(-0.5, 1.0), pos(0.5, 1.0), pos(0.5, 0.0)])
                .unwrap(),
        ])
    }

    #[test]
    fn progression_is_monotonic_and_saturates() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        let total_ms = sweep_ms(&model);
        let expected_s = meters_per_degree_lng(0.0) / 10.0;
        assert!((model.total_duration().as_secs_f64() - expected_s).abs() < 1e-6);

        let mut last = -1.0;
        for step in 0..=100 {
            let t = total_ms * step / 100 - 1_000;
            let p = model.progression(t);
            assert!(p >= last, "progression went backwards at {t}");
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert_eq!(model.progression(total_ms), 1.0);
        assert_eq!(model.progression(total_ms * 3), 1.0);
        assert_eq!(model.progression(-5), 0.0);
    }

    #[test]
    fn looping_wraps_elapsed_time() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        let total_ms = sweep_ms(&model);
        let wrapped = model.wrap_elapsed(total_ms + 500, true);
        assert!(wrapped < total_ms);
        assert!(model.progression(wrapped) < 0.01);
        assert_eq!(model.wrap_elapsed(total_ms + 500, false), total_ms + 500);
    }

    #[test]
    fn eastward_front_reaches_positions_in_order() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        let total_ms = sweep_ms(&model);
        let west_user = pos(0.0, 0.2);
        let east_user = pos(0.0, 0.8);
        let half = total_ms / 2;

        assert!(!model.has_reached(&west_user, -1, 0.0001));
        assert!(model.has_reached(&west_user, half, 0.0001));
        assert!(!model.has_reached(&east_user, half, 0.0001));
        assert!(model.has_reached(&east_user, total_ms, 0.0001));

        match model.front(half) {
            WaveFront::Meridians(fronts) => assert!((fronts[0] - 0.5).abs() < 1e-3),
            other => panic!("unexpected front {other:?}"),
        }
        let eta = model.time_until_reached(&east_user, half).unwrap();
        assert!((eta.as_secs_f64() - 0.3 * total_ms as f64 / 1_000.0).abs() < 1.0);
    }

    #[test]
    fn westward_front_starts_on_the_east_edge() {
        let west = WaveKind::Linear {
            direction: Direction::West,
        };
        let model = WaveModel::new(&definition(west, WarmingRule::Meters(100.0)), &equator_box());
        let quarter = sweep_ms(&model) / 4;
        assert!(model.has_reached(&pos(0.0, 0.9), quarter, 0.0001));
        assert!(!model.has_reached(&pos(0.0, 0.1), quarter, 0.0001));
    }

    #[test]
    fn warming_by_meters_tracks_the_front() {
        let model = WaveModel::new(
            &definition(east(), WarmingRule::Meters(1_000.0)),
            &equator_box(),
        );
        let user = pos(0.0, 0.5);
        let reach_ms = (0.5 * meters_per_degree_lng(0.0) / 10.0 * 1_000.0) as EpochMillis;

        assert!(!model.is_warming(&user, reach_ms - 200_000, 0.0001));
        assert!(model.is_warming(&user, reach_ms - 50_000, 0.0001));
        assert!(!model.is_warming(&user, reach_ms + 1_000, 0.0001));
    }

    #[test]
    fn warming_by_longitude_spans_front_to_cutoff() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Longitude(0.6)), &equator_box());
        let quarter = sweep_ms(&model) / 4;
        assert!(model.is_warming(&pos(0.0, 0.5), quarter, 0.0001));
        assert!(!model.is_warming(&pos(0.0, 0.7), quarter, 0.0001));
        assert!(!model.is_warming(&pos(0.0, 0.1), quarter, 0.0001));
    }

    #[test]
    fn swept_region_grows_with_the_front() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        let area = square_area();
        let total_ms = sweep_ms(&model);

        assert!(model.swept_polygons(&area, 0).is_empty());
        let half = model.swept_polygons(&area, total_ms / 2);
        assert_eq!(half.len(), 1);
        let swept = Area::new(half);
        assert!(swept.contains(&pos(0.0, 0.3)));
        assert!(!swept.contains(&pos(0.0, 0.7)));
        assert_eq!(model.swept_polygons(&area, total_ms), area.polygons().to_vec());
    }

    #[test]
    fn split_wave_sweeps_every_band_at_once() {
        let kind = WaveKind::LinearSplit {
            direction: Direction::East,
            splits: 2,
        };
        let model = WaveModel::new(&definition(kind, WarmingRule::Meters(100.0)), &equator_box());
        let single = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        assert!(
            (model.total_duration().as_secs_f64() * 2.0 - single.total_duration().as_secs_f64())
                .abs()
                < 1e-6
        );

        let half = sweep_ms(&model) / 2;
        assert!(model.has_reached(&pos(0.0, 0.2), half, 0.0001));
        assert!(model.has_reached(&pos(0.0, 0.7), half, 0.0001));
        assert!(!model.has_reached(&pos(0.0, 0.45), half, 0.0001));
        assert!(!model.has_reached(&pos(0.0, 0.95), half, 0.0001));

        let swept = Area::new(model.swept_polygons(&square_area(), half));
        assert_eq!(swept.len(), 2);
        assert!(swept.contains(&pos(0.0, 0.7)));
        assert!(!swept.contains(&pos(0.0, 0.9)));
    }

    #[test]
    fn deep_wave_expands_from_the_centre() {
        let model = WaveModel::new(
            &definition(WaveKind::Deep, WarmingRule::Meters(500.0)),
            &equator_box(),
        );
        let center = pos(0.0, 0.5);
        let corner = pos(0.5, 1.0);
        let expected = distance_m(&center, &corner) / 10.0;
        assert!((model.total_duration().as_secs_f64() - expected).abs() < 1e-6);

        let third = sweep_ms(&model) / 3;
        assert!(model.has_reached(&pos(0.0, 0.55), third, 0.0001));
        assert!(!model.has_reached(&pos(0.45, 0.95), third, 0.0001));

        let swept = Area::new(model.swept_polygons(&square_area(), third));
        assert!(swept.contains(&pos(0.0, 0.55)));
        assert!(!swept.contains(&pos(0.45, 0.95)));
        assert!(matches!(model.front(third), WaveFront::Circle { .. }));
    }

    #[test]
    fn positions_beyond_the_box_are_never_reached() {
        let model = WaveModel::new(&definition(east(), WarmingRule::Meters(100.0)), &equator_box());
        assert!(model.time_until_reached(&pos(0.0, 1.5), 0).is_none());
        let total_ms = sweep_ms(&model);
        assert!(!model.has_reached(&pos(0.0, 1.5), total_ms * 2, 0.0001));
    }
}
