//! Sutherland-Hodgman clipping of event polygons. Used to derive the part of
//! an area a wave front has already swept. A concave subject clipped into
//! several pieces comes back as one ring joined by zero-width bridges, which
//! is fine for rendering and for containment.

use crate::polygon::{signed_area, Polygon};
use crate::position::Position;
use std::f64::consts::TAU;

const MIN_AREA_DEG2: f64 = 1e-18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeridianSide {
    West,
    East,
}

impl MeridianSide {
    fn keeps(self, lng: f64, meridian: f64) -> bool {
        match self {
            Self::West => lng <= meridian,
            Self::East => lng >= meridian,
        }
    }
}

pub fn clip_to_meridian(polygon: &Polygon, meridian: f64, side: MeridianSide) -> Option<Polygon> {
    let input = polygon.vertices();
    let mut output = Vec::with_capacity(input.len() + 2);
    let n = input.len();
    for i in 0..n {
        let current = input[i];
        let previous = input[(i + n - 1) % n];
        let current_in = side.keeps(current.lng(), meridian);
        let previous_in = side.keeps(previous.lng(), meridian);
        if current_in {
            if !previous_in {
                output.push(meridian_crossing(previous, current, meridian));
            }
            output.push(current);
        } else if previous_in {
            output.push(meridian_crossing(previous, current, meridian));
        }
    }
    finish(output)
}

/// Part of `subject` inside the convex ring `clip`, whichever way `clip` winds.
pub fn clip_to_convex(subject: &Polygon, clip: &Polygon) -> Option<Polygon> {
    let clip_ring = clip.vertices();
    let orientation = signed_area(clip_ring).signum();
    if orientation == 0.0 {
        return None;
    }
    let mut output: Vec<Position> = subject.vertices().to_vec();
    let m = clip_ring.len();
    for k in 0..m {
        if output.is_empty() {
            break;
        }
        let a = clip_ring[k];
        let b = clip_ring[(k + 1) % m];
        let input = std::mem::take(&mut output);
        let n = input.len();
        for i in 0..n {
            let current = input[i];
            let previous = input[(i + n - 1) % n];
            let current_in = side_of(a, b, current) * orientation >= 0.0;
            let previous_in = side_of(a, b, previous) * orientation >= 0.0;
            if current_in {
                if !previous_in {
                    output.push(line_crossing(previous, current, a, b));
                }
                output.push(current);
            } else if previous_in {
                output.push(line_crossing(previous, current, a, b));
            }
        }
    }
    finish(output)
}

pub fn circle_polygon(center: &Position, radius_m: f64, segments: usize) -> Option<Polygon> {
    if radius_m <= 0.0 || !radius_m.is_finite() || segments < 3 {
        return None;
    }
    let vertices = (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            center.offset_m(radius_m * theta.cos(), radius_m * theta.sin())
        })
        .collect();
    finish(vertices)
}

fn meridian_crossing(a: Position, b: Position, meridian: f64) -> Position {
    let t = (meridian - a.lng()) / (b.lng() - a.lng());
    Position::from_valid(a.lat() + t * (b.lat() - a.lat()), meridian)
}

fn side_of(a: Position, b: Position, p: Position) -> f64 {
    (b.lng() - a.lng()) * (p.lat() - a.lat()) - (b.lat() - a.lat()) * (p.lng() - a.lng())
}

fn line_crossing(s: Position, e: Position, a: Position, b: Position) -> Position {
    let (x1, y1, x2, y2) = (s.lng(), s.lat(), e.lng(), e.lat());
    let (x3, y3, x4, y4) = (a.lng(), a.lat(), b.lng(), b.lat());
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom == 0.0 {
        return e;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let lng = (x1 + t * (x2 - x1)).clamp(-180.0, 180.0);
    let lat = (y1 + t * (y2 - y1)).clamp(-90.0, 90.0);
    Position::from_valid(lat, lng)
}

fn finish(mut vertices: Vec<Position>) -> Option<Polygon> {
    vertices.dedup();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 || signed_area(&vertices).abs() < MIN_AREA_DEG2 {
        return None;
    }
    Polygon::new(vertices).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::METERS_PER_DEGREE;

    fn pos(lat: f64, lng: f64) -> Position {
        Position::new(lat, lng).unwrap()
    }

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![
            pos(0.0, 0.0),
            pos(0.0, size),
            pos(size, size),
            pos(size, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn meridian_halves_a_square() {
        let west = clip_to_meridian(&square(2.0), 0.5, MeridianSide::West).unwrap();
        assert!((west.signed_area().abs() - 1.0).abs() < 1e-12);
        assert!(west.contains(&pos(1.0, 0.25)));
        assert!(!west.contains(&pos(1.0, 1.0)));

        let east = clip_to_meridian(&square(2.0), 0.5, MeridianSide::East).unwrap();
        assert!((east.signed_area().abs() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn meridian_outside_polygon_yields_nothing_or_everything() {
        assert!(clip_to_meridian(&square(1.0), -1.0, MeridianSide::West).is_none());
        let all = clip_to_meridian(&square(1.0), 3.0, MeridianSide::West).unwrap();
        assert_eq!(all.vertices().len(), 4);
    }

    #[test]
    fn concave_subject_keeps_both_lobes() {
        // U shape opening north; the meridian cuts through both arms.
        let u = Polygon::new(vec![
            pos(0.0, 0.0),
            pos(0.0, 3.0),
            pos(3.0, 3.0),
            pos(3.0, 2.0),
            pos(1.0, 2.0),
            pos(1.0, 1.0),
            pos(3.0, 1.0),
            pos(3.0, 0.0),
        ])
        .unwrap();
        let swept = clip_to_meridian(&u, 2.5, MeridianSide::West).unwrap();
        assert!(swept.contains(&pos(2.0, 0.5)));
        assert!(swept.contains(&pos(2.0, 2.25)));
        assert!(!swept.contains(&pos(2.0, 1.5)));
        assert!(!swept.contains(&pos(2.0, 2.75)));
    }

    #[test]
    fn circle_clip_is_bounded_by_both_shapes() {
        let radius = 0.5 * METERS_PER_DEGREE;
        let circle = circle_polygon(&pos(0.0, 0.0), radius, 64).unwrap();
        let clipped = clip_to_convex(&square(2.0), &circle).unwrap();
        assert!(clipped.contains(&pos(0.2, 0.2)));
        assert!(!clipped.contains(&pos(0.6, 0.6)));
        assert!(!clipped.contains(&pos(-0.2, 0.2)));
        let quarter = std::f64::consts::PI * 0.25 / 4.0;
        assert!((clipped.signed_area().abs() - quarter).abs() < 0.01);
    }

    #[test]
    fn clip_orientation_does_not_matter() {
        let ccw = square(1.0);
        let cw = Polygon::new(ccw.vertices().iter().rev().copied().collect()).unwrap();
        let subject = Polygon::new(vec![pos(0.5, 0.5), pos(0.5, 2.0), pos(2.0, 2.0), pos(2.0, 0.5)])
            .unwrap();
        let a = clip_to_convex(&subject, &ccw).unwrap();
        let b = clip_to_convex(&subject, &cw).unwrap();
        assert!((a.signed_area().abs() - 0.25).abs() < 1e-12);
        assert!((b.signed_area().abs() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn degenerate_circle_is_none() {
        assert!(circle_polygon(&pos(0.0, 0.0), 0.0, 32).is_none());
        assert!(circle_polygon(&pos(0.0, 0.0), 10.0, 2).is_none());
    }
}
