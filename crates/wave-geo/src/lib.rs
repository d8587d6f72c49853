//! Geographic primitives for wave observation: validated positions,
//! bounding boxes, polygon areas and the containment tests run against them.

pub mod bbox;
pub mod clip;
pub mod containment;
pub mod geojson;
pub mod polygon;
pub mod position;

pub use bbox::BoundingBox;
pub use clip::{circle_polygon, clip_to_convex, clip_to_meridian, MeridianSide};
pub use containment::{is_position_within, CachedContainment, Containment, ContainmentCache};
pub use geojson::area_from_geojson;
pub use polygon::{point_in_polygon, point_in_polygons, Area, Polygon, PolygonSet};
pub use position::{
    distance_m, meters_per_degree_lng, Position, EARTH_RADIUS_M, METERS_PER_DEGREE,
    POSITION_EPSILON_DEG,
};
