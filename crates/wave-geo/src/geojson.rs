use crate::polygon::{Area, Polygon};
use crate::position::Position;
use serde_json::Value;
use wave_core::{WaveError, WaveResult};

/// Builds an [`Area`] from a GeoJSON `Polygon`, `MultiPolygon`, `Feature` or
/// `FeatureCollection`. Only exterior rings are kept; holes are ignored.
pub fn area_from_geojson(document: &Value) -> WaveResult<Area> {
    let mut polygons = Vec::new();
    collect(document, &mut polygons)?;
    Ok(Area::new(polygons))
}

fn collect(value: &Value, out: &mut Vec<Polygon>) -> WaveResult<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WaveError::invalid("geojson object without a type"))?;
    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| WaveError::invalid("FeatureCollection without features"))?;
            for feature in features {
                collect(feature, out)?;
            }
            Ok(())
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => Ok(()),
            Some(geometry) => collect(geometry, out),
        },
        "Polygon" => {
            let rings = coordinates(value)?;
            if let Some(exterior) = rings.first() {
                out.push(ring(exterior)?);
            }
            Ok(())
        }
        "MultiPolygon" => {
            for polygon in coordinates(value)? {
                let rings = polygon
                    .as_array()
                    .ok_or_else(|| WaveError::invalid("MultiPolygon member is not an array"))?;
                if let Some(exterior) = rings.first() {
                    out.push(ring(exterior)?);
                }
            }
            Ok(())
        }
        // Points, lines and anything else carry no area.
        _ => Ok(()),
    }
}

fn coordinates(value: &Value) -> WaveResult<&Vec<Value>> {
    value
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| WaveError::invalid("geometry without coordinates"))
}

fn ring(value: &Value) -> WaveResult<Polygon> {
    let points = value
        .as_array()
        .ok_or_else(|| WaveError::invalid("ring is not an array"))?;
    let vertices = points
        .iter()
        .map(|point| {
            let pair = point.as_array().filter(|pair| pair.len() >= 2);
            let lng = pair.and_then(|pair| pair[0].as_f64());
            let lat = pair.and_then(|pair| pair[1].as_f64());
            match (lat, lng) {
                // GeoJSON orders coordinates as [longitude, latitude].
                (Some(lat), Some(lng)) => Position::new(lat, lng),
                _ => Err(WaveError::invalid(format!("malformed coordinate {point}"))),
            }
        })
        .collect::<WaveResult<Vec<_>>>()?;
    Polygon::new(vertices)
}
