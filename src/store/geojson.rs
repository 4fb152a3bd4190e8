use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

/// Decode a GeoJSON `Polygon` or `MultiPolygon` into a `MultiPolygon`.
///
/// Anything else (points, lines, malformed coordinates) yields `None`.
pub fn decode_geometry(value: &Value) -> Option<MultiPolygon<f64>> {
    let obj = value.as_object()?;
    let coordinates = obj.get("coordinates")?;

    match obj.get("type")?.as_str()? {
        "Polygon" => decode_polygon(coordinates).map(|p| MultiPolygon::new(vec![p])),
        "MultiPolygon" => coordinates
            .as_array()?
            .iter()
            .map(decode_polygon)
            .collect::<Option<Vec<_>>>()
            .map(MultiPolygon::new),
        _ => None,
    }
}

fn decode_polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().map(decode_ring);
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

fn decode_ring(value: &Value) -> Option<LineString<f64>> {
    value
        .as_array()?
        .iter()
        .map(decode_position)
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn decode_position(value: &Value) -> Option<Coord<f64>> {
    let position = value.as_array()?;
    Some(Coord {
        x: position.first()?.as_f64()?,
        y: position.get(1)?.as_f64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_polygon_with_hole() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]]
            ]
        });

        let geometry = decode_geometry(&value).unwrap();
        assert_eq!(geometry.0.len(), 1);
        assert_eq!(geometry.0[0].exterior().0.len(), 5);
        assert_eq!(geometry.0[0].interiors().len(), 1);
    }

    #[test]
    fn test_decode_multipolygon() {
        let value = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                [[[5, 5], [6, 5], [6, 6], [5, 5]]]
            ]
        });

        let geometry = decode_geometry(&value).unwrap();
        assert_eq!(geometry.0.len(), 2);
        assert_eq!(geometry.0[1].exterior().0[0], Coord { x: 5.0, y: 5.0 });
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        assert!(decode_geometry(&json!({"type": "Point", "coordinates": [1, 2]})).is_none());
        assert!(decode_geometry(&json!({"type": "Polygon", "coordinates": [[["a", 0]]]})).is_none());
        assert!(decode_geometry(&json!({"type": "Polygon", "coordinates": []})).is_none());
        assert!(decode_geometry(&Value::Null).is_none());
    }
}
