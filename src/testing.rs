//! Fixtures shared by unit tests.

use geo::{MultiPolygon, Polygon, Rect};
use serde_json::{json, Map, Value};

use crate::models::{Batch, FeatureId, FeatureRecord};

/// Axis-aligned square with its lower-left corner at `(x, y)`
pub fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![
        Rect::new((x, y), (x + size, y + size)).to_polygon()
    ])
}

/// Encode a `MultiPolygon` as GeoJSON, collapsing single-part shapes to `Polygon`
fn encode_geometry(geometry: &MultiPolygon<f64>) -> Value {
    let polygons: Vec<Value> = geometry.0.iter().map(encode_polygon).collect();
    if polygons.len() == 1 {
        json!({ "type": "Polygon", "coordinates": polygons[0] })
    } else {
        json!({ "type": "MultiPolygon", "coordinates": polygons })
    }
}

fn encode_polygon(polygon: &Polygon<f64>) -> Value {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| json!([c.x, c.y])).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .into()
}

/// Push a feature with `adm_code`, `pop` and `nam` properties
pub fn push(
    batch: &mut Batch,
    code: &str,
    population: f64,
    geometry: MultiPolygon<f64>,
) -> FeatureId {
    let mut properties = Map::new();
    properties.insert("adm_code".to_string(), json!(code));
    properties.insert("pop".to_string(), json!(population));
    properties.insert("nam".to_string(), json!(format!("unit-{}", batch.len())));

    batch.push(FeatureRecord {
        admin_code: code.to_string(),
        population: Some(population),
        raw_geometry: encode_geometry(&geometry),
        geometry: Some(geometry),
        properties,
    })
}

/// Push a feature that has no decodable geometry
pub fn push_without_geometry(batch: &mut Batch, code: &str, population: f64) -> FeatureId {
    batch.push(FeatureRecord {
        admin_code: code.to_string(),
        population: Some(population),
        geometry: None,
        raw_geometry: Value::Null,
        properties: Map::new(),
    })
}

/// A: 010001 main, B: 020001 main, X touches A, Y is an island, Z touches B
pub fn two_unit_batch() -> (Batch, [FeatureId; 5]) {
    let mut batch = Batch::new();
    let a = push(&mut batch, "010001", 50.0, square(0.0, 0.0, 1.0));
    let b = push(&mut batch, "020001", 30.0, square(10.0, 0.0, 1.0));
    let x = push(&mut batch, "010001", -1.0, square(1.0, 0.0, 1.0));
    let y = push(&mut batch, "010001", -1.0, square(5.0, 5.0, 1.0));
    let z = push(&mut batch, "020001", -1.0, square(11.0, 0.0, 1.0));
    (batch, [a, b, x, y, z])
}
