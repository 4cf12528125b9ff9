// Reading GeoJSON feature collections.

use geojson::{feature::Id, FeatureCollection, GeoJson};
use serde_json::Value as JSValue;
use vote_atlas::is_areal;

use crate::atlas::{
    io_common::{stringify_id, ShapeFeature},
    *,
};

/// Reads every feature of a collection.
pub fn read_features(contents: &str, path: &str) -> AtlasResult<Vec<ShapeFeature>> {
    let parse_error = |message: String| AtlasError::ParsingBoundaries {
        path: path.to_string(),
        message,
    };
    let collection = match contents.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(fc)) => fc,
        Ok(_) => return Err(parse_error("the document is not a feature collection".to_string())),
        Err(e) => return Err(parse_error(e.to_string())),
    };
    let features = collection_features(collection, path);
    debug!("read_features: {}: {} features", path, features.len());
    Ok(features)
}

/// The shapes of a collection, keyed by feature id.
///
/// Features without an id are dropped. A geometry that is null, or that is not a polygon or
/// a multipolygon, is kept as a missing shape.
pub fn collection_features(collection: FeatureCollection, source: &str) -> Vec<ShapeFeature> {
    let mut res: Vec<ShapeFeature> = Vec::new();
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let id = match feature.id.as_ref().and_then(feature_id) {
            Some(id) => id,
            None => {
                warn!("{}: feature #{} has no id, skipping", source, idx);
                continue;
            }
        };
        let geometry = match feature.geometry {
            Some(g) if is_areal(&g) => Some(g),
            Some(_) => {
                warn!("{}: feature {}: unsupported geometry type", source, id);
                None
            }
            None => None,
        };
        res.push(ShapeFeature { id, geometry });
    }
    res
}

fn feature_id(id: &Id) -> Option<String> {
    match id {
        Id::String(s) => stringify_id(&JSValue::String(s.clone())),
        Id::Number(n) => stringify_id(&JSValue::Number(n.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_features() {
        let contents = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":6037,"properties":{},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","id":"06001","properties":{},"geometry":null},
            {"type":"Feature","id":"06075","properties":{},
             "geometry":{"type":"Point","coordinates":[0,0]}},
            {"type":"Feature","properties":{"name":"no id"},"geometry":null}
        ]}"#;
        let features = read_features(contents, "c.geojson").unwrap();
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["6037", "06001", "06075"]);
        assert!(matches!(
            features[0].geometry.as_ref().map(|g| &g.value),
            Some(GeometryValue::Polygon(_))
        ));
        assert_eq!(features[1].geometry, None);
        assert_eq!(features[2].geometry, None);
    }

    #[test]
    fn rejects_other_documents() {
        assert!(matches!(
            read_features("not json", "bad.geojson"),
            Err(AtlasError::ParsingBoundaries { .. })
        ));
        assert!(matches!(
            read_features(r#"{"type":"Point","coordinates":[0,0]}"#, "point.geojson"),
            Err(AtlasError::ParsingBoundaries { .. })
        ));
    }
}
