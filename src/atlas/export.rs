// Writing the joined counties of a year as a GeoJSON feature collection.

use std::fs::File;
use std::io::{BufWriter, Write};

use serde::Serialize;
use serde_json::value::RawValue;
use snafu::ResultExt;

use crate::atlas::*;

/// The properties of an exported county. `pct_a` is written with exactly 6 decimals.
#[derive(Serialize, Debug)]
pub struct CountyProperties<'a> {
    fips: &'a str,
    name: &'a str,
    state: &'a str,
    votes_a: i64,
    votes_b: i64,
    total: i64,
    pct_a: Box<RawValue>,
    pct_b: f64,
    margin: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'static str>,
}

#[derive(Serialize, Debug)]
pub struct CountyFeature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    properties: CountyProperties<'a>,
    geometry: Box<RawValue>,
}

#[derive(Serialize, Debug)]
pub struct CountyCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<CountyFeature<'a>>,
}

impl CountyCollection<'_> {
    pub fn count(&self) -> usize {
        self.features.len()
    }
}

fn fixed6(code: &str, x: f64) -> AtlasResult<Box<RawValue>> {
    RawValue::from_string(format!("{:.6}", x)).context(SerializingJsonSnafu { path: code })
}

fn county_properties<'a>(c: &'a CountyView, color: Option<&'static str>) -> AtlasResult<CountyProperties<'a>> {
    Ok(CountyProperties {
        fips: &c.code,
        name: &c.display_name,
        state: &c.state_name,
        votes_a: c.votes_a,
        votes_b: c.votes_b,
        total: c.votes_total,
        pct_a: fixed6(&c.code, c.pct_a)?,
        pct_b: c.pct_b,
        margin: c.margin,
        color,
    })
}

/// The feature of a county, or None when the county has no usable shape.
fn county_feature<'a>(c: &'a CountyView, properties: CountyProperties<'a>) -> Option<CountyFeature<'a>> {
    if c.geojson.is_empty() || c.geojson == "null" {
        return None;
    }
    let geometry = match RawValue::from_string(c.geojson.clone()) {
        Ok(g) => g,
        Err(e) => {
            warn!("county_feature: {}: unreadable geometry: {}", c.code, e);
            return None;
        }
    };
    Some(CountyFeature {
        kind: "Feature",
        id: &c.code,
        properties,
        geometry,
    })
}

/// The counties that have a shape, in the order of `get_counties`. With `with_colors`, each
/// feature carries the fill color of its margin.
pub fn county_collection(counties: &[CountyView], with_colors: bool) -> AtlasResult<CountyCollection<'_>> {
    let mut features: Vec<CountyFeature> = Vec::new();
    for c in counties.iter() {
        let color = if with_colors {
            Some(margin_to_color(c.margin))
        } else {
            None
        };
        if let Some(f) = county_feature(c, county_properties(c, color)?) {
            features.push(f);
        }
    }
    Ok(CountyCollection {
        kind: "FeatureCollection",
        features,
    })
}

/// Writes the counties of `year` to `path`. Returns the number of features written.
pub fn export_geojson<S: Store>(store: &S, year: i32, path: &str) -> AtlasResult<usize> {
    let counties = get_counties(store, year);
    let collection = county_collection(&counties, false)?;
    let file = File::create(path).context(WritingOutputSnafu { path })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection).context(SerializingJsonSnafu { path })?;
    writer.flush().context(WritingOutputSnafu { path })?;
    info!(
        "export_geojson: {} of {} counties written to {}",
        collection.count(),
        counties.len(),
        path
    );
    Ok(collection.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JSValue;
    use std::fs;
    use tempfile::TempDir;

    fn view(code: &str, geojson: &str) -> CountyView {
        CountyView {
            code: code.to_string(),
            display_name: "Los Angeles County".to_string(),
            state_name: "California".to_string(),
            state_code: "06".to_string(),
            votes_a: 1000,
            votes_b: 1200,
            votes_total: 2200,
            pct_a: 1000.0 / 2200.0,
            pct_b: 1200.0 / 2200.0,
            margin: -200.0 / 2200.0,
            geojson: geojson.to_string(),
        }
    }

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}"#;

    #[test]
    fn null_geometries_are_skipped() {
        let counties = vec![
            view("06037", SQUARE),
            view("06001", "null"),
            view("06075", ""),
            view("06081", "{oops"),
        ];
        let collection = county_collection(&counties, false).unwrap();
        assert_eq!(collection.count(), 1);
        let js: JSValue = serde_json::to_value(&collection).unwrap();
        let features = js["features"].as_array().unwrap();
        assert_eq!(features[0]["id"], "06037");
        assert_eq!(features[0]["geometry"]["type"], "Polygon");
        assert!(features[0]["properties"].get("color").is_none());
    }

    #[test]
    fn pct_a_has_six_decimals() {
        let mut half = view("06001", SQUARE);
        half.pct_a = 0.5;
        let counties = vec![view("06037", SQUARE), half];
        let text = serde_json::to_string(&county_collection(&counties, false).unwrap()).unwrap();
        assert!(text.contains(r#""pct_a":0.454545,"#));
        assert!(text.contains(r#""pct_a":0.500000,"#));

        let js: JSValue = serde_json::from_str(&text).unwrap();
        let props = &js["features"][0]["properties"];
        assert_eq!(props["fips"], "06037");
        assert_eq!(props["state"], "California");
        assert_eq!(props["total"], 2200);
        assert_eq!(props["pct_b"], 1200.0 / 2200.0);
    }

    #[test]
    fn colors_follow_the_margin() {
        let counties = [view("06037", SQUARE)];
        let collection = county_collection(&counties, true).unwrap();
        let js: JSValue = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            js["features"][0]["properties"]["color"],
            margin_to_color(-200.0 / 2200.0)
        );
    }

    #[test]
    fn export_counts_written_features() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("counties.geojson");
        let out = out.to_str().unwrap();

        let mut store = MemoryStore::new();
        let shape: Geometry = serde_json::from_str(SQUARE).unwrap();
        store
            .upsert_county_geometries(&[
                GeometryRecord::county("06037".to_string(), Some(shape)),
                GeometryRecord::county("06001".to_string(), None),
            ])
            .unwrap();
        assert_eq!(export_geojson(&store, 2024, out).unwrap(), 1);

        let text = fs::read_to_string(out).unwrap();
        assert!(text.contains(r#""pct_a":0.000000,"#));
        let written: JSValue = serde_json::from_str(&text).unwrap();
        assert_eq!(written["type"], "FeatureCollection");
        assert_eq!(written["features"].as_array().unwrap().len(), 1);
        assert_eq!(written["features"][0]["properties"]["votes_a"], 0);
    }

    #[test]
    fn unwritable_destination() {
        let store = MemoryStore::new();
        assert!(matches!(
            export_geojson(&store, 2024, "/nonexistent/dir/out.geojson"),
            Err(AtlasError::WritingOutput { .. })
        ));
    }
}
