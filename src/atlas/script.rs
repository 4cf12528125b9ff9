// The county layer as a JavaScript statement, for the map front-end.

use std::fs;

use snafu::ResultExt;

use crate::atlas::{export::county_collection, *};

/// Escapes a string for a single-quoted JavaScript literal.
pub fn escape_js_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\'' => output.push_str("\\'"),
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            _ => output.push(c),
        }
    }
    output
}

/// The statement defining `geojson`: the exported features, each with its fill color.
/// Returns the script and the number of features in it.
pub fn map_script(counties: &[CountyView]) -> AtlasResult<(String, usize)> {
    let collection = county_collection(counties, true)?;
    let text =
        serde_json::to_string(&collection).context(SerializingJsonSnafu { path: "<script>" })?;
    Ok((
        format!("var geojson = JSON.parse('{}');\n", escape_js_string(&text)),
        collection.count(),
    ))
}

pub fn write_map_script<S: Store>(store: &S, year: i32, path: &str) -> AtlasResult<usize> {
    let counties = get_counties(store, year);
    let (script, count) = map_script(&counties)?;
    fs::write(path, script).context(WritingOutputSnafu { path })?;
    info!("write_map_script: {} counties written to {}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(escape_js_string("St. Mary's"), "St. Mary\\'s");
        assert_eq!(escape_js_string(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_js_string("a\nb\rc\td"), "a\\nb\\rc\\td");
        assert_eq!(escape_js_string("Doña Ana"), "Doña Ana");
    }

    #[test]
    fn script_carries_colors() {
        let county = CountyView {
            code: "22087".to_string(),
            display_name: "St. Bernard Parish".to_string(),
            state_name: "Louisiana".to_string(),
            state_code: "22".to_string(),
            votes_a: 700,
            votes_b: 300,
            votes_total: 1000,
            pct_a: 0.7,
            pct_b: 0.3,
            margin: 0.4,
            geojson: r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[0.0,0.0]]]}"#
                .to_string(),
        };
        let mut missing = county.clone();
        missing.code = "22001".to_string();
        missing.geojson = "null".to_string();

        let (script, count) = map_script(&[county, missing]).unwrap();
        assert_eq!(count, 1);
        assert!(script.starts_with("var geojson = JSON.parse('{"));
        assert!(script.contains("\\\"type\\\":\\\"FeatureCollection\\\""));
        assert!(script.ends_with("');\n"));
        assert!(script.contains("#B82D35"));
        assert!(!script.contains("22001"));
        assert!(script.contains("\\\"pct_a\\\":0.700000"));
    }
}
