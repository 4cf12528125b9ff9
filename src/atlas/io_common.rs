use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use snafu::ResultExt;
use vote_atlas::Geometry;

use crate::atlas::{AtlasResult, OpeningFileSnafu};

/// A shape read from a boundary file, before it is keyed as a county or a state.
#[derive(PartialEq, Debug, Clone)]
pub struct ShapeFeature {
    /// The identifier as found in the file, not padded yet.
    pub id: String,
    pub geometry: Option<Geometry>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn read_text(path: &str) -> AtlasResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu { path })
}

/// True if the document declares itself as a TopoJSON topology.
///
/// This is a textual check on `"type":` followed by optional whitespace and `"Topology"`.
pub fn is_topology(contents: &str) -> bool {
    let marker = "\"type\":";
    contents.match_indices(marker).any(|(idx, _)| {
        contents[idx + marker.len()..]
            .trim_start()
            .starts_with("\"Topology\"")
    })
}

/// The text of a feature identifier. Integral numbers are written without a fraction.
pub fn stringify_id(id: &JSValue) -> Option<String> {
    match id {
        JSValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JSValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| format!("{}", f as i64))
            }
        }
        _ => None,
    }
}

/// Reads a county identifier from a CSV cell, the way a numeric column would be read back:
/// an all-digit identifier loses its leading zeros.
pub fn normalize_identifier(cell: &str) -> String {
    let s = cell.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        let stripped = s.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        s.to_string()
    }
}
