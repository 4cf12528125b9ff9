// Reading the layers of TopoJSON topologies.

use snafu::OptionExt;
use topojson::{to_geojson, TopoJson, Topology, Value as TopoValue};

use crate::atlas::{
    io_common::ShapeFeature,
    io_geojson::collection_features,
    *,
};

pub const COUNTIES_LAYER: &str = "counties";
pub const STATES_LAYER: &str = "states";

pub fn parse_topology(contents: &str, path: &str) -> AtlasResult<Topology> {
    match contents.parse::<TopoJson>() {
        Ok(TopoJson::Topology(t)) => Ok(t),
        Ok(_) => Err(AtlasError::ParsingBoundaries {
            path: path.to_string(),
            message: "the document is not a topology".to_string(),
        }),
        Err(e) => Err(AtlasError::ParsingBoundaries {
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

pub fn has_layer(topology: &Topology, layer: &str) -> bool {
    topology.objects.iter().any(|o| o.name == layer)
}

/// All the features of one named object of the topology.
///
/// Features without an identifier are dropped. An arc reference out of range fails the
/// whole layer.
pub fn read_layer(topology: &Topology, layer: &str) -> AtlasResult<Vec<ShapeFeature>> {
    let object = topology
        .objects
        .iter()
        .find(|o| o.name == layer)
        .context(MissingLayerSnafu { layer })?;
    debug!("read_layer: {}: {} arcs", layer, topology.arcs.len());
    let bad_topology = |message: String| AtlasError::BadTopology {
        layer: layer.to_string(),
        message,
    };
    check_arcs(&object.geometry.value, topology.arcs.len()).map_err(bad_topology)?;
    let collection = to_geojson(topology, layer).map_err(|e| bad_topology(e.to_string()))?;
    let features = collection_features(collection, layer);
    debug!("read_layer: {}: {} features", layer, features.len());
    Ok(features)
}

/// Checks the arc references of a geometry. A negative index `~i` stands for arc `i` reversed.
fn check_arcs(value: &TopoValue, arc_count: usize) -> Result<(), String> {
    match value {
        TopoValue::LineString(arcs) => check_indexes(arcs, arc_count),
        TopoValue::MultiLineString(lines) => lines
            .iter()
            .try_for_each(|arcs| check_indexes(arcs, arc_count)),
        TopoValue::Polygon(rings) => rings
            .iter()
            .try_for_each(|arcs| check_indexes(arcs, arc_count)),
        TopoValue::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .try_for_each(|arcs| check_indexes(arcs, arc_count)),
        TopoValue::GeometryCollection(members) => members
            .iter()
            .try_for_each(|g| check_arcs(&g.value, arc_count)),
        _ => Ok(()),
    }
}

fn check_indexes<I: Copy + Into<i64>>(indexes: &[I], arc_count: usize) -> Result<(), String> {
    for &i in indexes {
        let i: i64 = i.into();
        let idx = if i < 0 { !i } else { i };
        if idx as u64 >= arc_count as u64 {
            return Err(format!("arc index {} out of range ({} arcs)", i, arc_count));
        }
    }
    Ok(())
}
