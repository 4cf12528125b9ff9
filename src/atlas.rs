use log::{debug, error, info, warn};

use snafu::{prelude::*, Snafu};
use vote_atlas::*;

use std::fs;

use text_diff::print_diff;

mod config_reader;
mod export;
mod io_common;
mod io_csv;
mod io_geojson;
mod io_topojson;
mod report;
mod script;
mod store_sqlite;

pub use crate::atlas::config_reader::*;
pub use crate::atlas::export::export_geojson;
pub use crate::atlas::script::write_map_script;
pub use crate::atlas::store_sqlite::SqliteStore;

use crate::atlas::io_common::{is_topology, read_text, simplify_file_name, ShapeFeature};
use crate::atlas::io_topojson::{has_layer, parse_topology, read_layer, COUNTIES_LAYER, STATES_LAYER};
use topojson::Topology;

#[derive(Debug, Snafu)]
pub enum AtlasError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading the boundaries in {path}: {message}"))]
    ParsingBoundaries { path: String, message: String },
    #[snafu(display("Error serializing the output for {path}"))]
    SerializingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: u64 },
    #[snafu(display("Column {column} not found in {path}"))]
    CsvMissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: column {column}: cannot read {content:?} as a number"))]
    CsvBadCell {
        lineno: u64,
        column: String,
        content: String,
    },
    #[snafu(display("The topology has no layer named {layer}"))]
    MissingLayer { layer: String },
    #[snafu(display("Layer {layer}: {message}"))]
    BadTopology { layer: String, message: String },
    #[snafu(display("Store operation failed"))]
    Storage { source: StoreError },
    #[snafu(display("Error opening the store at {path}"))]
    OpeningStore {
        source: rusqlite::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No usable rows were loaded from {path}"))]
    EmptyLoad { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AtlasResult<T> = Result<T, AtlasError>;

// ******** Loaders *********

/// Loads a boundary file into the geometry tables.
///
/// A topology replaces the county and the state shapes, a feature collection only the county
/// shapes. A file that cannot be read or parsed leaves the store untouched. Once the tables
/// are cleared, a layer that fails is logged and skipped.
///
/// Returns the number of county rows in the store after the load.
pub fn load_boundaries<S: Store>(store: &mut S, path: &str) -> AtlasResult<usize> {
    let contents = read_text(path)?;
    let file_name = simplify_file_name(path);
    if is_topology(&contents) {
        debug!("load_boundaries: {}: reading as a topology", file_name);
        let topology = parse_topology(&contents, path)?;
        store.clear_county_geometries().context(StorageSnafu)?;
        store.clear_state_geometries().context(StorageSnafu)?;
        load_topology_layer(store, &topology, COUNTIES_LAYER);
        if has_layer(&topology, STATES_LAYER) {
            load_topology_layer(store, &topology, STATES_LAYER);
        } else {
            warn!(
                "load_boundaries: {}: no {} layer, state outlines are empty",
                file_name, STATES_LAYER
            );
        }
    } else {
        debug!("load_boundaries: {}: reading as a feature collection", file_name);
        let features = io_geojson::read_features(&contents, path)?;
        store.clear_county_geometries().context(StorageSnafu)?;
        let rows = county_rows(features);
        match store.upsert_county_geometries(&rows) {
            Ok(n) => info!("load_boundaries: {}: {} county shapes", file_name, n),
            Err(e) => error!("load_boundaries: {}: county insert failed: {}", file_name, e),
        }
    }
    let count = store.county_count().context(StorageSnafu)?;
    info!("Loaded {} counties from {}", count, file_name);
    Ok(count)
}

fn load_topology_layer<S: Store>(store: &mut S, topology: &Topology, layer: &str) {
    let features = match read_layer(topology, layer) {
        Ok(features) => features,
        Err(e) => {
            error!("load_boundaries: skipping layer {}: {}", layer, e);
            return;
        }
    };
    let res = if layer == STATES_LAYER {
        store.upsert_state_geometries(&state_rows(features))
    } else {
        store.upsert_county_geometries(&county_rows(features))
    };
    match res {
        Ok(n) => info!("load_boundaries: layer {}: {} shapes", layer, n),
        Err(e) => error!("load_boundaries: layer {}: insert failed: {}", layer, e),
    }
}

fn county_rows(features: Vec<ShapeFeature>) -> Vec<GeometryRecord> {
    features
        .into_iter()
        .map(|f| GeometryRecord::county(pad_code(&f.id, COUNTY_CODE_WIDTH), f.geometry))
        .collect()
}

fn state_rows(features: Vec<ShapeFeature>) -> Vec<GeometryRecord> {
    features
        .into_iter()
        .map(|f| GeometryRecord::state(pad_code(&f.id, STATE_CODE_WIDTH), f.geometry))
        .collect()
}

/// Replaces the results of `year` with the content of a CSV file.
///
/// The whole file is read before the store is touched: a malformed file leaves the previous
/// results of the year in place. Returns the number of rows stored for the year.
pub fn load_results<S: Store>(
    store: &mut S,
    path: &str,
    year: i32,
    columns: &CsvColumns,
) -> AtlasResult<usize> {
    let parsed = io_csv::read_returns_csv(path, year, columns)?;
    let count = store
        .replace_year(year, &parsed.records)
        .context(StorageSnafu)?;
    info!(
        "Loaded {} results for {} from {} ({} rows dropped)",
        count,
        year,
        simplify_file_name(path),
        parsed.dropped
    );
    Ok(count)
}

// ******** Commands *********

fn open_store(config: &AtlasConfig, store_path: Option<&str>) -> AtlasResult<SqliteStore> {
    let path = config.resolve_store_path(store_path);
    debug!("open_store: {}", path);
    SqliteStore::open(&path)
}

/// The requested year, or the most recent one in the store.
fn resolve_year<S: Store>(store: &S, year: Option<i32>) -> AtlasResult<i32> {
    match year {
        Some(y) => Ok(y),
        None => match get_years(store).first() {
            Some(y) => Ok(*y),
            None => whatever!("The store has no results yet, load a year first"),
        },
    }
}

pub fn run_load(
    config: &AtlasConfig,
    boundary_path: &str,
    csv_path: &str,
    year: i32,
    store_path: Option<&str>,
) -> AtlasResult<()> {
    let mut store = open_store(config, store_path)?;

    let geo_count = load_boundaries(&mut store, boundary_path)?;
    ensure!(geo_count > 0, EmptyLoadSnafu { path: boundary_path });
    println!("Counties loaded: {}", geo_count);

    let csv_count = load_results(&mut store, csv_path, year, &config.columns)?;
    ensure!(csv_count > 0, EmptyLoadSnafu { path: csv_path });
    println!("Results loaded: {}", csv_count);

    let states = get_states(&store, year);
    print!("{}", report::summary_table(year, &states, &config.parties));
    Ok(())
}

pub fn run_export(
    config: &AtlasConfig,
    year: i32,
    out: &str,
    store_path: Option<&str>,
) -> AtlasResult<()> {
    let store = open_store(config, store_path)?;
    let count = export_geojson(&store, year, out)?;
    println!("Exported {} counties to {}", count, out);
    Ok(())
}

pub fn run_script(
    config: &AtlasConfig,
    year: i32,
    out: &str,
    store_path: Option<&str>,
) -> AtlasResult<()> {
    let store = open_store(config, store_path)?;
    let count = write_map_script(&store, year, out)?;
    println!("Wrote the map data of {} counties to {}", count, out);
    Ok(())
}

/// Prints the national summary and the per-state table of a year.
///
/// With a reference file, the printed text must match it line for line.
pub fn run_summary(
    config: &AtlasConfig,
    year: Option<i32>,
    store_path: Option<&str>,
    reference: Option<&str>,
) -> AtlasResult<()> {
    let store = open_store(config, store_path)?;
    let year = resolve_year(&store, year)?;
    let text = summary_text(&store, year, &config.parties);
    print!("{}", text);

    if let Some(ref_path) = reference {
        let expected = fs::read_to_string(ref_path).context(OpeningFileSnafu { path: ref_path })?;
        if expected != text {
            warn!("run_summary: the summary differs from {}", ref_path);
            print_diff(expected.as_str(), text.as_str(), "\n");
            whatever!("Difference detected between the summary and the reference summary")
        }
        info!("run_summary: the summary matches {}", ref_path);
    }
    Ok(())
}

fn summary_text<S: Store>(store: &S, year: i32, parties: &PartyLabels) -> String {
    let states = get_states(store, year);
    let national = national_totals(&states, get_total_votes(store, year));
    let mut text = report::national_summary(year, &national, parties);
    text.push_str(&report::summary_table(year, &states, parties));
    text
}

pub fn run_info(config: &AtlasConfig, store_path: Option<&str>) -> AtlasResult<()> {
    let store = open_store(config, store_path)?;
    let county_count = store.county_count().context(StorageSnafu)?;
    print!("{}", report::store_info(county_count, &get_years(&store)));
    Ok(())
}
