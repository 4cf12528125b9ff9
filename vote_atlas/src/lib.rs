mod classify;
mod config;
pub mod manual;
mod names;
mod store;
use log::{debug, error, warn};

use std::collections::{BTreeMap, HashMap};

pub use crate::classify::*;
pub use crate::config::*;
pub use crate::names::*;
pub use crate::store::*;

// **** Query and aggregation ****
//
// Everything is recomputed from the store on each call. The inputs are bounded by the
// number of U.S. counties, so there is no cache.

/// The years with at least one result row, most recent first.
pub fn get_years<S: Store>(store: &S) -> Vec<i32> {
    match store.years() {
        Ok(mut years) => {
            years.sort_unstable_by(|a, b| b.cmp(a));
            years.dedup();
            years
        }
        Err(e) => {
            error!("get_years: {}", e);
            Vec::new()
        }
    }
}

/// One view per county geometry row, joined to the results of `year` and to the state names.
///
/// Counties without results for the year are kept with zero votes. The county name is taken
/// from the result row, then from the geometry row, and is empty otherwise.
/// Ordered by state name, then county name (then code, for rows with equal names).
pub fn get_counties<S: Store>(store: &S, year: i32) -> Vec<CountyView> {
    match join_counties(store, year, true) {
        Ok(counties) => {
            debug!(
                "get_counties: year {}: {} counties, first: {:?}",
                year,
                counties.len(),
                counties
                    .iter()
                    .take(3)
                    .map(|c| (c.code.as_str(), c.display_name.as_str()))
                    .collect::<Vec<_>>()
            );
            counties
        }
        Err(e) => {
            error!("get_counties: year {}: {}", year, e);
            Vec::new()
        }
    }
}

/// One view per state code found among the county rows, with the votes of its counties summed.
///
/// A state whose counties have no results for the year is still returned, with zero votes and
/// party B as the winner. Ordered by state name, then code.
pub fn get_states<S: Store>(store: &S, year: i32) -> Vec<StateView> {
    match aggregate_states(store, year) {
        Ok(states) => states,
        Err(e) => {
            error!("get_states: year {}: {}", year, e);
            Vec::new()
        }
    }
}

/// Sum of the reported totals over every result row of the year.
pub fn get_total_votes<S: Store>(store: &S, year: i32) -> i64 {
    match store.results_for_year(year) {
        Ok(results) => results.iter().map(|r| r.votes_total).sum(),
        Err(e) => {
            error!("get_total_votes: year {}: {}", year, e);
            0
        }
    }
}

/// Nationwide totals: the party votes summed over the states, and the reported total.
pub fn get_national<S: Store>(store: &S, year: i32) -> NationalView {
    let states = get_states(store, year);
    national_totals(&states, get_total_votes(store, year))
}

pub fn national_totals(states: &[StateView], votes_total: i64) -> NationalView {
    let votes_a: i64 = states.iter().map(|s| s.votes_a).sum();
    let votes_b: i64 = states.iter().map(|s| s.votes_b).sum();
    NationalView {
        votes_a,
        votes_b,
        votes_total,
        pct_a: share(votes_a, votes_total),
        pct_b: share(votes_b, votes_total),
        winner: Party::winner(votes_a, votes_b),
    }
}

fn share(votes: i64, total: i64) -> f64 {
    if total > 0 {
        votes as f64 / total as f64
    } else {
        0.0
    }
}

/// Serializes an optional geometry. A missing geometry gives `"null"`, a failure gives an
/// empty string: both are skipped by the feature writers.
fn geometry_to_geojson(code: &str, geometry: &Option<Geometry>) -> String {
    match serde_json::to_string(geometry) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not serialize the geometry of {}: {}", code, e);
            String::new()
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|x| !x.is_empty())
}

fn join_counties<S: Store>(
    store: &S,
    year: i32,
    with_geometry: bool,
) -> Result<Vec<CountyView>, StoreError> {
    let geometries = store.county_geometries()?;
    let results = store.results_for_year(year)?;
    let names: HashMap<String, String> = store
        .state_names()?
        .into_iter()
        .map(|n| (n.code, n.name))
        .collect();
    let results_by_code: HashMap<&str, &ResultRecord> = results
        .iter()
        .map(|r| (r.county_code.as_str(), r))
        .collect();

    let mut views: Vec<CountyView> = geometries
        .iter()
        .map(|g| {
            let r = results_by_code.get(g.code.as_str()).copied();
            let display_name = non_empty(r.and_then(|r| r.county_name.as_deref()))
                .or_else(|| non_empty(Some(g.display_name.as_str())))
                .unwrap_or("")
                .to_string();
            let geojson = if with_geometry {
                geometry_to_geojson(&g.code, &g.geometry)
            } else {
                String::new()
            };
            CountyView {
                code: g.code.clone(),
                display_name,
                state_name: names.get(&g.parent_code).cloned().unwrap_or_default(),
                state_code: g.parent_code.clone(),
                votes_a: r.map(|r| r.votes_a).unwrap_or(0),
                votes_b: r.map(|r| r.votes_b).unwrap_or(0),
                votes_total: r.map(|r| r.votes_total).unwrap_or(0),
                pct_a: r.map(|r| r.pct_a).unwrap_or(0.0),
                pct_b: r.map(|r| r.pct_b).unwrap_or(0.0),
                margin: r.map(|r| r.margin).unwrap_or(0.0),
                geojson,
            }
        })
        .collect();

    views.sort_by(|a, b| {
        (&a.state_name, &a.display_name, &a.code).cmp(&(&b.state_name, &b.display_name, &b.code))
    });
    Ok(views)
}

fn aggregate_states<S: Store>(store: &S, year: i32) -> Result<Vec<StateView>, StoreError> {
    let counties = join_counties(store, year, false)?;
    // The vote sums do not need the outlines.
    let outlines: HashMap<String, Option<Geometry>> = match store.state_geometries() {
        Ok(rows) => rows.into_iter().map(|g| (g.code, g.geometry)).collect(),
        Err(e) => {
            warn!("get_states: year {}: state outlines unavailable: {}", year, e);
            HashMap::new()
        }
    };

    // state code -> (name, votes a, votes b, total)
    let mut sums: BTreeMap<&str, (&str, i64, i64, i64)> = BTreeMap::new();
    for c in counties.iter() {
        let entry = sums
            .entry(c.state_code.as_str())
            .or_insert((c.state_name.as_str(), 0, 0, 0));
        entry.1 += c.votes_a;
        entry.2 += c.votes_b;
        entry.3 += c.votes_total;
    }

    let mut states: Vec<StateView> = sums
        .into_iter()
        .map(|(code, (name, votes_a, votes_b, votes_total))| StateView {
            code: code.to_string(),
            name: name.to_string(),
            votes_a,
            votes_b,
            votes_total,
            pct_a: share(votes_a, votes_total),
            pct_b: share(votes_b, votes_total),
            winner: Party::winner(votes_a, votes_b),
            geojson: match outlines.get(code) {
                Some(geometry) => geometry_to_geojson(code, geometry),
                None => "null".to_string(),
            },
        })
        .collect();
    states.sort_by(|a, b| (&a.name, &a.code).cmp(&(&b.name, &b.code)));
    debug!("get_states: year {}: {} states", year, states.len());
    Ok(states)
}
