// Primitives for reading CSV files of county returns.

use std::collections::HashMap;

use csv::StringRecord;
use snafu::{OptionExt, ResultExt};
use vote_atlas::{pad_code, ResultRecord, COUNTY_CODE_WIDTH};

use crate::atlas::{config_reader::CsvColumns, io_common::normalize_identifier, *};

/// Identifiers shorter than this (once read back from the file) are not county codes.
const MIN_IDENTIFIER_LEN: usize = 4;

#[derive(PartialEq, Debug, Clone)]
pub struct ParsedReturns {
    pub records: Vec<ResultRecord>,
    /// Rows dropped because of their identifier.
    pub dropped: usize,
}

struct ColumnIndexes {
    county_id: usize,
    county_name: Option<usize>,
    votes_a: usize,
    votes_b: usize,
    votes_total: usize,
    pct_a: usize,
    pct_b: usize,
}

pub fn read_returns_csv(path: &str, year: i32, columns: &CsvColumns) -> AtlasResult<ParsedReturns> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header = rdr.headers().context(CsvOpenSnafu { path })?.clone();
    debug!("read_returns_csv: header: {:?}", header);
    let idx = column_indexes(&header, columns, path)?;

    let mut records: Vec<ResultRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0;
    for (row, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = (row + 2) as u64;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;

        let raw_id = normalize_identifier(cell(&line, idx.county_id));
        if raw_id.chars().count() < MIN_IDENTIFIER_LEN {
            debug!("read_returns_csv: line {}: dropping identifier {:?}", lineno, raw_id);
            dropped += 1;
            continue;
        }
        let county_code = pad_code(&raw_id, COUNTY_CODE_WIDTH);

        let record = ResultRecord::new(
            year,
            county_code.clone(),
            idx.county_name.map(|i| cell(&line, i).to_string()),
            read_count(&line, idx.votes_a, &columns.votes_a, lineno)?,
            read_count(&line, idx.votes_b, &columns.votes_b, lineno)?,
            read_count(&line, idx.votes_total, &columns.votes_total, lineno)?,
            read_share(&line, idx.pct_a, &columns.pct_a, lineno)?,
            read_share(&line, idx.pct_b, &columns.pct_b, lineno)?,
        );

        match positions.get(&county_code) {
            Some(&pos) => {
                warn!(
                    "read_returns_csv: line {}: county {} appears again, keeping this line",
                    lineno, county_code
                );
                records[pos] = record;
            }
            None => {
                positions.insert(county_code, records.len());
                records.push(record);
            }
        }
    }
    info!(
        "read_returns_csv: {}: {} rows kept, {} rows without a county identifier",
        path,
        records.len(),
        dropped
    );
    Ok(ParsedReturns { records, dropped })
}

fn column_indexes(header: &StringRecord, columns: &CsvColumns, path: &str) -> AtlasResult<ColumnIndexes> {
    let find = |name: &str| header.iter().position(|h| h == name);
    let require = |name: &str| -> AtlasResult<usize> {
        find(name).context(CsvMissingColumnSnafu { column: name, path })
    };
    let county_name = find(columns.county_name.as_str());
    if county_name.is_none() {
        warn!(
            "read_returns_csv: {}: no {} column, county names will be empty",
            path, columns.county_name
        );
    }
    Ok(ColumnIndexes {
        county_id: require(columns.county_id.as_str())?,
        county_name,
        votes_a: require(columns.votes_a.as_str())?,
        votes_b: require(columns.votes_b.as_str())?,
        votes_total: require(columns.votes_total.as_str())?,
        pct_a: require(columns.pct_a.as_str())?,
        pct_b: require(columns.pct_b.as_str())?,
    })
}

fn cell(line: &StringRecord, idx: usize) -> &str {
    line.get(idx).unwrap_or("")
}

/// Vote counts are integers, but some exports write them with a fraction.
fn read_count(line: &StringRecord, idx: usize, column: &str, lineno: u64) -> AtlasResult<i64> {
    let s = cell(line, idx);
    s.parse::<i64>()
        .ok()
        .or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.round() as i64)
        })
        .context(CsvBadCellSnafu {
            lineno,
            column,
            content: s,
        })
}

fn read_share(line: &StringRecord, idx: usize, column: &str, lineno: u64) -> AtlasResult<f64> {
    let s = cell(line, idx);
    s.parse::<f64>().ok().filter(|f| f.is_finite()).context(CsvBadCellSnafu {
        lineno,
        column,
        content: s,
    })
}
