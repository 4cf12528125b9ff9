// ********* Jurisdiction codes ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Width of a state code ("06").
pub const STATE_CODE_WIDTH: usize = 2;
/// Width of a county code ("06037"): the state code followed by a 3-digit local code.
pub const COUNTY_CODE_WIDTH: usize = 5;

/// Left-pads a raw identifier with zeros up to `width` characters.
///
/// Identifiers that are already at least `width` long are returned unchanged.
/// Codes are opaque keys: this never parses them as numbers.
pub fn pad_code(raw: &str, width: usize) -> String {
    format!("{:0>width$}", raw, width = width)
}

/// The state code of a (padded) county code: its first two characters.
pub fn parent_code(county_code: &str) -> String {
    county_code.chars().take(STATE_CODE_WIDTH).collect()
}

// ********* Stored records ***********

/// A shape, in the GeoJSON geometry encoding.
///
/// Only polygons and multipolygons are stored: boundaries of other kinds are dropped by the
/// readers (see `is_areal`).
pub use geojson::{Geometry, Value as GeometryValue};

/// True for the geometry kinds that can be filled on a map.
pub fn is_areal(geometry: &Geometry) -> bool {
    matches!(
        geometry.value,
        GeometryValue::Polygon(_) | GeometryValue::MultiPolygon(_)
    )
}

/// One row of the county or state geometry table.
#[derive(PartialEq, Debug, Clone)]
pub struct GeometryRecord {
    pub code: String,
    /// Always written empty by the loaders. Names are resolved when joining.
    pub display_name: String,
    /// The state code for a county, empty for a state.
    pub parent_code: String,
    pub geometry: Option<Geometry>,
}

impl GeometryRecord {
    pub fn county(code: String, geometry: Option<Geometry>) -> GeometryRecord {
        GeometryRecord {
            parent_code: parent_code(&code),
            code,
            display_name: String::new(),
            geometry,
        }
    }

    pub fn state(code: String, geometry: Option<Geometry>) -> GeometryRecord {
        GeometryRecord {
            code,
            display_name: String::new(),
            parent_code: String::new(),
            geometry,
        }
    }
}

/// The returns of one county for one election year.
///
/// `votes_total` may exceed `votes_a + votes_b` (third parties, write-ins).
/// The percentages are taken from the source file as-is.
#[derive(PartialEq, Debug, Clone)]
pub struct ResultRecord {
    pub year: i32,
    pub county_code: String,
    /// Missing for rows written before the column existed.
    pub county_name: Option<String>,
    pub votes_a: i64,
    pub votes_b: i64,
    pub votes_total: i64,
    pub pct_a: f64,
    pub pct_b: f64,
    pub margin: f64,
}

impl ResultRecord {
    /// Builds a record, deriving the margin from the two percentages.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        county_code: String,
        county_name: Option<String>,
        votes_a: i64,
        votes_b: i64,
        votes_total: i64,
        pct_a: f64,
        pct_b: f64,
    ) -> ResultRecord {
        ResultRecord {
            year,
            county_code,
            county_name,
            votes_a,
            votes_b,
            votes_total,
            pct_a,
            pct_b,
            margin: pct_a - pct_b,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NameRecord {
    pub code: String,
    pub name: String,
}

// ******** Joined views *********

/// The two tracked parties.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Party {
    A,
    B,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::A => "A",
            Party::B => "B",
        }
    }

    /// The winner between two vote counts. Ties go to B.
    pub fn winner(votes_a: i64, votes_b: i64) -> Party {
        if votes_a > votes_b {
            Party::A
        } else {
            Party::B
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One county geometry row, joined to its returns for a year and to its state name.
#[derive(PartialEq, Debug, Clone)]
pub struct CountyView {
    pub code: String,
    pub display_name: String,
    pub state_name: String,
    pub state_code: String,
    pub votes_a: i64,
    pub votes_b: i64,
    pub votes_total: i64,
    pub pct_a: f64,
    pub pct_b: f64,
    pub margin: f64,
    /// The geometry as GeoJSON text, `"null"` when the county has no shape.
    pub geojson: String,
}

/// The sum of the counties of a state for a year.
#[derive(PartialEq, Debug, Clone)]
pub struct StateView {
    pub code: String,
    pub name: String,
    pub votes_a: i64,
    pub votes_b: i64,
    pub votes_total: i64,
    pub pct_a: f64,
    pub pct_b: f64,
    pub winner: Party,
    /// The state outline as GeoJSON text, `"null"` when there is none.
    pub geojson: String,
}

/// Nationwide totals for a year.
#[derive(PartialEq, Debug, Clone)]
pub struct NationalView {
    pub votes_a: i64,
    pub votes_b: i64,
    /// Sum of the county totals reported for the year.
    pub votes_total: i64,
    pub pct_a: f64,
    pub pct_b: f64,
    pub winner: Party,
}

// ******** Errors *********

/// Errors reported by a store backend.
#[derive(Debug)]
pub enum StoreError {
    /// The backend failed to run an operation.
    Backend(Box<dyn Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E: Error + Send + Sync + 'static>(err: E) -> StoreError {
        StoreError::Backend(Box::new(err))
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Backend(e) => Some(e.as_ref()),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Backend(e) => write!(f, "store backend error: {}", e),
        }
    }
}
