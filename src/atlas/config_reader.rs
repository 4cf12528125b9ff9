use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::atlas::{io_common::read_text, *};

/// The store used when neither the command line nor the configuration names one.
pub const DEFAULT_STORE_PATH: &str = "elections.db";

/// The names of the CSV columns read by the results loader.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    #[serde(rename = "countyId")]
    pub county_id: String,
    #[serde(rename = "countyName")]
    pub county_name: String,
    #[serde(rename = "votesA")]
    pub votes_a: String,
    #[serde(rename = "votesB")]
    pub votes_b: String,
    #[serde(rename = "votesTotal")]
    pub votes_total: String,
    #[serde(rename = "pctA")]
    pub pct_a: String,
    #[serde(rename = "pctB")]
    pub pct_b: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        CsvColumns {
            county_id: "county_fips".to_string(),
            county_name: "county_name".to_string(),
            votes_a: "votes_gop".to_string(),
            votes_b: "votes_dem".to_string(),
            votes_total: "total_votes".to_string(),
            pct_a: "per_gop".to_string(),
            pct_b: "per_dem".to_string(),
        }
    }
}

/// Display labels of the two tracked parties.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyLabels {
    pub a: String,
    pub b: String,
}

impl PartyLabels {
    pub fn label(&self, party: Party) -> &str {
        match party {
            Party::A => &self.a,
            Party::B => &self.b,
        }
    }
}

impl Default for PartyLabels {
    fn default() -> Self {
        PartyLabels {
            a: "GOP".to_string(),
            b: "DEM".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    #[serde(rename = "storePath")]
    pub store_path: Option<String>,
    pub columns: CsvColumns,
    pub parties: PartyLabels,
}

impl AtlasConfig {
    /// The store named on the command line, else the configured one, else the default.
    pub fn resolve_store_path(&self, cli_path: Option<&str>) -> String {
        cli_path
            .or(self.store_path.as_deref())
            .unwrap_or(DEFAULT_STORE_PATH)
            .to_string()
    }
}

pub fn read_config(path: &str) -> AtlasResult<AtlasConfig> {
    let contents = read_text(path)?;
    let config: AtlasConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}
