use clap::{Parser, Subcommand};

/// Loads county boundaries and county-level election returns into a store, and produces
/// per-county and per-state results for maps.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file: store path, CSV column names and
    /// party labels. See the Configuration section of `vote_atlas::manual` for the format.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Loads a boundary file (TopoJSON or GeoJSON) and the returns of one year, then prints the
    /// per-state summary of that year.
    Load {
        /// (file path) The county boundaries.
        #[clap(value_parser)]
        boundary: String,
        /// (file path) The county-level returns, as CSV with a header row.
        #[clap(value_parser)]
        csv: String,
        /// The election year of the returns.
        #[clap(value_parser)]
        year: i32,
        /// (file path, optional) The store. Overrides the path of the configuration.
        #[clap(value_parser)]
        store: Option<String>,
    },
    /// Writes the counties of a year as a GeoJSON feature collection.
    Export {
        #[clap(short, long, value_parser)]
        year: i32,
        /// (file path) The destination file.
        #[clap(short, long, value_parser)]
        out: String,
        /// (file path, optional) The store.
        #[clap(short, long, value_parser)]
        store: Option<String>,
    },
    /// Writes the counties of a year, with their colors, as a JavaScript statement for the map.
    Script {
        #[clap(short, long, value_parser)]
        year: i32,
        /// (file path) The destination file.
        #[clap(short, long, value_parser)]
        out: String,
        /// (file path, optional) The store.
        #[clap(short, long, value_parser)]
        store: Option<String>,
    },
    /// Prints the national and per-state results of a year.
    Summary {
        /// (default: the most recent year in the store)
        #[clap(short, long, value_parser)]
        year: Option<i32>,
        /// (file path, optional) The store.
        #[clap(short, long, value_parser)]
        store: Option<String>,
        /// (file path) A reference file containing the expected summary. If provided, the
        /// printed summary must match it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Prints the number of counties and the years available in the store.
    Info {
        /// (file path, optional) The store.
        #[clap(short, long, value_parser)]
        store: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_arguments() {
        let args = Args::try_parse_from([
            "voteatlas",
            "load",
            "counties-10m.json",
            "results.csv",
            "2024",
            "--verbose",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Load {
                boundary,
                csv,
                year,
                store,
            } => {
                assert_eq!(boundary, "counties-10m.json");
                assert_eq!(csv, "results.csv");
                assert_eq!(year, 2024);
                assert_eq!(store, None);
            }
            c => panic!("unexpected command {:?}", c),
        }
    }

    #[test]
    fn usage_errors() {
        assert!(Args::try_parse_from(["voteatlas", "load", "a.json", "b.csv"]).is_err());
        assert!(Args::try_parse_from(["voteatlas", "load", "a.json", "b.csv", "year"]).is_err());
        assert!(Args::try_parse_from(["voteatlas", "export", "--year", "2024"]).is_err());
    }

    #[test]
    fn global_config() {
        let args = Args::try_parse_from([
            "voteatlas",
            "summary",
            "--config",
            "atlas.json",
            "-r",
            "expected.txt",
        ])
        .unwrap();
        assert_eq!(args.config.as_deref(), Some("atlas.json"));
        assert!(matches!(
            args.command,
            Command::Summary { year: None, store: None, reference: Some(_) }
        ));
    }
}
