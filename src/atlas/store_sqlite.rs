// A durable store in a SQLite database file.

use rusqlite::{params, Connection, OptionalExtension};
use snafu::ResultExt;
use vote_atlas::{
    state_name_records, Geometry, GeometryRecord, NameRecord, ResultRecord, Store, StoreError,
};

use crate::atlas::*;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS counties (
    fips TEXT PRIMARY KEY,
    name TEXT,
    state_fips TEXT,
    geometry TEXT
);
CREATE TABLE IF NOT EXISTS states (
    fips TEXT PRIMARY KEY,
    name TEXT,
    geometry TEXT
);
CREATE TABLE IF NOT EXISTS state_names (
    fips TEXT PRIMARY KEY,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS results (
    year INTEGER NOT NULL,
    county_fips TEXT NOT NULL,
    county_name TEXT,
    votes_gop INTEGER NOT NULL,
    votes_dem INTEGER NOT NULL,
    votes_total INTEGER NOT NULL,
    per_gop REAL NOT NULL,
    per_dem REAL NOT NULL,
    margin REAL NOT NULL,
    PRIMARY KEY (year, county_fips)
);
";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and brings its schema up to date.
    pub fn open(path: &str) -> AtlasResult<SqliteStore> {
        let conn = Connection::open(path).context(OpeningStoreSnafu { path })?;
        SqliteStore::init(conn, path)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> AtlasResult<SqliteStore> {
        let conn = Connection::open_in_memory().context(OpeningStoreSnafu { path: ":memory:" })?;
        SqliteStore::init(conn, ":memory:")
    }

    fn init(conn: Connection, path: &str) -> AtlasResult<SqliteStore> {
        conn.execute_batch(SCHEMA)
            .context(OpeningStoreSnafu { path })?;
        if add_column_if_missing(&conn, "results", "county_name", "TEXT")
            .context(OpeningStoreSnafu { path })?
        {
            info!("Added county_name column to results table");
        }
        for n in state_name_records() {
            conn.execute(
                "INSERT OR IGNORE INTO state_names (fips, name) VALUES (?1, ?2)",
                params![n.code, n.name],
            )
            .context(OpeningStoreSnafu { path })?;
        }
        debug!("SqliteStore: opened {}", path);
        Ok(SqliteStore { conn })
    }

    /// `sql` takes the code, the name and the geometry, then the parent code if `with_parent`.
    fn upsert_geometries(
        &mut self,
        sql: &str,
        rows: &[GeometryRecord],
        with_parent: bool,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::backend)?;
        {
            let mut stmt = tx.prepare(sql).map_err(StoreError::backend)?;
            for row in rows {
                let geometry = encode_geometry(&row.geometry)?;
                let res = if with_parent {
                    stmt.execute(params![row.code, row.display_name, geometry, row.parent_code])
                } else {
                    stmt.execute(params![row.code, row.display_name, geometry])
                };
                res.map_err(StoreError::backend)?;
            }
        }
        tx.commit().map_err(StoreError::backend)?;
        Ok(rows.len())
    }

    fn read_geometries(&self, sql: &str, table: &str) -> Result<Vec<GeometryRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql).map_err(StoreError::backend)?;
        let raw = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, Option<String>>(1)?,
                    r.get::<_, Option<String>>(2)?,
                    r.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(StoreError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)?;

        Ok(raw
            .into_iter()
            .map(|(code, name, parent, text)| {
                let geometry = decode_geometry(text.as_deref(), table, &code);
                GeometryRecord {
                    code,
                    display_name: name.unwrap_or_default(),
                    parent_code: parent.unwrap_or_default(),
                    geometry,
                }
            })
            .collect())
    }
}

/// Adds a column to a table created by an older version. Returns true if the column was added.
fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> rusqlite::Result<bool> {
    let present = conn
        .query_row(
            &format!("SELECT 1 FROM pragma_table_info('{table}') WHERE name = ?1"),
            [column],
            |r| r.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if present {
        return Ok(false);
    }
    conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"), [])?;
    Ok(true)
}

fn encode_geometry(geometry: &Option<Geometry>) -> Result<Option<String>, StoreError> {
    match geometry {
        Some(g) => serde_json::to_string(g)
            .map(Some)
            .map_err(StoreError::backend),
        None => Ok(None),
    }
}

/// A stored shape that cannot be read back is treated as a missing shape.
fn decode_geometry(text: Option<&str>, table: &str, code: &str) -> Option<Geometry> {
    match text {
        None | Some("null") => None,
        Some(t) => match serde_json::from_str(t) {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("{}: unreadable geometry for {}, ignoring it: {}", table, code, e);
                None
            }
        },
    }
}

impl Store for SqliteStore {
    fn clear_county_geometries(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM counties", [])
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn clear_state_geometries(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM states", [])
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn upsert_county_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError> {
        self.upsert_geometries(
            "INSERT INTO counties (fips, name, geometry, state_fips) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(fips) DO UPDATE SET geometry=excluded.geometry",
            rows,
            true,
        )
    }

    fn upsert_state_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError> {
        self.upsert_geometries(
            "INSERT INTO states (fips, name, geometry) VALUES (?1, ?2, ?3)
             ON CONFLICT(fips) DO UPDATE SET geometry=excluded.geometry",
            rows,
            false,
        )
    }

    fn replace_year(&mut self, year: i32, rows: &[ResultRecord]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::backend)?;
        let deleted = tx
            .execute("DELETE FROM results WHERE year = ?1", [year])
            .map_err(StoreError::backend)?;
        debug!("replace_year: {}: {} previous rows deleted", year, deleted);
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO results (year, county_fips, county_name, votes_gop,
                       votes_dem, votes_total, per_gop, per_dem, margin)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(StoreError::backend)?;
            for r in rows {
                stmt.execute(params![
                    year,
                    r.county_code,
                    r.county_name,
                    r.votes_a,
                    r.votes_b,
                    r.votes_total,
                    r.pct_a,
                    r.pct_b,
                    r.margin
                ])
                .map_err(StoreError::backend)?;
            }
        }
        let count: i64 = tx
            .query_row("SELECT COUNT(*) FROM results WHERE year = ?1", [year], |r| {
                r.get(0)
            })
            .map_err(StoreError::backend)?;
        tx.commit().map_err(StoreError::backend)?;
        Ok(count as usize)
    }

    fn county_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        self.read_geometries(
            "SELECT fips, name, state_fips, geometry FROM counties ORDER BY fips",
            "counties",
        )
    }

    fn state_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        self.read_geometries(
            "SELECT fips, name, NULL, geometry FROM states ORDER BY fips",
            "states",
        )
    }

    fn results_for_year(&self, year: i32) -> Result<Vec<ResultRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT county_fips, county_name, votes_gop, votes_dem, votes_total, per_gop,
                   per_dem, margin
                 FROM results WHERE year = ?1 ORDER BY county_fips",
            )
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map([year], |r| {
                Ok(ResultRecord {
                    year,
                    county_code: r.get(0)?,
                    county_name: r.get(1)?,
                    votes_a: r.get(2)?,
                    votes_b: r.get(3)?,
                    votes_total: r.get(4)?,
                    pct_a: r.get(5)?,
                    pct_b: r.get(6)?,
                    margin: r.get(7)?,
                })
            })
            .map_err(StoreError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)?;
        Ok(rows)
    }

    fn state_names(&self) -> Result<Vec<NameRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT fips, name FROM state_names ORDER BY fips")
            .map_err(StoreError::backend)?;
        let rows = stmt
            .query_map([], |r| {
                Ok(NameRecord {
                    code: r.get(0)?,
                    name: r.get(1)?,
                })
            })
            .map_err(StoreError::backend)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::backend)?;
        Ok(rows)
    }

    fn years(&self) -> Result<Vec<i32>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT year FROM results")
            .map_err(StoreError::backend)?;
        let years = stmt
            .query_map([], |r| r.get(0))
            .map_err(StoreError::backend)?
            .collect::<Result<Vec<i32>, _>>()
            .map_err(StoreError::backend)?;
        Ok(years)
    }

    fn county_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM counties", [], |r| r.get(0))
            .map_err(StoreError::backend)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn square() -> Option<Geometry> {
        Some(Geometry::new(GeometryValue::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]])))
    }

    fn result(code: &str, a: i64, b: i64) -> ResultRecord {
        ResultRecord::new(2024, code.to_string(), None, a, b, a + b, 0.25, 0.75)
    }

    #[test]
    fn names_are_seeded_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.db");
        let path = path.to_str().unwrap();
        let store = SqliteStore::open(path).unwrap();
        assert_eq!(store.state_names().unwrap().len(), 51);
        drop(store);
        let store = SqliteStore::open(path).unwrap();
        let names = store.state_names().unwrap();
        assert_eq!(names.len(), 51);
        assert_eq!(names[0].code, "01");
        assert_eq!(names[0].name, "Alabama");
    }

    #[test]
    fn upsert_only_refreshes_the_shape() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let row = GeometryRecord::county("06037".to_string(), None);
        assert_eq!(store.upsert_county_geometries(&[row.clone()]).unwrap(), 1);
        let updated = GeometryRecord::county("06037".to_string(), square());
        store.upsert_county_geometries(&[updated.clone()]).unwrap();
        assert_eq!(store.county_count().unwrap(), 1);
        assert_eq!(store.county_geometries().unwrap(), vec![updated]);

        store
            .upsert_state_geometries(&[GeometryRecord::state("06".to_string(), square())])
            .unwrap();
        let states = store.state_geometries().unwrap();
        assert_eq!(states[0].parent_code, "");
        assert_eq!(states[0].geometry, square());
        store.clear_state_geometries().unwrap();
        assert!(store.state_geometries().unwrap().is_empty());
        assert_eq!(store.county_count().unwrap(), 1);
    }

    #[test]
    fn replace_year_in_a_transaction() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut other = result("01001", 5, 6);
        other.year = 2020;
        store.replace_year(2020, &[other]).unwrap();
        assert_eq!(
            store
                .replace_year(2024, &[result("06037", 1, 2), result("06001", 3, 4)])
                .unwrap(),
            2
        );
        assert_eq!(store.replace_year(2024, &[result("06037", 7, 8)]).unwrap(), 1);

        let rows = store.results_for_year(2024).unwrap();
        assert_eq!(rows, vec![result("06037", 7, 8)]);
        assert_eq!(store.results_for_year(2020).unwrap().len(), 1);
        let mut years = store.years().unwrap();
        years.sort();
        assert_eq!(years, vec![2020, 2024]);
    }

    #[test]
    fn adds_the_county_name_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.db");
        let path = path.to_str().unwrap();
        {
            let conn = Connection::open(path).unwrap();
            conn.execute_batch(
                "CREATE TABLE results (
                    year INTEGER NOT NULL, county_fips TEXT NOT NULL,
                    votes_gop INTEGER NOT NULL, votes_dem INTEGER NOT NULL,
                    votes_total INTEGER NOT NULL, per_gop REAL NOT NULL,
                    per_dem REAL NOT NULL, margin REAL NOT NULL,
                    PRIMARY KEY (year, county_fips));
                 INSERT INTO results VALUES (2016, '06037', 10, 20, 35, 0.25, 0.5, -0.25);",
            )
            .unwrap();
        }
        let mut store = SqliteStore::open(path).unwrap();
        let old = store.results_for_year(2016).unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].county_name, None);
        assert_eq!(old[0].votes_total, 35);

        let mut named = result("06037", 1, 2);
        named.county_name = Some("Los Angeles County".to_string());
        store.replace_year(2024, &[named.clone()]).unwrap();
        assert_eq!(store.results_for_year(2024).unwrap(), vec![named]);

        // Opening again finds the column in place.
        drop(store);
        let conn = Connection::open(path).unwrap();
        assert!(!add_column_if_missing(&conn, "results", "county_name", "TEXT").unwrap());
    }

    #[test]
    fn unreadable_geometry_is_a_missing_shape() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_county_geometries(&[GeometryRecord::county("06001".to_string(), square())])
            .unwrap();
        store
            .upsert_state_geometries(&[GeometryRecord::state("06".to_string(), square())])
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO counties (fips, name, state_fips, geometry) VALUES ('06037', '', '06', '{oops')",
                [],
            )
            .unwrap();
        store
            .replace_year(2024, &[result("06037", 10, 30), result("06001", 5, 1)])
            .unwrap();

        let rows = store.county_geometries().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].geometry, square());
        assert_eq!(rows[1].code, "06037");
        assert_eq!(rows[1].geometry, None);

        // The other rows still join and aggregate.
        let counties = get_counties(&store, 2024);
        assert_eq!(counties.len(), 2);
        let la = counties.iter().find(|c| c.code == "06037").unwrap();
        assert_eq!(la.geojson, "null");
        assert_eq!(la.votes_a, 10);
        let states = get_states(&store, 2024);
        assert_eq!(states.len(), 1);
        assert_eq!((states[0].votes_a, states[0].votes_b), (15, 31));
        assert_ne!(states[0].geojson, "null");
    }
}
