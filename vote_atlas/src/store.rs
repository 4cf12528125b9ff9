use std::collections::BTreeMap;

use crate::config::*;
use crate::names::state_name_records;

/// The storage capability needed by the loaders and the query engine.
///
/// Implementations own the county and state geometry tables, the per-year results table
/// and the state name table. The name table is seeded when the store is created and never
/// written afterwards.
///
/// There is a single writer: loaders take `&mut self`, readers take `&self`.
pub trait Store {
    fn clear_county_geometries(&mut self) -> Result<(), StoreError>;

    fn clear_state_geometries(&mut self) -> Result<(), StoreError>;

    /// Inserts the rows, overwriting the geometry of any row with the same code.
    /// Returns the number of rows written.
    fn upsert_county_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError>;

    fn upsert_state_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError>;

    /// Drops every row of `year`, then inserts `rows`. Other years are untouched.
    /// Returns the number of rows now stored for the year.
    fn replace_year(&mut self, year: i32, rows: &[ResultRecord]) -> Result<usize, StoreError>;

    fn county_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError>;

    fn state_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError>;

    fn results_for_year(&self, year: i32) -> Result<Vec<ResultRecord>, StoreError>;

    fn state_names(&self) -> Result<Vec<NameRecord>, StoreError>;

    /// The distinct years present in the results table, in any order.
    fn years(&self) -> Result<Vec<i32>, StoreError>;

    fn county_count(&self) -> Result<usize, StoreError>;
}

/// A store kept entirely in memory, ordered by key.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    counties: BTreeMap<String, GeometryRecord>,
    states: BTreeMap<String, GeometryRecord>,
    results: BTreeMap<(i32, String), ResultRecord>,
    names: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            counties: BTreeMap::new(),
            states: BTreeMap::new(),
            results: BTreeMap::new(),
            names: state_name_records()
                .into_iter()
                .map(|n| (n.code, n.name))
                .collect(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn upsert(table: &mut BTreeMap<String, GeometryRecord>, rows: &[GeometryRecord]) -> usize {
    for row in rows {
        match table.get_mut(&row.code) {
            // Only the shape is refreshed on a conflict.
            Some(existing) => existing.geometry = row.geometry.clone(),
            None => {
                table.insert(row.code.clone(), row.clone());
            }
        }
    }
    rows.len()
}

impl Store for MemoryStore {
    fn clear_county_geometries(&mut self) -> Result<(), StoreError> {
        self.counties.clear();
        Ok(())
    }

    fn clear_state_geometries(&mut self) -> Result<(), StoreError> {
        self.states.clear();
        Ok(())
    }

    fn upsert_county_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError> {
        Ok(upsert(&mut self.counties, rows))
    }

    fn upsert_state_geometries(&mut self, rows: &[GeometryRecord]) -> Result<usize, StoreError> {
        Ok(upsert(&mut self.states, rows))
    }

    fn replace_year(&mut self, year: i32, rows: &[ResultRecord]) -> Result<usize, StoreError> {
        self.results.retain(|(y, _), _| *y != year);
        for row in rows {
            let mut r = row.clone();
            r.year = year;
            self.results.insert((year, r.county_code.clone()), r);
        }
        Ok(self.results.keys().filter(|(y, _)| *y == year).count())
    }

    fn county_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        Ok(self.counties.values().cloned().collect())
    }

    fn state_geometries(&self) -> Result<Vec<GeometryRecord>, StoreError> {
        Ok(self.states.values().cloned().collect())
    }

    fn results_for_year(&self, year: i32) -> Result<Vec<ResultRecord>, StoreError> {
        Ok(self
            .results
            .iter()
            .filter(|((y, _), _)| *y == year)
            .map(|(_, r)| r.clone())
            .collect())
    }

    fn state_names(&self) -> Result<Vec<NameRecord>, StoreError> {
        Ok(self
            .names
            .iter()
            .map(|(code, name)| NameRecord {
                code: code.clone(),
                name: name.clone(),
            })
            .collect())
    }

    fn years(&self) -> Result<Vec<i32>, StoreError> {
        let mut years: Vec<i32> = self.results.keys().map(|(y, _)| *y).collect();
        years.dedup();
        Ok(years)
    }

    fn county_count(&self) -> Result<usize, StoreError> {
        Ok(self.counties.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(offset: f64) -> Geometry {
        Geometry::new(GeometryValue::Polygon(vec![vec![
            vec![offset, 0.0],
            vec![offset + 1.0, 0.0],
            vec![offset + 1.0, 1.0],
            vec![offset, 0.0],
        ]]))
    }

    #[test]
    fn upsert_overwrites_geometry_only() {
        let mut store = MemoryStore::new();
        let first = vec![
            GeometryRecord::county("06037".to_string(), Some(square(0.0))),
            GeometryRecord::county("06001".to_string(), Some(square(1.0))),
        ];
        assert_eq!(store.upsert_county_geometries(&first).unwrap(), 2);
        assert_eq!(store.upsert_county_geometries(&first).unwrap(), 2);
        assert_eq!(store.county_count().unwrap(), 2);

        let mut renamed = GeometryRecord::county("06037".to_string(), Some(square(5.0)));
        renamed.display_name = "Los Angeles".to_string();
        store.upsert_county_geometries(&[renamed]).unwrap();
        let rows = store.county_geometries().unwrap();
        assert_eq!(rows.len(), 2);
        let la = rows.iter().find(|r| r.code == "06037").unwrap();
        assert_eq!(la.geometry, Some(square(5.0)));
        assert_eq!(la.display_name, "");
        assert_eq!(la.parent_code, "06");
    }

    #[test]
    fn replace_year_leaves_other_years() {
        let mut store = MemoryStore::new();
        let r = |year: i32, code: &str, a: i64| {
            ResultRecord::new(year, code.to_string(), None, a, 10, a + 10, 0.5, 0.4)
        };
        store
            .replace_year(2020, &[r(2020, "01001", 1), r(2020, "01003", 2)])
            .unwrap();
        store.replace_year(2024, &[r(2024, "01001", 3)]).unwrap();
        assert_eq!(store.replace_year(2020, &[r(2020, "01005", 4)]).unwrap(), 1);

        let y2020 = store.results_for_year(2020).unwrap();
        assert_eq!(y2020.len(), 1);
        assert_eq!(y2020[0].county_code, "01005");
        assert_eq!(store.results_for_year(2024).unwrap().len(), 1);
        assert_eq!(store.years().unwrap(), vec![2020, 2024]);
    }

    #[test]
    fn name_table_is_seeded() {
        let store = MemoryStore::new();
        let names = store.state_names().unwrap();
        assert_eq!(names.len(), 51);
        assert!(names
            .iter()
            .any(|n| n.code == "06" && n.name == "California"));
    }
}
