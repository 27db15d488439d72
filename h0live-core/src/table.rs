/// Likelihood table: an H0 grid plus one likelihood column per event/counterpart pair.
///
/// Parsing works on text the caller has already read; this crate does no IO.
/// Columns are identified by their header (`<Event>_<Counterpart>`) and looked
/// up by name, the same way callers' IDs are mapped to internal indices elsewhere.
use std::collections::HashMap;

use crate::constants::GRID_COLUMN;
use crate::error::{H0Error, Result, TableError};
use crate::types::{CatalogEntry, EventKey, H0Grid};

#[derive(Debug, Clone)]
pub struct LikelihoodTable {
    grid: H0Grid,
    keys: Vec<EventKey>,
    columns: Vec<Vec<f64>>,
    id_to_idx: HashMap<String, usize>,
}

impl LikelihoodTable {
    /// Build a table from an already-parsed grid and `(column id, values)` pairs.
    /// Column order is preserved.
    pub fn new(grid: H0Grid, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(TableError::NoEventColumns { grid: GRID_COLUMN.to_string() }.into());
        }

        let mut keys = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut id_to_idx = HashMap::with_capacity(columns.len());

        for (idx, (id, column)) in columns.into_iter().enumerate() {
            grid.check_aligned(&id, column.len())?;
            if id_to_idx.insert(id.clone(), idx).is_some() {
                return Err(TableError::DuplicateColumn { name: id }.into());
            }
            keys.push(EventKey::parse(&id));
            values.push(column);
        }

        Ok(LikelihoodTable {
            grid,
            keys,
            columns: values,
            id_to_idx,
        })
    }

    /// Parse comma-separated text with a header row.
    ///
    /// The column headed `H0` is the grid; every other column is a likelihood
    /// column. Fields may be quoted, blank lines are skipped and surrounding
    /// whitespace is trimmed.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() {
            return Err(TableError::Empty.into());
        }

        let grid_idx = header
            .iter()
            .position(|h| h == GRID_COLUMN)
            .ok_or_else(|| TableError::MissingGridColumn {
                expected: GRID_COLUMN.to_string(),
                found: header.clone(),
            })?;

        let mut raw: Vec<Vec<f64>> = vec![Vec::new(); header.len()];
        for record in reader.records() {
            let record = record.map_err(malformed)?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            if record.len() != header.len() {
                return Err(TableError::RaggedRow {
                    line,
                    expected: header.len(),
                    got: record.len(),
                }
                .into());
            }
            for (col, field) in record.iter().enumerate() {
                let value: f64 = field.parse().map_err(|_| TableError::InvalidValue {
                    line,
                    column: header[col].clone(),
                    value: field.to_string(),
                })?;
                raw[col].push(value);
            }
        }

        let grid = H0Grid::new(std::mem::take(&mut raw[grid_idx]))?;
        let columns: Vec<(String, Vec<f64>)> = header
            .into_iter()
            .zip(raw)
            .enumerate()
            .filter(|(i, _)| *i != grid_idx)
            .map(|(_, pair)| pair)
            .collect();

        let table = LikelihoodTable::new(grid, columns)?;
        tracing::debug!(
            grid_points = table.grid.len(),
            columns = table.keys.len(),
            "parsed likelihood table"
        );
        Ok(table)
    }

    pub fn grid(&self) -> &H0Grid {
        &self.grid
    }

    /// Column ids in header order.
    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.id.as_str())
    }

    pub fn num_columns(&self) -> usize {
        self.keys.len()
    }

    /// Likelihood values for a column id.
    pub fn column(&self, id: &str) -> Result<&[f64]> {
        let idx = self.index_of(id)?;
        Ok(&self.columns[idx])
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.id_to_idx
            .get(id)
            .copied()
            .ok_or_else(|| H0Error::UnknownEvent {
                event: id.to_string(),
                available: self.column_ids().map(str::to_string).collect(),
            })
    }

    /// Events with their counterparts, both in first-seen column order.
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = Vec::new();
        let mut event_idx: HashMap<&str, usize> = HashMap::new();

        for key in &self.keys {
            let idx = *event_idx.entry(key.event.as_str()).or_insert_with(|| {
                entries.push(CatalogEntry {
                    event: key.event.clone(),
                    columns: Vec::new(),
                    counterparts: Vec::new(),
                });
                entries.len() - 1
            });
            entries[idx].columns.push(key.id.clone());
            entries[idx]
                .counterparts
                .push(key.counterpart.clone().unwrap_or_default());
        }

        entries
    }

    /// Resolve a selector to a column id.
    ///
    /// An exact column id wins; otherwise a bare event name picks that event's
    /// first counterpart column.
    pub fn resolve(&self, selector: &str) -> Result<String> {
        if self.id_to_idx.contains_key(selector) {
            return Ok(selector.to_string());
        }
        self.keys
            .iter()
            .find(|k| k.event == selector)
            .map(|k| k.id.clone())
            .ok_or_else(|| H0Error::UnknownEvent {
                event: selector.to_string(),
                available: self.column_ids().map(str::to_string).collect(),
            })
    }

    /// First event with its first counterpart, for callers with an empty selection.
    pub fn default_selection(&self) -> Vec<String> {
        vec![self.keys[0].id.clone()]
    }
}

/// Reader-level failures keep the line they occurred on.
fn malformed(err: csv::Error) -> TableError {
    TableError::Malformed {
        line: err.position().map_or(0, |p| p.line() as usize),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
H0,GW170817_NGC4993,GW190521_ZTF19abanrhr,GW170817_Alt_Host
60,0.1,0.5,0.2
65,0.6,0.5,0.4

70,1.0,0.5,0.8
";

    #[test]
    fn test_parse_sample_table() {
        let table = LikelihoodTable::from_csv_str(SAMPLE).unwrap();
        assert_eq!(table.grid().values(), &[60.0, 65.0, 70.0]);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.column("GW170817_NGC4993").unwrap(), &[0.1, 0.6, 1.0]);
        assert_eq!(
            table.column_ids().collect::<Vec<_>>(),
            vec!["GW170817_NGC4993", "GW190521_ZTF19abanrhr", "GW170817_Alt_Host"]
        );
    }

    #[test]
    fn test_quoted_fields_and_headers() {
        let text = "\"H0\",\"A_x\"\n60,\"0.5\"\n70,\"1.0\"\n";
        let table = LikelihoodTable::from_csv_str(text).unwrap();
        assert_eq!(table.grid().values(), &[60.0, 70.0]);
        assert_eq!(table.column("A_x").unwrap(), &[0.5, 1.0]);

        let table = LikelihoodTable::from_csv_str("H0,\"A_x,y\"\n60,0.5\n70,1.0\n").unwrap();
        assert_eq!(table.column_ids().collect::<Vec<_>>(), vec!["A_x,y"]);
        assert_eq!(table.catalog()[0].counterparts, vec!["x,y"]);
    }

    #[test]
    fn test_grid_column_need_not_be_first() {
        let table = LikelihoodTable::from_csv_str("A_x,H0\n1,10\n2,20\n").unwrap();
        assert_eq!(table.grid().values(), &[10.0, 20.0]);
        assert_eq!(table.column("A_x").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_catalog_groups_counterparts_by_event() {
        let table = LikelihoodTable::from_csv_str(SAMPLE).unwrap();
        let catalog = table.catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].event, "GW170817");
        assert_eq!(catalog[0].counterparts, vec!["NGC4993", "Alt_Host"]);
        assert_eq!(catalog[0].columns, vec!["GW170817_NGC4993", "GW170817_Alt_Host"]);
        assert_eq!(catalog[1].event, "GW190521");
    }

    #[test]
    fn test_resolve_exact_id_and_bare_event() {
        let table = LikelihoodTable::from_csv_str(SAMPLE).unwrap();
        assert_eq!(table.resolve("GW170817_Alt_Host").unwrap(), "GW170817_Alt_Host");
        assert_eq!(table.resolve("GW170817").unwrap(), "GW170817_NGC4993");
        assert!(matches!(
            table.resolve("GW000000"),
            Err(H0Error::UnknownEvent { ref event, .. }) if event == "GW000000"
        ));
    }

    #[test]
    fn test_default_selection_is_first_column() {
        let table = LikelihoodTable::from_csv_str(SAMPLE).unwrap();
        assert_eq!(table.default_selection(), vec!["GW170817_NGC4993".to_string()]);
    }

    #[test]
    fn test_unknown_column_lists_available() {
        let table = LikelihoodTable::from_csv_str(SAMPLE).unwrap();
        match table.column("nope") {
            Err(H0Error::UnknownEvent { event, available }) => {
                assert_eq!(event, "nope");
                assert_eq!(available.len(), 3);
            }
            other => panic!("expected UnknownEvent, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let missing = LikelihoodTable::from_csv_str("h,A_x\n1,2\n");
        assert!(matches!(missing, Err(H0Error::Table(TableError::MissingGridColumn { .. }))));

        let ragged = LikelihoodTable::from_csv_str("H0,A_x\n1,2\n2\n");
        assert_eq!(
            ragged.unwrap_err(),
            H0Error::Table(TableError::RaggedRow { line: 3, expected: 2, got: 1 })
        );

        let bad = LikelihoodTable::from_csv_str("H0,A_x\n1,2\n2,abc\n");
        assert_eq!(
            bad.unwrap_err(),
            H0Error::Table(TableError::InvalidValue {
                line: 3,
                column: "A_x".to_string(),
                value: "abc".to_string(),
            })
        );

        let dup = LikelihoodTable::from_csv_str("H0,A_x,A_x\n1,2,3\n2,3,4\n");
        assert!(matches!(dup, Err(H0Error::Table(TableError::DuplicateColumn { .. }))));

        assert!(matches!(
            LikelihoodTable::from_csv_str("H0\n1\n2\n"),
            Err(H0Error::Table(TableError::NoEventColumns { .. }))
        ));
        assert!(matches!(
            LikelihoodTable::from_csv_str("\n\n"),
            Err(H0Error::Table(TableError::Empty))
        ));
    }

    #[test]
    fn test_unsorted_grid_is_rejected() {
        let r = LikelihoodTable::from_csv_str("H0,A_x\n70,1\n60,2\n");
        assert!(matches!(r, Err(H0Error::InvalidGrid { .. })));
    }
}
