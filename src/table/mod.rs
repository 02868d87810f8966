//! Destination tables
//!
//! The flattening engine only talks to a [`TableSink`]; [`Table`] is the
//! in-memory implementation used by the import driver and the CLI.

pub mod writer;

pub use writer::{write_json, write_jsonl};

use crate::types::Cell;
use serde::Serialize;
use serde_json::Value;

/// One committed row. `cells[i]` holds the value for cell index `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Option<Cell>>,
}

impl Row {
    pub fn new(cells: Vec<Option<Cell>>) -> Self {
        Row { cells }
    }

    pub fn cell(&self, cell_index: usize) -> Option<&Cell> {
        self.cells.get(cell_index).and_then(Option::as_ref)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// A presentation column, pointing at a cell index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub cell_index: usize,
    pub name: String,
}

/// A contiguous run of columns that came from one schema subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnGroupBand {
    pub start_column: usize,
    pub span: usize,
    pub key_column: usize,
}

/// Where flattened rows and the final column layout go
pub trait TableSink {
    /// Reserve a fresh cell index; never hands out the same index twice
    fn allocate_cell_index(&mut self) -> usize;

    fn append_column(&mut self, cell_index: usize, name: &str);

    fn add_column_group(&mut self, start_column: usize, span: usize, key_column: usize);

    fn append_row(&mut self, row: Row);

    fn column_count(&self) -> usize;

    fn first_row(&self) -> Option<&Row>;
}

/// In-memory table
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table {
    pub columns: Vec<ColumnDef>,
    pub column_groups: Vec<ColumnGroupBand>,
    pub rows: Vec<Row>,
    #[serde(skip)]
    next_cell_index: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value of the named column on a row
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let column = self.column(column)?;
        self.rows
            .get(row)
            .and_then(|r| r.cell(column.cell_index))
            .map(|c| &c.value)
    }

    /// A row's values in column order
    pub fn row_values(&self, row: usize) -> Vec<Option<&Value>> {
        let Some(row) = self.rows.get(row) else {
            return Vec::new();
        };
        self.columns
            .iter()
            .map(|c| row.cell(c.cell_index).map(|cell| &cell.value))
            .collect()
    }
}

impl TableSink for Table {
    fn allocate_cell_index(&mut self) -> usize {
        let index = self.next_cell_index;
        self.next_cell_index += 1;
        index
    }

    fn append_column(&mut self, cell_index: usize, name: &str) {
        self.columns.push(ColumnDef {
            cell_index,
            name: name.to_string(),
        });
    }

    fn add_column_group(&mut self, start_column: usize, span: usize, key_column: usize) {
        self.column_groups.push(ColumnGroupBand {
            start_column,
            span,
            key_column,
        });
    }

    fn append_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn first_row(&self) -> Option<&Row> {
        self.rows.first()
    }
}
