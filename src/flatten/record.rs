use crate::table::{Row, TableSink};
use crate::types::Cell;

/// Rows produced by one record occurrence, indexed by row then cell index.
///
/// Row cursors keep growing across a document, so a record's rows start at
/// `first_row` rather than 0; the rows above it would all be blank.
#[derive(Debug, Default)]
pub struct ImportRecord {
    pub first_row: usize,
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl ImportRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(first_row: usize) -> Self {
        ImportRecord {
            first_row,
            rows: Vec::new(),
        }
    }

    /// Put `cell` at (`row_index`, `cell_index`), growing the buffer as needed
    pub fn set_cell(&mut self, row_index: usize, cell_index: usize, cell: Cell) {
        if row_index < self.first_row {
            let missing = self.first_row - row_index;
            self.rows.splice(0..0, std::iter::repeat_with(Vec::new).take(missing));
            self.first_row = row_index;
        }

        let offset = row_index - self.first_row;
        if self.rows.len() <= offset {
            self.rows.resize_with(offset + 1, Vec::new);
        }
        let row = &mut self.rows[offset];
        if row.len() <= cell_index {
            row.resize(cell_index + 1, None);
        }
        row[cell_index] = Some(cell);
    }
}

/// Append the record's non-blank rows to `table`, returning how many were kept
pub fn commit_record<T: TableSink + ?Sized>(record: ImportRecord, table: &mut T) -> usize {
    let mut committed = 0;
    for cells in record.rows {
        let row = Row::new(cells);
        if row.is_blank() {
            continue;
        }
        table.append_row(row);
        committed += 1;
    }
    committed
}
