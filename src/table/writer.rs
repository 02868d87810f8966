use crate::table::Table;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;

/// Write one JSON object per row, keyed by column name in column order.
///
/// Blank cells are left out of the object.
pub fn write_jsonl<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    for row in 0..table.rows.len() {
        let mut data = Map::new();
        for (column, value) in table.columns.iter().zip(table.row_values(row)) {
            if let Some(value) = value {
                data.insert(column.name.clone(), value.clone());
            }
        }

        let json = serde_json::to_string(&Value::Object(data))
            .context("Failed to serialize row")?;
        writeln!(writer, "{}", json)
            .context("Failed to write row")?;
    }

    writer.flush().context("Failed to flush writer")
}

/// Write the whole table (columns, bands, rows) as one JSON document
pub fn write_json<W: Write>(table: &Table, mut writer: W, pretty: bool) -> Result<()> {
    let result = if pretty {
        serde_json::to_writer_pretty(&mut writer, table)
    } else {
        serde_json::to_writer(&mut writer, table)
    };
    result.context("Failed to serialize table")?;

    writeln!(writer).context("Failed to write table")?;
    writer.flush().context("Failed to flush writer")
}
