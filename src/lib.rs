//! # xmlgrid - XML to table flattening
//!
//! Turns nested XML documents into a flat, spreadsheet-like table without a
//! schema declared up front.
//!
//! ## Modules
//!
//! - **events**: forward-only XML event stream (`quick-xml` backed)
//! - **detect**: find the record element by name or by repetition statistics
//! - **schema**: the column/column-group tree discovered from the records
//! - **flatten**: walk each record and assign values to rows and columns
//! - **table**: destination tables and their writers
//!
//! ## Quick Start
//!
//! ```rust
//! use xmlgrid::{import_xml_str, ImportConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let xml = r#"<people>
//!     <person id="1"><phone>555-1</phone><phone>555-2</phone></person>
//!     <person id="2"><phone>555-3</phone></person>
//! </people>"#;
//!
//! let mut config = ImportConfig::default();
//! config.record_tag = Some("person".to_string());
//!
//! let table = import_xml_str(xml, &config)?;
//!
//! // person - id | person - phone
//! // 1           | 555-1
//! //             | 555-2
//! // 2           | 555-3
//! assert_eq!(table.rows.len(), 3);
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, Context, Result};
use std::io::BufRead;
use tracing::{info, warn};

pub mod detect;
pub mod error;
pub mod events;
pub mod flatten;
pub mod scalar;
pub mod schema;
pub mod table;
pub mod types;

// Re-export commonly used types for convenience
pub use detect::{detect_record_path, locate_path};
pub use error::ImportError;
pub use events::{EventSource, XmlEvent, XmlReaderSource};
pub use flatten::{flatten_document, Flattener};
pub use scalar::{infer_scalar, ScalarParser};
pub use schema::{materialize_columns, ColumnGroup};
pub use table::{Table, TableSink};
pub use types::{Cell, DetectConfig, ImportConfig, SchemaConfig};

/// Decide which element path holds the records.
///
/// An explicit `record_path` wins, then `record_tag` is located, and
/// otherwise the path is inferred from repetition. `open` is called once,
/// only when the document has to be scanned.
pub fn resolve_record_path<R, F>(open: F, config: &ImportConfig) -> Result<Option<Vec<String>>>
where
    R: BufRead,
    F: FnOnce() -> std::io::Result<R>,
{
    if let Some(path) = config.record_path.as_ref().filter(|p| !p.is_empty()) {
        return Ok(Some(path.clone()));
    }

    let source = XmlReaderSource::new(open().context("Failed to open input")?);
    let path = match &config.record_tag {
        Some(tag) => locate_path(source, tag),
        None => detect_record_path(source, &config.detect),
    };
    Ok(path)
}

/// Main entry point: import an XML document into a new table.
///
/// The document is read twice when the record path has to be found first,
/// so `open` must be able to produce a fresh reader each time.
pub fn import_xml<R, F>(mut open: F, config: &ImportConfig) -> Result<Table>
where
    R: BufRead,
    F: FnMut() -> std::io::Result<R>,
{
    let record_path = resolve_record_path(&mut open, config)?
        .ok_or_else(|| anyhow!("No record element found in document"))?;
    info!(path = %record_path.join("/"), "importing records");

    let mut table = Table::new();
    let mut root = ColumnGroup::root();
    let source = XmlReaderSource::new(open().context("Failed to reopen input")?);

    let rows = Flattener::new(config)
        .flatten_document(source, &record_path, &mut root, &mut table)
        .context("Failed to flatten document")?;
    materialize_columns(&mut table, &mut root);

    if rows == 0 {
        warn!(path = %record_path.join("/"), "no rows were produced for record path");
    }
    info!(rows, columns = table.columns.len(), "import complete");
    Ok(table)
}

/// Import from an in-memory document
pub fn import_xml_str(xml: &str, config: &ImportConfig) -> Result<Table> {
    import_xml(|| Ok(xml.as_bytes()), config)
}
