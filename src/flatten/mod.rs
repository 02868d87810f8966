//! Tree-to-table flattening
//!
//! Each occurrence of the record element is walked once. Elements become
//! column groups, attributes and text become columns, and every value lands
//! on the row given by the larger of its group's and its column's row
//! cursor. A column that repeats inside one record therefore moves down a
//! row, while sibling columns share a row.

pub mod record;

pub use record::{commit_record, ImportRecord};

use crate::error::{ImportError, Result};
use crate::events::{skip_element, EventSource, StartElement, XmlEvent};
use crate::scalar::{InferScalar, PlainText, ScalarParser};
use crate::schema::ColumnGroup;
use crate::table::TableSink;
use crate::types::{Cell, ImportConfig, SchemaConfig};
use tracing::{debug, trace};

/// Flattens record elements against a shared schema registry
pub struct Flattener {
    schema: SchemaConfig,
    trim_text: bool,
    parser: Box<dyn ScalarParser>,
}

impl Flattener {
    pub fn new(config: &ImportConfig) -> Self {
        let parser: Box<dyn ScalarParser> = if config.guess_cell_types {
            Box::new(InferScalar)
        } else {
            Box::new(PlainText)
        };

        Flattener {
            schema: config.schema.clone(),
            trim_text: config.trim_text,
            parser,
        }
    }

    /// Replace the scalar parser
    pub fn with_parser(mut self, parser: impl ScalarParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Flatten every element matching `record_path` in the document.
    ///
    /// Rows are appended to `table` record by record, so a stream fault leaves
    /// the rows of earlier records in place. Returns the number of rows kept.
    pub fn flatten_document<S, T>(
        &self,
        mut source: S,
        record_path: &[String],
        root: &mut ColumnGroup,
        table: &mut T,
    ) -> Result<usize>
    where
        S: EventSource,
        T: TableSink + ?Sized,
    {
        if record_path.is_empty() {
            return Err(ImportError::EmptyRecordPath);
        }

        let mut committed = 0;
        loop {
            match source.next_event()? {
                XmlEvent::StartElement(element) => {
                    committed += self.find_record(&mut source, &element, record_path, 0, root, table)?;
                }
                XmlEvent::EndDocument => break,
                XmlEvent::StartDocument | XmlEvent::Characters(_) | XmlEvent::EndElement => {}
            }
        }

        debug!(rows = committed, path = %record_path.join("/"), "flattened document");
        Ok(committed)
    }

    fn find_record<S, T>(
        &self,
        source: &mut S,
        element: &StartElement,
        record_path: &[String],
        path_index: usize,
        root: &mut ColumnGroup,
        table: &mut T,
    ) -> Result<usize>
    where
        S: EventSource,
        T: TableSink + ?Sized,
    {
        if element.local_name != record_path[path_index] {
            trace!(element = %element.local_name, depth = path_index, "skipping subtree");
            skip_element(source)?;
            return Ok(0);
        }

        if path_index + 1 == record_path.len() {
            return self.process_record(source, element, root, table);
        }

        let mut committed = 0;
        loop {
            match source.next_event()? {
                XmlEvent::StartElement(child) => {
                    committed += self.find_record(source, &child, record_path, path_index + 1, root, table)?;
                }
                XmlEvent::EndElement => break,
                XmlEvent::EndDocument => {
                    return Err(ImportError::UnexpectedEof(element.qualified_name()));
                }
                XmlEvent::StartDocument | XmlEvent::Characters(_) => {}
            }
        }
        Ok(committed)
    }

    /// Flatten one record occurrence and commit its rows
    fn process_record<S, T>(
        &self,
        source: &mut S,
        element: &StartElement,
        root: &mut ColumnGroup,
        table: &mut T,
    ) -> Result<usize>
    where
        S: EventSource,
        T: TableSink + ?Sized,
    {
        // nothing in this record can land above its group's current cursor
        let first_row = root
            .subgroups
            .get(element.qualified_name().as_str())
            .map_or(root.next_row_index, |g| g.next_row_index.max(root.next_row_index));

        let mut record = ImportRecord::starting_at(first_row);
        self.process_sub_record(source, element, root, &mut record, table)?;
        Ok(commit_record(record, table))
    }

    fn process_sub_record<S, T>(
        &self,
        source: &mut S,
        element: &StartElement,
        parent: &mut ColumnGroup,
        record: &mut ImportRecord,
        table: &mut T,
    ) -> Result<()>
    where
        S: EventSource,
        T: TableSink + ?Sized,
    {
        let parent_row = parent.next_row_index;
        let group = parent.subgroup_mut(&element.qualified_name(), &self.schema);
        group.next_row_index = group.next_row_index.max(parent_row);

        for attribute in &element.attributes {
            let text = attribute.value.trim();
            if !text.is_empty() {
                self.add_cell(group, Some(&attribute.qualified_name()), text, record, table);
            }
        }

        loop {
            match source.next_event()? {
                XmlEvent::StartElement(child) => {
                    self.process_sub_record(source, &child, group, record, table)?;
                }
                XmlEvent::Characters(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        let value = if self.trim_text { trimmed } else { text.as_str() };
                        self.add_cell(group, None, value, record, table);
                    }
                }
                XmlEvent::EndElement => break,
                XmlEvent::EndDocument => {
                    return Err(ImportError::UnexpectedEof(element.qualified_name()));
                }
                XmlEvent::StartDocument => {}
            }
        }

        group.settle_row_cursor();
        Ok(())
    }

    /// Place one value in the record buffer and advance its column's cursor
    fn add_cell<T: TableSink + ?Sized>(
        &self,
        group: &mut ColumnGroup,
        local_name: Option<&str>,
        text: &str,
        record: &mut ImportRecord,
        table: &mut T,
    ) {
        if text.is_empty() {
            return;
        }

        let value = self.parser.parse_scalar(text);
        let group_row = group.next_row_index;
        let column = group.column_mut(local_name, table, &self.schema);
        let row_index = group_row.max(column.next_row_index);

        trace!(column = %column.name, row = row_index, cell = column.cell_index, "add cell");
        record.set_cell(row_index, column.cell_index, Cell::new(value));

        column.next_row_index = row_index + 1;
        column.non_blank_count += 1;
    }
}

/// Flatten with default settings
pub fn flatten_document<S, T>(
    source: S,
    record_path: &[String],
    root: &mut ColumnGroup,
    table: &mut T,
) -> Result<usize>
where
    S: EventSource,
    T: TableSink + ?Sized,
{
    Flattener::new(&ImportConfig::default()).flatten_document(source, record_path, root, table)
}
