//! Schema registry: the column/column-group tree discovered while flattening
//!
//! Groups mirror element nesting; columns are the leaves that own a cell
//! index. The tree lives for a whole document and is extended in place by
//! every record, so later records reuse the columns earlier ones created.

use crate::table::{Row, TableSink};
use crate::types::SchemaConfig;
use indexmap::IndexMap;

/// A schema leaf bound to one cell index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub cell_index: usize,
    pub next_row_index: usize,
    pub non_blank_count: usize,
    pub blank_on_first_row: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, cell_index: usize) -> Self {
        Column {
            name: name.into(),
            cell_index,
            next_row_index: 0,
            non_blank_count: 0,
            blank_on_first_row: false,
        }
    }
}

/// A schema branch: everything found under one element name.
///
/// `columns` is keyed by local name, with `None` for the element's own text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: String,
    pub subgroups: IndexMap<String, ColumnGroup>,
    pub columns: IndexMap<Option<String>, Column>,
    pub non_blank_count: usize,
    pub next_row_index: usize,
}

impl ColumnGroup {
    /// The unnamed root every document starts from
    pub fn root() -> Self {
        Self::default()
    }

    /// Label for a child of this group.
    ///
    /// Text under the root is called `text_column_name`, text under a named
    /// group takes the group's own label.
    pub fn child_label(&self, local_name: Option<&str>, config: &SchemaConfig) -> String {
        match (self.name.is_empty(), local_name) {
            (true, None) => config.text_column_name.clone(),
            (true, Some(local)) => local.to_string(),
            (false, None) => self.name.clone(),
            (false, Some(local)) => format!("{}{}{}", self.name, config.name_separator, local),
        }
    }

    /// Get the subgroup for `local_name`, creating it at this group's row cursor
    pub fn subgroup_mut(&mut self, local_name: &str, config: &SchemaConfig) -> &mut ColumnGroup {
        let index = match self.subgroups.get_index_of(local_name) {
            Some(index) => index,
            None => {
                let group = ColumnGroup {
                    name: self.child_label(Some(local_name), config),
                    next_row_index: self.next_row_index,
                    ..ColumnGroup::default()
                };
                self.subgroups.insert_full(local_name.to_string(), group).0
            }
        };
        &mut self.subgroups[index]
    }

    /// Get the column for `local_name`, creating it (and allocating its cell
    /// index from `table`) at this group's row cursor
    pub fn column_mut<T: TableSink + ?Sized>(
        &mut self,
        local_name: Option<&str>,
        table: &mut T,
        config: &SchemaConfig,
    ) -> &mut Column {
        let key = local_name.map(str::to_string);
        let index = match self.columns.get_index_of(&key) {
            Some(index) => index,
            None => {
                let mut column = Column::new(
                    self.child_label(local_name, config),
                    table.allocate_cell_index(),
                );
                column.next_row_index = self.next_row_index;
                self.columns.insert_full(key, column).0
            }
        };
        &mut self.columns[index]
    }

    /// Raise this group's cursor past every row its children have used
    pub fn settle_row_cursor(&mut self) {
        let columns = self.columns.values().map(|c| c.next_row_index);
        let groups = self.subgroups.values().map(|g| g.next_row_index);
        self.next_row_index = columns
            .chain(groups)
            .fold(self.next_row_index, usize::max);
    }

    /// Fill in the statistics used for column ordering.
    ///
    /// A group's `non_blank_count` is the maximum over its children. A column
    /// is `blank_on_first_row` when `first_row` has nothing at its cell index.
    pub fn tabulate(&mut self, first_row: Option<&Row>) {
        for column in self.columns.values_mut() {
            column.blank_on_first_row = first_row
                .map_or(true, |row| row.cell(column.cell_index).is_none());
            self.non_blank_count = self.non_blank_count.max(column.non_blank_count);
        }
        for group in self.subgroups.values_mut() {
            group.tabulate(first_row);
            self.non_blank_count = self.non_blank_count.max(group.non_blank_count);
        }
    }

    /// Number of columns in this group and all of its descendants
    pub fn total_columns(&self) -> usize {
        self.columns.len() + self.subgroups.values().map(ColumnGroup::total_columns).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::types::Cell;
    use serde_json::json;

    #[test]
    fn test_child_labels() {
        let config = SchemaConfig::default();
        let root = ColumnGroup::root();
        assert_eq!(root.child_label(None, &config), "Text");
        assert_eq!(root.child_label(Some("item"), &config), "item");

        let item = ColumnGroup {
            name: "item".to_string(),
            ..ColumnGroup::default()
        };
        assert_eq!(item.child_label(None, &config), "item");
        assert_eq!(item.child_label(Some("id"), &config), "item - id");
    }

    #[test]
    fn test_custom_labels() {
        let config = SchemaConfig {
            text_column_name: "value".to_string(),
            name_separator: ".".to_string(),
        };
        let mut root = ColumnGroup::root();
        let item = root.subgroup_mut("item", &config);
        let name = item.subgroup_mut("name", &config);
        assert_eq!(name.name, "item.name");
        assert_eq!(ColumnGroup::root().child_label(None, &config), "value");
    }

    #[test]
    fn test_subgroup_is_created_once() {
        let config = SchemaConfig::default();
        let mut root = ColumnGroup::root();
        root.next_row_index = 3;

        root.subgroup_mut("item", &config).non_blank_count = 9;
        let again = root.subgroup_mut("item", &config);

        assert_eq!(again.non_blank_count, 9);
        assert_eq!(again.next_row_index, 3);
        assert_eq!(root.subgroups.len(), 1);
    }

    #[test]
    fn test_column_allocates_cell_index_once() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut group = ColumnGroup::root();

        let a = group.column_mut(Some("a"), &mut table, &config).cell_index;
        let text = group.column_mut(None, &mut table, &config).cell_index;
        let a_again = group.column_mut(Some("a"), &mut table, &config).cell_index;

        assert_eq!((a, text, a_again), (0, 1, 0));
        assert_eq!(group.columns[&None::<String>].name, "Text");
    }

    #[test]
    fn test_settle_row_cursor_takes_max_of_children() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut group = ColumnGroup::root();
        group.column_mut(Some("a"), &mut table, &config).next_row_index = 2;
        group.subgroup_mut("b", &config).next_row_index = 4;

        group.settle_row_cursor();
        assert_eq!(group.next_row_index, 4);

        group.next_row_index = 7;
        group.settle_row_cursor();
        assert_eq!(group.next_row_index, 7);
    }

    #[test]
    fn test_tabulate() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut root = ColumnGroup::root();
        {
            let item = root.subgroup_mut("item", &config);
            let id = item.column_mut(Some("id"), &mut table, &config);
            id.non_blank_count = 3;
            let note = item.column_mut(Some("note"), &mut table, &config);
            note.non_blank_count = 1;
        }
        let first = Row::new(vec![Some(Cell::new(json!(1)))]);

        root.tabulate(Some(&first));

        let item = &root.subgroups["item"];
        assert_eq!(root.non_blank_count, 3);
        assert_eq!(item.non_blank_count, 3);
        assert!(!item.columns[&Some("id".to_string())].blank_on_first_row);
        assert!(item.columns[&Some("note".to_string())].blank_on_first_row);
        assert_eq!(root.total_columns(), 2);
    }
}
