use crate::schema::registry::{Column, ColumnGroup};
use crate::table::TableSink;
use std::cmp::Ordering;
use tracing::trace;

/// Lay the discovered schema out as the table's ordered column list.
///
/// Within each group, columns filled on the first row come first, then the
/// most populated, then the shortest names; subgroups follow, most populated
/// first. A subtree contributing more than one column, but not every column,
/// is registered as a column group.
pub fn materialize_columns<T: TableSink + ?Sized>(table: &mut T, root: &mut ColumnGroup) {
    root.tabulate(table.first_row());
    create_columns(table, root);
}

fn create_columns<T: TableSink + ?Sized>(table: &mut T, group: &ColumnGroup) {
    let start_column = table.column_count();

    let mut columns: Vec<&Column> = group.columns.values().collect();
    columns.sort_by(|a, b| compare_columns(a, b));
    for column in columns {
        table.append_column(column.cell_index, &column.name);
    }

    let mut subgroups: Vec<&ColumnGroup> = group.subgroups.values().collect();
    subgroups.sort_by(|a, b| compare_groups(a, b));
    for subgroup in subgroups {
        create_columns(table, subgroup);
    }

    let span = table.column_count() - start_column;
    if span > 1 && span < table.column_count() {
        trace!(group = %group.name, start_column, span, "column group");
        table.add_column_group(start_column, span, start_column);
    }
}

fn compare_columns(a: &Column, b: &Column) -> Ordering {
    a.blank_on_first_row
        .cmp(&b.blank_on_first_row)
        .then_with(|| b.non_blank_count.cmp(&a.non_blank_count))
        .then_with(|| name_len(&a.name).cmp(&name_len(&b.name)))
}

fn compare_groups(a: &ColumnGroup, b: &ColumnGroup) -> Ordering {
    b.non_blank_count
        .cmp(&a.non_blank_count)
        .then_with(|| name_len(&a.name).cmp(&name_len(&b.name)))
}

fn name_len(name: &str) -> usize {
    name.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Row, Table};
    use crate::types::{Cell, SchemaConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn column_in(
        group: &mut ColumnGroup,
        name: &str,
        non_blank: usize,
        table: &mut Table,
        config: &SchemaConfig,
    ) -> usize {
        let column = group.column_mut(Some(name), table, config);
        column.non_blank_count = non_blank;
        column.cell_index
    }

    #[test]
    fn test_column_order_rules() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut root = ColumnGroup::root();

        let (rare, common, longer_common, _late) = {
            let item = root.subgroup_mut("item", &config);
            (
                column_in(item, "rare", 1, &mut table, &config),
                column_in(item, "common", 5, &mut table, &config),
                column_in(item, "commonest", 5, &mut table, &config),
                column_in(item, "late", 9, &mut table, &config),
            )
        };

        let mut first = vec![None; 4];
        first[rare] = Some(Cell::new(json!(1)));
        first[common] = Some(Cell::new(json!(1)));
        first[longer_common] = Some(Cell::new(json!(1)));
        table.append_row(Row::new(first));

        materialize_columns(&mut table, &mut root);

        // "late" is the most populated but missing from the first row
        assert_eq!(
            table.column_names(),
            vec!["item - common", "item - commonest", "item - rare", "item - late"]
        );
    }

    #[test]
    fn test_subgroups_follow_columns() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut root = ColumnGroup::root();
        {
            let item = root.subgroup_mut("item", &config);
            column_in(item, "id", 3, &mut table, &config);
            let tags = item.subgroup_mut("tags", &config);
            column_in(tags, "a", 2, &mut table, &config);
            column_in(tags, "b", 2, &mut table, &config);
            let owner = item.subgroup_mut("owner", &config);
            column_in(owner, "n", 6, &mut table, &config);
        }

        materialize_columns(&mut table, &mut root);

        assert_eq!(
            table.column_names(),
            vec!["item - id", "item - owner - n", "item - tags - a", "item - tags - b"]
        );
        // tags spans 2 of 4 columns; item and root span everything
        assert_eq!(table.column_groups.len(), 1);
        assert_eq!(table.column_groups[0].start_column, 2);
        assert_eq!(table.column_groups[0].span, 2);
        assert_eq!(table.column_groups[0].key_column, 2);
    }

    #[test]
    fn test_no_band_when_group_spans_every_column() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut root = ColumnGroup::root();
        {
            let item = root.subgroup_mut("item", &config);
            column_in(item, "id", 3, &mut table, &config);
            column_in(item, "name", 3, &mut table, &config);
        }

        materialize_columns(&mut table, &mut root);

        assert_eq!(table.column_count(), 2);
        assert!(table.column_groups.is_empty());
    }

    #[test]
    fn test_materialized_cell_indices_cover_allocation() {
        let config = SchemaConfig::default();
        let mut table = Table::new();
        let mut root = ColumnGroup::root();
        {
            let item = root.subgroup_mut("item", &config);
            for (i, name) in ["x", "yy", "zzz"].iter().enumerate() {
                column_in(item, name, i, &mut table, &config);
            }
        }

        materialize_columns(&mut table, &mut root);

        let mut indices: Vec<usize> = table.columns.iter().map(|c| c.cell_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
