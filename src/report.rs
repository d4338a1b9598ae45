//! Read-only projections of the extraction and validation state.
//!
//! The registry flattens into one row per table; parent lineage is carried
//! as row indices into the same output, so the rows serialize cleanly and
//! downstream consumers can rebuild the graph without pointer chasing.

use std::io::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::sql_engine::tables::TableRegistry;
use crate::validators::TableValidation;

/// One extracted table, flattened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub schema: String,
    pub name: String,
    pub full_name: String,
    pub used: bool,
    pub created: bool,
    pub renamed: bool,
    pub populated: bool,
    pub sql: String,
    /// Row indices of this table's lineage parents within the same output
    pub parent_tables: Vec<usize>,
}

/// One validated table: the table columns plus catalog and freshness state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRow {
    pub schema: String,
    pub name: String,
    pub full_name: String,
    pub used: bool,
    pub created: bool,
    pub renamed: bool,
    pub populated: bool,
    pub sql: String,
    pub parent_tables: Vec<usize>,
    pub in_database: bool,
    pub in_table_catalog: bool,
    pub update_frequency: String,
    pub update_column: String,
    pub minimum_update_ts: Option<NaiveDateTime>,
    pub next_regular_update_ts: Option<NaiveDateTime>,
    pub actual_update_ts: Option<NaiveDateTime>,
    pub content_current: bool,
    pub validation_successful: bool,
    pub validation_error: String,
}

/// Flatten the registry, one row per table in registry order
pub fn table_rows(registry: &TableRegistry) -> Vec<TableRow> {
    registry
        .tables()
        .iter()
        .map(|table| TableRow {
            schema: table.schema.clone(),
            name: table.name.clone(),
            full_name: table.full_name(),
            used: table.used,
            created: table.created,
            renamed: table.renamed,
            populated: table.populated,
            sql: table.sql.clone(),
            parent_tables: table.parent_tables.clone(),
        })
        .collect()
}

/// Flatten registry and validation state into one row per table
pub fn validation_rows(
    registry: &TableRegistry,
    validations: &[TableValidation],
) -> Vec<ValidationRow> {
    validations
        .iter()
        .map(|tv| {
            let table = registry.get(tv.table_id);
            ValidationRow {
                schema: table.schema.clone(),
                name: table.name.clone(),
                full_name: table.full_name(),
                used: table.used,
                created: table.created,
                renamed: table.renamed,
                populated: table.populated,
                sql: table.sql.clone(),
                parent_tables: table.parent_tables.clone(),
                in_database: tv.in_database,
                in_table_catalog: tv.in_table_catalog,
                update_frequency: tv.update_frequency.clone(),
                update_column: tv.update_column.clone(),
                minimum_update_ts: tv.minimum_update_ts,
                next_regular_update_ts: tv.next_regular_update_ts,
                actual_update_ts: tv.actual_update_ts,
                content_current: tv.content_current,
                validation_successful: tv.validation_successful,
                validation_error: tv.validation_error.clone(),
            }
        })
        .collect()
}

/// (parent, child) full-name pairs for graph consumers
pub fn lineage_edges(registry: &TableRegistry) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for (_, table) in registry.iter() {
        for &parent in &table.parent_tables {
            edges.push((registry.get(parent).full_name(), table.full_name()));
        }
    }
    edges
}

/// Render the lineage as a Graphviz digraph (dot format)
pub fn to_dot_graph(registry: &TableRegistry) -> String {
    let mut result = String::from("digraph lineage {\n");
    result.push_str("  rankdir=LR;\n");
    result.push_str("  node [shape=box];\n");

    for (_, table) in registry.iter() {
        result.push_str(&format!("  \"{}\";\n", table.full_name()));
    }
    for (parent, child) in lineage_edges(registry) {
        result.push_str(&format!("  \"{}\" -> \"{}\";\n", parent, child));
    }

    result.push_str("}\n");
    result
}

/// Write table rows as CSV; parent indices are space-joined in one column
pub fn write_table_csv<W: Write>(writer: W, rows: &[TableRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "SCHEMA",
        "NAME",
        "FULL_NAME",
        "USED",
        "CREATED",
        "RENAMED",
        "POPULATED",
        "SQL",
        "PARENT_TABLES",
    ])?;
    for row in rows {
        csv_writer.write_record(&[
            row.schema.clone(),
            row.name.clone(),
            row.full_name.clone(),
            row.used.to_string(),
            row.created.to_string(),
            row.renamed.to_string(),
            row.populated.to_string(),
            row.sql.clone(),
            join_indices(&row.parent_tables),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write validation rows as CSV
pub fn write_validation_csv<W: Write>(
    writer: W,
    rows: &[ValidationRow],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "SCHEMA",
        "NAME",
        "FULL_NAME",
        "USED",
        "CREATED",
        "RENAMED",
        "POPULATED",
        "SQL",
        "PARENT_TABLES",
        "IN_DATABASE",
        "IN_TABLE_CATALOG",
        "UPDATE_FREQUENCY",
        "UPDATE_COLUMN",
        "MINIMUM_UPDATE_TS",
        "NEXT_REGULAR_UPDATE_TS",
        "ACTUAL_UPDATE_TS",
        "CONTENT_CURRENT",
        "VALIDATION_SUCCESSFUL",
        "VALIDATION_ERROR",
    ])?;
    for row in rows {
        csv_writer.write_record(&[
            row.schema.clone(),
            row.name.clone(),
            row.full_name.clone(),
            row.used.to_string(),
            row.created.to_string(),
            row.renamed.to_string(),
            row.populated.to_string(),
            row.sql.clone(),
            join_indices(&row.parent_tables),
            row.in_database.to_string(),
            row.in_table_catalog.to_string(),
            row.update_frequency.clone(),
            row.update_column.clone(),
            format_ts(row.minimum_update_ts),
            format_ts(row.next_regular_update_ts),
            format_ts(row.actual_update_ts),
            row.content_current.to_string(),
            row.validation_successful.to_string(),
            row.validation_error.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn join_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.to_string()).unwrap_or_default()
}
