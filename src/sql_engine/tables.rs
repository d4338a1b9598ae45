//! Table registry and lineage data model.
//!
//! One extraction run owns one [`TableRegistry`]: an arena of [`Table`]
//! entries keyed by upper-cased `SCHEMA.NAME`. Lineage edges are stored as
//! [`TableId`] indices into the same arena, so the graph carries no reference
//! cycles and projects straight into flat report rows.

use std::collections::HashMap;

/// Index of a table within its owning [`TableRegistry`]
pub type TableId = usize;

/// One database object referenced by the analyzed SQL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub schema: String,
    pub name: String,
    /// Statement text that created, renamed or populated this table;
    /// empty if the table is only ever read.
    pub sql: String,
    pub used: bool,
    pub created: bool,
    pub renamed: bool,
    pub populated: bool,
    /// Lineage predecessors, deduplicated
    pub parent_tables: Vec<TableId>,
}

impl Table {
    /// Create a blank entry; schema and name are upper-cased here so the
    /// registry key is case-insensitive end-to-end.
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_uppercase(),
            name: name.to_uppercase(),
            sql: String::new(),
            used: false,
            created: false,
            renamed: false,
            populated: false,
            parent_tables: Vec::new(),
        }
    }

    /// Fully qualified name, the unique registry key
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Facts about a table observed in a single statement scan
#[derive(Debug, Clone, Default)]
pub struct TableFacts {
    pub used: bool,
    pub created: bool,
    pub renamed: bool,
    pub populated: bool,
    pub sql: Option<String>,
}

impl TableFacts {
    pub fn used() -> Self {
        Self {
            used: true,
            ..Self::default()
        }
    }

    pub fn created(sql: &str) -> Self {
        Self {
            created: true,
            sql: Some(sql.to_string()),
            ..Self::default()
        }
    }

    pub fn renamed(sql: &str) -> Self {
        Self {
            renamed: true,
            sql: Some(sql.to_string()),
            ..Self::default()
        }
    }

    pub fn populated(sql: &str) -> Self {
        Self {
            populated: true,
            sql: Some(sql.to_string()),
            ..Self::default()
        }
    }
}

/// Merge newly observed facts into an existing entry: flags OR-accumulate,
/// the defining SQL is overwritten by the most recent statement.
pub fn merge_facts(table: &mut Table, facts: &TableFacts) {
    table.used |= facts.used;
    table.created |= facts.created;
    table.renamed |= facts.renamed;
    table.populated |= facts.populated;
    if let Some(sql) = &facts.sql {
        table.sql = sql.clone();
    }
}

/// Arena of tables for one extraction run
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: Vec<Table>,
    by_name: HashMap<String, TableId>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply facts to the entry keyed by `full_name`, creating it on first
    /// mention. `full_name` must already be upper-cased `SCHEMA.NAME`.
    pub fn apply(&mut self, full_name: &str, facts: &TableFacts) -> TableId {
        let id = match self.by_name.get(full_name) {
            Some(&id) => id,
            None => {
                let (schema, name) = full_name.split_once('.').unwrap_or((full_name, ""));
                let id = self.tables.len();
                self.tables.push(Table::new(schema, name));
                self.by_name.insert(full_name.to_string(), id);
                id
            }
        };
        merge_facts(&mut self.tables[id], facts);
        id
    }

    /// Add a lineage edge from `parent` to `child`, deduplicated
    pub fn add_parent(&mut self, child: TableId, parent: TableId) {
        let parents = &mut self.tables[child].parent_tables;
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    pub fn id_of(&self, full_name: &str) -> Option<TableId> {
        self.by_name.get(full_name).copied()
    }

    pub fn get(&self, id: TableId) -> &Table {
        &self.tables[id]
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableId, &Table)> {
        self.tables.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Sorted fully qualified names of a table's lineage parents
    pub fn parent_names(&self, id: TableId) -> Vec<String> {
        let mut names: Vec<String> = self.tables[id]
            .parent_tables
            .iter()
            .map(|&pid| self.tables[pid].full_name())
            .collect();
        names.sort();
        names
    }
}
