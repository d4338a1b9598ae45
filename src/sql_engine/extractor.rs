//! Table lineage extraction from SQL statements.
//!
//! This is not a SQL parser: statements are scanned with a fixed set of
//! case-insensitive patterns for the shapes that move data between tables
//! (read, create, rename, populate). Identifiers are restricted to
//! letters/digits/underscore/dash with the schema and name separated by a
//! dot, optionally surrounded by whitespace. Everything that does not match
//! is simply not a table reference.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use super::normalize::{normalize, split_statements};
use super::tables::{TableFacts, TableRegistry};

/// Statement scan patterns, compiled once per extractor
struct Patterns {
    trim_call: Regex,
    extract_call: Regex,
    from_table: Regex,
    join_table: Regex,
    create_table: Regex,
    create_hadoop_table: Regex,
    rename_table: Regex,
    insert_into: Regex,
    into_table: Regex,
}

impl Patterns {
    fn new() -> Self {
        let table = r"([a-z\d_-]+)\s*\.\s*([a-z\d_-]+)";
        let compile = |pattern: String| Regex::new(&pattern).expect("hardcoded pattern");
        Self {
            trim_call: compile(r"(?i)trim\s*\([^)]*from[^)]*\)".to_string()),
            extract_call: compile(r"(?i)extract\s*\([^)]*from[^)]*\)".to_string()),
            from_table: compile(format!(r"(?i)from\s+{table}")),
            join_table: compile(format!(r"(?i)join\s+{table}")),
            create_table: compile(format!(r"(?i)create\s+table\s+{table}")),
            create_hadoop_table: compile(format!(r"(?i)create\s+hadoop\s+table\s+{table}")),
            rename_table: compile(format!(r"(?i)rename\s+table\s+{table}\s+to\s+([a-z\d_-]+)")),
            insert_into: compile(format!(r"(?i)insert\s+into\s+{table}")),
            into_table: compile(format!(r"(?i)into\s+table\s+{table}")),
        }
    }
}

/// Scans SQL text and builds the table/lineage registry for one run
pub struct LineageExtractor {
    patterns: Patterns,
}

impl Default for LineageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageExtractor {
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
        }
    }

    /// Normalize the raw SQL body and merge every statement's table facts
    /// into a fresh registry. Statement order is text order; later statements
    /// add flags and lineage to earlier entries but never remove them.
    pub fn extract(&self, sql: &str) -> TableRegistry {
        let clean = normalize(sql);
        let mut registry = TableRegistry::new();
        for statement in split_statements(&clean) {
            self.scan_statement(statement, &mut registry);
        }
        registry
    }

    fn scan_statement(&self, statement: &str, registry: &mut TableRegistry) {
        let sources = self.source_tables(statement);
        let targets = self.target_tables(statement);
        let renames = self.renamed_tables(statement);
        let populated = self.populated_tables(statement);
        debug!(
            "statement scan: {} sources, {} targets, {} renames, {} populated",
            sources.len(),
            targets.len(),
            renames.len(),
            populated.len()
        );

        let source_ids: Vec<_> = sources
            .iter()
            .map(|name| registry.apply(name, &TableFacts::used()))
            .collect();

        for name in &targets {
            let target = registry.apply(name, &TableFacts::created(statement));
            for &source in &source_ids {
                registry.add_parent(target, source);
            }
        }

        for (original, renamed) in &renames {
            let original = registry.apply(original, &TableFacts::used());
            let renamed = registry.apply(renamed, &TableFacts::renamed(statement));
            registry.add_parent(renamed, original);
        }

        for name in &populated {
            let target = registry.apply(name, &TableFacts::populated(statement));
            for &source in &source_ids {
                registry.add_parent(target, source);
            }
        }
    }

    /// Two-part identifiers following FROM or JOIN. TRIM(... FROM ...) and
    /// EXTRACT(... FROM ...) snippets are masked first so their embedded
    /// FROM is not mistaken for a clause.
    fn source_tables(&self, statement: &str) -> BTreeSet<String> {
        let masked = self.patterns.trim_call.replace_all(statement, "x");
        let masked = self.patterns.extract_call.replace_all(&masked, "x");
        let mut tables = capture_names(&self.patterns.from_table, &masked);
        tables.extend(capture_names(&self.patterns.join_table, &masked));
        tables
    }

    /// Two-part identifiers following CREATE TABLE or CREATE HADOOP TABLE
    fn target_tables(&self, statement: &str) -> BTreeSet<String> {
        let mut tables = capture_names(&self.patterns.create_table, statement);
        tables.extend(capture_names(&self.patterns.create_hadoop_table, statement));
        tables
    }

    /// RENAME TABLE schema.old TO new pairs; the new name shares the schema
    fn renamed_tables(&self, statement: &str) -> BTreeSet<(String, String)> {
        self.patterns
            .rename_table
            .captures_iter(statement)
            .map(|caps| {
                let schema = caps[1].to_uppercase();
                let original = format!("{}.{}", schema, caps[2].to_uppercase());
                let renamed = format!("{}.{}", schema, caps[3].to_uppercase());
                (original, renamed)
            })
            .collect()
    }

    /// Two-part identifiers following INSERT INTO or INTO TABLE
    fn populated_tables(&self, statement: &str) -> BTreeSet<String> {
        let mut tables = capture_names(&self.patterns.into_table, statement);
        tables.extend(capture_names(&self.patterns.insert_into, statement));
        tables
    }
}

fn capture_names(pattern: &Regex, statement: &str) -> BTreeSet<String> {
    pattern
        .captures_iter(statement)
        .map(|caps| format!("{}.{}", caps[1].to_uppercase(), caps[2].to_uppercase()))
        .collect()
}
