//! Catalog and freshness validation for extracted tables.
//!
//! For every table found by the extractor, the validator determines physical
//! existence, table-catalog registration and content freshness, and records a
//! per-table verdict. Setup problems (bad catalog name, unreachable catalog
//! object, a failed batched query) abort the run; per-table failures are
//! recorded in [`TableValidation::validation_error`] and never abort it. An
//! empty `validation_error` is the only true success signal.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::db::{QueryExecutor, Value};
use crate::error::ValidatorError;
use crate::sql_engine::tables::{Table, TableId, TableRegistry};

/// Validation state for one extracted table.
///
/// Fields are assigned in a fixed order over one pass: the batched existence
/// probe fills `in_database`, the batched catalog read fills the catalog
/// fields, the per-table content check fills the rest. Once
/// `validation_error` is non-empty the record is terminal for the pass.
#[derive(Debug, Clone)]
pub struct TableValidation {
    pub table_id: TableId,
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

impl TableValidation {
    fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            in_database: false,
            in_table_catalog: false,
            update_frequency: String::new(),
            update_column: String::new(),
            minimum_update_ts: None,
            next_regular_update_ts: None,
            actual_update_ts: None,
            content_current: false,
            validation_successful: false,
            validation_error: String::new(),
        }
    }
}

/// Cross-references the extracted table registry against the database and
/// the configured table catalog
#[derive(Debug)]
pub struct FreshnessValidator<E: QueryExecutor> {
    executor: E,
    table_catalog: String,
    registry: TableRegistry,
    validations: Vec<TableValidation>,
}

impl<E: QueryExecutor> FreshnessValidator<E> {
    /// Validate the catalog name, probe the catalog object and set up one
    /// [`TableValidation`] per registry entry.
    ///
    /// The catalog name must be `SCHEMA.NAME` built from
    /// letters/digits/underscore/dash, and the catalog object itself must be
    /// queryable; anything else fails here, before any per-table work.
    pub fn new(
        executor: E,
        table_catalog: &str,
        registry: TableRegistry,
    ) -> Result<Self, ValidatorError> {
        let table_catalog = table_catalog.to_uppercase();
        if !valid_characters(&table_catalog) {
            return Err(ValidatorError::CatalogInvalidCharacters(table_catalog));
        }
        if !valid_table_name_format(&table_catalog) {
            return Err(ValidatorError::CatalogWrongFormat(table_catalog));
        }
        let probe = format!("select top 1 1 from {table_catalog}");
        executor
            .execute(&probe)
            .map_err(|source| ValidatorError::CatalogUnreachable {
                catalog: table_catalog.clone(),
                source,
            })?;

        let validations = registry.iter().map(|(id, _)| TableValidation::new(id)).collect();
        Ok(Self {
            executor,
            table_catalog,
            registry,
            validations,
        })
    }

    /// Run the validation pass: the two batched catalog queries, then the
    /// per-table content checks.
    pub fn validate(&mut self) -> Result<(), ValidatorError> {
        self.check_table_existence()?;
        self.read_table_catalog()?;
        self.check_table_content();
        Ok(())
    }

    pub fn table_catalog(&self) -> &str {
        &self.table_catalog
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn validations(&self) -> &[TableValidation] {
        &self.validations
    }

    /// Overall go/no-go: true iff at least one table was identified and
    /// every per-table validation succeeded. An empty table list is
    /// inconclusive, never safe.
    pub fn validation_successful(&self) -> bool {
        !self.validations.is_empty()
            && self.validations.iter().all(|tv| tv.validation_successful)
    }

    /// One OR-joined predicate per extracted table
    fn name_predicates(&self, schema_col: &str, name_col: &str) -> String {
        self.registry
            .tables()
            .iter()
            .map(|t| {
                format!(
                    "(upper({schema_col})='{}' and upper({name_col})='{}')",
                    t.schema, t.name
                )
            })
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Batched physical-existence probe over the system table/view catalog
    fn check_table_existence(&mut self) -> Result<(), ValidatorError> {
        if self.validations.is_empty() {
            return Ok(());
        }
        let predicates = self.name_predicates("s.name", "t.name");
        let sql = format!(
            "select upper(s.name) + '.' + upper(t.name) \
             from sys.tables t join sys.schemas s on t.schema_id = s.schema_id \
             where {predicates} \
             union \
             select upper(s.name) + '.' + upper(t.name) \
             from sys.views t join sys.schemas s on t.schema_id = s.schema_id \
             where {predicates}"
        );
        let rows = self
            .executor
            .execute(&sql)
            .map_err(|source| ValidatorError::Query { sql: sql.clone(), source })?;
        debug!("existence probe returned {} rows", rows.len());
        for row in rows {
            let Some(full_name) = row.first().and_then(|v| v.as_text()) else {
                continue;
            };
            if let Some(id) = self.registry.id_of(full_name) {
                if let Some(tv) = self.validations.get_mut(id) {
                    tv.in_database = true;
                }
            }
        }
        Ok(())
    }

    /// Batched metadata read from the configured table-catalog object
    fn read_table_catalog(&mut self) -> Result<(), ValidatorError> {
        if self.validations.is_empty() {
            return Ok(());
        }
        let predicates = self.name_predicates("object_schema_name", "object_name");
        let sql = format!(
            "select upper(object_schema_name) + '.' + upper(object_name), \
             object_update_frequency, object_update_column, \
             object_minimum_update, object_next_regular_update \
             from {} where {predicates}",
            self.table_catalog
        );
        let rows = self
            .executor
            .execute(&sql)
            .map_err(|source| ValidatorError::Query { sql: sql.clone(), source })?;
        debug!("catalog read returned {} rows", rows.len());
        for row in rows {
            let Some(full_name) = row.first().and_then(|v| v.as_text()) else {
                continue;
            };
            let Some(id) = self.registry.id_of(full_name) else {
                continue;
            };
            let Some(tv) = self.validations.get_mut(id) else {
                continue;
            };
            tv.in_table_catalog = true;
            tv.update_frequency = row.get(1).and_then(|v| v.as_text()).unwrap_or("").to_string();
            tv.update_column = row.get(2).and_then(|v| v.as_text()).unwrap_or("").to_string();
            tv.minimum_update_ts = row.get(3).and_then(|v| v.as_timestamp());
            tv.next_regular_update_ts = row.get(4).and_then(|v| v.as_timestamp());
        }
        Ok(())
    }

    /// Per-table guard pipeline, terminal on the first failing branch
    fn check_table_content(&mut self) {
        let Self {
            executor,
            table_catalog,
            registry,
            validations,
        } = self;
        for tv in validations.iter_mut() {
            let table = registry.get(tv.table_id);
            match content_checks(&*executor, table_catalog, table, tv) {
                Ok(()) => tv.validation_successful = true,
                Err(reason) => tv.validation_error = reason,
            }
        }
    }
}

/// Ordered guard checks for one table. Every `Err` is the human-readable
/// reason recorded in `validation_error`; `Ok` means the table passed all
/// applicable gates.
fn content_checks<E: QueryExecutor>(
    executor: &E,
    table_catalog: &str,
    table: &Table,
    validation: &mut TableValidation,
) -> Result<(), String> {
    if !validation.in_database && !table.created && !table.renamed {
        return Err("table not found in the database".to_string());
    }
    if !validation.in_table_catalog {
        return Err(format!("table not registered in {table_catalog}"));
    }
    if validation.update_column.is_empty() {
        return Err("update column name is blank".to_string());
    }
    if !valid_characters(&validation.update_column) {
        return Err("the update column name contains invalid characters".to_string());
    }
    let minimum_update_ts = validation
        .minimum_update_ts
        .ok_or_else(|| "invalid minimum update timestamp in the table catalog".to_string())?;

    // Freshness only applies to pure read sources; data this run creates,
    // renames or populates does not exist to be fresh yet.
    if table.created || table.renamed || table.populated {
        return Ok(());
    }

    let sql = format!(
        "select max({}) from {}",
        validation.update_column,
        table.full_name()
    );
    let rows = executor.execute(&sql).map_err(|_| format!("unable to run query {sql}"))?;
    let value = rows
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
        .unwrap_or(Value::Null);
    let actual_update_ts = match value {
        Value::Timestamp(ts) => ts,
        Value::Null => return Err("table is blank".to_string()),
        other => {
            return Err(format!(
                "invalid data type in {} - datetime expected, {} received",
                validation.update_column,
                other.type_name()
            ));
        }
    };
    validation.actual_update_ts = Some(actual_update_ts);

    // Tables with lineage parents are exempt: their freshness is governed by
    // their parents' own validation.
    if minimum_update_ts > actual_update_ts && table.parent_tables.is_empty() {
        return Err(format!(
            "outdated data - minimal update: {minimum_update_ts}, actual update: {actual_update_ts}"
        ));
    }
    validation.content_current = true;
    Ok(())
}

fn ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
}

/// Letters, digits, underscore, dash and dot only
fn valid_characters(name: &str) -> bool {
    name.chars().all(|c| ident_char(c) || c == '.')
}

/// Exactly `SCHEMA.NAME`, both parts non-empty identifier runs
fn valid_table_name_format(name: &str) -> bool {
    match name.split_once('.') {
        Some((schema, table)) => {
            !schema.is_empty()
                && !table.is_empty()
                && schema.chars().all(ident_char)
                && table.chars().all(ident_char)
        }
        None => false,
    }
}
