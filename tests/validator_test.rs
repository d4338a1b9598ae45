//! End-to-end tests for the freshness validator, driven by a scripted
//! executor standing in for the database.

use std::cell::RefCell;

use chrono::{NaiveDate, NaiveDateTime};
use sqlgate::report;
use sqlgate::sql_engine::tables::TableFacts;
use sqlgate::{
    FreshnessValidator, LineageExtractor, QueryError, QueryExecutor, Row, TableRegistry, Value,
};

const CATALOG: &str = "META.V_ETL_SCOPE";

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Answers queries by substring match against scripted responses and keeps
/// a log of every statement it was asked to run. Unmatched queries return
/// no rows.
struct ScriptedExecutor {
    responses: Vec<(String, Result<Vec<Row>, QueryError>)>,
    log: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    fn new(responses: Vec<(&str, Result<Vec<Row>, QueryError>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(needle, response)| (needle.to_string(), response))
                .collect(),
            log: RefCell::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        self.log.borrow_mut().push(sql.to_string());
        for (needle, response) in &self.responses {
            if sql.contains(needle.as_str()) {
                return response.clone();
            }
        }
        Ok(vec![])
    }
}

fn probe_ok() -> (&'static str, Result<Vec<Row>, QueryError>) {
    ("select top 1 1", Ok(vec![vec![Value::Integer(1)]]))
}

fn existing(full_names: &[&str]) -> (&'static str, Result<Vec<Row>, QueryError>) {
    let rows = full_names
        .iter()
        .map(|name| vec![Value::Text(name.to_string())])
        .collect();
    ("sys.tables", Ok(rows))
}

fn catalog_row(full_name: &str, column: &str, minimum: Value) -> Row {
    vec![
        Value::Text(full_name.to_string()),
        Value::Text("daily".to_string()),
        Value::Text(column.to_string()),
        minimum,
        Value::Timestamp(ts(2024, 7, 1)),
    ]
}

fn catalog(rows: Vec<Row>) -> (&'static str, Result<Vec<Row>, QueryError>) {
    ("object_update_frequency", Ok(rows))
}

#[test]
fn test_fresh_source_table_is_safe() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["MLDBNC.HW_INFO"]),
        catalog(vec![catalog_row(
            "MLDBNC.HW_INFO",
            "LOAD_TS",
            Value::Timestamp(ts(2024, 1, 1)),
        )]),
        (
            "select max(LOAD_TS) from MLDBNC.HW_INFO",
            Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]]),
        ),
    ]);
    let registry = LineageExtractor::new().extract("select * from mldbnc.hw_info");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let tv = &validator.validations()[0];
    assert!(tv.in_database);
    assert!(tv.in_table_catalog);
    assert_eq!(tv.update_frequency, "daily");
    assert_eq!(tv.update_column, "LOAD_TS");
    assert_eq!(tv.minimum_update_ts, Some(ts(2024, 1, 1)));
    assert_eq!(tv.actual_update_ts, Some(ts(2024, 6, 1)));
    assert!(tv.content_current);
    assert!(tv.validation_successful);
    assert_eq!(tv.validation_error, "");
    assert!(validator.validation_successful());
}

#[test]
fn test_missing_table_is_reported_not_raised() {
    let executor = ScriptedExecutor::new(vec![probe_ok()]);
    let registry = LineageExtractor::new().extract("select * from ghost.table");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let tv = &validator.validations()[0];
    assert!(!tv.validation_successful);
    assert!(tv.validation_error.contains("not found in the database"));
    assert!(!validator.validation_successful());
}

#[test]
fn test_unregistered_table() {
    let executor = ScriptedExecutor::new(vec![probe_ok(), existing(&["RAW.ORDERS"])]);
    let registry = LineageExtractor::new().extract("select * from raw.orders");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let tv = &validator.validations()[0];
    assert_eq!(
        tv.validation_error,
        format!("table not registered in {CATALOG}")
    );
}

#[test]
fn test_outdated_source_blocks_the_run() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["RAW.ORDERS"]),
        catalog(vec![catalog_row(
            "RAW.ORDERS",
            "LOAD_TS",
            Value::Timestamp(ts(2024, 6, 1)),
        )]),
        (
            "select max(LOAD_TS) from RAW.ORDERS",
            Ok(vec![vec![Value::Timestamp(ts(2024, 1, 1))]]),
        ),
    ]);
    let registry = LineageExtractor::new().extract("select * from raw.orders");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let tv = &validator.validations()[0];
    assert!(tv.validation_error.contains("outdated data"));
    assert!(!tv.content_current);
    assert!(!validator.validation_successful());
}

#[test]
fn test_outdated_source_with_parent_is_exempt() {
    // a pure read source that carries lineage parents (derived in an earlier
    // run) is presumed governed by its parents' own validation
    let mut registry = TableRegistry::new();
    let parent = registry.apply("RAW.ORDERS", &TableFacts::used());
    let child = registry.apply("MART.ORDERS", &TableFacts::used());
    registry.add_parent(child, parent);

    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["RAW.ORDERS", "MART.ORDERS"]),
        catalog(vec![
            catalog_row("RAW.ORDERS", "LOAD_TS", Value::Timestamp(ts(2024, 1, 1))),
            catalog_row("MART.ORDERS", "BUILD_TS", Value::Timestamp(ts(2024, 6, 1))),
        ]),
        (
            "select max(LOAD_TS) from RAW.ORDERS",
            Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]]),
        ),
        (
            // behind its minimum, but exempt through the parent edge
            "select max(BUILD_TS) from MART.ORDERS",
            Ok(vec![vec![Value::Timestamp(ts(2024, 1, 1))]]),
        ),
    ]);
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let mart = &validator.validations()[child];
    assert_eq!(mart.validation_error, "");
    assert!(mart.content_current);
    assert!(validator.validation_successful());
}

#[test]
fn test_created_table_skips_freshness_probe() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["OLD.TABLE"]),
        catalog(vec![
            catalog_row("OLD.TABLE", "LOAD_TS", Value::Timestamp(ts(2024, 1, 1))),
            catalog_row("NEW.TABLE", "LOAD_TS", Value::Timestamp(ts(2024, 1, 1))),
        ]),
        (
            "select max(LOAD_TS) from OLD.TABLE",
            Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]]),
        ),
    ]);
    let registry =
        LineageExtractor::new().extract("create table new.table as select * from old.table");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    assert!(validator.validation_successful());

    let queries = executor.queries();
    let max_queries: Vec<_> = queries.iter().filter(|q| q.contains("select max(")).collect();
    assert_eq!(max_queries.len(), 1);
    assert!(max_queries[0].contains("from OLD.TABLE"));
}

#[test]
fn test_batched_probes_run_once() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["A.ONE", "B.TWO"]),
        catalog(vec![
            catalog_row("A.ONE", "TS1", Value::Timestamp(ts(2024, 1, 1))),
            catalog_row("B.TWO", "TS2", Value::Timestamp(ts(2024, 1, 1))),
        ]),
        ("select max(", Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]])),
    ]);
    let registry = LineageExtractor::new().extract("select * from a.one join b.two on 1=1");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let queries = executor.queries();
    let existence: Vec<_> = queries.iter().filter(|q| q.contains("sys.tables")).collect();
    assert_eq!(existence.len(), 1);
    assert!(existence[0].contains("upper(s.name)='A' and upper(t.name)='ONE'"));
    assert!(existence[0].contains("upper(s.name)='B' and upper(t.name)='TWO'"));

    let catalog_reads: Vec<_> = queries
        .iter()
        .filter(|q| q.contains("object_update_frequency"))
        .collect();
    assert_eq!(catalog_reads.len(), 1);
}

#[test]
fn test_one_bad_table_does_not_abort_the_others() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["A.ONE"]),
        catalog(vec![catalog_row(
            "A.ONE",
            "TS1",
            Value::Timestamp(ts(2024, 1, 1)),
        )]),
        ("select max(", Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]])),
    ]);
    let registry = LineageExtractor::new().extract("select * from a.one join b.two on 1=1");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let good = validator
        .validations()
        .iter()
        .find(|tv| validator.registry().get(tv.table_id).full_name() == "A.ONE")
        .unwrap();
    assert!(good.validation_successful);

    let bad = validator
        .validations()
        .iter()
        .find(|tv| validator.registry().get(tv.table_id).full_name() == "B.TWO")
        .unwrap();
    assert!(!bad.validation_successful);
    assert!(bad.validation_error.contains("not found in the database"));

    assert!(!validator.validation_successful());
}

#[test]
fn test_blank_source_table() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["RAW.ORDERS"]),
        catalog(vec![catalog_row(
            "RAW.ORDERS",
            "LOAD_TS",
            Value::Timestamp(ts(2024, 1, 1)),
        )]),
        ("select max(", Ok(vec![vec![Value::Null]])),
    ]);
    let registry = LineageExtractor::new().extract("select * from raw.orders");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    assert_eq!(validator.validations()[0].validation_error, "table is blank");
}

#[test]
fn test_invalid_minimum_update_timestamp() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["RAW.ORDERS"]),
        catalog(vec![catalog_row(
            "RAW.ORDERS",
            "LOAD_TS",
            Value::Text("not a date".to_string()),
        )]),
    ]);
    let registry = LineageExtractor::new().extract("select * from raw.orders");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    assert!(validator.validations()[0]
        .validation_error
        .contains("invalid minimum update timestamp"));
}

#[test]
fn test_freshness_probe_failure_is_recorded_per_table() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["RAW.ORDERS"]),
        catalog(vec![catalog_row(
            "RAW.ORDERS",
            "LOAD_TS",
            Value::Timestamp(ts(2024, 1, 1)),
        )]),
        ("select max(", Err(QueryError::new("connectivity lost"))),
    ]);
    let registry = LineageExtractor::new().extract("select * from raw.orders");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    assert!(validator.validations()[0]
        .validation_error
        .contains("unable to run query select max(LOAD_TS) from RAW.ORDERS"));
}

#[test]
fn test_empty_extraction_is_inconclusive() {
    let executor = ScriptedExecutor::new(vec![probe_ok()]);
    let registry = LineageExtractor::new().extract("-- nothing but comments");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    assert!(validator.validations().is_empty());
    assert!(!validator.validation_successful());
    // only the construction probe ran
    assert_eq!(executor.queries().len(), 1);
}

#[test]
fn test_validation_rows_projection() {
    let executor = ScriptedExecutor::new(vec![
        probe_ok(),
        existing(&["OLD.TABLE"]),
        catalog(vec![
            catalog_row("OLD.TABLE", "LOAD_TS", Value::Timestamp(ts(2024, 1, 1))),
            catalog_row("NEW.TABLE", "LOAD_TS", Value::Timestamp(ts(2024, 1, 1))),
        ]),
        (
            "select max(LOAD_TS) from OLD.TABLE",
            Ok(vec![vec![Value::Timestamp(ts(2024, 6, 1))]]),
        ),
    ]);
    let registry =
        LineageExtractor::new().extract("create table new.table as select * from old.table");
    let mut validator = FreshnessValidator::new(&executor, CATALOG, registry).unwrap();
    validator.validate().unwrap();

    let rows = report::validation_rows(validator.registry(), validator.validations());
    assert_eq!(rows.len(), 2);

    let source = rows.iter().find(|r| r.full_name == "OLD.TABLE").unwrap();
    assert!(source.in_database);
    assert!(source.content_current);
    assert_eq!(source.actual_update_ts, Some(ts(2024, 6, 1)));
    assert!(source.validation_successful);

    let target = rows.iter().find(|r| r.full_name == "NEW.TABLE").unwrap();
    assert!(target.created);
    assert_eq!(target.parent_tables.len(), 1);
    assert_eq!(target.actual_update_ts, None);
    assert!(target.validation_successful);
    assert_eq!(target.validation_error, "");

    let mut buffer = Vec::new();
    report::write_validation_csv(&mut buffer, &rows).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("SCHEMA,NAME,FULL_NAME"));
    assert!(text.contains("2024-06-01 00:00:00"));
}

#[test]
fn test_catalog_name_is_uppercased() {
    let executor = ScriptedExecutor::new(vec![probe_ok()]);
    let validator =
        FreshnessValidator::new(&executor, "meta.v_etl_scope", TableRegistry::new()).unwrap();
    assert_eq!(validator.table_catalog(), "META.V_ETL_SCOPE");
    assert!(executor.queries()[0].contains("from META.V_ETL_SCOPE"));
}
