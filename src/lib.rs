//! sqlgate - table lineage extraction and freshness validation for SQL
//! pipelines.
//!
//! The crate answers one question for data-pipeline operators: given a batch
//! of SQL statements, which tables does it touch, and are the source tables
//! fresh enough (and registered correctly) to run it safely?
//!
//! Two subsystems do the work:
//! - [`sql_engine`]: normalizes the raw SQL body and scans each statement for
//!   source, target, rename and populate shapes, merging the findings into a
//!   deduplicated [`TableRegistry`](sql_engine::TableRegistry) with
//!   parent/child lineage edges.
//! - [`validators`]: cross-references every extracted table against the
//!   database and a table-catalog object through a caller-supplied
//!   [`QueryExecutor`](db::QueryExecutor), recording a per-table verdict and
//!   an overall go/no-go.
//!
//! ```no_run
//! use sqlgate::sql_engine::LineageExtractor;
//!
//! let registry = LineageExtractor::new()
//!     .extract("create table mart.orders as select * from raw.orders");
//! assert_eq!(registry.len(), 2);
//! ```

pub mod commands;
pub mod db;
pub mod display;
pub mod error;
pub mod report;
pub mod source;
pub mod sql_engine;
pub mod validators;

pub use db::{QueryExecutor, Row, Value};
pub use error::{ConfigError, QueryError, SourceError, ValidatorError};
pub use sql_engine::{LineageExtractor, Table, TableId, TableRegistry};
pub use validators::{FreshnessValidator, TableValidation};
