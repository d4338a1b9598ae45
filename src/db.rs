//! Database collaborator seam.
//!
//! The crate never bundles a driver; callers hand in anything that can run a
//! SQL string and return rows. The validator issues four query shapes through
//! this trait: the catalog reachability probe, the batched physical-existence
//! probe, the batched catalog metadata read, and the per-table `MAX(column)`
//! freshness probes.

use chrono::NaiveDateTime;

use crate::error::QueryError;

/// A dynamically typed result cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Type label used in validation error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// One result row
pub type Row = Vec<Value>;

/// Executes SQL against the database holding the tables under validation
pub trait QueryExecutor {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError>;
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn execute(&self, sql: &str) -> Result<Vec<Row>, QueryError> {
        (**self).execute(sql)
    }
}
