//! Connection boundary.
//!
//! The crate never opens connections. Callers hand in something that can
//! run a statement with bound values and return rows; readers and writers
//! only talk to the database through this trait.

use indexmap::IndexMap;

use crate::builder::{BindValues, SqlValue, Statement};
use crate::error::BoxError;

/// A fetched row, column name to value, in select-list order.
pub type Row = IndexMap<String, SqlValue>;

/// A live database connection.
pub trait Connection {
    /// Engine name, matching a registered dialect (e.g. `mysql`).
    fn driver(&self) -> &str;

    /// Server version string as reported by the engine.
    fn server_version(&mut self) -> Result<String, BoxError>;

    /// Runs a statement that returns no rows; returns the affected count.
    fn execute(&mut self, sql: &str, binds: &BindValues) -> Result<u64, BoxError>;

    /// Runs a query and returns all rows.
    fn fetch_all(&mut self, sql: &str, binds: &BindValues) -> Result<Vec<Row>, BoxError>;

    /// Starts a transaction.
    fn begin(&mut self) -> Result<(), BoxError>;

    /// Commits the current transaction.
    fn commit(&mut self) -> Result<(), BoxError>;

    /// Rolls back the current transaction.
    fn rollback(&mut self) -> Result<(), BoxError>;

    /// Runs a built statement that returns no rows.
    fn execute_statement(&mut self, statement: &Statement) -> Result<u64, BoxError> {
        self.execute(&statement.sql, &statement.binds)
    }

    /// Runs a built query.
    fn fetch_statement(&mut self, statement: &Statement) -> Result<Vec<Row>, BoxError> {
        self.fetch_all(&statement.sql, &statement.binds)
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn driver(&self) -> &str {
        (**self).driver()
    }

    fn server_version(&mut self) -> Result<String, BoxError> {
        (**self).server_version()
    }

    fn execute(&mut self, sql: &str, binds: &BindValues) -> Result<u64, BoxError> {
        (**self).execute(sql, binds)
    }

    fn fetch_all(&mut self, sql: &str, binds: &BindValues) -> Result<Vec<Row>, BoxError> {
        (**self).fetch_all(sql, binds)
    }

    fn begin(&mut self) -> Result<(), BoxError> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        (**self).rollback()
    }
}

/// Reads a column from a row, case-insensitively, as text.
///
/// Catalog views differ in the case they report column labels in, so
/// normalizers look columns up through this helper.
#[must_use]
pub fn row_text(row: &Row, column: &str) -> Option<String> {
    row_value(row, column).and_then(SqlValue::to_text)
}

/// Looks up a column value case-insensitively.
#[must_use]
pub fn row_value<'a>(row: &'a Row, column: &str) -> Option<&'a SqlValue> {
    row.get(column).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    })
}
