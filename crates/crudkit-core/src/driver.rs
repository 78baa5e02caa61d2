//! Database driver traits.
//!
//! crudkit never speaks a wire protocol itself. A [`Connector`] opens
//! sessions and each session is a [`Driver`]: a blocking handle that runs
//! SQL with `?` placeholders and positional parameters.
//!
//! - [`Driver`] - one live database session
//! - [`Connector`] - factory that opens a [`Driver`] from [`ConnectOptions`]

use crate::error::Result;
use crate::options::ConnectOptions;
use crate::quoting::quote_literal;
use crate::row::Row;
use crate::value::Value;

/// A single blocking database session.
///
/// Implementations report every failure through `Result`; there is no
/// silent error mode.
///
/// # Example
///
/// ```rust,ignore
/// let rows = driver.query("SELECT * FROM users WHERE id = ?", &[Value::Int(1)])?;
/// let affected = driver.execute("DELETE FROM users WHERE id = ?", &[Value::Int(1)])?;
/// ```
pub trait Driver: Send {
    /// Run a statement and return all rows it produced.
    #[allow(clippy::result_large_err)]
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement (INSERT, UPDATE, DELETE, ...) and return rows affected.
    #[allow(clippy::result_large_err)]
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// The id generated by the most recent INSERT on this session.
    #[allow(clippy::result_large_err)]
    fn last_insert_id(&mut self) -> Result<u64>;

    /// Check that the session is still usable.
    #[allow(clippy::result_large_err)]
    fn ping(&mut self) -> Result<()> {
        self.query("SELECT 1", &[]).map(|_| ())
    }

    /// Start a transaction.
    #[allow(clippy::result_large_err)]
    fn begin(&mut self) -> Result<()> {
        self.execute("START TRANSACTION", &[]).map(|_| ())
    }

    /// Commit the open transaction.
    #[allow(clippy::result_large_err)]
    fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT", &[]).map(|_| ())
    }

    /// Roll back the open transaction.
    #[allow(clippy::result_large_err)]
    fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK", &[]).map(|_| ())
    }

    /// Quote a value as a literal for this session's SQL dialect.
    fn quote(&self, value: &Value) -> String {
        quote_literal(value)
    }

    /// Close the session. Errors are for reporting only; the handle is
    /// considered gone either way.
    #[allow(clippy::result_large_err)]
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens driver sessions.
///
/// The engine keeps its connector so it can reconnect with the same
/// options after a failed ping.
pub trait Connector {
    /// The session type this connector produces.
    type Driver: Driver;

    /// Open a new session.
    #[allow(clippy::result_large_err)]
    fn connect(&self, options: &ConnectOptions) -> Result<Self::Driver>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn last_insert_id(&mut self) -> Result<u64> {
        (**self).last_insert_id()
    }

    fn ping(&mut self) -> Result<()> {
        (**self).ping()
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn quote(&self, value: &Value) -> String {
        (**self).quote(value)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
