//! The query engine: one connection, CRUD helpers, retries and query logging.
//!
//! A [`QueryEngine`] owns exactly one driver session. Every statement goes
//! through the same path:
//!
//! 1. fail fast with [`Error::NotInitialized`] once the engine is closed
//! 2. resolve the caller and write a debug line to the [`LogSink`]
//! 3. run the statement, retrying with a fixed pause between attempts
//! 4. shape the result according to the [`ReturnMode`]
//!
//! Only step 3 is retried. Reading the insert id in step 4 happens once, so
//! a statement that succeeded is never sent again.
//!
//! When every attempt fails, a single error line is written to the sink and
//! the last driver error is returned wrapped in a [`QueryError`] of kind
//! [`QueryErrorKind::Exhausted`].

use crate::caller::Caller;
use crate::config::EngineConfig;
use crate::log::{LogLevel, LogSink, TracingSink};
use crate::output::{QueryOutput, ReturnMode};
use crate::retry::{Backoff, FixedBackoff, retry};
use crudkit_core::{
    ConnectOptions, ConnectionError, ConnectionErrorKind, Connector, Driver, Error, FromRow,
    QueryError, QueryErrorKind, Result, Row, TransactionError, TransactionErrorKind, Value,
};
use crudkit_query::{
    OnDuplicate, Params, QuerySpec, Select, build_delete, build_insert, build_select,
    build_update,
};
use std::panic::Location;

/// Per-call overrides for [`QueryEngine::execute_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Attempts for this statement instead of the configured count
    pub attempts: Option<u32>,
    /// Do not write the debug line for this statement
    pub skip_log: bool,
    /// Attribute the statement to this tag instead of the call site
    pub caller: Option<String>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn skip_log(mut self) -> Self {
        self.skip_log = true;
        self
    }

    pub fn caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }
}

/// Open a session and force the configured character set.
#[allow(clippy::result_large_err)]
fn open<C: Connector>(connector: &C, options: &ConnectOptions) -> Result<C::Driver> {
    let dsn = options.dsn();
    tracing::debug!(target: "crudkit::engine", dsn = %dsn, user = %options.user, "Connecting");

    let wrap = |e: Error| {
        let kind = match &e {
            Error::Connection(c) => c.kind,
            _ => ConnectionErrorKind::Connect,
        };
        Error::Connection(ConnectionError {
            kind,
            message: format!("cannot connect to {}: {}", dsn, e),
            source: Some(Box::new(e)),
        })
    };

    let mut driver = connector.connect(options).map_err(wrap)?;
    driver.execute(&options.set_names_sql(), &[]).map_err(wrap)?;

    tracing::info!(target: "crudkit::engine", dsn = %dsn, charset = %options.charset, "Connected");
    Ok(driver)
}

/// What a statement produced, before it is shaped.
#[derive(Debug)]
enum Executed {
    Rows(Vec<Row>),
    Affected(u64),
}

/// Send a statement once.
#[allow(clippy::result_large_err)]
fn execute_once<D: Driver>(driver: &mut D, spec: &QuerySpec, mode: ReturnMode) -> Result<Executed> {
    if mode.returns_rows() {
        driver.query(spec.sql(), spec.values()).map(Executed::Rows)
    } else {
        driver.execute(spec.sql(), spec.values()).map(Executed::Affected)
    }
}

/// Shape the result of a statement that already succeeded.
#[allow(clippy::result_large_err)]
fn shape<D: Driver>(driver: &mut D, mode: ReturnMode, executed: Executed) -> Result<QueryOutput> {
    Ok(match (executed, mode) {
        (Executed::Rows(rows), mode) => QueryOutput::from_rows(mode, rows),
        (Executed::Affected(affected), ReturnMode::RowCount) => QueryOutput::RowCount(affected),
        (Executed::Affected(_), ReturnMode::LastInsertId) => {
            QueryOutput::LastInsertId(driver.last_insert_id()?)
        }
        (Executed::Affected(_), _) => QueryOutput::Success(true),
    })
}

/// Parameterized CRUD over a single database session.
///
/// # Example
///
/// ```rust,ignore
/// use crudkit::prelude::*;
///
/// let mut db = QueryEngine::init(connector, ConnectOptions::new("localhost", "shop", "app", "secret"), EngineConfig::default())?;
///
/// let id = db.store("users", &params! { "email" => "a@example.com" }, None)?;
/// let user = db.fetch_one("users", &params! { "email" => "a@example.com" })?;
/// db.update("users", &params! { "active" => true }, &params! { "id" => id })?;
/// ```
pub struct QueryEngine<C: Connector> {
    connector: C,
    options: ConnectOptions,
    config: EngineConfig,
    driver: Option<C::Driver>,
    sink: Box<dyn LogSink>,
    backoff: Box<dyn Backoff>,
    last_query: Option<String>,
    in_transaction: bool,
}

impl<C: Connector> std::fmt::Debug for QueryEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("options", &self.options)
            .field("config", &self.config)
            .field("connected", &self.driver.is_some())
            .field("in_transaction", &self.in_transaction)
            .field("last_query", &self.last_query)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> QueryEngine<C> {
    /// Connect and set the session character set.
    ///
    /// Any failure is reported as [`Error::Connection`].
    #[allow(clippy::result_large_err)]
    pub fn init(connector: C, options: ConnectOptions, config: EngineConfig) -> Result<Self> {
        let driver = open(&connector, &options)?;
        let backoff = FixedBackoff::new(config.delay());
        Ok(Self {
            connector,
            options,
            config,
            driver: Some(driver),
            sink: Box::new(TracingSink),
            backoff: Box::new(backoff),
            last_query: None,
            in_transaction: false,
        })
    }

    /// Replace the query log sink.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the pause policy between attempts.
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Box::new(backoff);
        self
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The most recently executed statement, with values interpolated.
    ///
    /// For diagnostics only; the text is not safe to execute.
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    // ==================== Execution ====================

    /// Run a statement with the configured retry budget.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn execute(&mut self, spec: &QuerySpec, mode: ReturnMode) -> Result<QueryOutput> {
        self.run(spec, mode, &ExecOptions::default(), Location::caller())
    }

    /// Run a statement with per-call overrides.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn execute_with(
        &mut self,
        spec: &QuerySpec,
        mode: ReturnMode,
        options: &ExecOptions,
    ) -> Result<QueryOutput> {
        self.run(spec, mode, options, Location::caller())
    }

    #[allow(clippy::result_large_err)]
    fn run(
        &mut self,
        spec: &QuerySpec,
        mode: ReturnMode,
        options: &ExecOptions,
        location: &'static Location<'static>,
    ) -> Result<QueryOutput> {
        if self.driver.is_none() {
            return Err(Error::NotInitialized);
        }

        let caller = options
            .caller
            .clone()
            .map_or_else(|| Caller::from_location(location), Caller::Tag);
        let rendered = spec.render();

        if self.config.log_queries
            && !options.skip_log
            && !caller.is_quiet(&self.config.quiet_callers)
        {
            self.sink.log(
                LogLevel::Debug,
                &format!("[{}][query: {}][{}]", caller, rendered, mode),
            );
        }

        let attempts = options.attempts.unwrap_or(self.config.retry_attempts);
        let session = &mut self.driver;
        let last_query = &mut self.last_query;
        let executed = retry(mode.as_str(), attempts, self.backoff.as_ref(), |_| {
            *last_query = Some(rendered.clone());
            let driver = session.as_mut().ok_or(Error::NotInitialized)?;
            execute_once(driver, spec, mode)
        });

        let outcome = match executed {
            Ok(executed) => match self.driver.as_mut() {
                Some(driver) => {
                    shape(driver, mode, executed).map_err(|e| (QueryErrorKind::Database, e))
                }
                None => Err((QueryErrorKind::Database, Error::NotInitialized)),
            },
            Err(e) => Err((QueryErrorKind::Exhausted, e)),
        };

        outcome.map_err(|(kind, e)| {
            let message = e.to_string();
            self.sink.log(
                LogLevel::Error,
                &format!("{}[{}][query: {}]", message, caller, rendered),
            );
            Error::Query(QueryError {
                kind,
                sql: Some(rendered),
                sqlstate: e.sqlstate().map(str::to_string),
                message,
                caller: Some(caller.to_string()),
                source: Some(Box::new(e)),
            })
        })
    }

    // ==================== Reads ====================

    /// All rows matching a [`Select`].
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch(&mut self, select: &Select) -> Result<Vec<Row>> {
        let spec = build_select(select);
        self.run(&spec, ReturnMode::AllRows, &ExecOptions::default(), Location::caller())?
            .into_rows()
    }

    /// The first row matching `criteria`, if any.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_one(&mut self, table: &str, criteria: &Params) -> Result<Option<Row>> {
        let spec = Select::from(table).filter(criteria.clone()).limit(1).build();
        self.run(&spec, ReturnMode::SingleRow, &ExecOptions::default(), Location::caller())?
            .into_row()
    }

    /// One column of every matching row.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_column(
        &mut self,
        table: &str,
        column: &str,
        criteria: &Params,
    ) -> Result<Vec<Value>> {
        let spec = Select::from(table)
            .filter(criteria.clone())
            .column(column)
            .build();
        self.run(&spec, ReturnMode::SingleColumn, &ExecOptions::default(), Location::caller())?
            .into_column()
    }

    /// One column of the first matching row.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_value(
        &mut self,
        table: &str,
        column: &str,
        criteria: &Params,
    ) -> Result<Option<Value>> {
        let spec = Select::from(table)
            .filter(criteria.clone())
            .column(column)
            .limit(1)
            .build();
        let column = self
            .run(&spec, ReturnMode::SingleColumn, &ExecOptions::default(), Location::caller())?
            .into_column()?;
        Ok(column.into_iter().next())
    }

    /// All rows of a hand-written query.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_query(&mut self, sql: &str, values: &[Value]) -> Result<Vec<Row>> {
        let spec = QuerySpec::raw(sql, values.to_vec());
        self.run(&spec, ReturnMode::AllRows, &ExecOptions::default(), Location::caller())?
            .into_rows()
    }

    /// The first row of a hand-written query.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_query_row(&mut self, sql: &str, values: &[Value]) -> Result<Option<Row>> {
        let spec = QuerySpec::raw(sql, values.to_vec());
        self.run(&spec, ReturnMode::SingleRow, &ExecOptions::default(), Location::caller())?
            .into_row()
    }

    /// [`fetch`](Self::fetch), with every row converted through [`FromRow`].
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_as<T: FromRow>(&mut self, select: &Select) -> Result<Vec<T>> {
        let spec = build_select(select);
        let rows = self
            .run(&spec, ReturnMode::AllRows, &ExecOptions::default(), Location::caller())?
            .into_rows()?;
        rows.iter().map(T::from_row).collect()
    }

    /// [`fetch_one`](Self::fetch_one), converted through [`FromRow`].
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_one_as<T: FromRow>(&mut self, table: &str, criteria: &Params) -> Result<Option<T>> {
        let spec = Select::from(table).filter(criteria.clone()).limit(1).build();
        let row = self
            .run(&spec, ReturnMode::SingleRow, &ExecOptions::default(), Location::caller())?
            .into_row()?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// [`fetch_query`](Self::fetch_query), with every row converted through
    /// [`FromRow`].
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn fetch_query_as<T: FromRow>(&mut self, sql: &str, values: &[Value]) -> Result<Vec<T>> {
        let spec = QuerySpec::raw(sql, values.to_vec());
        let rows = self
            .run(&spec, ReturnMode::AllRows, &ExecOptions::default(), Location::caller())?
            .into_rows()?;
        rows.iter().map(T::from_row).collect()
    }

    // ==================== Writes ====================

    /// Insert a row and return the generated id.
    ///
    /// Returns `Ok(None)` without touching the connection when `input` is
    /// empty.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn store(
        &mut self,
        table: &str,
        input: &Params,
        on_duplicate: Option<OnDuplicate>,
    ) -> Result<Option<u64>> {
        let spec = match build_insert(table, input, on_duplicate) {
            Ok(spec) => spec,
            Err(Error::EmptyInput { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let id = self
            .run(&spec, ReturnMode::LastInsertId, &ExecOptions::default(), Location::caller())?
            .into_last_insert_id()?;
        Ok(Some(id))
    }

    /// Update matching rows and return how many were affected.
    ///
    /// Empty `criteria` updates every row. Returns `Ok(None)` without
    /// touching the connection when `input` is empty.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn update(&mut self, table: &str, input: &Params, criteria: &Params) -> Result<Option<u64>> {
        let spec = match build_update(table, input, Some(criteria)) {
            Ok(spec) => spec,
            Err(Error::EmptyInput { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let affected = self
            .run(&spec, ReturnMode::RowCount, &ExecOptions::default(), Location::caller())?
            .into_row_count()?;
        Ok(Some(affected))
    }

    /// Delete matching rows and return how many were removed.
    ///
    /// Empty `criteria` deletes every row of the table.
    #[track_caller]
    #[allow(clippy::result_large_err)]
    pub fn delete(&mut self, table: &str, criteria: &Params) -> Result<u64> {
        let spec = build_delete(table, Some(criteria));
        self.run(&spec, ReturnMode::RowCount, &ExecOptions::default(), Location::caller())?
            .into_row_count()
    }

    /// Quote a value as an SQL literal using the session's rules.
    #[allow(clippy::result_large_err)]
    pub fn quote(&self, value: &Value) -> Result<String> {
        Ok(self.driver()?.quote(value))
    }

    /// The live driver session, for driver-specific work the engine does
    /// not cover. Statements run here bypass retries, logging and the last
    /// query.
    #[allow(clippy::result_large_err)]
    pub fn driver(&self) -> Result<&C::Driver> {
        self.driver.as_ref().ok_or(Error::NotInitialized)
    }

    /// Mutable access to the live driver session. See [`driver`](Self::driver).
    #[allow(clippy::result_large_err)]
    pub fn driver_mut(&mut self) -> Result<&mut C::Driver> {
        self.driver.as_mut().ok_or(Error::NotInitialized)
    }

    // ==================== Transactions ====================

    /// Start a transaction. Transactions do not nest.
    #[allow(clippy::result_large_err)]
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NestedNotSupported,
                message: "a transaction is already open on this connection".to_string(),
            }));
        }
        self.driver_mut()?.begin()?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the open transaction.
    #[allow(clippy::result_large_err)]
    pub fn commit(&mut self) -> Result<()> {
        self.require_transaction("commit")?;
        self.driver_mut()?.commit()?;
        self.in_transaction = false;
        Ok(())
    }

    /// Roll back the open transaction.
    ///
    /// The engine leaves transaction state even when the driver reports an
    /// error.
    #[allow(clippy::result_large_err)]
    pub fn rollback(&mut self) -> Result<()> {
        self.require_transaction("rollback")?;
        self.in_transaction = false;
        self.driver_mut()?.rollback()
    }

    #[allow(clippy::result_large_err)]
    fn require_transaction(&self, operation: &str) -> Result<()> {
        if self.in_transaction {
            Ok(())
        } else {
            Err(Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotStarted,
                message: format!("cannot {}: no transaction is open", operation),
            }))
        }
    }

    // ==================== Lifecycle ====================

    /// Check the session and reconnect if it is gone.
    ///
    /// Returns `true` when the session is usable, either because it
    /// answered or because reconnecting succeeded. A failed reconnect is
    /// returned as an error and leaves the engine without a session.
    #[allow(clippy::result_large_err)]
    pub fn ping(&mut self) -> Result<bool> {
        let Err(e) = self.driver_mut()?.ping() else {
            return Ok(true);
        };

        tracing::warn!(
            target: "crudkit::engine",
            dsn = %self.options.dsn(),
            error = %e,
            "Ping failed, reconnecting"
        );

        if let Some(mut stale) = self.driver.take() {
            if let Err(e) = stale.close() {
                tracing::warn!(
                    target: "crudkit::engine",
                    error = %e,
                    "Error while closing stale connection"
                );
            }
        }
        self.in_transaction = false;

        let driver = open(&self.connector, &self.options)?;
        self.driver = Some(driver);
        Ok(true)
    }

    /// Release the session. Later operations fail with
    /// [`Error::NotInitialized`]. Closing twice is a no-op.
    pub fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            if let Err(e) = driver.close() {
                tracing::warn!(target: "crudkit::engine", error = %e, "Error while closing connection");
            }
            tracing::debug!(target: "crudkit::engine", dsn = %self.options.dsn(), "Connection closed");
        }
        self.in_transaction = false;
    }
}
