//! Error types for crudkit operations.

use std::fmt;

/// Underlying cause carried by connection, query and config errors.
pub type BoxedSource = Option<Box<dyn std::error::Error + Send + Sync>>;

/// Everything that can go wrong between building a statement and reading
/// its result.
#[derive(Debug)]
pub enum Error {
    /// No session could be opened, or reopened after a failed ping
    Connection(ConnectionError),
    /// The engine was closed (or never connected)
    NotInitialized,
    /// INSERT/UPDATE with nothing to write
    EmptyInput {
        table: String,
    },
    /// The statement failed; after retries the kind is `Exhausted`
    Query(QueryError),
    /// A value or result did not have the requested shape
    Type(TypeError),
    Transaction(TransactionError),
    Config(ConfigError),
    Io(std::io::Error),
    Serde(String),
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: BoxedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Opening the session failed
    Connect,
    /// The server rejected the credentials
    Authentication,
    /// The session dropped mid-statement ("server has gone away")
    Disconnected,
    /// No driver was compiled in for this backend
    DriverUnavailable,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// Rendered (display-only) SQL of the failed statement
    pub sql: Option<String>,
    pub sqlstate: Option<String>,
    pub message: String,
    /// Caller the failed statement was attributed to
    pub caller: Option<String>,
    pub source: BoxedSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    Syntax,
    /// Duplicate key, foreign key and similar integrity failures
    Constraint,
    /// Unknown table or column
    NotFound,
    Deadlock,
    /// Lock wait or statement timeout
    Timeout,
    /// Every retry attempt failed; `source` holds the last driver error
    Exhausted,
    /// Anything the driver could not classify
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// A transaction is already open on this connection
    NestedNotSupported,
    /// Commit or rollback without an open transaction
    NotStarted,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: BoxedSource,
}

impl Error {
    /// Is this a connection error that likely requires reconnection?
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection(_) | Error::NotInitialized | Error::Io(_) => true,
            Error::Query(q) => q
                .source
                .as_deref()
                .and_then(|src| src.downcast_ref::<Error>())
                .is_some_and(Error::is_connection_error),
            _ => false,
        }
    }

    /// Is this the empty-input sentinel raised by the INSERT/UPDATE builders?
    pub const fn is_empty_input(&self) -> bool {
        matches!(self, Error::EmptyInput { .. })
    }

    /// Get SQLSTATE if available (e.g., "23000" for a duplicate key)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Get the rendered SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// Build a `Custom` error from anything printable.
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom(message.into())
    }
}

impl QueryError {
    /// Create a query error of the given kind with no extra context.
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            sql: None,
            sqlstate: None,
            message: message.into(),
            caller: None,
            source: None,
        }
    }

    /// Is this a duplicate-key violation? MySQL reports these as SQLSTATE 23000.
    pub fn is_duplicate_key(&self) -> bool {
        self.kind == QueryErrorKind::Constraint && self.sqlstate.as_deref() == Some("23000")
    }
}

impl ConnectionError {
    /// Create a connection error of the given kind with no source.
    pub fn new(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e),
            Error::NotInitialized => f.write_str("Database connection is not initialized"),
            Error::EmptyInput { table } => write!(f, "No fields to write for table '{}'", table),
            Error::Query(e) => write!(f, "Query error: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Transaction(e) => write!(f, "Transaction error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => f.write_str(msg),
        }
    }
}

fn as_source(source: &BoxedSource) -> Option<&(dyn std::error::Error + 'static)> {
    match source {
        Some(inner) => Some(inner.as_ref() as &(dyn std::error::Error + 'static)),
        None => None,
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => as_source(&e.source),
            Error::Query(e) => as_source(&e.source),
            Error::Config(e) => as_source(&e.source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sqlstate {
            Some(state) => write!(f, "[{}] {}", state, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}", self.expected)?;
        if let Some(column) = &self.column {
            write!(f, " for column '{}'", column)?;
        }
        write!(f, ", found {}", self.actual)
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

macro_rules! error_from {
    ($($payload:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$payload> for Error {
                fn from(err: $payload) -> Self {
                    Error::$variant(err)
                }
            }
        )+
    };
}

error_from! {
    std::io::Error => Io,
    ConnectionError => Connection,
    QueryError => Query,
    TypeError => Type,
    TransactionError => Transaction,
    ConfigError => Config,
}

/// Result alias used across crudkit.
pub type Result<T> = std::result::Result<T, Error>;
