//! Core types and traits for crudkit.
//!
//! This crate provides the foundations the query builders and the engine
//! share:
//!
//! - `Value` and `Row` for bound parameters and fetched data
//! - `Error` and the crate-wide `Result` alias
//! - `Driver` and `Connector`, the seam to an actual database driver
//! - `ConnectOptions` for opening sessions
//! - identifier and literal quoting for MySQL SQL text

pub mod driver;
pub mod error;
pub mod options;
pub mod quoting;
pub mod row;
pub mod value;

pub use driver::{Connector, Driver};
pub use error::{
    BoxedSource, ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, Result, TransactionError, TransactionErrorKind, TypeError,
};
pub use options::ConnectOptions;
pub use quoting::{escape_string, quote_ident, quote_literal};
pub use row::{FromRow, FromValue, Row};
pub use value::Value;
