//! crudkit: parameterized CRUD over a single MySQL connection.
//!
//! The engine turns a table name plus ordered column maps into bound SQL,
//! runs it through one driver session with a small fixed-delay retry loop,
//! and logs every statement with the call site that issued it.
//!
//! - [`QueryEngine`]: connection lifecycle, CRUD helpers, transactions
//! - [`ReturnMode`] / [`QueryOutput`]: how a statement's result is shaped
//! - [`EngineConfig`]: retry budget, delay, query logging, quiet callers
//! - [`LogSink`]: where statement lines go ([`TracingSink`] by default)
//!
//! The wire protocol is not part of this crate. Plug a driver in through the
//! [`Connector`] and [`Driver`] traits.
//!
//! ```rust,ignore
//! use crudkit::prelude::*;
//!
//! let config = EngineConfig::default().retry_attempts(3);
//! let mut db = QueryEngine::init(connector, ConnectOptions::new("db1", "shop", "app", "pw"), config)?;
//!
//! let id = db.store("orders", &params! { "sku" => "A-1", "qty" => 2 }, Some(OnDuplicate::Update))?;
//! let skus = db.fetch_column("orders", "sku", &params! { "qty" => 2 })?;
//! let removed = db.delete("orders", &params! { "id" => id })?;
//! ```

pub mod caller;
pub mod config;
pub mod engine;
pub mod log;
pub mod output;
pub mod retry;

pub use caller::Caller;
pub use config::EngineConfig;
pub use engine::{ExecOptions, QueryEngine};
pub use log::{LogLevel, LogSink, TracingSink};
pub use output::{QueryOutput, ReturnMode};
pub use retry::{Backoff, FixedBackoff};

pub use crudkit_core::{
    ConfigError, ConnectOptions, ConnectionError, ConnectionErrorKind, Connector, Driver, Error,
    FromRow, FromValue, QueryError, QueryErrorKind, Result, Row, TransactionError,
    TransactionErrorKind, TypeError, Value,
};
pub use crudkit_query::{
    OnDuplicate, Params, QuerySpec, Select, build_delete, build_insert, build_select,
    build_update, params, render_for_display,
};

/// Everything needed for everyday use.
///
/// ```ignore
/// use crudkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ConnectOptions, Connector, Driver, EngineConfig, Error, ExecOptions, FromRow, OnDuplicate,
        Params, QueryEngine, QueryOutput, QuerySpec, Result, ReturnMode, Row, Select, Value, params,
    };
}
