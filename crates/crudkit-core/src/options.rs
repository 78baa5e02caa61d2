//! Connection parameters.
//!
//! Holds everything needed to open (and later re-open) a session: the
//! DSN parts, credentials, the session character set, and a free-form map
//! of driver-specific options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Connection parameters handed to a [`Connector`](crate::Connector).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Hostname or IP address
    pub host: String,
    /// Port number; `None` lets the driver use its default (3306)
    pub port: Option<u16>,
    /// Database name
    pub database: String,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: Option<String>,
    /// Session character set forced with `SET NAMES` after connecting
    pub charset: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Additional driver-specific options
    pub driver_options: BTreeMap<String, String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            user: String::new(),
            password: None,
            charset: "utf8mb4".to_string(),
            connect_timeout_ms: 30_000,
            driver_options: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charset", &self.charset)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("driver_options", &self.driver_options)
            .finish()
    }
}

impl ConnectOptions {
    /// Create options for the given host, database, user and password.
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Set the hostname.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the session character set.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set the connection timeout. Sub-millisecond parts round up.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.connect_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set a driver-specific option.
    pub fn driver_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.driver_options.insert(key.into(), value.into());
        self
    }

    /// Get the connection timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// The data source name, e.g. `mysql:host=db1;port=3307;dbname=shop`.
    pub fn dsn(&self) -> String {
        match self.port {
            Some(port) => format!(
                "mysql:host={};port={};dbname={}",
                self.host, port, self.database
            ),
            None => format!("mysql:host={};dbname={}", self.host, self.database),
        }
    }

    /// The statement that forces the session character set.
    ///
    /// Only ASCII alphanumerics and `_` survive, since charset names are
    /// spliced into the SQL text.
    pub fn set_names_sql(&self) -> String {
        let charset: String = self
            .charset
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        format!("SET NAMES '{}'", charset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsn() {
        let opts = ConnectOptions::new("db1", "shop", "app", "secret");
        assert_eq!(opts.dsn(), "mysql:host=db1;dbname=shop");
        assert_eq!(opts.port(3307).dsn(), "mysql:host=db1;port=3307;dbname=shop");
    }

    #[test]
    fn test_debug_hides_password() {
        let opts = ConnectOptions::new("db1", "shop", "app", "hunter2");
        let printed = format!("{opts:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_set_names_strips_junk() {
        let opts = ConnectOptions::default().charset("utf8'; DROP TABLE x; --");
        assert_eq!(opts.set_names_sql(), "SET NAMES 'utf8DROPTABLEx'");
        assert_eq!(
            ConnectOptions::default().set_names_sql(),
            "SET NAMES 'utf8mb4'"
        );
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let opts = ConnectOptions::default().connect_timeout(Duration::from_millis(500));
        assert_eq!(opts.timeout(), Duration::from_millis(500));
        let opts = ConnectOptions::default().connect_timeout(Duration::from_micros(1));
        assert_eq!(opts.timeout(), Duration::from_millis(1));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let opts: ConnectOptions =
            serde_json::from_str(r#"{"host": "db", "database": "app", "user": "u"}"#).unwrap();
        assert_eq!(opts.host, "db");
        assert_eq!(opts.charset, "utf8mb4");
        assert_eq!(opts.timeout(), Duration::from_secs(30));
        assert!(opts.password.is_none());
    }
}
