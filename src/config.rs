//! Connection configuration for the dedicated sessions that hold locks.

use std::fmt;

/// TLS behavior for new sessions, following libpq's `sslmode` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub(crate) fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "prefer" => Self::Prefer,
            "require" => Self::Require,
            "verify-ca" => Self::VerifyCa,
            "verify-full" => Self::VerifyFull,
            _ => Self::Disable,
        }
    }

    fn from_env() -> Self {
        let value = std::env::var("PGSSLMODE").unwrap_or_else(|_| "disable".to_string());
        Self::parse(value.as_str())
    }
}

/// PostgreSQL connection settings.
#[derive(Clone)]
pub struct Config {
    host: String,
    port: String,
    user: String,
    dbname: String,
    password: Option<String>,
    ssl_mode: SslMode,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "5432".to_string(),
            user: "postgres".to_string(),
            dbname: "postgres".to_string(),
            password: None,
            ssl_mode: SslMode::Disable,
        }
    }

    /// Build a configuration from the conventional libpq environment
    /// variables: `PGHOST`, `PGPORT`, `PGUSER`, `PGDATABASE`, `PGPASSWORD`
    /// and `PGSSLMODE`.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string()),
            user: std::env::var("PGUSER").unwrap_or_else(|_| "postgres".to_string()),
            dbname: std::env::var("PGDATABASE").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PGPASSWORD").ok(),
            ssl_mode: SslMode::from_env(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port.to_string();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = dbname.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn ssl_mode(mut self, mode: SslMode) -> Self {
        self.ssl_mode = mode;
        self
    }

    pub(crate) fn connection_string(&self) -> String {
        let mut config = format!(
            "host={} port={} user={} dbname={}",
            self.host, self.port, self.user, self.dbname
        );
        if let Some(pwd) = &self.password {
            config.push_str(&format!(" password={pwd}"));
        }
        config
    }

    pub(crate) fn tls_mode(&self) -> SslMode {
        self.ssl_mode
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
