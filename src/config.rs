use serde::Deserialize;

use crate::error::MysqlScopedError;

pub const ENV_HOST: &str = "MYSQL_HOST";
pub const ENV_USER: &str = "MYSQL_USER";
pub const ENV_PASSWORD: &str = "MYSQL_PASSWORD";
pub const ENV_DATABASE: &str = "MYSQL_DATABASE";
pub const ENV_PORT: &str = "MYSQL_PORT";

/// Everything needed to open a connection and bind it to a schema.
///
/// The factory does not validate these values; empty strings are handed to
/// the driver as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParameters {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(alias = "database", alias = "db")]
    pub schema: String,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ConnectionParameters {
    #[must_use]
    pub fn new(host: String, user: String, password: String, schema: String) -> Self {
        Self {
            host,
            user,
            password,
            schema,
            port: None,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn builder(host: String, user: String, schema: String) -> ConnectionParametersBuilder {
        ConnectionParametersBuilder::new(host, user, schema)
    }

    /// Read `MYSQL_HOST`, `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`
    /// and the optional `MYSQL_PORT` from the process environment.
    ///
    /// # Errors
    /// Returns `MysqlScopedError::ConfigError` if a required key is missing or
    /// the port does not parse.
    pub fn from_env() -> Result<Self, MysqlScopedError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build parameters from any key-lookup provider.
    ///
    /// A missing password is treated as empty.
    ///
    /// # Errors
    /// Returns `MysqlScopedError::ConfigError` if host, user or database is
    /// missing, or if the port is present but not a valid `u16`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MysqlScopedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                MysqlScopedError::ConfigError(format!("missing configuration key {key}"))
            })
        };

        let host = required(ENV_HOST)?;
        let user = required(ENV_USER)?;
        let schema = required(ENV_DATABASE)?;
        let password = lookup(ENV_PASSWORD).unwrap_or_default();
        let port = match lookup(ENV_PORT) {
            Some(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u16>().map_err(|e| {
                MysqlScopedError::ConfigError(format!("invalid {ENV_PORT} value {raw:?}: {e}"))
            })?),
            _ => None,
        };

        Ok(Self {
            host,
            user,
            password,
            schema,
            port,
        })
    }

    /// Parse parameters from a JSON document.
    ///
    /// # Errors
    /// Returns `MysqlScopedError::ConfigError` if the document is not valid.
    pub fn from_json(json: &str) -> Result<Self, MysqlScopedError> {
        serde_json::from_str(json)
            .map_err(|e| MysqlScopedError::ConfigError(format!("invalid connection JSON: {e}")))
    }
}

/// Fluent builder for connection parameters.
#[derive(Debug, Clone)]
pub struct ConnectionParametersBuilder {
    params: ConnectionParameters,
}

impl ConnectionParametersBuilder {
    #[must_use]
    pub fn new(host: String, user: String, schema: String) -> Self {
        Self {
            params: ConnectionParameters::new(host, user, String::new(), schema),
        }
    }

    #[must_use]
    pub fn password(mut self, password: String) -> Self {
        self.params.password = password;
        self
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.params.port = port;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionParameters {
        self.params
    }
}
