use thiserror::Error;

#[derive(Debug, Error)]
pub enum MysqlScopedError {
    /// The native driver failed to open, authenticate or bind a connection.
    #[cfg(feature = "mysql")]
    #[error("MySQL connection error: {0}")]
    MysqlConnection(#[source] ::mysql::Error),

    /// The native driver failed to prepare or execute a statement.
    #[cfg(feature = "mysql")]
    #[error("MySQL statement error: {0}")]
    MysqlStatement(#[source] ::mysql::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Statement error: {0}")]
    StatementError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl MysqlScopedError {
    /// Connect, authenticate or select-schema failure.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            #[cfg(feature = "mysql")]
            Self::MysqlConnection(_) => true,
            Self::ConnectionError(_) => true,
            _ => false,
        }
    }

    /// Prepare, bind or execute failure.
    #[must_use]
    pub fn is_statement_error(&self) -> bool {
        match self {
            #[cfg(feature = "mysql")]
            Self::MysqlStatement(_) => true,
            Self::StatementError(_) | Self::ParameterError(_) => true,
            _ => false,
        }
    }
}
