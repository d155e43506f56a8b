use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ::mysql::{Conn, OptsBuilder};
use tracing::debug;

use super::connection::MysqlConnection;
use crate::driver::Driver;
use crate::error::MysqlScopedError;

pub const DEFAULT_PORT: u16 = 3306;

/// Native MySQL driver handle.
///
/// Holds the options applied to every connection it opens.
#[derive(Debug, Default)]
pub struct MysqlDriver {
    connect_timeout: Option<Duration>,
    stmt_cache_size: Option<usize>,
    opened: AtomicU64,
}

impl MysqlDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TCP connect timeout for new connections; unset means the OS default.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Per-connection prepared statement cache size.
    #[must_use]
    pub fn with_stmt_cache_size(mut self, size: Option<usize>) -> Self {
        self.stmt_cache_size = size;
        self
    }

    /// Connections opened through this handle so far.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }

    /// Whether statements must be closed by hand because the driver cache is
    /// switched off.
    #[must_use]
    pub fn closes_statements_on_drop(&self) -> bool {
        statement_cache_disabled(self.stmt_cache_size)
    }

    fn build_opts(&self, host: &str, port: Option<u16>, user: &str, password: &str) -> OptsBuilder {
        OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .tcp_port(port.unwrap_or(DEFAULT_PORT))
            .user(Some(user))
            .pass(Some(password))
            .tcp_connect_timeout(self.connect_timeout)
            .stmt_cache_size(self.stmt_cache_size)
    }
}

impl Driver for MysqlDriver {
    type Connection = MysqlConnection;

    fn connect(
        &mut self,
        host: &str,
        port: Option<u16>,
        user: &str,
        password: &str,
    ) -> Result<MysqlConnection, MysqlScopedError> {
        let conn = Conn::new(self.build_opts(host, port, user, password))
            .map_err(MysqlScopedError::MysqlConnection)?;
        let total = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            connection_id = conn.connection_id(),
            total, "MySQL connection opened"
        );
        Ok(MysqlConnection::new(conn, self.closes_statements_on_drop()))
    }
}

/// `Some(0)` turns the `mysql` statement cache off; `None` keeps its default.
fn statement_cache_disabled(stmt_cache_size: Option<usize>) -> bool {
    stmt_cache_size == Some(0)
}
