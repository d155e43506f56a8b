use std::sync::{Arc, Mutex, MutexGuard};

use ::mysql::Conn;
use ::mysql::prelude::Queryable;
use tracing::debug;

use super::statement::{MysqlPreparedStatement, MysqlStatement};
use crate::driver::{NativeConnection, StatementSource};
use crate::error::MysqlScopedError;

/// An open MySQL session.
///
/// Statements created from the connection share the session, so it closes
/// when the connection and every statement derived from it are gone.
#[derive(Debug)]
pub struct MysqlConnection {
    session: Arc<Mutex<Conn>>,
    connection_id: u32,
    close_statements: bool,
}

impl MysqlConnection {
    /// `close_statements` is set when the driver's statement cache is off and
    /// prepared statements have to be closed on the server when dropped.
    pub(crate) fn new(conn: Conn, close_statements: bool) -> Self {
        let connection_id = conn.connection_id();
        Self {
            session: Arc::new(Mutex::new(conn)),
            connection_id,
            close_statements,
        }
    }

    /// Server-side thread id of this session.
    #[must_use]
    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// Round-trip to the server.
    ///
    /// # Errors
    /// Returns `MysqlScopedError::MysqlConnection` if the server does not answer.
    pub fn ping(&self) -> Result<(), MysqlScopedError> {
        lock_session(&self.session)
            .query_drop("SELECT 1")
            .map_err(MysqlScopedError::MysqlConnection)
    }
}

impl Drop for MysqlConnection {
    fn drop(&mut self) {
        debug!(connection_id = self.connection_id, "releasing MySQL connection");
    }
}

impl StatementSource for MysqlConnection {
    type Statement = MysqlStatement;
    type PreparedStatement = MysqlPreparedStatement;

    fn create_statement(&self) -> Result<MysqlStatement, MysqlScopedError> {
        Ok(MysqlStatement::new(Arc::clone(&self.session)))
    }

    fn prepare_statement(&self, query: &str) -> Result<MysqlPreparedStatement, MysqlScopedError> {
        let statement = lock_session(&self.session)
            .prep(query)
            .map_err(MysqlScopedError::MysqlStatement)?;
        Ok(MysqlPreparedStatement::new(
            Arc::clone(&self.session),
            statement,
            query.to_string(),
            self.close_statements,
        ))
    }
}

impl NativeConnection for MysqlConnection {
    fn set_schema(&self, schema: &str) -> Result<(), MysqlScopedError> {
        lock_session(&self.session)
            .query_drop(use_schema_sql(schema))
            .map_err(MysqlScopedError::MysqlConnection)
    }

    fn schema(&self) -> Result<Option<String>, MysqlScopedError> {
        lock_session(&self.session)
            .query_first::<Option<String>, _>("SELECT DATABASE()")
            .map(Option::flatten)
            .map_err(MysqlScopedError::MysqlStatement)
    }
}

pub(crate) fn lock_session(session: &Mutex<Conn>) -> MutexGuard<'_, Conn> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// `USE` statement with the identifier quoted in backticks.
pub(crate) fn use_schema_sql(schema: &str) -> String {
    format!("USE `{}`", schema.replace('`', "``"))
}
