use std::sync::{Arc, Mutex};

use ::mysql::Conn;
use ::mysql::prelude::Queryable;
use tracing::{debug, warn};

use super::connection::lock_session;
use super::params::convert_params;
use super::query::{ColumnInfo, build_result_set};
use crate::driver::{NativePreparedStatement, NativeStatement, ParameterSlots};
use crate::error::MysqlScopedError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Plain statement sharing its connection's session.
#[derive(Debug)]
pub struct MysqlStatement {
    session: Arc<Mutex<Conn>>,
}

impl MysqlStatement {
    pub(crate) fn new(session: Arc<Mutex<Conn>>) -> Self {
        Self { session }
    }
}

impl NativeStatement for MysqlStatement {
    fn execute_query(&self, query: &str) -> Result<ResultSet, MysqlScopedError> {
        let mut conn = lock_session(&self.session);
        let mut result = conn
            .query_iter(query)
            .map_err(MysqlScopedError::MysqlStatement)?;
        let columns = ColumnInfo::from_columns(result.columns().as_ref());
        build_result_set(columns, result.by_ref())
    }

    fn execute(&self, query: &str) -> Result<usize, MysqlScopedError> {
        let mut conn = lock_session(&self.session);
        conn.query_drop(query)
            .map_err(MysqlScopedError::MysqlStatement)?;
        Ok(usize::try_from(conn.affected_rows()).unwrap_or(usize::MAX))
    }
}

/// Server-side prepared statement.
///
/// Parameters are bound by 1-based position and stay bound across executions
/// until overwritten or cleared. With the driver's statement cache disabled
/// the server-side statement is closed when the handle drops; otherwise the
/// cache owns it.
#[derive(Debug)]
pub struct MysqlPreparedStatement {
    session: Arc<Mutex<Conn>>,
    statement: ::mysql::Statement,
    sql: String,
    params: ParameterSlots,
    close_on_drop: bool,
}

impl MysqlPreparedStatement {
    pub(crate) fn new(
        session: Arc<Mutex<Conn>>,
        statement: ::mysql::Statement,
        sql: String,
        close_on_drop: bool,
    ) -> Self {
        let params = ParameterSlots::new(usize::from(statement.num_params()));
        Self {
            session,
            statement,
            sql,
            params,
            close_on_drop,
        }
    }

    /// Number of `?` placeholders the server reported.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// True when dropping this handle sends a close to the server.
    #[must_use]
    pub fn closes_on_drop(&self) -> bool {
        self.close_on_drop
    }
}

impl Drop for MysqlPreparedStatement {
    fn drop(&mut self) {
        if !self.close_on_drop {
            return;
        }
        match lock_session(&self.session).close(self.statement.clone()) {
            Ok(()) => debug!(sql = %self.sql, "prepared statement closed"),
            Err(err) => {
                warn!(sql = %self.sql, error = %err, "failed to close prepared statement");
            }
        }
    }
}

impl NativePreparedStatement for MysqlPreparedStatement {
    fn set_parameter(&mut self, index: usize, value: RowValues) -> Result<(), MysqlScopedError> {
        self.params.set(index, value)
    }

    fn clear_parameters(&mut self) {
        self.params.clear();
    }

    fn execute_query(&mut self) -> Result<ResultSet, MysqlScopedError> {
        let params = convert_params(&self.params.bound()?)?;
        let mut conn = lock_session(&self.session);
        let mut result = conn
            .exec_iter(&self.statement, params)
            .map_err(MysqlScopedError::MysqlStatement)?;
        let columns = ColumnInfo::from_columns(result.columns().as_ref());
        build_result_set(columns, result.by_ref())
    }

    fn execute(&mut self) -> Result<usize, MysqlScopedError> {
        let params = convert_params(&self.params.bound()?)?;
        let mut conn = lock_session(&self.session);
        conn.exec_drop(&self.statement, params)
            .map_err(MysqlScopedError::MysqlStatement)?;
        let affected = conn.affected_rows();
        debug!(sql = %self.sql, affected, "prepared statement executed");
        Ok(usize::try_from(affected).unwrap_or(usize::MAX))
    }

    fn sql(&self) -> &str {
        &self.sql
    }
}
