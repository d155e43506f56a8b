//! Ownership handles and the helpers that allocate them.
//!
//! The handles add no behavior: dropping one releases the native resource it
//! owns. The helpers only forward to the native calls and wrap the result.

use std::sync::Arc;

use tracing::debug;

use crate::driver::{NativePreparedStatement, NativeStatement, StatementSource};
use crate::error::MysqlScopedError;
use crate::results::ResultSet;

/// Single owner; released when the owner goes out of scope.
pub type ExclusiveHandle<T> = Box<T>;

/// Reference-counted owners; released when the last clone is dropped.
///
/// The pointee is not synchronized for concurrent statement execution; callers
/// sharing a connection across threads must serialize access themselves.
pub type SharedHandle<T> = Arc<T>;

/// Create a plain statement on any connection owner.
///
/// # Errors
/// Propagates the driver's statement error.
pub fn make_statement<S>(conn: &S) -> Result<ExclusiveHandle<S::Statement>, MysqlScopedError>
where
    S: StatementSource + ?Sized,
{
    conn.create_statement().map(Box::new)
}

/// Prepare `query` on any connection owner.
///
/// # Errors
/// Propagates the driver's statement error.
pub fn make_prepared_statement<S>(
    conn: &S,
    query: &str,
) -> Result<ExclusiveHandle<S::PreparedStatement>, MysqlScopedError>
where
    S: StatementSource + ?Sized,
{
    debug!(query, "preparing statement");
    conn.prepare_statement(query).map(Box::new)
}

/// Run `query` through a plain statement.
///
/// # Errors
/// Propagates the driver's statement error.
pub fn execute_query<T>(
    statement: &T,
    query: &str,
) -> Result<ExclusiveHandle<ResultSet>, MysqlScopedError>
where
    T: NativeStatement + ?Sized,
{
    debug!(query, "executing query");
    statement.execute_query(query).map(Box::new)
}

/// Run a prepared statement with its currently bound parameters.
///
/// # Errors
/// Returns `MysqlScopedError::ParameterError` for unbound placeholders or
/// propagates the driver's statement error.
pub fn execute_prepared_query<T>(
    statement: &mut T,
) -> Result<ExclusiveHandle<ResultSet>, MysqlScopedError>
where
    T: NativePreparedStatement + ?Sized,
{
    debug!(query = statement.sql(), "executing prepared query");
    statement.execute_query().map(Box::new)
}
