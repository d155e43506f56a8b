//! Convenient imports for common functionality.

pub use crate::config::ConnectionParameters;
pub use crate::driver::{
    Driver, NativeConnection, NativePreparedStatement, NativeStatement, StatementSource,
};
pub use crate::error::MysqlScopedError;
pub use crate::factory::ConnectionFactory;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::scoped::{
    ExclusiveHandle, SharedHandle, execute_prepared_query, execute_query, make_prepared_statement,
    make_statement,
};
pub use crate::types::RowValues;

#[cfg(feature = "mysql")]
pub use crate::mysql::{MysqlConnection, MysqlDriver, MysqlPreparedStatement, MysqlStatement};
