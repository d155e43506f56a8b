//! Scoped (RAII) handles over a synchronous MySQL driver.
//!
//! A [`ConnectionFactory`] owns the process-wide driver handle and opens
//! connections that are already bound to their schema. Connections come back
//! either exclusively owned ([`ExclusiveHandle`]) or reference counted
//! ([`SharedHandle`]); statements, prepared statements and result sets are
//! derived with the helpers in [`scoped`] and released when they go out of
//! scope.
//!
//! ```rust,no_run
//! # #[cfg(feature = "mysql")]
//! # fn main() -> Result<(), mysql_scoped::MysqlScopedError> {
//! use mysql_scoped::prelude::*;
//!
//! let factory = ConnectionFactory::mysql();
//! let params = ConnectionParameters::from_env()?;
//! let conn = factory.connect_exclusive(&params)?;
//!
//! let mut select = make_prepared_statement(&conn, "SELECT * FROM test WHERE id = ?")?;
//! select.set_parameter(1, RowValues::Int(1))?;
//! let mut rows = execute_prepared_query(&mut select)?;
//! while rows.next() {
//!     println!("{:?}", rows.get("id"));
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mysql"))]
//! # fn main() {}
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod factory;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod prelude;
pub mod results;
pub mod scoped;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::{ConnectionParameters, ConnectionParametersBuilder};
pub use driver::{
    Driver, NativeConnection, NativePreparedStatement, NativeStatement, StatementSource,
};
pub use error::MysqlScopedError;
pub use factory::ConnectionFactory;
pub use results::{CustomDbRow, ResultSet};
pub use scoped::{
    ExclusiveHandle, SharedHandle, execute_prepared_query, execute_query, make_prepared_statement,
    make_statement,
};
pub use types::RowValues;
