// MySQL module - native driver bindings for the scoped handles
//
// - driver: the process-wide driver handle and connection options
// - connection: schema-bound sessions
// - statement: plain and prepared statements
// - params: middleware values to MySQL values
// - query: MySQL rows to result sets

pub mod connection;
pub mod driver;
pub mod params;
pub mod query;
pub mod statement;

pub use connection::MysqlConnection;
pub use driver::MysqlDriver;
pub use statement::{MysqlPreparedStatement, MysqlStatement};
