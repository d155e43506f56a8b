//! Test utilities: an in-memory driver that records how the scoped handles
//! use it.

pub mod mock;
pub mod test_helpers;

pub use mock::{
    ExecutedStatement, ExecutionKind, MockConnection, MockDriver, MockPreparedStatement,
    MockServer, MockStatement,
};
pub use test_helpers::{create_test_result_set, create_test_row, sample_parameters};
