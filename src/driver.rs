//! Seams between the scoped handles and a native client library.
//!
//! A [`Driver`] is the process-wide handle that opens connections. Opening is
//! not reentrant, which is why it takes `&mut self`; the factory keeps the
//! driver behind a mutex. Everything a connection produces (statements,
//! prepared statements, result sets) is an ordinary owned value that releases
//! its native resource when dropped.

use std::sync::Arc;

use crate::error::MysqlScopedError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Process-wide native driver handle.
pub trait Driver: Send + 'static {
    type Connection: NativeConnection;

    /// Open a new, not yet schema-bound, connection.
    ///
    /// # Errors
    /// Returns the driver's connection error if the server cannot be reached
    /// or rejects the credentials.
    fn connect(
        &mut self,
        host: &str,
        port: Option<u16>,
        user: &str,
        password: &str,
    ) -> Result<Self::Connection, MysqlScopedError>;
}

/// Capability to produce statements.
///
/// Implemented for native connections and forwarded through every owning or
/// borrowing wrapper, so the scoped helpers accept plain connections,
/// exclusive handles, shared handles and references alike.
pub trait StatementSource {
    type Statement: NativeStatement;
    type PreparedStatement: NativePreparedStatement;

    /// # Errors
    /// Returns the driver's statement error.
    fn create_statement(&self) -> Result<Self::Statement, MysqlScopedError>;

    /// # Errors
    /// Returns the driver's statement error if the server rejects the query.
    fn prepare_statement(&self, query: &str) -> Result<Self::PreparedStatement, MysqlScopedError>;
}

/// An open native session.
pub trait NativeConnection: StatementSource {
    /// Bind the session to `schema`.
    ///
    /// # Errors
    /// Returns the driver's connection error if the schema cannot be selected.
    fn set_schema(&self, schema: &str) -> Result<(), MysqlScopedError>;

    /// Schema currently selected on the server side, if any.
    ///
    /// # Errors
    /// Returns the driver's statement error if the lookup query fails.
    fn schema(&self) -> Result<Option<String>, MysqlScopedError>;
}

/// Plain (unprepared) statement.
pub trait NativeStatement {
    /// # Errors
    /// Returns the driver's statement error.
    fn execute_query(&self, query: &str) -> Result<ResultSet, MysqlScopedError>;

    /// Run a statement that returns no rows, yielding the affected-row count.
    ///
    /// # Errors
    /// Returns the driver's statement error.
    fn execute(&self, query: &str) -> Result<usize, MysqlScopedError>;
}

/// Server-side prepared statement with 1-based positional parameters.
pub trait NativePreparedStatement {
    /// # Errors
    /// Returns `MysqlScopedError::ParameterError` if `index` is outside the
    /// statement's placeholders.
    fn set_parameter(&mut self, index: usize, value: RowValues) -> Result<(), MysqlScopedError>;

    /// Forget all bound parameters.
    fn clear_parameters(&mut self);

    /// # Errors
    /// Returns `MysqlScopedError::ParameterError` if a placeholder is unbound,
    /// or the driver's statement error.
    fn execute_query(&mut self) -> Result<ResultSet, MysqlScopedError>;

    /// # Errors
    /// Returns `MysqlScopedError::ParameterError` if a placeholder is unbound,
    /// or the driver's statement error.
    fn execute(&mut self) -> Result<usize, MysqlScopedError>;

    fn sql(&self) -> &str;
}

macro_rules! forward_statement_source {
    ($($wrapper:ty),*) => {
        $(
            impl<T: StatementSource + ?Sized> StatementSource for $wrapper {
                type Statement = T::Statement;
                type PreparedStatement = T::PreparedStatement;

                fn create_statement(&self) -> Result<Self::Statement, MysqlScopedError> {
                    (**self).create_statement()
                }

                fn prepare_statement(
                    &self,
                    query: &str,
                ) -> Result<Self::PreparedStatement, MysqlScopedError> {
                    (**self).prepare_statement(query)
                }
            }
        )*
    };
}

forward_statement_source!(&T, &mut T, Box<T>, Arc<T>, std::rc::Rc<T>);

impl<T: NativeStatement + ?Sized> NativeStatement for Box<T> {
    fn execute_query(&self, query: &str) -> Result<ResultSet, MysqlScopedError> {
        (**self).execute_query(query)
    }

    fn execute(&self, query: &str) -> Result<usize, MysqlScopedError> {
        (**self).execute(query)
    }
}

impl<T: NativePreparedStatement + ?Sized> NativePreparedStatement for Box<T> {
    fn set_parameter(&mut self, index: usize, value: RowValues) -> Result<(), MysqlScopedError> {
        (**self).set_parameter(index, value)
    }

    fn clear_parameters(&mut self) {
        (**self).clear_parameters();
    }

    fn execute_query(&mut self) -> Result<ResultSet, MysqlScopedError> {
        (**self).execute_query()
    }

    fn execute(&mut self) -> Result<usize, MysqlScopedError> {
        (**self).execute()
    }

    fn sql(&self) -> &str {
        (**self).sql()
    }
}

/// Bound parameter slots shared by prepared-statement implementations.
#[derive(Debug, Clone, Default)]
pub struct ParameterSlots {
    slots: Vec<Option<RowValues>>,
}

impl ParameterSlots {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// # Errors
    /// Returns `MysqlScopedError::ParameterError` for index 0 or an index past
    /// the last placeholder.
    pub fn set(&mut self, index: usize, value: RowValues) -> Result<(), MysqlScopedError> {
        let count = self.slots.len();
        let slot = index
            .checked_sub(1)
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| {
                MysqlScopedError::ParameterError(format!(
                    "parameter index {index} out of range 1..={count}"
                ))
            })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// All values in placeholder order.
    ///
    /// # Errors
    /// Returns `MysqlScopedError::ParameterError` naming the first unbound index.
    pub fn bound(&self) -> Result<Vec<RowValues>, MysqlScopedError> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.clone().ok_or_else(|| {
                    MysqlScopedError::ParameterError(format!(
                        "parameter {} is not bound",
                        idx + 1
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_one_based() {
        let mut slots = ParameterSlots::new(2);
        assert!(slots.set(0, RowValues::Int(1)).is_err());
        assert!(slots.set(3, RowValues::Int(1)).is_err());
        slots.set(2, RowValues::Text("b".into())).unwrap();
        slots.set(1, RowValues::Int(1)).unwrap();
        assert_eq!(
            slots.bound().unwrap(),
            vec![RowValues::Int(1), RowValues::Text("b".into())]
        );
    }

    #[test]
    fn unbound_slot_is_reported() {
        let mut slots = ParameterSlots::new(2);
        slots.set(1, RowValues::Int(1)).unwrap();
        let err = slots.bound().unwrap_err();
        assert!(matches!(err, MysqlScopedError::ParameterError(msg) if msg.contains('2')));

        slots.set(2, RowValues::Null).unwrap();
        assert!(slots.bound().is_ok());
        slots.clear();
        assert!(slots.bound().is_err());
    }

    #[test]
    fn no_placeholders_binds_nothing() {
        let slots = ParameterSlots::new(0);
        assert!(slots.is_empty());
        assert!(slots.bound().unwrap().is_empty());
    }
}
