use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::driver::{
    Driver, NativeConnection, NativePreparedStatement, NativeStatement, ParameterSlots,
    StatementSource,
};
use crate::error::MysqlScopedError;
use crate::factory::ConnectionFactory;
use crate::results::ResultSet;
use crate::types::RowValues;

/// How a recorded statement was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Query,
    Execute,
}

/// One statement execution seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
    pub kind: ExecutionKind,
    pub prepared: bool,
}

#[derive(Debug, Default)]
struct Script {
    fail_connect: Option<String>,
    fail_schema: Option<String>,
    fail_statements: Option<String>,
    connect_delay: Option<Duration>,
    query_results: HashMap<String, ResultSet>,
    affected_rows: Option<usize>,
}

/// Callback run at schema selection; its answer is recorded per connection.
struct SchemaObserver(Box<dyn Fn() -> bool + Send + Sync>);

impl std::fmt::Debug for SchemaObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SchemaObserver")
    }
}

#[derive(Debug, Default)]
struct MockState {
    driver_inits: AtomicUsize,
    connect_calls: AtomicUsize,
    in_driver: AtomicUsize,
    max_in_driver: AtomicUsize,
    connections_opened: AtomicUsize,
    connections_closed: AtomicUsize,
    prepared: Mutex<Vec<String>>,
    executed: Mutex<Vec<ExecutedStatement>>,
    script: Mutex<Script>,
    schema_observer: Mutex<Option<SchemaObserver>>,
    schema_observations: Mutex<Vec<bool>>,
}

/// Server-side session shared by a connection and every statement made from
/// it; the close is counted when the last of them is dropped.
#[derive(Debug)]
struct MockSession {
    state: Arc<MockState>,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.state.connections_closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Scriptable stand-in for a MySQL server and its driver.
///
/// Clones share state, so a test keeps one `MockServer` for assertions while
/// the factory owns the driver built from it.
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    state: Arc<MockState>,
}

impl MockServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that builds its driver from this server on first connect.
    #[must_use]
    pub fn factory(&self) -> ConnectionFactory<MockDriver> {
        let server = self.clone();
        ConnectionFactory::new(move || {
            server.state.driver_inits.fetch_add(1, Ordering::SeqCst);
            Ok(server.driver())
        })
    }

    #[must_use]
    pub fn driver(&self) -> MockDriver {
        MockDriver {
            state: Arc::clone(&self.state),
        }
    }

    /// Make every connect attempt fail with `message`.
    pub fn fail_connect(&self, message: &str) {
        lock(&self.state.script).fail_connect = Some(message.to_string());
    }

    /// Make every schema selection fail with `message`.
    pub fn fail_schema(&self, message: &str) {
        lock(&self.state.script).fail_schema = Some(message.to_string());
    }

    /// Make statement preparation and execution fail with `message`.
    pub fn fail_statements(&self, message: &str) {
        lock(&self.state.script).fail_statements = Some(message.to_string());
    }

    /// Time spent inside the driver per connect, to widen race windows.
    pub fn set_connect_delay(&self, delay: Duration) {
        lock(&self.state.script).connect_delay = Some(delay);
    }

    /// Rows returned for `sql`; unknown queries return an empty result.
    pub fn set_query_result(&self, sql: &str, result: ResultSet) {
        lock(&self.state.script)
            .query_results
            .insert(sql.to_string(), result);
    }

    /// Affected-row count reported by executions (default 1).
    pub fn set_affected_rows(&self, rows: usize) {
        lock(&self.state.script).affected_rows = Some(rows);
    }

    /// Run `observer` whenever a connection selects its schema and keep its
    /// answer, e.g. whether the factory lock was still held at that point.
    pub fn observe_schema_selection<F>(&self, observer: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        *lock(&self.state.schema_observer) = Some(SchemaObserver(Box::new(observer)));
    }

    /// Answers of the schema-selection observer, in call order.
    #[must_use]
    pub fn schema_observations(&self) -> Vec<bool> {
        lock(&self.state.schema_observations).clone()
    }

    #[must_use]
    pub fn driver_inits(&self) -> usize {
        self.state.driver_inits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn connect_calls(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }

    /// Highest number of threads seen inside the driver at once.
    #[must_use]
    pub fn max_concurrent_driver_entries(&self) -> usize {
        self.state.max_in_driver.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.state.connections_opened.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn connections_closed(&self) -> usize {
        self.state.connections_closed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn prepared_queries(&self) -> Vec<String> {
        lock(&self.state.prepared).clone()
    }

    #[must_use]
    pub fn executions(&self) -> Vec<ExecutedStatement> {
        lock(&self.state.executed).clone()
    }
}

struct DriverEntry<'a> {
    state: &'a MockState,
}

impl<'a> DriverEntry<'a> {
    fn enter(state: &'a MockState) -> Self {
        let now = state.in_driver.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_driver.fetch_max(now, Ordering::SeqCst);
        Self { state }
    }
}

impl Drop for DriverEntry<'_> {
    fn drop(&mut self) {
        self.state.in_driver.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Driver half of [`MockServer`].
#[derive(Debug)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(
        &mut self,
        host: &str,
        port: Option<u16>,
        user: &str,
        _password: &str,
    ) -> Result<MockConnection, MysqlScopedError> {
        let _entry = DriverEntry::enter(&self.state);
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);

        let (delay, failure) = {
            let script = lock(&self.state.script);
            (script.connect_delay, script.fail_connect.clone())
        };
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        if let Some(message) = failure {
            return Err(MysqlScopedError::ConnectionError(message));
        }

        let id = self.state.connections_opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MockConnection {
            session: Arc::new(MockSession {
                state: Arc::clone(&self.state),
            }),
            id,
            host: host.to_string(),
            port,
            user: user.to_string(),
            schema: Mutex::new(None),
        })
    }
}

/// Connection half of [`MockServer`].
///
/// The session is counted as closed once the connection and every statement
/// created from it are dropped.
#[derive(Debug)]
pub struct MockConnection {
    session: Arc<MockSession>,
    id: usize,
    host: String,
    port: Option<u16>,
    user: String,
    schema: Mutex<Option<String>>,
}

impl MockConnection {
    /// Sequence number of this connection, starting at 1.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    fn statement_failure(&self) -> Result<(), MysqlScopedError> {
        statement_failure(&self.session.state)
    }
}

impl StatementSource for MockConnection {
    type Statement = MockStatement;
    type PreparedStatement = MockPreparedStatement;

    fn create_statement(&self) -> Result<MockStatement, MysqlScopedError> {
        self.statement_failure()?;
        Ok(MockStatement {
            session: Arc::clone(&self.session),
        })
    }

    fn prepare_statement(&self, query: &str) -> Result<MockPreparedStatement, MysqlScopedError> {
        self.statement_failure()?;
        lock(&self.session.state.prepared).push(query.to_string());
        Ok(MockPreparedStatement {
            session: Arc::clone(&self.session),
            sql: query.to_string(),
            params: ParameterSlots::new(count_placeholders(query)),
        })
    }
}

impl NativeConnection for MockConnection {
    fn set_schema(&self, schema: &str) -> Result<(), MysqlScopedError> {
        let state = &self.session.state;
        if let Some(observer) = lock(&state.schema_observer).as_ref() {
            let observed = (observer.0)();
            lock(&state.schema_observations).push(observed);
        }
        if let Some(message) = lock(&state.script).fail_schema.clone() {
            return Err(MysqlScopedError::ConnectionError(message));
        }
        *lock(&self.schema) = Some(schema.to_string());
        Ok(())
    }

    fn schema(&self) -> Result<Option<String>, MysqlScopedError> {
        Ok(lock(&self.schema).clone())
    }
}

/// Plain statement half of [`MockServer`].
#[derive(Debug)]
pub struct MockStatement {
    session: Arc<MockSession>,
}

impl NativeStatement for MockStatement {
    fn execute_query(&self, query: &str) -> Result<ResultSet, MysqlScopedError> {
        run_query(&self.session.state, query, Vec::new(), false)
    }

    fn execute(&self, query: &str) -> Result<usize, MysqlScopedError> {
        run_execute(&self.session.state, query, Vec::new(), false)
    }
}

/// Prepared statement half of [`MockServer`].
#[derive(Debug)]
pub struct MockPreparedStatement {
    session: Arc<MockSession>,
    sql: String,
    params: ParameterSlots,
}

impl NativePreparedStatement for MockPreparedStatement {
    fn set_parameter(&mut self, index: usize, value: RowValues) -> Result<(), MysqlScopedError> {
        self.params.set(index, value)
    }

    fn clear_parameters(&mut self) {
        self.params.clear();
    }

    fn execute_query(&mut self) -> Result<ResultSet, MysqlScopedError> {
        let params = self.params.bound()?;
        run_query(&self.session.state, &self.sql, params, true)
    }

    fn execute(&mut self) -> Result<usize, MysqlScopedError> {
        let params = self.params.bound()?;
        run_execute(&self.session.state, &self.sql, params, true)
    }

    fn sql(&self) -> &str {
        &self.sql
    }
}

fn statement_failure(state: &MockState) -> Result<(), MysqlScopedError> {
    match lock(&state.script).fail_statements.clone() {
        Some(message) => Err(MysqlScopedError::StatementError(message)),
        None => Ok(()),
    }
}

fn record(
    state: &MockState,
    sql: &str,
    params: Vec<RowValues>,
    kind: ExecutionKind,
    prepared: bool,
) {
    lock(&state.executed).push(ExecutedStatement {
        sql: sql.to_string(),
        params,
        kind,
        prepared,
    });
}

fn run_query(
    state: &MockState,
    sql: &str,
    params: Vec<RowValues>,
    prepared: bool,
) -> Result<ResultSet, MysqlScopedError> {
    statement_failure(state)?;
    record(state, sql, params, ExecutionKind::Query, prepared);
    Ok(lock(&state.script)
        .query_results
        .get(sql)
        .cloned()
        .unwrap_or_default())
}

fn run_execute(
    state: &MockState,
    sql: &str,
    params: Vec<RowValues>,
    prepared: bool,
) -> Result<usize, MysqlScopedError> {
    statement_failure(state)?;
    record(state, sql, params, ExecutionKind::Execute, prepared);
    Ok(lock(&state.script).affected_rows.unwrap_or(1))
}

/// Count `?` placeholders outside quoted strings and identifiers.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '?') => count += 1,
            (None, _) => {}
        }
    }
    count
}
