#![cfg(feature = "test-utils")]

use std::rc::Rc;

use mysql_scoped::prelude::*;
use mysql_scoped::test_utils::{
    ExecutionKind, MockServer, create_test_result_set, sample_parameters,
};

const SELECT_BY_ID: &str = "SELECT * FROM test WHERE id = ?";
const INSERT_NAME: &str = "INSERT INTO test (name, created_at, updated_at) VALUES (?, NOW(), NOW());";

#[test]
fn prepared_select_with_no_rows_iterates_nothing() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    server.set_query_result(
        SELECT_BY_ID,
        create_test_result_set(&["id", "name", "created_at", "updated_at"], vec![]),
    );
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let mut select = make_prepared_statement(&conn, SELECT_BY_ID)?;
    select.set_parameter(1, RowValues::Int(1))?;
    let mut rows = execute_prepared_query(&mut select)?;

    assert!(!rows.next());
    assert_eq!(rows.rows_count(), 0);
    assert_eq!(rows.column_count(), 4);
    assert_eq!(rows.column_label(1), Some("id"));

    let executions = server.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].sql, SELECT_BY_ID);
    assert_eq!(executions[0].params, vec![RowValues::Int(1)]);
    assert_eq!(executions[0].kind, ExecutionKind::Query);
    assert!(executions[0].prepared);
    Ok(())
}

#[test]
fn prepared_select_returns_scripted_rows() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    server.set_query_result(
        SELECT_BY_ID,
        create_test_result_set(
            &["id", "name"],
            vec![vec![RowValues::Int(1), RowValues::Text("some name".into())]],
        ),
    );
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let mut select = make_prepared_statement(&conn, SELECT_BY_ID)?;
    select.set_parameter(1, RowValues::Int(1))?;
    let mut rows = execute_prepared_query(&mut select)?;

    assert!(rows.next());
    assert_eq!(rows.get("id").and_then(RowValues::as_int), Some(&1));
    assert_eq!(rows.get_string("name").as_deref(), Some("some name"));
    assert!(!rows.next());
    Ok(())
}

#[test]
fn prepared_insert_executes_once() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let mut insert = make_prepared_statement(&conn, INSERT_NAME)?;
    insert.set_parameter(1, RowValues::Text("some name".into()))?;
    let affected = insert.execute()?;

    assert_eq!(affected, 1);
    let executions = server.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].kind, ExecutionKind::Execute);
    assert_eq!(executions[0].params, vec![RowValues::Text("some name".into())]);
    Ok(())
}

#[test]
fn unbound_parameter_is_rejected_before_execution() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let mut select = make_prepared_statement(&conn, SELECT_BY_ID)?;
    let err = execute_prepared_query(&mut select).expect_err("parameter 1 is unbound");
    assert!(matches!(err, MysqlScopedError::ParameterError(_)));
    assert!(err.is_statement_error());

    let err = select
        .set_parameter(2, RowValues::Int(1))
        .expect_err("only one placeholder");
    assert!(matches!(err, MysqlScopedError::ParameterError(_)));

    select.set_parameter(1, RowValues::Int(5))?;
    select.clear_parameters();
    assert!(select.execute().is_err());

    assert!(server.executions().is_empty());
    Ok(())
}

#[test]
fn bound_parameters_persist_across_executions() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    server.set_affected_rows(3);
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let mut insert = make_prepared_statement(&conn, INSERT_NAME)?;
    insert.set_parameter(1, RowValues::Text("first".into()))?;
    assert_eq!(insert.execute()?, 3);
    assert_eq!(insert.execute()?, 3);
    insert.set_parameter(1, RowValues::Text("second".into()))?;
    insert.execute()?;

    let names: Vec<_> = server
        .executions()
        .into_iter()
        .map(|e| e.params[0].clone())
        .collect();
    assert_eq!(
        names,
        vec![
            RowValues::Text("first".into()),
            RowValues::Text("first".into()),
            RowValues::Text("second".into()),
        ]
    );
    Ok(())
}

#[test]
fn statement_errors_propagate_unchanged() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;
    server.fail_statements("You have an error in your SQL syntax");

    let err = make_prepared_statement(&conn, "SELEC 1").expect_err("prepare should fail");
    assert!(
        matches!(&err, MysqlScopedError::StatementError(msg) if msg.contains("SQL syntax"))
    );
    assert!(!err.is_connection_error());
    Ok(())
}

#[test]
fn plain_statement_runs_text_queries() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    server.set_query_result(
        "SELECT 1 AS one",
        create_test_result_set(&["one"], vec![vec![RowValues::Int(1)]]),
    );
    let factory = server.factory();
    let conn = factory.connect_exclusive(&sample_parameters())?;

    let statement = make_statement(&conn)?;
    let mut rows = execute_query(&statement, "SELECT 1 AS one")?;
    assert!(rows.next());
    assert_eq!(rows.get_string_at(1).as_deref(), Some("1"));

    let executions = server.executions();
    assert!(!executions[0].prepared);
    assert!(executions[0].params.is_empty());
    Ok(())
}

#[test]
fn helpers_accept_any_connection_owner() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();

    let exclusive = factory.connect_exclusive(&sample_parameters())?;
    let shared = factory.connect_shared(&sample_parameters())?;
    let plain = server.driver().connect("db1", None, "u", "p")?;
    let counted = Rc::new(server.driver().connect("db1", None, "u", "p")?);

    make_prepared_statement(&exclusive, SELECT_BY_ID)?;
    make_prepared_statement(&shared, SELECT_BY_ID)?;
    make_prepared_statement(&plain, SELECT_BY_ID)?;
    make_prepared_statement(&&plain, SELECT_BY_ID)?;
    make_prepared_statement(&counted, SELECT_BY_ID)?;
    make_statement(&*exclusive)?;

    assert_eq!(server.prepared_queries().len(), 5);
    Ok(())
}

#[test]
fn statement_keeps_the_session_open_after_the_connection_handle_drops()
-> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    let conn = factory.connect_shared(&sample_parameters())?;

    let mut insert = make_prepared_statement(&conn, INSERT_NAME)?;
    let select = make_statement(&conn)?;
    drop(conn);
    assert_eq!(server.connections_closed(), 0);

    insert.set_parameter(1, RowValues::Text("late".into()))?;
    assert_eq!(insert.execute()?, 1);
    drop(select);
    assert_eq!(server.connections_closed(), 0);

    drop(insert);
    assert_eq!(server.connections_opened(), 1);
    assert_eq!(server.connections_closed(), 1);
    Ok(())
}
