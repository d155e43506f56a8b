#![cfg(feature = "mysql")]

//! Runs against a real server only when `MYSQL_HOST` is set, e.g.
//! `MYSQL_HOST=127.0.0.1 MYSQL_USER=root MYSQL_PASSWORD=secret MYSQL_DATABASE=testing cargo test`.

use mysql_scoped::prelude::*;

fn live_parameters() -> Option<ConnectionParameters> {
    std::env::var("MYSQL_HOST").ok()?;
    ConnectionParameters::from_env().ok()
}

#[test]
fn live_prepared_select_and_insert() -> Result<(), MysqlScopedError> {
    let Some(params) = live_parameters() else {
        eprintln!("MYSQL_HOST not set; skipping live MySQL test");
        return Ok(());
    };

    let factory = ConnectionFactory::mysql();
    let conn = factory.connect_exclusive(&params)?;
    assert_eq!(conn.schema()?.as_deref(), Some(params.schema.as_str()));

    let ddl = make_statement(&conn)?;
    ddl.execute("DROP TABLE IF EXISTS scoped_live_test")?;
    ddl.execute(
        "CREATE TABLE scoped_live_test (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )",
    )?;

    let mut select = make_prepared_statement(&conn, "SELECT * FROM scoped_live_test WHERE id = ?")?;
    select.set_parameter(1, RowValues::Int(1))?;
    let mut rows = execute_prepared_query(&mut select)?;
    assert!(!rows.next());
    assert_eq!(rows.column_count(), 4);

    let mut insert = make_prepared_statement(
        &conn,
        "INSERT INTO scoped_live_test (name, created_at, updated_at) VALUES (?, NOW(), NOW())",
    )?;
    insert.set_parameter(1, RowValues::Text("some name".into()))?;
    assert_eq!(insert.execute()?, 1);

    let mut rows = execute_prepared_query(&mut select)?;
    assert!(rows.next());
    assert_eq!(rows.get("id"), Some(&RowValues::Int(1)));
    assert_eq!(rows.get_string("name").as_deref(), Some("some name"));
    assert!(matches!(rows.get("created_at"), Some(RowValues::Timestamp(_))));

    let mut text_rows = execute_query(&ddl, "SELECT COUNT(*) AS n FROM scoped_live_test")?;
    assert!(text_rows.next());
    assert_eq!(text_rows.get("n"), Some(&RowValues::Int(1)));

    ddl.execute("DROP TABLE scoped_live_test")?;
    Ok(())
}

#[test]
fn live_bad_credentials_fail_with_connection_error() {
    let Some(mut params) = live_parameters() else {
        return;
    };
    params.password = format!("{}-wrong", params.password);

    let err = ConnectionFactory::instance()
        .connect_shared(&params)
        .expect_err("wrong password should be rejected");
    assert!(err.is_connection_error());
}

fn statements_closed(conn: &MysqlConnection) -> Result<u64, MysqlScopedError> {
    let mut status = execute_query(
        &*make_statement(conn)?,
        "SHOW SESSION STATUS LIKE 'Com_stmt_close'",
    )?;
    assert!(status.next());
    status
        .get_string("Value")
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| MysqlScopedError::Other("Com_stmt_close is not a number".into()))
}

#[test]
fn live_uncached_prepared_statements_are_closed_on_drop() -> Result<(), MysqlScopedError> {
    let Some(params) = live_parameters() else {
        return Ok(());
    };

    let factory =
        ConnectionFactory::with_driver(MysqlDriver::new().with_stmt_cache_size(Some(0)));
    let conn = factory.connect_exclusive(&params)?;
    let before = statements_closed(&conn)?;

    for id in 0..5 {
        let mut select = make_prepared_statement(&*conn, "SELECT ? AS id")?;
        assert!(select.closes_on_drop());
        select.set_parameter(1, RowValues::Int(id))?;
        assert_eq!(execute_prepared_query(&mut select)?.rows_count(), 1);
    }

    assert_eq!(statements_closed(&conn)? - before, 5);
    Ok(())
}

#[test]
fn live_date_columns_match_across_protocols() -> Result<(), MysqlScopedError> {
    let Some(params) = live_parameters() else {
        return Ok(());
    };

    let conn = ConnectionFactory::mysql().connect_exclusive(&params)?;
    let sql = "SELECT CAST('2021-09-04' AS DATE) AS d";

    let mut text = execute_query(&*make_statement(&conn)?, sql)?;
    let mut binary = execute_prepared_query(&mut *make_prepared_statement(&conn, sql)?)?;
    assert!(text.next() && binary.next());
    assert!(matches!(text.get("d"), Some(RowValues::Timestamp(_))));
    assert_eq!(text.get("d"), binary.get("d"));
    Ok(())
}
