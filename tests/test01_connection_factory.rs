#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mysql_scoped::prelude::*;
use mysql_scoped::test_utils::{MockServer, sample_parameters};

#[test]
fn exclusive_connection_is_bound_to_schema() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    assert!(!factory.is_driver_initialized());

    let conn = factory.connect_exclusive(&sample_parameters())?;

    assert_eq!(conn.schema()?.as_deref(), Some("test"));
    assert_eq!(conn.host(), "db1");
    assert_eq!(conn.user(), "u");
    assert_eq!(conn.port(), None);
    assert!(factory.is_driver_initialized());
    Ok(())
}

#[test]
fn shared_connection_is_bound_to_schema() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();
    let params = sample_parameters().with_port(Some(3307));

    let conn = factory.connect_shared(&params)?;

    assert_eq!(conn.schema()?.as_deref(), Some("test"));
    assert_eq!(conn.port(), Some(3307));
    Ok(())
}

#[test]
fn driver_handle_is_created_once_and_reused() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();

    let first = factory.connect_exclusive(&sample_parameters())?;
    let second = factory.connect_shared(&sample_parameters())?;
    let third = factory.connect_exclusive(&sample_parameters())?;

    assert_eq!(server.driver_inits(), 1);
    assert_eq!(server.connect_calls(), 3);
    assert_eq!([first.id(), second.id(), third.id()], [1, 2, 3]);
    Ok(())
}

#[test]
fn preconstructed_driver_is_never_rebuilt() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = ConnectionFactory::with_driver(server.driver());
    assert!(factory.is_driver_initialized());

    let _conn = factory.connect_exclusive(&sample_parameters())?;

    assert_eq!(server.driver_inits(), 0);
    assert_eq!(server.connections_opened(), 1);
    Ok(())
}

#[test]
fn failed_authentication_propagates_connection_error() {
    let server = MockServer::new();
    server.fail_connect("Access denied for user 'u'@'db1'");
    let factory = server.factory();

    let exclusive = factory.connect_exclusive(&sample_parameters());
    let shared = factory.connect_shared(&sample_parameters());

    for result in [exclusive.map(|_| ()), shared.map(|_| ())] {
        let err = result.expect_err("connect should fail");
        assert!(err.is_connection_error());
        assert!(
            matches!(&err, MysqlScopedError::ConnectionError(msg) if msg.contains("Access denied"))
        );
    }
    assert_eq!(server.connect_calls(), 2);
    assert_eq!(server.connections_opened(), 0);
    assert_eq!(server.connections_closed(), 0);
}

#[test]
fn failed_schema_selection_releases_the_connection() {
    let server = MockServer::new();
    server.fail_schema("Unknown database 'test'");
    let factory = server.factory();

    let err = factory
        .connect_exclusive(&sample_parameters())
        .expect_err("schema selection should fail");

    assert!(err.is_connection_error());
    assert_eq!(server.connections_opened(), 1);
    assert_eq!(server.connections_closed(), 1);
}

#[test]
fn dropping_exclusive_handle_closes_once() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();

    {
        let _conn = factory.connect_exclusive(&sample_parameters())?;
        assert_eq!(server.connections_closed(), 0);
    }

    assert_eq!(server.connections_closed(), 1);
    Ok(())
}

#[test]
fn last_shared_handle_closes_exactly_once() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = server.factory();

    let conn = factory.connect_shared(&sample_parameters())?;
    let clones: Vec<_> = (0..4).map(|_| Arc::clone(&conn)).collect();
    assert_eq!(Arc::strong_count(&conn), 5);

    drop(conn);
    for (remaining, handle) in clones.into_iter().enumerate().rev() {
        assert_eq!(server.connections_closed(), 0, "{remaining} handles still alive");
        drop(handle);
    }

    assert_eq!(server.connections_closed(), 1);
    Ok(())
}

#[test]
fn schema_is_selected_after_the_driver_lock_is_released() -> Result<(), MysqlScopedError> {
    let server = MockServer::new();
    let factory = Arc::new(server.factory());
    let weak = Arc::downgrade(&factory);
    server.observe_schema_selection(move || {
        weak.upgrade()
            .is_some_and(|factory| factory.is_connect_in_progress())
    });

    let exclusive = factory.connect_exclusive(&sample_parameters())?;
    let shared = factory.connect_shared(&sample_parameters())?;

    assert_eq!(exclusive.schema()?.as_deref(), Some("test"));
    assert_eq!(shared.schema()?.as_deref(), Some("test"));
    assert_eq!(server.schema_observations(), vec![false, false]);
    Ok(())
}

#[test]
fn driver_lock_is_visible_while_a_connect_is_running() {
    let server = MockServer::new();
    server.set_connect_delay(Duration::from_millis(200));
    let factory = server.factory();
    assert!(!factory.is_connect_in_progress());

    let seen = thread::scope(|s| {
        let connect = s.spawn(|| factory.connect_exclusive(&sample_parameters()));
        let mut seen = false;
        while !connect.is_finished() {
            if factory.is_connect_in_progress() {
                seen = true;
                break;
            }
            thread::yield_now();
        }
        assert!(connect.join().expect("connect thread panicked").is_ok());
        seen
    });

    assert!(seen);
    assert!(!factory.is_connect_in_progress());
}
