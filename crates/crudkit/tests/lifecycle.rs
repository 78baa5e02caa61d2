mod common;

use common::{ScriptedConnector, Script, harness, options};
use crudkit::prelude::*;
use crudkit::{ConnectionErrorKind, TransactionErrorKind};

#[test]
fn init_forces_session_charset() {
    let h = harness(EngineConfig::default());
    assert!(h.engine.is_connected());
    assert_eq!(h.script.connects(), 1);
    assert_eq!(h.script.statements(), vec!["SET NAMES 'utf8mb4'"]);
    assert_eq!(h.engine.options().dsn(), "mysql:host=localhost;dbname=shop");
}

#[test]
fn init_honours_configured_charset() {
    let script = Script::default();
    let _engine = QueryEngine::init(
        ScriptedConnector(script.clone()),
        options().charset("latin1"),
        EngineConfig::default(),
    )
    .expect("init");
    assert_eq!(script.statements(), vec!["SET NAMES 'latin1'"]);
}

#[test]
fn init_failure_is_connection_error() {
    let script = Script::default();
    script.fail_connects(1);

    let err = QueryEngine::init(
        ScriptedConnector(script),
        options(),
        EngineConfig::default(),
    )
    .expect_err("connect refused");

    let Error::Connection(conn) = &err else {
        panic!("expected a connection error, got {err:?}");
    };
    assert_eq!(conn.kind, ConnectionErrorKind::Authentication);
    assert!(conn.message.contains("mysql:host=localhost;dbname=shop"));
    assert!(conn.message.contains("Access denied"));
    assert!(conn.source.is_some());
}

#[test]
fn failing_set_names_fails_init() {
    let script = Script::default();
    script.fail_next(1);

    let err = QueryEngine::init(
        ScriptedConnector(script),
        options(),
        EngineConfig::default(),
    )
    .expect_err("SET NAMES fails");
    assert!(matches!(err, Error::Connection(_)));
}

#[test]
fn ping_healthy_connection() {
    let mut h = harness(EngineConfig::default());
    assert!(h.engine.ping().expect("ping"));
    assert_eq!(h.script.pings(), 1);
    assert_eq!(h.script.connects(), 1);
}

#[test]
fn ping_reconnects_after_failure() {
    let mut h = harness(EngineConfig::default());
    h.script.fail_pings(1);

    assert!(h.engine.ping().expect("ping reconnects"));
    assert_eq!(h.script.connects(), 2);
    assert_eq!(h.script.closes(), 1);
    assert!(h.engine.is_connected());
    assert_eq!(
        h.script.statements(),
        vec!["SET NAMES 'utf8mb4'", "SET NAMES 'utf8mb4'"]
    );
}

#[test]
fn ping_reconnects_when_stale_close_fails() {
    let mut h = harness(EngineConfig::default());
    h.script.fail_pings(1);
    h.script.fail_closes(1);

    assert!(h.engine.ping().expect("ping reconnects"));
    assert_eq!(h.script.closes(), 1);
    assert_eq!(h.script.connects(), 2);
    assert!(h.engine.is_connected());
}

#[test]
fn direct_driver_access_bypasses_the_query_log() {
    let mut h = harness(EngineConfig::default());
    h.engine
        .driver_mut()
        .expect("open session")
        .execute("SET SESSION wait_timeout = 60", &[])
        .expect("execute");

    assert_eq!(h.script.last().0, "SET SESSION wait_timeout = 60");
    assert!(h.sink.entries().is_empty());
    assert_eq!(h.engine.last_query(), None);
}

#[test]
fn ping_propagates_failed_reconnect() {
    let mut h = harness(EngineConfig::default());
    h.script.fail_pings(1);
    h.script.fail_connects(1);

    let err = h.engine.ping().expect_err("reconnect refused");
    assert!(matches!(err, Error::Connection(_)));
    assert!(!h.engine.is_connected());
    assert!(matches!(
        h.engine.delete("t", &Params::new()),
        Err(Error::NotInitialized)
    ));
}

#[test]
fn close_then_everything_fails_not_initialized() {
    let mut h = harness(EngineConfig::default());
    h.engine.close();

    assert!(!h.engine.is_connected());
    assert_eq!(h.script.closes(), 1);
    assert!(matches!(
        h.engine.fetch_one("users", &params! { "id" => 1 }),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        h.engine.store("users", &params! { "a" => 1 }, None),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(h.engine.ping(), Err(Error::NotInitialized)));
    assert!(matches!(
        h.engine.quote(&Value::Text("x".into())),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(h.engine.driver(), Err(Error::NotInitialized)));
    assert!(matches!(h.engine.driver_mut(), Err(Error::NotInitialized)));
    assert!(matches!(h.engine.commit(), Err(Error::Transaction(_))));
    assert!(h.sink.entries().is_empty());

    h.engine.close();
    assert_eq!(h.script.closes(), 1);
}

#[test]
fn transactions_pass_through() {
    let mut h = harness(EngineConfig::default());

    h.engine.begin_transaction().expect("begin");
    assert!(h.engine.in_transaction());
    h.engine.commit().expect("commit");
    assert!(!h.engine.in_transaction());

    h.engine.begin_transaction().expect("begin");
    h.engine.rollback().expect("rollback");

    assert_eq!(
        h.script.transactions(),
        vec!["begin", "commit", "begin", "rollback"]
    );
}

#[test]
fn nested_transaction_is_rejected() {
    let mut h = harness(EngineConfig::default());
    h.engine.begin_transaction().expect("begin");

    let err = h.engine.begin_transaction().expect_err("nested");
    let Error::Transaction(tx) = err else {
        panic!("expected a transaction error");
    };
    assert_eq!(tx.kind, TransactionErrorKind::NestedNotSupported);
    assert_eq!(h.script.transactions(), vec!["begin"]);
}

#[test]
fn commit_without_transaction_is_rejected() {
    let mut h = harness(EngineConfig::default());
    let err = h.engine.rollback().expect_err("nothing to roll back");
    let Error::Transaction(tx) = err else {
        panic!("expected a transaction error");
    };
    assert_eq!(tx.kind, TransactionErrorKind::NotStarted);
    assert!(h.script.transactions().is_empty());
}

#[test]
fn reconnect_drops_open_transaction() {
    let mut h = harness(EngineConfig::default());
    h.engine.begin_transaction().expect("begin");
    h.script.fail_pings(1);

    h.engine.ping().expect("ping");
    assert!(!h.engine.in_transaction());
}
