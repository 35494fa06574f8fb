use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dbrelay::drivers::{ConnectionEvent, InMemoryTestDriver, InMemoryTestResponseBuilder};
use dbrelay::{ColumnType, DatabaseDriver, DbRelay, DbRelayError, RelayConfig, Shaped};

#[derive(Debug)]
enum AppError {
    Db(DbRelayError),
    Rejected(&'static str),
}

impl From<DbRelayError> for AppError {
    fn from(e: DbRelayError) -> Self {
        AppError::Db(e)
    }
}

fn relay_over(driver: &Arc<InMemoryTestDriver>) -> DbRelay {
    let driver: Arc<dyn DatabaseDriver> = Arc::clone(driver) as Arc<dyn DatabaseDriver>;
    DbRelay::with_driver(driver, &RelayConfig::default().with_debug(true))
}

fn inserted_id(id: &str) -> dbrelay::RawQueryResult {
    InMemoryTestResponseBuilder::new()
        .column("id", ColumnType::Integer, None)
        .row(&[id])
        .build()
}

#[tokio::test]
async fn test_commit_on_success() {
    let in_memory_test_driver =
        Arc::new(InMemoryTestDriver::new().with_responses([inserted_id("1"), inserted_id("2")]));
    let relay = relay_over(&in_memory_test_driver);

    let worker = relay.clone();
    let result = relay
        .transaction(
            move |conn| {
                Box::pin(async move {
                    let first = worker
                        .insert("users")
                        .values([("name", "Ann")])
                        .returning(&["id"])
                        .execute(Some(conn))
                        .await?;
                    let second = worker
                        .insert("users")
                        .values([("name", "Bob")])
                        .returning(&["id"])
                        .execute(Some(conn))
                        .await?;
                    Ok::<_, DbRelayError>((first, second))
                })
            },
            None,
        )
        .await
        .unwrap();

    assert!(matches!(result.0, Shaped::Row(_)));
    assert!(matches!(result.1, Shaped::Row(_)));
    assert_eq!(
        in_memory_test_driver.events(),
        vec![
            ConnectionEvent::Acquired(0),
            ConnectionEvent::Begin(0),
            ConnectionEvent::Commit(0),
            ConnectionEvent::Released(0),
        ]
    );
    for query in in_memory_test_driver.recorded_queries() {
        assert_eq!(query.connection, Some(0));
    }
}

#[tokio::test]
async fn test_work_failure_rolls_back_and_returns_work_error() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_response(inserted_id("1")));
    let relay = relay_over(&in_memory_test_driver);

    let worker = relay.clone();
    let err = relay
        .transaction(
            move |conn| {
                Box::pin(async move {
                    worker
                        .insert("users")
                        .values([("name", "Ann")])
                        .execute(Some(conn))
                        .await?;
                    Err::<(), _>(AppError::Rejected("quota exceeded"))
                })
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Rejected("quota exceeded")));
    in_memory_test_driver.assert_query_count(1);
    assert_eq!(
        in_memory_test_driver.events(),
        vec![
            ConnectionEvent::Acquired(0),
            ConnectionEvent::Begin(0),
            ConnectionEvent::Rollback(0),
            ConnectionEvent::Released(0),
        ]
    );
}

#[tokio::test]
async fn test_commit_failure_rolls_back_and_returns_commit_error() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().failing_commit("serialization failure"));
    let relay = relay_over(&in_memory_test_driver);

    let err = relay
        .transaction(|_conn| Box::pin(async { Ok::<_, AppError>(42) }), None)
        .await
        .unwrap_err();

    match err {
        AppError::Db(DbRelayError::TransactionFailed(message)) => {
            assert_eq!(message, "serialization failure")
        }
        other => panic!("Expected commit error, got {other:?}"),
    }
    assert_eq!(
        in_memory_test_driver.events(),
        vec![
            ConnectionEvent::Acquired(0),
            ConnectionEvent::Begin(0),
            ConnectionEvent::Commit(0),
            ConnectionEvent::Rollback(0),
            ConnectionEvent::Released(0),
        ]
    );
}

#[tokio::test]
async fn test_existing_handle_is_not_leased_or_released() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new());
    let relay = relay_over(&in_memory_test_driver);

    let conn = relay.get_connection().await.unwrap();
    let value = relay
        .transaction(|_conn| Box::pin(async { Ok::<_, DbRelayError>("done") }), Some(&conn))
        .await
        .unwrap();

    assert_eq!(value, "done");
    assert_eq!(
        in_memory_test_driver.events(),
        vec![
            ConnectionEvent::Acquired(0),
            ConnectionEvent::Begin(0),
            ConnectionEvent::Commit(0),
        ]
    );

    conn.release();
    assert_eq!(
        in_memory_test_driver.events().last(),
        Some(&ConnectionEvent::Released(0))
    );
}

#[tokio::test]
async fn test_sequential_transactions_on_one_handle() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new());
    let relay = relay_over(&in_memory_test_driver);

    let conn = relay.get_connection().await.unwrap();
    for _ in 0..2 {
        relay
            .transaction(|_conn| Box::pin(async { Ok::<_, DbRelayError>(()) }), Some(&conn))
            .await
            .unwrap();
    }
    drop(conn);

    let events = in_memory_test_driver.events();
    assert_eq!(events.iter().filter(|e| matches!(e, ConnectionEvent::Acquired(_))).count(), 1);
    assert_eq!(events.iter().filter(|e| matches!(e, ConnectionEvent::Commit(0))).count(), 2);
    assert_eq!(events.iter().filter(|e| matches!(e, ConnectionEvent::Released(_))).count(), 1);
}

#[tokio::test]
async fn test_begin_failure_skips_work_and_rollback() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().failing_begin("too many clients"));
    let relay = relay_over(&in_memory_test_driver);

    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    let err = relay
        .transaction(
            move |_conn| {
                flag.store(true, Ordering::SeqCst);
                Box::pin(async { Ok::<_, DbRelayError>(()) })
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(!ran.load(Ordering::SeqCst));
    assert!(matches!(err, DbRelayError::TransactionFailed(ref m) if m == "too many clients"));
    assert_eq!(
        in_memory_test_driver.events(),
        vec![
            ConnectionEvent::Acquired(0),
            ConnectionEvent::Begin(0),
            ConnectionEvent::Released(0),
        ]
    );
}

#[tokio::test]
async fn test_rollback_failure_keeps_work_error() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().failing_rollback("connection reset"));
    let relay = relay_over(&in_memory_test_driver);

    let err = relay
        .transaction(
            |_conn| Box::pin(async { Err::<(), _>(AppError::Rejected("bad input")) }),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Rejected("bad input")));
    assert_eq!(
        in_memory_test_driver.events().last(),
        Some(&ConnectionEvent::Released(0))
    );
}

#[tokio::test]
async fn test_acquire_failure_propagates() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().failing_acquire("pool exhausted"));
    let relay = relay_over(&in_memory_test_driver);

    let err = relay
        .transaction(|_conn| Box::pin(async { Ok::<_, DbRelayError>(()) }), None)
        .await
        .unwrap_err();

    assert!(matches!(err, DbRelayError::ConnectionFailed(ref m) if m == "pool exhausted"));
    assert!(in_memory_test_driver.events().is_empty());
}

#[tokio::test]
async fn test_query_failure_inside_work_rolls_back() {
    let in_memory_test_driver = Arc::new(InMemoryTestDriver::new().with_error("duplicate key"));
    let relay = relay_over(&in_memory_test_driver);

    let worker = relay.clone();
    let err = relay
        .transaction(
            move |conn| {
                Box::pin(async move {
                    worker
                        .insert("users")
                        .values([("email", "a@b.c")])
                        .execute(Some(conn))
                        .await
                })
            },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DbRelayError::QueryFailed(ref m) if m == "duplicate key"));
    assert!(in_memory_test_driver
        .events()
        .contains(&ConnectionEvent::Rollback(0)));
}
