//! Session factory behaviour against real SQLite files.

use garden_db::{DbConnConfig, DbError, DbHandle, SessionFactory};
use sea_orm::{ConnectionTrait, Statement};
use std::sync::Arc;

fn file_factory(dir: &tempfile::TempDir) -> SessionFactory {
    let path = dir.path().join("garden.db");
    SessionFactory::new(DbConnConfig::from_dsn(format!("sqlite://{}", path.display())))
}

#[tokio::test]
async fn factory_is_lazy_until_first_session() {
    let dir = tempfile::tempdir().unwrap();
    let factory = file_factory(&dir);

    assert!(!factory.is_initialized());
    assert!(!dir.path().join("garden.db").exists());

    let session = factory.get_session().await.unwrap();
    assert!(factory.is_initialized());
    assert_eq!(factory.init_attempts(), 1);
    assert!(dir.path().join("garden.db").exists());

    drop(session);
    let _again = factory.get_session().await.unwrap();
    assert_eq!(factory.init_attempts(), 1);
}

#[tokio::test]
async fn sessions_are_released_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let factory = file_factory(&dir);

    let a = factory.get_session().await.unwrap();
    let b = factory.get_session().await.unwrap();
    assert_eq!(factory.open_sessions(), 2);

    drop(a);
    assert_eq!(factory.open_sessions(), 1);
    drop(b);
    assert_eq!(factory.open_sessions(), 0);
}

#[tokio::test]
async fn failed_initialization_is_sticky() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the parent directory should be.
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();
    let dsn = format!("sqlite://{}", blocker.join("garden.db").display());
    let factory = SessionFactory::new(DbConnConfig::from_dsn(dsn));

    for _ in 0..3 {
        let err = factory.get_session().await.unwrap_err();
        assert!(matches!(err, DbError::Configuration(_)), "got {err:?}");
    }
    assert_eq!(factory.init_attempts(), 1);
    assert_eq!(factory.open_sessions(), 0);
}

#[tokio::test]
async fn unknown_pragma_fails_as_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = DbConnConfig::from_dsn(format!(
        "sqlite://{}",
        dir.path().join("garden.db").display()
    ));
    cfg.params = Some([("cache_size".to_string(), "10".to_string())].into());
    let factory = SessionFactory::new(cfg);

    assert!(matches!(
        factory.get_session().await,
        Err(DbError::Configuration(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_initialize_once() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(file_factory(&dir));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let factory = Arc::clone(&factory);
        tasks.push(tokio::spawn(async move {
            factory.get_session().await.map(|_| ())
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(factory.init_attempts(), 1);
    assert_eq!(factory.open_sessions(), 0);
}

#[tokio::test]
async fn uncommitted_transaction_rolls_back() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let factory = file_factory(&dir);

    let session = factory.get_session().await?;
    session
        .connection()
        .execute_unprepared("CREATE TABLE beds (id INTEGER PRIMARY KEY, label TEXT NOT NULL)")
        .await?;

    {
        let txn = session.begin().await?;
        txn.execute_unprepared("INSERT INTO beds (label) VALUES ('tomatoes')")
            .await?;
        // dropped without commit
    }

    let backend = session.connection().get_database_backend();
    let row = session
        .connection()
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM beds".to_string(),
        ))
        .await?
        .expect("count row");
    let n: i64 = row.try_get("", "n")?;
    assert_eq!(n, 0);
    Ok(())
}

#[tokio::test]
async fn factory_from_handle_skips_initialization() {
    let handle = DbHandle::connect("sqlite::memory:").await.unwrap();
    let factory = SessionFactory::from_handle(handle);

    assert!(factory.is_initialized());
    let session = factory.get_session().await.unwrap();
    assert_eq!(factory.init_attempts(), 0);
    drop(session);
    factory.close().await;
}
