#![allow(dead_code)]

use std::sync::Arc;

use garden_db::{DbConnConfig, SessionFactory};
use garden_users::config::GardenUsersConfig;
use garden_users::GardenUsers;
use tempfile::TempDir;

/// A migrated garden database in a temp dir.
pub struct TestGarden {
    pub module: GardenUsers,
    pub sessions: Arc<SessionFactory>,
    _dir: TempDir,
}

pub async fn migrated_garden() -> TestGarden {
    let dir = tempfile::tempdir().expect("tempdir");
    let dsn = format!("sqlite://{}", dir.path().join("garden.db").display());
    let sessions = Arc::new(SessionFactory::new(DbConnConfig::from_dsn(dsn)));
    let module = GardenUsers::new(Arc::clone(&sessions), &GardenUsersConfig::default());
    module.migrate().await.expect("migrations");
    TestGarden {
        module,
        sessions,
        _dir: dir,
    }
}

/// A factory whose first initialisation is guaranteed to fail.
pub fn broken_sessions(dir: &TempDir) -> Arc<SessionFactory> {
    let blocker = dir.path().join("plain_file");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    let dsn = format!("sqlite://{}", blocker.join("garden.db").display());
    Arc::new(SessionFactory::new(DbConnConfig::from_dsn(dsn)))
}
