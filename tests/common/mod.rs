// SPDX-License-Identifier: MIT

use joggr::config::Config;
use joggr::db::Db;
use joggr::routes::create_router;
use joggr::services::JournalService;
use joggr::AppState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create a fresh on-disk test database under the system temp dir.
///
/// A file-backed database is used (rather than `:memory:`) so that every
/// pooled connection sees the same data.
#[allow(dead_code)]
pub async fn test_db() -> Db {
    let n = DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "joggr_test_{}_{}.db",
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_file(&path);
    Db::connect(&format!("sqlite://{}", path.display()))
        .await
        .expect("Failed to open test database")
}

/// Create a test app over a fresh database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let db = test_db().await;
    let journal = JournalService::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        journal,
    });

    (create_router(state.clone()), state)
}

/// Create a signed session token for a test user.
#[allow(dead_code)]
pub fn create_test_jwt(uid: i64, signing_key: &[u8]) -> String {
    joggr::middleware::auth::create_jwt(uid, signing_key).expect("Failed to sign test JWT")
}
