//! Shared utilities for integration tests.

use replica_router::config::PoolConfig;
use replica_router::{args, ConnectionRouter};

/// Settings for in-memory SQLite backends.
///
/// Every connection to `:memory:` is a fresh database, so each pool is held
/// to a single connection that is dialed up front.
pub fn sqlite_settings() -> PoolConfig {
    PoolConfig {
        max_connections: 1,
        acquire_timeout_secs: 5,
        connect_eagerly: true,
        ..PoolConfig::default()
    }
}

/// Open a router over `n` in-memory databases.
///
/// Each database holds a `whoami` table with one row carrying its own index,
/// so a read reveals which backend answered it.
pub async fn sqlite_router(n: usize) -> ConnectionRouter {
    let sources = vec![":memory:"; n].join(";");
    let router = ConnectionRouter::open_with("sqlite", &sources, &sqlite_settings())
        .await
        .unwrap();

    for backend in router.backends() {
        backend
            .execute("CREATE TABLE whoami (idx INTEGER NOT NULL)", &[])
            .await
            .unwrap();
        backend
            .execute("INSERT INTO whoami (idx) VALUES (?)", &args![backend.index() as i64])
            .await
            .unwrap();
    }
    router
}

/// Number of rows in `whoami` on every backend, in index order.
#[allow(dead_code)]
pub async fn row_counts(router: &ConnectionRouter) -> Vec<i64> {
    let mut counts = Vec::new();
    for backend in router.backends() {
        let (count,): (i64,) = backend
            .get("SELECT COUNT(*) FROM whoami", &[])
            .await
            .unwrap();
        counts.push(count);
    }
    counts
}
