//! Backing connection abstraction.
//!
//! # Responsibilities
//! - Represent one backing database (a client pool opened from one target)
//! - Forward queries, executes and transactions to it
//! - Enforce the open-connection limit set by `set_max_open_connections`

use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{BoxStream, Stream};
use serde::Serialize;
use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{Any, AnyConnection, AnyPool, Connection, FromRow, Transaction};
use tokio::sync::Notify;

use crate::observability::metrics;
use crate::router::error::RouterResult;
use crate::router::named::{self, BindStyle};
use crate::router::value::{to_arguments, SqlValue};

/// Role of a backend in the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Secondary => "secondary",
        }
    }
}

/// A single backing database.
#[derive(Debug)]
pub struct Backend {
    /// Position in the router; 0 is the primary.
    index: usize,
    /// Connection URL, credentials redacted.
    target: String,
    pool: AnyPool,
    bind_style: BindStyle,

    /// Limit on concurrently open connections (0 = unlimited).
    max_open: AtomicU32,
    /// Connections currently checked out through this backend.
    in_use: AtomicU32,
    /// Signalled when a slot frees up or the limit changes.
    released: Notify,
}

impl Backend {
    /// Wrap an opened client pool.
    pub fn new(index: usize, target: String, pool: AnyPool, bind_style: BindStyle) -> Self {
        Self {
            index,
            target,
            pool,
            bind_style,
            max_open: AtomicU32::new(0),
            in_use: AtomicU32::new(0),
            released: Notify::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> Role {
        if self.index == 0 {
            Role::Primary
        } else {
            Role::Secondary
        }
    }

    /// Redacted connection URL.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The underlying client pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn bind_style(&self) -> BindStyle {
        self.bind_style
    }

    pub fn max_open_connections(&self) -> u32 {
        self.max_open.load(Ordering::Relaxed)
    }

    pub fn in_use(&self) -> u32 {
        self.in_use.load(Ordering::Relaxed)
    }

    /// Set the open-connection limit. 0 removes the limit.
    pub fn set_max_open_connections(&self, max: u32) {
        self.max_open.store(max, Ordering::Relaxed);
        // A raised limit may admit waiters.
        self.released.notify_waiters();
    }

    /// Take a slot if the limit allows it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<OpenGuard> {
        let mut prev = self.in_use.load(Ordering::Relaxed);
        loop {
            let max = self.max_open.load(Ordering::Relaxed);
            if max != 0 && prev >= max {
                return None;
            }
            match self.in_use.compare_exchange_weak(
                prev, prev + 1, Ordering::AcqRel, Ordering::Relaxed
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        metrics::record_in_use(self.index, prev + 1);
        Some(OpenGuard {
            backend: self.clone(),
        })
    }

    /// Wait for a slot.
    pub async fn acquire(self: &Arc<Self>) -> OpenGuard {
        loop {
            // Registered before the check so a release in between is not lost.
            let notified = self.released.notified();
            if let Some(guard) = self.try_acquire() {
                return guard;
            }
            tracing::trace!(index = self.index, "Open-connection limit reached, waiting");
            notified.await;
        }
    }

    fn release(&self) {
        let now = self.in_use.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_in_use(self.index, now);
        self.released.notify_waiters();
    }

    // --- Forwarded operations ---

    /// Check liveness with a round trip on one connection.
    pub async fn ping(self: &Arc<Self>) -> Result<(), sqlx::Error> {
        let _slot = self.acquire().await;
        let mut conn = self.pool.acquire().await?;
        conn.ping().await
    }

    /// Fetch every row, decoded into `T`.
    pub async fn select<T>(self: &Arc<Self>, query: &str, args: &[SqlValue]) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let arguments = to_arguments(args)?;
        let _slot = self.acquire().await;
        sqlx::query_as_with::<_, T, _>(query, arguments)
            .fetch_all(&self.pool)
            .await
    }

    /// Fetch exactly one row, decoded into `T`.
    pub async fn get<T>(self: &Arc<Self>, query: &str, args: &[SqlValue]) -> Result<T, sqlx::Error>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let arguments = to_arguments(args)?;
        let _slot = self.acquire().await;
        sqlx::query_as_with::<_, T, _>(query, arguments)
            .fetch_one(&self.pool)
            .await
    }

    /// Stream raw rows. The slot is held until the stream is dropped.
    pub async fn query_rows<'a>(
        self: &'a Arc<Self>,
        query: &'a str,
        args: &[SqlValue],
    ) -> Result<RowStream<'a>, sqlx::Error> {
        let arguments = to_arguments(args)?;
        let slot = self.acquire().await;
        let rows = sqlx::query_with(query, arguments).fetch(&self.pool);
        Ok(RowStream { rows, _slot: slot })
    }

    /// Fetch the first row as a raw row.
    pub async fn query_row(self: &Arc<Self>, query: &str, args: &[SqlValue]) -> Result<AnyRow, sqlx::Error> {
        let arguments = to_arguments(args)?;
        let _slot = self.acquire().await;
        sqlx::query_with(query, arguments)
            .fetch_one(&self.pool)
            .await
    }

    /// Run a statement.
    pub async fn execute(self: &Arc<Self>, query: &str, args: &[SqlValue]) -> Result<AnyQueryResult, sqlx::Error> {
        let arguments = to_arguments(args)?;
        let _slot = self.acquire().await;
        sqlx::query_with(query, arguments)
            .execute(&self.pool)
            .await
    }

    /// Run a statement with `:name` placeholders bound from `arg`.
    pub async fn named_execute<A>(self: &Arc<Self>, query: &str, arg: &A) -> RouterResult<AnyQueryResult>
    where
        A: Serialize + ?Sized,
    {
        let compiled = named::compile(query, self.bind_style);
        let values = compiled.bind(arg)?;
        Ok(self.execute(&compiled.sql, &values).await?)
    }

    /// Start a transaction. The slot is held until commit or rollback.
    pub async fn begin(self: &Arc<Self>) -> Result<RouterTransaction, sqlx::Error> {
        let slot = self.acquire().await;
        let tx = self.pool.begin().await?;
        Ok(RouterTransaction { tx, _slot: slot })
    }
}

/// RAII guard for one open-connection slot.
#[derive(Debug)]
pub struct OpenGuard {
    backend: Arc<Backend>,
}

impl Deref for OpenGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.backend.release();
    }
}

/// Row stream returned by `query_rows`.
pub struct RowStream<'a> {
    rows: BoxStream<'a, Result<AnyRow, sqlx::Error>>,
    _slot: OpenGuard,
}

impl Stream for RowStream<'_> {
    type Item = Result<AnyRow, sqlx::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rows.as_mut().poll_next(cx)
    }
}

/// A transaction on the primary.
///
/// Dropping it without `commit` rolls back.
pub struct RouterTransaction {
    tx: Transaction<'static, Any>,
    _slot: OpenGuard,
}

impl RouterTransaction {
    pub async fn execute(&mut self, query: &str, args: &[SqlValue]) -> Result<AnyQueryResult, sqlx::Error> {
        let arguments = to_arguments(args)?;
        sqlx::query_with(query, arguments).execute(&mut *self.tx).await
    }

    pub async fn select<T>(&mut self, query: &str, args: &[SqlValue]) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let arguments = to_arguments(args)?;
        sqlx::query_as_with::<_, T, _>(query, arguments)
            .fetch_all(&mut *self.tx)
            .await
    }

    pub async fn get<T>(&mut self, query: &str, args: &[SqlValue]) -> Result<T, sqlx::Error>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin,
    {
        let arguments = to_arguments(args)?;
        sqlx::query_as_with::<_, T, _>(query, arguments)
            .fetch_one(&mut *self.tx)
            .await
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

impl Deref for RouterTransaction {
    type Target = AnyConnection;
    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl DerefMut for RouterTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}
