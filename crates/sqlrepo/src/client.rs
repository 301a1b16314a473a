//! Generic client trait for unified database access.

use crate::error::{RepoError, RepoResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A database handle a [`Repository`](crate::Repository) can run statements on.
///
/// Implemented for Postgres clients, transactions and pools, and for
/// [`SqliteClient`](crate::SqliteClient). Parameters and rows use the
/// backend-neutral [`Value`] and [`Row`] types.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`RepoError::NotFound`]
    /// - 1 row: returns that row
    /// - multiple rows: returns the first row (does **not** error)
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Row>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| RepoError::not_found("Expected one row, got none"))
        }
    }

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = RepoResult<u64>> + Send;

    /// [`query`](Self::query), abortable through `cancel`.
    ///
    /// Firing `cancel` before the statement starts keeps it from running.
    /// The default implementation checks `cancel` once, up front, and cannot
    /// abort a statement that is already running.
    fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send {
        async move {
            cancel.check()?;
            self.query(sql, params).await
        }
    }

    /// [`execute`](Self::execute), abortable through `cancel`.
    fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<u64>> + Send {
        async move {
            cancel.check()?;
            self.execute(sql, params).await
        }
    }
}

/// Cancellation for a single statement.
///
/// A [`Repository`](crate::Repository) creates one per statement and fires
/// it when the statement timeout elapses. Backends consult it when the
/// statement actually starts, so a statement still waiting for its
/// connection never runs once cancelled, and a cancel never reaches another
/// caller's statement on a shared SQLite connection.
///
/// On Postgres the cancel request goes to the server process of the
/// connection. A `tokio_postgres::Client` shared between concurrent callers
/// pipelines their statements on that one process, so the request aborts
/// whichever of them the server is running at that moment. Give each caller
/// its own client, transaction or a pool when that matters.
#[derive(Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    token: Arc<Mutex<Option<tokio_postgres::CancelToken>>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fire the handle. A statement that has not started yet will not run;
    /// a running Postgres statement gets a server-side cancel request.
    pub fn cancel(&self) {
        let token = {
            let mut slot = self.lock_token();
            self.cancelled.store(true, Ordering::SeqCst);
            slot.take()
        };
        let Some(token) = token else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = token.cancel_query(tokio_postgres::NoTls).await {
                        tracing::debug!(target: "sqlrepo", error = %e, "postgres cancel request failed");
                    }
                });
            }
            Err(_) => {
                tracing::debug!(target: "sqlrepo", "no runtime to send postgres cancel request");
            }
        }
    }

    /// Fail with [`RepoError::Cancelled`] once the handle has fired.
    pub fn check(&self) -> RepoResult<()> {
        if self.is_cancelled() {
            Err(RepoError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Shared flag, for backends that poll it while a statement runs.
    #[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Register the connection's cancel token for the duration of one
    /// statement. Fails if the handle already fired.
    pub(crate) fn arm(&self, token: tokio_postgres::CancelToken) -> RepoResult<Armed<'_>> {
        let mut slot = self.lock_token();
        self.check()?;
        *slot = Some(token);
        Ok(Armed { handle: self })
    }

    fn lock_token(&self) -> MutexGuard<'_, Option<tokio_postgres::CancelToken>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Disarms the cancel token when the statement completes.
pub(crate) struct Armed<'a> {
    handle: &'a CancelHandle,
}

impl Drop for Armed<'_> {
    fn drop(&mut self) {
        *self.handle.lock_token() = None;
    }
}

impl<C: GenericClient + ?Sized> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn query_one(&self, sql: &str, params: &[Value]) -> impl Future<Output = RepoResult<Row>> + Send {
        (**self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Option<Row>>> + Send {
        (**self).query_opt(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = RepoResult<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send {
        (**self).query_cancellable(sql, params, cancel)
    }

    fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<u64>> + Send {
        (**self).execute_cancellable(sql, params, cancel)
    }
}

impl<C: GenericClient + ?Sized> GenericClient for Arc<C> {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn query_one(&self, sql: &str, params: &[Value]) -> impl Future<Output = RepoResult<Row>> + Send {
        (**self).query_one(sql, params)
    }

    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = RepoResult<Option<Row>>> + Send {
        (**self).query_opt(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = RepoResult<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<Vec<Row>>> + Send {
        (**self).query_cancellable(sql, params, cancel)
    }

    fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> impl Future<Output = RepoResult<u64>> + Send {
        (**self).execute_cancellable(sql, params, cancel)
    }
}
