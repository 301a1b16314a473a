//! Generic CRUD repository over a [`Record`] type and a [`GenericClient`].
//!
//! Every operation builds exactly one statement, runs it once on the handle
//! and returns. No caching, batching or retries.

use crate::client::{CancelHandle, GenericClient};
use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};
use crate::qb::{self, Placeholder, SqlQb, Statement};
use crate::record::{Projection, Record};
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// The CRUD operation a statement belongs to, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Get,
    GetAll,
    FindBy,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::GetAll => "get_all",
            Operation::FindBy => "find_by",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD access to the table of record type `R` through database handle `C`.
///
/// The handle can be anything implementing [`GenericClient`]: a client, a
/// pool, a transaction, or a reference to one. The repository never opens,
/// closes or commits it.
///
/// # Example
///
/// ```ignore
/// use sqlrepo::{Repository, SqliteClient};
///
/// let db = SqliteClient::open_in_memory()?;
/// let people = Repository::<Person, _>::new(&db, Placeholder::Question);
///
/// people.create(&Person { id: 1, name: "Joe".into() }).await?;
/// let joe = people.get(1).await?;
/// ```
pub struct Repository<R, C> {
    client: C,
    config: RepositoryConfig,
    _record: PhantomData<fn() -> R>,
}

impl<R, C: Clone> Clone for Repository<R, C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            _record: PhantomData,
        }
    }
}

impl<R, C> fmt::Debug for Repository<R, C>
where
    R: Record,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("table", &R::TABLE)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<R, C> Repository<R, C>
where
    R: Record,
    C: GenericClient,
{
    /// Create a repository with default settings and the given parameter syntax.
    pub fn new(client: C, placeholder: Placeholder) -> Self {
        Self::with_config(client, RepositoryConfig::new(placeholder))
    }

    pub fn with_config(client: C, config: RepositoryConfig) -> Self {
        trace!(
            target: "sqlrepo",
            table = R::TABLE,
            placeholder = config.placeholder.name(),
            timeout = ?config.statement_timeout,
            "repository created"
        );
        Self {
            client,
            config,
            _record: PhantomData,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn placeholder(&self) -> Placeholder {
        self.config.placeholder
    }

    /// Release the database handle.
    pub fn into_client(self) -> C {
        self.client
    }

    /// Insert one row built from all of `record`'s declared columns.
    ///
    /// A NULL primary key is left out of the statement so the database can
    /// generate it; a record with no other column inserts `DEFAULT VALUES`.
    /// No generated value is read back.
    pub async fn create(&self, record: &R) -> RepoResult<()> {
        let stmt = self.insert_statement(record)?;
        let affected = self
            .run(Operation::Create, &stmt, |cancel| {
                self.client.execute_cancellable(&stmt.sql, &stmt.params, cancel)
            })
            .await?;
        debug!(target: "sqlrepo.sql", op = "create", table = R::TABLE, affected, "rows inserted");
        Ok(())
    }

    /// Fetch the record whose primary key equals `key`.
    ///
    /// Returns [`RepoError::NotFound`] when no row matches.
    pub async fn get(&self, key: impl Into<Value>) -> RepoResult<R> {
        let key = key.into();
        let stmt = self.select_statement(Some(&key))?;
        let rows = self
            .run(Operation::Get, &stmt, |cancel| {
                self.client.query_cancellable(&stmt.sql, &stmt.params, cancel)
            })
            .await?;
        match rows.first() {
            Some(row) => R::from_row(row),
            None => Err(RepoError::not_found(format!(
                "{}.{} = {key}",
                R::TABLE,
                R::PRIMARY_KEY
            ))),
        }
    }

    /// Fetch every row of the table, in database order.
    pub async fn get_all(&self) -> RepoResult<Vec<R>> {
        let stmt = self.select_statement(None)?;
        let rows = self
            .run(Operation::GetAll, &stmt, |cancel| {
                self.client.query_cancellable(&stmt.sql, &stmt.params, cancel)
            })
            .await?;
        decode_all(&rows)
    }

    /// Fetch every row whose `column` equals `value`. A NULL `value` matches
    /// rows where the column IS NULL.
    pub async fn find_by(&self, column: &str, value: impl Into<Value>) -> RepoResult<Vec<R>> {
        let stmt = self.find_by_statement(column, value.into())?;
        let rows = self
            .run(Operation::FindBy, &stmt, |cancel| {
                self.client.query_cancellable(&stmt.sql, &stmt.params, cancel)
            })
            .await?;
        decode_all(&rows)
    }

    /// Overwrite every non-key column of the row identified by `key` with
    /// `record`'s values.
    ///
    /// The record's own key field is ignored: the row is chosen by `key`
    /// alone and the key column is never written. Returns the number of rows
    /// changed; updating a missing key succeeds with `0`.
    pub async fn update(&self, key: impl Into<Value>, record: &R) -> RepoResult<u64> {
        let key = key.into();
        let stmt = self.update_statement(&key, record)?;
        self.run(Operation::Update, &stmt, |cancel| {
            self.client.execute_cancellable(&stmt.sql, &stmt.params, cancel)
        })
        .await
    }

    /// Delete the row identified by `key`. Returns the number of rows removed;
    /// deleting a missing key succeeds with `0`.
    pub async fn delete(&self, key: impl Into<Value>) -> RepoResult<u64> {
        let key = key.into();
        let stmt = self.delete_statement(&key)?;
        self.run(Operation::Delete, &stmt, |cancel| {
            self.client.execute_cancellable(&stmt.sql, &stmt.params, cancel)
        })
        .await
    }

    /// The INSERT that [`Repository::create`] would run.
    pub fn insert_statement(&self, record: &R) -> RepoResult<Statement> {
        let mut projection = checked_projection(record)?;
        let mut builder = qb::insert(R::TABLE).placeholder(self.placeholder());
        for &column in R::COLUMNS {
            let value = take_column::<R>(&mut projection, column)?;
            if value.is_null() && column.eq_ignore_ascii_case(R::PRIMARY_KEY) {
                builder = builder.or_default_values();
                continue;
            }
            builder = builder.set(column, value);
        }
        builder.build()
    }

    /// The SELECT that [`Repository::get`] (`Some(key)`) or
    /// [`Repository::get_all`] (`None`) would run.
    pub fn select_statement(&self, key: Option<&Value>) -> RepoResult<Statement> {
        check_key_column::<R>()?;
        let builder = qb::select(R::TABLE).placeholder(self.placeholder());
        match key {
            Some(key) => builder.eq(R::PRIMARY_KEY, key_value::<R>(key)?).build(),
            None => builder.build(),
        }
    }

    pub fn find_by_statement(&self, column: &str, value: Value) -> RepoResult<Statement> {
        if !R::COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            return Err(RepoError::query_build(format!(
                "{} has no column {column:?}",
                R::TABLE
            )));
        }
        qb::select(R::TABLE)
            .placeholder(self.placeholder())
            .eq(column, value)
            .build()
    }

    /// The UPDATE that [`Repository::update`] would run.
    ///
    /// SET lists every declared column except the primary key, in declared
    /// order, followed by `WHERE <key column> = key`.
    pub fn update_statement(&self, key: &Value, record: &R) -> RepoResult<Statement> {
        let mut projection = checked_projection(record)?;
        projection.remove_ignore_case(R::PRIMARY_KEY);

        let mut builder = qb::update(R::TABLE).placeholder(self.placeholder());
        for &column in R::COLUMNS {
            if column.eq_ignore_ascii_case(R::PRIMARY_KEY) {
                continue;
            }
            builder = builder.set(column, take_column::<R>(&mut projection, column)?);
        }
        builder.eq(R::PRIMARY_KEY, key_value::<R>(key)?).build()
    }

    /// The DELETE that [`Repository::delete`] would run.
    pub fn delete_statement(&self, key: &Value) -> RepoResult<Statement> {
        check_key_column::<R>()?;
        qb::delete(R::TABLE)
            .placeholder(self.placeholder())
            .eq(R::PRIMARY_KEY, key_value::<R>(key)?)
            .build()
    }

    async fn run<T, F, Fut>(&self, op: Operation, stmt: &Statement, call: F) -> RepoResult<T>
    where
        F: FnOnce(CancelHandle) -> Fut,
        Fut: Future<Output = RepoResult<T>> + Send,
    {
        let start = Instant::now();
        let result = self.execute_with_timeout(call).await;
        let elapsed = start.elapsed();

        let sql = truncate_sql(&stmt.sql, self.config.max_logged_sql_length);
        match &result {
            Ok(_) => debug!(
                target: "sqlrepo.sql",
                op = op.as_str(),
                table = R::TABLE,
                sql = %sql,
                param_count = stmt.params.len(),
                elapsed_us = elapsed.as_micros() as u64,
                "statement executed"
            ),
            Err(e) => debug!(
                target: "sqlrepo.sql",
                op = op.as_str(),
                table = R::TABLE,
                sql = %sql,
                param_count = stmt.params.len(),
                elapsed_us = elapsed.as_micros() as u64,
                error = %e,
                "statement failed"
            ),
        }

        if let Some(threshold) = self.config.slow_statement_threshold
            && elapsed > threshold
        {
            warn!(
                target: "sqlrepo.sql",
                op = op.as_str(),
                table = R::TABLE,
                sql = %sql,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = threshold.as_millis() as u64,
                "slow statement"
            );
        }
        result
    }

    /// Run one statement under the configured timeout. On expiry the
    /// statement's own cancel handle fires: a statement still queued for the
    /// connection never starts and a running one is aborted.
    async fn execute_with_timeout<T, F, Fut>(&self, call: F) -> RepoResult<T>
    where
        F: FnOnce(CancelHandle) -> Fut,
        Fut: Future<Output = RepoResult<T>> + Send,
    {
        let cancel = CancelHandle::new();
        let future = call(cancel.clone());
        match self.config.statement_timeout {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => {
                        cancel.cancel();
                        Err(RepoError::Timeout(timeout))
                    }
                }
            }
            None => future.await,
        }
    }
}

impl<R, C> Repository<R, C>
where
    R: Record,
    C: GenericClient + Clone,
{
    /// A copy of this repository with a different statement timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut repo = self.clone();
        repo.config.statement_timeout = Some(timeout);
        repo
    }
}

fn decode_all<R: Record>(rows: &[Row]) -> RepoResult<Vec<R>> {
    rows.iter().map(R::from_row).collect()
}

fn check_key_column<R: Record>() -> RepoResult<()> {
    if R::COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(R::PRIMARY_KEY))
    {
        Ok(())
    } else {
        Err(RepoError::query_build(format!(
            "{}: primary key {:?} is not one of its columns {:?}",
            R::TABLE,
            R::PRIMARY_KEY,
            R::COLUMNS
        )))
    }
}

/// Project `record` and check the projection against the declared columns.
fn checked_projection<R: Record>(record: &R) -> RepoResult<Projection> {
    check_key_column::<R>()?;
    let projection = record.projection();
    if let Some(extra) = projection
        .columns()
        .find(|c| !R::COLUMNS.iter().any(|declared| declared == c))
    {
        return Err(RepoError::query_build(format!(
            "{}: projection has undeclared column {extra:?}",
            R::TABLE
        )));
    }
    Ok(projection)
}

fn take_column<R: Record>(projection: &mut Projection, column: &str) -> RepoResult<Value> {
    projection.remove(column).ok_or_else(|| {
        RepoError::query_build(format!(
            "{}: projection is missing declared column {column:?}",
            R::TABLE
        ))
    })
}

fn key_value<R: Record>(key: &Value) -> RepoResult<Value> {
    if key.is_null() {
        return Err(RepoError::query_build(format!(
            "{}: primary key value must not be NULL",
            R::TABLE
        )));
    }
    Ok(key.clone())
}

/// Truncate `sql` to at most `max` bytes on a char boundary.
fn truncate_sql(sql: &str, max: Option<usize>) -> std::borrow::Cow<'_, str> {
    match max {
        Some(max) if sql.len() > max => {
            let mut end = max;
            while !sql.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &sql[..end]).into()
        }
        _ => sql.into(),
    }
}
