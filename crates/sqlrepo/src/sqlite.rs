//! SQLite backend built on `rusqlite`.

use crate::client::{CancelHandle, GenericClient};
use crate::error::{RepoError, RepoResult};
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use std::fmt;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

/// VM instructions between checks of a statement's cancel flag.
const CANCEL_CHECK_OPS: i32 = 1000;

/// A shared SQLite connection usable as a [`GenericClient`].
///
/// Statements run on tokio's blocking pool, one at a time per connection.
/// Clones share the same connection. Cancelling a statement only affects
/// that statement, never another caller's statement on the same connection.
#[derive(Clone)]
pub struct SqliteClient {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteClient {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| RepoError::Connection(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| RepoError::Connection(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a batch of semicolon-separated statements without parameters,
    /// e.g. schema setup.
    pub async fn execute_batch(&self, sql: &str) -> RepoResult<()> {
        let sql = sql.to_string();
        self.with_conn(None, move |conn| Ok(conn.execute_batch(&sql)?))
            .await
    }

    /// Run `f` on the connection from the blocking pool.
    ///
    /// With a `cancel` handle, `f` is skipped if the handle fired while the
    /// call waited for the connection, and a running statement is aborted
    /// with `SQLITE_INTERRUPT` once it fires.
    async fn with_conn<T, F>(&self, cancel: Option<CancelHandle>, f: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| RepoError::Connection("sqlite connection lock poisoned".into()))?;
            let Some(cancel) = cancel else {
                return f(&guard);
            };

            cancel.check()?;
            let flag = cancel.flag();
            guard.progress_handler(
                CANCEL_CHECK_OPS,
                Some(move || flag.load(Ordering::SeqCst)),
            );
            let result = f(&guard);
            guard.progress_handler(0, None::<fn() -> bool>);
            result
        })
        .await
        .map_err(RepoError::execution)?
    }
}

fn query_rows(conn: &Connection, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            values.push(from_value_ref(name, row.get_ref(idx)?)?);
        }
        out.push(Row::new(Arc::clone(&columns), values));
    }
    Ok(out)
}

fn execute_statement(conn: &Connection, sql: &str, params: &[Value]) -> RepoResult<u64> {
    let mut stmt = conn.prepare_cached(sql)?;
    let affected = stmt.execute(params_from_iter(params.iter()))?;
    Ok(affected as u64)
}

impl fmt::Debug for SqliteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteClient").finish_non_exhaustive()
    }
}

impl GenericClient for SqliteClient {
    async fn query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(None, move |conn| query_rows(conn, &sql, &params))
            .await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RepoResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(None, move |conn| execute_statement(conn, &sql, &params))
            .await
    }

    async fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<Vec<Row>> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(Some(cancel), move |conn| query_rows(conn, &sql, &params))
            .await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<u64> {
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(Some(cancel), move |conn| execute_statement(conn, &sql, &params))
            .await
    }
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Bool(v) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*v))),
            Value::Int(v) => ToSqlOutput::Owned(SqliteValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqliteValue::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
            Value::Json(v) => ToSqlOutput::Owned(SqliteValue::Text(v.to_string())),
            Value::Uuid(v) => ToSqlOutput::Owned(SqliteValue::Text(v.hyphenated().to_string())),
            Value::Date(v) => ToSqlOutput::Owned(SqliteValue::Text(v.format("%Y-%m-%d").to_string())),
            Value::Timestamp(v) => ToSqlOutput::Owned(SqliteValue::Text(
                v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            )),
            Value::TimestampTz(v) => ToSqlOutput::Owned(SqliteValue::Text(v.to_rfc3339())),
        })
    }
}

fn from_value_ref(column: &str, value: ValueRef<'_>) -> RepoResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(e) => return Err(RepoError::decode(column, format!("invalid utf-8 text: {e}"))),
        },
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}
