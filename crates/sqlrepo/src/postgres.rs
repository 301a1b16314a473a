//! Postgres backend: [`GenericClient`] for `tokio-postgres` handles.
//!
//! [`Value`] binds to any parameter type the server infers; integers and
//! floats are narrowed to the column width at bind time. Result columns are
//! decoded by their Postgres type name.

use crate::client::{CancelHandle, GenericClient};
use crate::error::{RepoError, RepoResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{NoTls, Row as PgRow};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match ty.name() {
                "int2" => i16::try_from(*v)?.to_sql_checked(ty, out),
                "int4" => i32::try_from(*v)?.to_sql_checked(ty, out),
                "oid" => u32::try_from(*v)?.to_sql_checked(ty, out),
                "float4" => (*v as f32).to_sql_checked(ty, out),
                "float8" => (*v as f64).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql_checked(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Connect without TLS and drive the connection on a background task.
///
/// Connection errors after the handshake are logged under the `sqlrepo`
/// target; the returned client then fails every subsequent call.
pub async fn connect(database_url: &str) -> RepoResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| RepoError::Connection(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "sqlrepo", error = %e, "postgres connection closed with error");
        }
    });
    Ok(client)
}

fn bind_params(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

async fn pg_query<C>(client: &C, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>>
where
    C: tokio_postgres::GenericClient + Sync,
{
    let rows = client.query(sql, &bind_params(params)).await?;
    decode_rows(&rows)
}

async fn pg_execute<C>(client: &C, sql: &str, params: &[Value]) -> RepoResult<u64>
where
    C: tokio_postgres::GenericClient + Sync,
{
    Ok(client.execute(sql, &bind_params(params)).await?)
}

fn decode_rows(rows: &[PgRow]) -> RepoResult<Vec<Row>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    rows.iter()
        .map(|row| {
            let values = (0..row.len())
                .map(|idx| decode_column(row, idx))
                .collect::<RepoResult<Vec<_>>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

fn decode_column(row: &PgRow, idx: usize) -> RepoResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    fn get<'a, T>(row: &'a PgRow, idx: usize) -> RepoResult<Option<T>>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx).map_err(|e| {
            let name = row.columns()[idx].name();
            RepoError::decode(name, e.to_string())
        })
    }

    let value = match ty.name() {
        "bool" => get::<bool>(row, idx)?.map(Value::Bool),
        "int2" => get::<i16>(row, idx)?.map(Value::from),
        "int4" => get::<i32>(row, idx)?.map(Value::from),
        "int8" => get::<i64>(row, idx)?.map(Value::Int),
        "oid" => get::<u32>(row, idx)?.map(Value::from),
        "float4" => get::<f32>(row, idx)?.map(Value::from),
        "float8" => get::<f64>(row, idx)?.map(Value::Float),
        "text" | "varchar" | "bpchar" | "name" | "unknown" | "citext" => {
            get::<String>(row, idx)?.map(Value::Text)
        }
        "bytea" => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        "json" | "jsonb" => get::<serde_json::Value>(row, idx)?.map(Value::Json),
        "uuid" => get::<uuid::Uuid>(row, idx)?.map(Value::Uuid),
        "date" => get::<chrono::NaiveDate>(row, idx)?.map(Value::Date),
        "timestamp" => get::<chrono::NaiveDateTime>(row, idx)?.map(Value::Timestamp),
        "timestamptz" => {
            get::<chrono::DateTime<chrono::Utc>>(row, idx)?.map(Value::TimestampTz)
        }
        other => {
            return Err(RepoError::decode(
                column.name(),
                format!("unsupported postgres type {other}"),
            ));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Cancel requests go to the connection's server process and abort
/// whatever it runs at that moment, see [`CancelHandle`].
impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
        pg_query(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RepoResult<u64> {
        pg_execute(self, sql, params).await
    }

    async fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<Vec<Row>> {
        let _armed = cancel.arm(self.cancel_token())?;
        pg_query(self, sql, params).await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<u64> {
        let _armed = cancel.arm(self.cancel_token())?;
        pg_execute(self, sql, params).await
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
        pg_query(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RepoResult<u64> {
        pg_execute(self, sql, params).await
    }

    async fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<Vec<Row>> {
        let _armed = cancel.arm(tokio_postgres::Transaction::cancel_token(self))?;
        pg_query(self, sql, params).await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<u64> {
        let _armed = cancel.arm(tokio_postgres::Transaction::cancel_token(self))?;
        pg_execute(self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        pg_query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RepoResult<u64> {
        let client: &tokio_postgres::Client = self;
        pg_execute(client, sql, params).await
    }

    async fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<Vec<Row>> {
        let client: &tokio_postgres::Client = self;
        GenericClient::query_cancellable(client, sql, params, cancel).await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<u64> {
        let client: &tokio_postgres::Client = self;
        GenericClient::execute_cancellable(client, sql, params, cancel).await
    }
}

/// Each call checks out a connection for the duration of one statement, so
/// a cancel reaches only that statement.
#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Pool {
    async fn query(&self, sql: &str, params: &[Value]) -> RepoResult<Vec<Row>> {
        let client = self.get().await?;
        let client: &tokio_postgres::Client = &client;
        pg_query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> RepoResult<u64> {
        let client = self.get().await?;
        let client: &tokio_postgres::Client = &client;
        pg_execute(client, sql, params).await
    }

    async fn query_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<Vec<Row>> {
        let client = self.get().await?;
        let client: &tokio_postgres::Client = &client;
        GenericClient::query_cancellable(client, sql, params, cancel).await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        params: &[Value],
        cancel: CancelHandle,
    ) -> RepoResult<u64> {
        let client = self.get().await?;
        let client: &tokio_postgres::Client = &client;
        GenericClient::execute_cancellable(client, sql, params, cancel).await
    }
}
