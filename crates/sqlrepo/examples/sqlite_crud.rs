//! Walk through create / get / update / delete on an in-memory SQLite table.
//!
//! Run with:
//!   RUST_LOG=sqlrepo.sql=debug cargo run --example sqlite_crud -p sqlrepo

use sqlrepo::{FromRow, Placeholder, Record, RepoError, Repository, SqliteClient};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, FromRow, Record)]
#[record(table = "persons")]
struct Person {
    #[record(id)]
    id: Option<i64>,
    name: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), RepoError> {
    init_tracing();

    let db = SqliteClient::open_in_memory()?;
    db.execute_batch("CREATE TABLE persons (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
        .await?;

    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);

    for name in ["Joe", "Mary", "John"] {
        persons
            .create(&Person {
                id: None,
                name: name.to_string(),
            })
            .await?;
    }
    println!("all: {:?}", persons.get_all().await?);

    persons
        .update(
            1_i64,
            &Person {
                id: None,
                name: "Joseph".into(),
            },
        )
        .await?;
    println!("updated: {:?}", persons.get(1_i64).await?);

    persons.delete(2_i64).await?;
    match persons.get(2_i64).await {
        Err(e) if e.is_not_found() => println!("deleted: {e}"),
        other => println!("unexpected: {other:?}"),
    }

    Ok(())
}
