//! End-to-end CRUD against an in-memory SQLite database.

use sqlrepo::{
    ConstraintKind, FromRow, Placeholder, Record, RepoResult, Repository, RepositoryConfig,
    SqliteClient, Value,
};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, FromRow, Record)]
#[record(table = "persons")]
struct Person {
    #[record(id)]
    id: i64,
    name: String,
}

/// Same table, key left to the database.
#[derive(Debug, Clone, PartialEq, FromRow, Record)]
#[record(table = "persons")]
struct NewPerson {
    #[record(id)]
    id: Option<i64>,
    name: String,
}

fn person(id: i64, name: &str) -> Person {
    Person {
        id,
        name: name.to_string(),
    }
}

async fn setup() -> RepoResult<SqliteClient> {
    let db = SqliteClient::open_in_memory()?;
    db.execute_batch("CREATE TABLE persons (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
        .await?;
    Ok(db)
}

#[tokio::test]
async fn create_with_generated_key_then_get() -> RepoResult<()> {
    let db = setup().await?;
    let drafts = Repository::<NewPerson, _>::new(&db, Placeholder::Question);
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);

    drafts
        .create(&NewPerson {
            id: None,
            name: "Joe".into(),
        })
        .await?;

    assert_eq!(persons.get(1_i64).await?, person(1, "Joe"));
    Ok(())
}

#[tokio::test]
async fn get_all_returns_every_row() -> RepoResult<()> {
    let db = setup().await?;
    let drafts = Repository::<NewPerson, _>::new(&db, Placeholder::Question);
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);

    let names = ["Joe", "Mary", "John", "Jane", "Bob"];
    for name in names {
        drafts
            .create(&NewPerson {
                id: None,
                name: name.into(),
            })
            .await?;
    }

    let all = persons.get_all().await?;
    assert_eq!(all.len(), names.len());
    let stored: BTreeSet<String> = all.into_iter().map(|p| p.name).collect();
    let expected: BTreeSet<String> = names.iter().map(|n| n.to_string()).collect();
    assert_eq!(stored, expected);
    Ok(())
}

/// Only a generated key column.
#[derive(Debug, Clone, PartialEq, FromRow, Record)]
#[record(table = "tickets")]
struct Ticket {
    #[record(id)]
    id: Option<i64>,
}

#[tokio::test]
async fn create_with_only_generated_key_uses_default_values() -> RepoResult<()> {
    let db = SqliteClient::open_in_memory()?;
    db.execute_batch("CREATE TABLE tickets (id INTEGER PRIMARY KEY AUTOINCREMENT)")
        .await?;
    let tickets = Repository::<Ticket, _>::new(&db, Placeholder::Question);

    tickets.create(&Ticket { id: None }).await?;
    tickets.create(&Ticket { id: None }).await?;

    let mut ids: Vec<Option<i64>> = tickets.get_all().await?.into_iter().map(|t| t.id).collect();
    ids.sort();
    assert_eq!(ids, [Some(1), Some(2)]);
    Ok(())
}

#[tokio::test]
async fn update_overwrites_non_key_columns_of_target_only() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    persons.create(&person(1, "Joe")).await?;
    persons.create(&person(2, "Mary")).await?;

    // The record's own id is zero; the row is chosen by the key argument.
    let affected = persons.update(1_i64, &person(0, "foo")).await?;

    assert_eq!(affected, 1);
    assert_eq!(persons.get(1_i64).await?, person(1, "foo"));
    assert_eq!(persons.get(2_i64).await?, person(2, "Mary"));
    assert!(persons.get(0_i64).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn delete_then_get_is_not_found() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    persons.create(&person(1, "Joe")).await?;
    persons.create(&person(2, "Bob")).await?;

    assert_eq!(persons.delete(1_i64).await?, 1);

    let err = persons.get(1_i64).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(persons.get_all().await?, vec![person(2, "Bob")]);
    Ok(())
}

#[tokio::test]
async fn unknown_key_is_not_found_not_execution_error() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);

    let err = persons.get(999_999_i64).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_execution());
    Ok(())
}

#[tokio::test]
async fn missing_keys_are_no_ops_for_update_and_delete() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    persons.create(&person(1, "Jane")).await?;

    assert_eq!(persons.update(42_i64, &person(0, "ghost")).await?, 0);
    assert_eq!(persons.delete(42_i64).await?, 0);
    assert_eq!(persons.get_all().await?, vec![person(1, "Jane")]);
    Ok(())
}

#[tokio::test]
async fn every_placeholder_style_runs_on_sqlite() -> RepoResult<()> {
    let db = setup().await?;

    for (i, placeholder) in Placeholder::ALL.into_iter().enumerate() {
        let persons = Repository::<Person, _>::new(&db, placeholder);
        let id = i as i64 + 1;

        persons.create(&person(id, "Joe")).await?;
        persons.update(id, &person(0, placeholder.name())).await?;
        assert_eq!(persons.get(id).await?, person(id, placeholder.name()));
        assert_eq!(persons.find_by("name", placeholder.name()).await?.len(), 1);
        assert_eq!(persons.delete(id).await?, 1);
    }
    assert!(Repository::<Person, _>::new(&db, Placeholder::Dollar)
        .get_all()
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn find_by_filters_on_declared_column() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    for p in [person(1, "Joe"), person(2, "Mary"), person(3, "Joe")] {
        persons.create(&p).await?;
    }

    let mut joes = persons.find_by("name", "Joe").await?;
    joes.sort_by_key(|p| p.id);

    assert_eq!(joes, vec![person(1, "Joe"), person(3, "Joe")]);
    assert!(persons.find_by("nickname", "Joe").await.unwrap_err().is_query_build());
    Ok(())
}

#[tokio::test]
async fn duplicate_key_surfaces_as_execution_error() -> RepoResult<()> {
    let db = setup().await?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    persons.create(&person(1, "Joe")).await?;

    let err = persons.create(&person(1, "Mary")).await.unwrap_err();

    assert!(err.is_execution());
    assert_eq!(err.constraint_violation(), Some(ConstraintKind::Unique));
    Ok(())
}

#[tokio::test]
async fn missing_table_is_execution_error() -> RepoResult<()> {
    let db = SqliteClient::open_in_memory()?;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);

    assert!(persons.create(&person(1, "Joe")).await.unwrap_err().is_execution());
    assert!(persons.get_all().await.unwrap_err().is_execution());
    Ok(())
}

#[tokio::test]
async fn null_in_non_optional_field_is_decode_error() -> RepoResult<()> {
    let db = setup().await?;
    let drafts = Repository::<NewPerson, _>::new(&db, Placeholder::Question);
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    db.execute_batch("INSERT INTO persons (id, name) VALUES (1, NULL)")
        .await?;

    let err = persons.get(1_i64).await.unwrap_err();
    assert!(matches!(err, sqlrepo::RepoError::Decode { ref column, .. } if column == "name"));

    // The draft type has the same column as non-optional text, so it fails too.
    assert!(drafts.get(1_i64).await.is_err());
    Ok(())
}

#[derive(Debug, FromRow, Record)]
#[record(table = "endless")]
#[allow(dead_code)]
struct Tick {
    #[record(id)]
    id: i64,
    name: String,
}

#[tokio::test]
async fn timeout_interrupts_running_statement() -> RepoResult<()> {
    let db = setup().await?;
    db.execute_batch(
        "CREATE VIEW endless AS \
         WITH RECURSIVE c(id) AS (SELECT 1 UNION ALL SELECT id + 1 FROM c) \
         SELECT id, 'tick' AS name FROM c WHERE id < 0",
    )
    .await?;

    let config = RepositoryConfig::for_sqlite().with_statement_timeout(Duration::from_millis(100));
    let ticks = Repository::<Tick, _>::with_config(&db, config);

    let err = ticks.get_all().await.unwrap_err();
    assert!(err.is_timeout());

    // The interrupted statement releases the connection.
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    let after = tokio::time::timeout(Duration::from_secs(5), persons.get_all())
        .await
        .map_err(|_| sqlrepo::RepoError::Timeout(Duration::from_secs(5)))??;
    assert!(after.is_empty());
    Ok(())
}

#[tokio::test]
async fn timeout_only_cancels_its_own_statement() -> RepoResult<()> {
    let db = setup().await?;
    db.execute_batch(
        "CREATE VIEW endless AS \
         WITH RECURSIVE c(id) AS (SELECT 1 UNION ALL SELECT id + 1 FROM c) \
         SELECT id, 'tick' AS name FROM c WHERE id < 0",
    )
    .await?;

    // Holds the shared connection until its own, longer timeout.
    let ticks = Repository::<Tick, _>::new(db.clone(), Placeholder::Question)
        .with_timeout(Duration::from_millis(1000));
    let started = Instant::now();
    let long_running = tokio::spawn(async move { ticks.get_all().await });
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Queued behind it on the same connection, times out first.
    let persons = Repository::<Person, _>::new(db.clone(), Placeholder::Question)
        .with_timeout(Duration::from_millis(20));
    let err = persons.create(&person(1, "Joe")).await.unwrap_err();
    assert!(err.is_timeout());

    let other = tokio::time::timeout(Duration::from_secs(5), long_running)
        .await
        .expect("long-running statement did not finish")
        .expect("task panicked")
        .unwrap_err();
    assert!(other.is_timeout(), "expected its own timeout, got {other}");
    assert!(started.elapsed() >= Duration::from_millis(900));

    // The timed-out insert never ran, not even once the connection freed up.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let persons = Repository::<Person, _>::new(&db, Placeholder::Question);
    assert!(persons.get(1_i64).await.unwrap_err().is_not_found());
    assert!(persons.get_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn file_database_persists_across_handles() -> RepoResult<()> {
    let path = std::env::temp_dir().join(format!("sqlrepo-test-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);

    {
        let db = SqliteClient::open(&path)?;
        db.execute_batch("CREATE TABLE persons (id INTEGER PRIMARY KEY, name TEXT)")
            .await?;
        Repository::<Person, _>::new(&db, Placeholder::Question)
            .create(&person(7, "Jane"))
            .await?;
    }

    let db = SqliteClient::open(&path)?;
    let found = Repository::<Person, _>::new(&db, Placeholder::Question)
        .get(Value::Int(7))
        .await?;
    assert_eq!(found, person(7, "Jane"));

    drop(db);
    let _ = std::fs::remove_file(&path);
    Ok(())
}
