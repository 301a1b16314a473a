//! CRUD against a live Postgres. Skipped unless `DATABASE_URL` is set
//! (read from the environment or a `.env` file).

use sqlrepo::{
    ConstraintKind, FromRow, Record, RepoResult, Repository, RepositoryConfig, postgres,
};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, FromRow, Record)]
#[record(table = "sqlrepo_test_persons")]
struct Person {
    #[record(id)]
    id: i64,
    name: String,
    nickname: Option<String>,
}

fn database_url() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").ok()
}

fn unique_id() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    (nanos % 1_000_000_000_000) as i64
}

#[tokio::test]
async fn postgres_crud_roundtrip() -> RepoResult<()> {
    let Some(database_url) = database_url() else {
        eprintln!("DATABASE_URL is not set; skipping postgres_crud_roundtrip");
        return Ok(());
    };

    let client = postgres::connect(&database_url).await?;
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS sqlrepo_test_persons (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                nickname TEXT
            )",
        )
        .await?;

    let persons = Repository::<Person, _>::with_config(&client, RepositoryConfig::for_postgres());
    let id = unique_id();
    let joe = Person {
        id,
        name: "Joe".into(),
        nickname: None,
    };

    persons.create(&joe).await?;
    assert_eq!(persons.get(id).await?, joe);

    let dup = persons.create(&joe).await.unwrap_err();
    assert_eq!(dup.constraint_violation(), Some(ConstraintKind::Unique));

    let changed = Person {
        id: 0,
        name: "foo".into(),
        nickname: Some("f".into()),
    };
    assert_eq!(persons.update(id, &changed).await?, 1);
    let updated = persons.get(id).await?;
    assert_eq!(updated.id, id);
    assert_eq!(updated.name, "foo");
    assert_eq!(updated.nickname.as_deref(), Some("f"));

    assert!(persons.get_all().await?.iter().any(|p| p.id == id));
    assert_eq!(persons.find_by("nickname", "f").await?.iter().filter(|p| p.id == id).count(), 1);

    assert_eq!(persons.delete(id).await?, 1);
    assert!(persons.get(id).await.unwrap_err().is_not_found());
    assert_eq!(persons.delete(id).await?, 0);
    Ok(())
}

#[cfg(feature = "pool")]
#[tokio::test]
async fn pool_is_a_repository_handle() -> RepoResult<()> {
    let Some(database_url) = database_url() else {
        eprintln!("DATABASE_URL is not set; skipping pool_is_a_repository_handle");
        return Ok(());
    };

    let pool = sqlrepo::create_pool(&database_url)?;
    let client = pool.get().await?;
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS sqlrepo_test_persons (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                nickname TEXT
            )",
        )
        .await?;
    drop(client);

    let persons = Repository::<Person, _>::with_config(pool, RepositoryConfig::for_postgres());
    let id = unique_id() + 1;
    let mary = Person {
        id,
        name: "Mary".into(),
        nickname: None,
    };
    persons.create(&mary).await?;
    assert_eq!(persons.get(id).await?, mary);
    assert_eq!(persons.delete(id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn transaction_is_a_repository_handle() -> RepoResult<()> {
    let Some(database_url) = database_url() else {
        eprintln!("DATABASE_URL is not set; skipping transaction_is_a_repository_handle");
        return Ok(());
    };

    let mut client = postgres::connect(&database_url).await?;
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS sqlrepo_test_persons (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                nickname TEXT
            )",
        )
        .await?;

    let id = unique_id() + 2;
    let tx = client.transaction().await?;
    {
        let persons = Repository::<Person, _>::with_config(&tx, RepositoryConfig::for_postgres());
        persons
            .create(&Person {
                id,
                name: "John".into(),
                nickname: None,
            })
            .await?;
        assert_eq!(persons.get(id).await?.name, "John");
    }
    tx.rollback().await?;

    let persons = Repository::<Person, _>::with_config(&client, RepositoryConfig::for_postgres());
    assert!(persons.get(id).await.unwrap_err().is_not_found());
    Ok(())
}
