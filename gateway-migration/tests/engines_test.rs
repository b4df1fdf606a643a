//! Round trips against real PostgreSQL and MySQL servers. Each test returns
//! early unless `POSTGRES_URL` or `MYSQL_URL` points at a scratch database.

use gateway_migration::{
    Actions, BoxFuture, Cell, Column, Database, Error, LATEST, Migration, Result, Script, SqlType, bootstrap_script,
    cells,
};
use sqlx::Row;

fn create_users(a: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        a.create_table(
            "mig_users",
            &[
                Column::new("id", SqlType::BIGINT).primary_key().auto_increment().into(),
                Column::new("name", SqlType::varchar(50)).not_null().into(),
                Column::new("local_dir", SqlType::varchar(255)).not_null().default_value("").into(),
                Column::new("remote_dir", SqlType::varchar(255)).not_null().default_value("").into(),
            ],
        )
        .await?;

        let alice = cells([
            ("name", Cell::new(SqlType::varchar(50), "Alice")),
            ("local_dir", Cell::new(SqlType::varchar(255), "out")),
            ("remote_dir", Cell::new(SqlType::varchar(255), "in")),
        ]);
        a.add_row("mig_users", &alice).await
    })
}

fn drop_users(a: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move { a.drop_table("mig_users").await })
}

fn evolve_users(a: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        a.swap_columns("mig_users", "local_dir", "remote_dir", "").await?;
        a.change_column_type("mig_users", "name", &SqlType::varchar(50), &SqlType::TEXT).await?;
        a.rename_column("mig_users", "name", "username").await
    })
}

fn unevolve_users(a: &mut Actions) -> BoxFuture<'_, Result<()>> {
    Box::pin(async move {
        a.rename_column("mig_users", "username", "name").await?;
        a.swap_columns("mig_users", "local_dir", "remote_dir", "").await
    })
}

static MIGRATIONS: &[Migration] = &[
    Migration::new("create the version table", bootstrap_script()).tagged("0.0.0"),
    Migration::new("create the users table", Script { up: create_users, down: drop_users }).tagged("0.1.0"),
    Migration::new("evolve the users table", Script { up: evolve_users, down: unevolve_users }).tagged("0.2.0"),
];

async fn round_trip(url: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::connect(url).await?;
    let dialect = db.dialect().name();

    db.migrator(MIGRATIONS).migrate_to(LATEST).await?;
    let row = sqlx::query("SELECT id, username, local_dir, remote_dir FROM mig_users").fetch_one(db.pool()).await?;
    let id: i64 = row.try_get(0)?;
    let username: String = row.try_get(1)?;
    let local: String = row.try_get(2)?;
    let remote: String = row.try_get(3)?;
    assert_eq!((id, username.as_str(), local.as_str(), remote.as_str()), (1, "Alice", "in", "out"), "{dialect}");

    db.migrator(MIGRATIONS).migrate_to("0.0.0").await?;
    assert!(!db.table_exists("mig_users").await?, "{dialect}");

    db.migrator(MIGRATIONS).downgrade(&MIGRATIONS[..1]).await?;
    assert!(!db.table_exists("version").await?, "{dialect}");
    Ok(())
}

#[tokio::test]
async fn test_postgres_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let Ok(url) = std::env::var("POSTGRES_URL") else {
        return Ok(());
    };
    round_trip(&url).await
}

#[tokio::test]
async fn test_mysql_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let Ok(url) = std::env::var("MYSQL_URL") else {
        return Ok(());
    };
    round_trip(&url).await
}

#[tokio::test]
async fn test_unknown_scheme() {
    let err = Database::connect("oracle://localhost/gateway").await.unwrap_err();
    assert!(matches!(err, Error::UnknownDialect(s) if s == "oracle"));
}
