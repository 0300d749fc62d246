//! This module is in charge of migrations, applied by serial number at
//! startup.

use super::{CountRow, Database};

const M0000_INIT: &[&str] = &[
    r#"
    CREATE TABLE users (
        id BIGSERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        birthdate DATE NOT NULL,
        location TEXT NOT NULL
    )"#,
    r#"CREATE INDEX user_location ON users (location)"#,
];

/// Execute all pending migrations on the database.
pub async fn run_migrations(db: &Database) {
    prepare_migrations_table(db).await;
    run_migration(0, M0000_INIT, db).await;
}

async fn prepare_migrations_table(db: &Database) {
    sqlx::query("CREATE TABLE IF NOT EXISTS migrations (serial_number bigint)")
        .execute(db)
        .await
        .unwrap();
}

async fn run_migration(serial_number: i64, sql: &[&str], db: &Database) {
    let row = sqlx::query_as::<_, CountRow>(
        "SELECT COUNT(*) AS count FROM migrations WHERE serial_number = $1",
    )
    .bind(serial_number)
    .fetch_one(db)
    .await
    .unwrap();

    if row.count > 0 {
        return;
    }

    let mut transaction = db.begin().await.unwrap();
    for statement in sql {
        sqlx::query(statement)
            .execute(&mut transaction)
            .await
            .unwrap();
    }
    sqlx::query("INSERT INTO migrations VALUES ($1)")
        .bind(serial_number)
        .execute(&mut transaction)
        .await
        .unwrap();
    transaction.commit().await.unwrap();
}
