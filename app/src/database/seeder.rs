use super::{CountRow, Database, Transaction};
use chrono::Utc;

/// Insert a couple of users for local development. No-op once the table has
/// rows.
pub async fn seed_development_data(db: &Database) {
    let row = sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS count FROM users")
        .fetch_one(db)
        .await
        .unwrap();
    if row.count > 0 {
        return;
    }

    let mut data_tx = db.begin().await.unwrap();
    seed_test_user(&mut data_tx, "John", "Doe", "Australia/Melbourne").await;
    seed_test_user(&mut data_tx, "Jane", "Roe", "Europe/London").await;
    data_tx.commit().await.unwrap();
}

async fn seed_test_user(data_tx: &mut Transaction, first_name: &str, last_name: &str, location: &str) {
    sqlx::query("INSERT INTO users (first_name, last_name, birthdate, location) VALUES ($1, $2, $3, $4)")
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now().date_naive())
        .bind(location)
        .execute(&mut *data_tx)
        .await
        .unwrap();
}
