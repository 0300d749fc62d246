use super::{Error, Id, NewUser, User, UserStore};
use crate::database::Database;
use async_trait::async_trait;

/// Relational store. The schema lives in
/// [`database::run_migrations`](crate::database::run_migrations).
pub struct PgUserStore {
    db: Database,
}

impl PgUserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_all(&self) -> Result<Vec<User>, Error> {
        queries::get_all(&self.db).await
    }

    async fn get_by_id(&self, id: Id) -> Result<User, Error> {
        queries::get_by_id(&self.db, id).await
    }

    async fn get_by_local_time(&self, hour: u32) -> Result<Vec<User>, Error> {
        queries::get_by_local_time(&self.db, hour).await
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        queries::create(&self.db, user).await
    }

    async fn update(&self, user: User) -> Result<User, Error> {
        queries::update(&self.db, user).await
    }

    async fn delete(&self, id: Id) -> Result<User, Error> {
        queries::delete(&self.db, id).await
    }
}

mod queries {
    use super::{Error, Id, NewUser, User};
    use crate::database::Database;
    use chrono::NaiveDate;
    use const_format::formatcp;

    const COLUMNS: &str = "id, first_name, last_name, birthdate, location";

    pub(super) async fn get_all(db: &Database) -> Result<Vec<User>, Error> {
        Ok(
            sqlx::query_as::<_, UserRow>(formatcp!("SELECT {} FROM users ORDER BY id", COLUMNS))
                .fetch_all(db)
                .await?
                .into_iter()
                .map(UserRow::into_entity)
                .collect(),
        )
    }

    pub(super) async fn get_by_id(db: &Database, id: Id) -> Result<User, Error> {
        sqlx::query_as::<_, UserRow>(formatcp!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id.0)
            .fetch_optional(db)
            .await?
            .map(UserRow::into_entity)
            .ok_or(Error::NotFound(id))
    }

    pub(super) async fn get_by_local_time(db: &Database, hour: u32) -> Result<Vec<User>, Error> {
        // The database resolves the zone names; they come from the same IANA
        // data the ZoneTable is built on.
        Ok(sqlx::query_as::<_, UserRow>(formatcp!(
            "SELECT {} FROM users WHERE CAST(EXTRACT(HOUR FROM NOW() AT TIME ZONE location) AS INT) = $1 ORDER BY id",
            COLUMNS
        ))
        .bind(hour as i32)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(UserRow::into_entity)
        .collect())
    }

    pub(super) async fn create(db: &Database, user: NewUser) -> Result<User, Error> {
        Ok(sqlx::query_as::<_, UserRow>(formatcp!(
            "INSERT INTO users (first_name, last_name, birthdate, location) VALUES ($1, $2, $3, $4) RETURNING {}",
            COLUMNS
        ))
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.birthdate)
        .bind(user.location)
        .fetch_one(db)
        .await?
        .into_entity())
    }

    pub(super) async fn update(db: &Database, user: User) -> Result<User, Error> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "UPDATE users SET first_name = $2, last_name = $3, birthdate = $4, location = $5 WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(user.id.0)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.birthdate)
        .bind(user.location)
        .fetch_optional(db)
        .await?
        .map(UserRow::into_entity)
        .ok_or(Error::NotFound(user.id))
    }

    pub(super) async fn delete(db: &Database, id: Id) -> Result<User, Error> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "DELETE FROM users WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .map(UserRow::into_entity)
        .ok_or(Error::NotFound(id))
    }

    #[derive(sqlx::FromRow, Debug)]
    struct UserRow {
        id: i64,
        first_name: String,
        last_name: String,
        birthdate: NaiveDate,
        location: String,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: Id(self.id),
                first_name: self.first_name,
                last_name: self.last_name,
                birthdate: self.birthdate,
                location: self.location,
            }
        }
    }
}
