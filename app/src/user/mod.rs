use async_trait::async_trait;
use thiserror::Error;

mod entities;
mod memory;
mod postgres;

pub use entities::{Id, NewUser, User};
pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Error)]
pub enum Error {
    #[error("user #{0} not found")]
    NotFound(Id),
    #[error("user storage failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Capability interface of the storage backends. Everything outside this
/// module is coded only against the trait; the backend is picked at startup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<User>, Error>;

    async fn get_by_id(&self, id: Id) -> Result<User, Error>;

    /// All users whose stored timezone is currently at local hour `hour`.
    async fn get_by_local_time(&self, hour: u32) -> Result<Vec<User>, Error>;

    /// Stores the user and assigns their id.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Full replace, keyed by `user.id`.
    async fn update(&self, user: User) -> Result<User, Error>;

    /// Removes the user, returning their last stored state.
    async fn delete(&self, id: Id) -> Result<User, Error>;
}
