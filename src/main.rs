use std::sync::Arc;

use app::database::{self, run_migrations, seed_development_data};
use app::email::{self, Dispatcher};
use app::notifier::HttpNotifier;
use app::user::{InMemoryUserStore, PgUserStore, UserStore};
use app::zones::ZoneTable;
use rocket::{launch, Build, Rocket};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct Config {
    storage: StorageConfig,
    emailer: EmailerConfig,
}

#[derive(Debug, Deserialize)]
struct StorageConfig {
    backend: Backend,
    database_url: Option<Url>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Backend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
struct EmailerConfig {
    service_url: Url,
    #[serde(default = "default_birthday_hour")]
    birthday_hour: u32,
}

fn default_birthday_hour() -> u32 {
    email::DEFAULT_BIRTHDAY_HOUR
}

fn check_birthday_hour(hour: u32) -> u32 {
    assert!(hour < 24, "emailer.birthday_hour must be between 0 and 23");
    hour
}

#[launch]
async fn rocket() -> _ {
    start_server().await
}

async fn start_server() -> Rocket<Build> {
    env_logger::init();

    let rocket = Rocket::build();
    let config: Config = rocket.figment().extract().unwrap();
    let birthday_hour = check_birthday_hour(config.emailer.birthday_hour);

    let zones = Arc::new(ZoneTable::new());

    log::info!(
        "starting with the {:?} storage backend, greeting at local hour {}",
        config.storage.backend,
        birthday_hour
    );

    let store: Arc<dyn UserStore> = match config.storage.backend {
        Backend::Memory => Arc::new(InMemoryUserStore::new(zones.clone())),
        Backend::Postgres => {
            let url = config
                .storage
                .database_url
                .expect("storage.database_url is required for the postgres backend");
            let db = database::connect(&url).await;
            run_migrations(&db).await;
            #[cfg(debug_assertions)]
            seed_development_data(&db).await;
            Arc::new(PgUserStore::new(db))
        }
    };

    let notifier = Arc::new(HttpNotifier::new(config.emailer.service_url));
    let dispatcher = Dispatcher::new(store.clone(), zones.clone(), notifier, birthday_hour);
    let emailer = email::start_worker(dispatcher);

    api::register(rocket, store, zones, emailer)
}
