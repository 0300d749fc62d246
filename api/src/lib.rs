//! This library contains definitions for the API layer.

use app::{user::UserStore, worker, zones::ZoneTable};
use rocket::{Build, Rocket};
use state::RocketState;
use std::sync::Arc;

mod error;
mod routes;
mod state;

pub fn register(
    rocket: Rocket<Build>,
    store: Arc<dyn UserStore>,
    zones: Arc<ZoneTable>,
    emailer: worker::Handle,
) -> Rocket<Build> {
    routes::register(
        rocket,
        RocketState {
            store,
            zones,
            emailer,
        },
    )
}
