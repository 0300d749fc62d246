use app::{user::UserStore, worker, zones::ZoneTable};
use std::sync::Arc;

pub struct RocketState {
    pub store: Arc<dyn UserStore>,
    pub zones: Arc<ZoneTable>,
    /// Keeps the recurring emailer alive for the process lifetime; stopping
    /// it takes effect between ticks.
    pub emailer: worker::Handle,
}
