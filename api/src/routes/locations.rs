//! Lookup route for the supported timezone identifiers.

use rocket::{get, serde::json::Json, State};
use rocket_okapi::{openapi, JsonSchema};
use serde::Serialize;

use crate::state::RocketState;

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct LocationsResponse {
    /// Timezone identifiers accepted as a user's location.
    locations: Vec<String>,
}

/// List every timezone identifier a user may live in.
#[openapi(tag = "Locations")]
#[get("/locations")]
pub(super) async fn list(state: &State<RocketState>) -> Json<LocationsResponse> {
    Json(LocationsResponse {
        locations: state.zones.names().map(str::to_owned).collect(),
    })
}
