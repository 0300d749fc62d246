//! Status of the recurring birthday emailer job.

use rocket::{get, serde::json::Json, State};
use rocket_okapi::{openapi, JsonSchema};
use serde::Serialize;

use crate::state::RocketState;

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct EmailerResponse {
    emailer: EmailerModel,
}

#[derive(Debug, Serialize, JsonSchema)]
struct EmailerModel {
    /// Name of the recurring job.
    name: String,
    /// False once the job has been stopped and its last tick has finished.
    active: bool,
}

/// Report whether the birthday emailer is still scheduled.
#[openapi(tag = "Emailer")]
#[get("/emailer")]
pub(super) async fn get(state: &State<RocketState>) -> Json<EmailerResponse> {
    Json(EmailerResponse {
        emailer: EmailerModel {
            name: state.emailer.name().to_owned(),
            active: state.emailer.is_active(),
        },
    })
}
