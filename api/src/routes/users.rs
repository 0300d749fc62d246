//! CRUD routes for users.

use chrono::NaiveDate;
use rocket::{delete, get, post, put, serde::json::Json, State};
use rocket_okapi::{openapi, JsonSchema};
use serde::{Deserialize, Serialize};

use app::user::{self, NewUser};
use app::zones::ZoneTable;

use crate::{
    error::{self, JsonError, JsonResult},
    state::RocketState,
};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct UserRequest {
    /// Given name. Must not be empty.
    first_name: String,
    /// Family name. Must not be empty.
    last_name: String,
    /// Date of birth as YYYY-MM-DD.
    birthday: String,
    /// A timezone identifier from `GET /locations`.
    location: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct UserModel {
    id: i64,
    first_name: String,
    last_name: String,
    /// Date of birth as YYYY-MM-DD.
    birthday: String,
    /// The user's timezone identifier.
    location: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserResponse {
    user: UserModel,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UsersResponse {
    users: Vec<UserModel>,
}

#[derive(Debug, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// First or last name was empty.
    EmptyName,
    /// Birthday was not a YYYY-MM-DD calendar date.
    InvalidBirthday,
    /// Location is not a supported timezone identifier.
    UnknownLocation,
    /// No user with the requested id.
    UserNotFound,
    /// The storage backend failed.
    StorageFailure,
}

impl UserModel {
    fn from_entity(user: &user::User) -> Self {
        Self {
            id: user.id.0,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birthday: user.birthdate.format("%Y-%m-%d").to_string(),
            location: user.location.clone(),
        }
    }
}

impl UserRequest {
    fn validate(&self, zones: &ZoneTable) -> Result<NewUser, Error> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(Error::EmptyName);
        }
        let birthdate = NaiveDate::parse_from_str(&self.birthday, "%Y-%m-%d")
            .map_err(|_| Error::InvalidBirthday)?;
        if !zones.contains(&self.location) {
            return Err(Error::UnknownLocation);
        }
        Ok(NewUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            birthdate,
            location: self.location.clone(),
        })
    }
}

fn invalid_request(e: Error) -> JsonError<Error> {
    let description = match e {
        Error::EmptyName => "first_name and last_name must not be empty",
        Error::InvalidBirthday => "birthday must be a YYYY-MM-DD calendar date",
        Error::UnknownLocation => "location is not a supported timezone",
        _ => "invalid request",
    };
    error::bad_request(e, description.to_owned())
}

fn store_error(e: user::Error) -> JsonError<Error> {
    match e {
        user::Error::NotFound(id) => {
            error::not_found(Error::UserNotFound, format!("user #{} not found", id))
        }
        user::Error::Database(e) => {
            log::error!("user storage failed: {}", e);
            error::internal_server_error(Error::StorageFailure, "user storage failed".to_owned())
        }
    }
}

/// List all users.
#[openapi(tag = "Users")]
#[get("/users")]
pub(super) async fn list(state: &State<RocketState>) -> JsonResult<UsersResponse, Error> {
    state
        .store
        .get_all()
        .await
        .map(|users| {
            Json(UsersResponse {
                users: users.iter().map(UserModel::from_entity).collect(),
            })
        })
        .map_err(store_error)
}

/// Get a single user.
#[openapi(tag = "Users")]
#[get("/users/<id>")]
pub(super) async fn get(state: &State<RocketState>, id: i64) -> JsonResult<UserResponse, Error> {
    state
        .store
        .get_by_id(user::Id(id))
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(store_error)
}

/// Create a user. The id is assigned by the store.
#[openapi(tag = "Users")]
#[post("/users", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<UserRequest>,
) -> JsonResult<UserResponse, Error> {
    let new_user = req.validate(&state.zones).map_err(invalid_request)?;
    state
        .store
        .create(new_user)
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(store_error)
}

/// Replace a user's details.
#[openapi(tag = "Users")]
#[put("/users/<id>", data = "<req>")]
pub(super) async fn put(
    state: &State<RocketState>,
    id: i64,
    req: Json<UserRequest>,
) -> JsonResult<UserResponse, Error> {
    let new_user = req.validate(&state.zones).map_err(invalid_request)?;
    state
        .store
        .update(new_user.into_user(user::Id(id)))
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(store_error)
}

/// Delete a user, returning their last stored details.
#[openapi(tag = "Users")]
#[delete("/users/<id>")]
pub(super) async fn delete(state: &State<RocketState>, id: i64) -> JsonResult<UserResponse, Error> {
    state
        .store
        .delete(user::Id(id))
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(store_error)
}
