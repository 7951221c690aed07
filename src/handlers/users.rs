use std::fmt;

use crate::error::{is_unique_violation, AppError};
use crate::password::hash_password;
use crate::schemas::ErrorResponse;
use crate::session::DbSession;
use crate::validation::{Schema, Validated};
use axum::{extract::Path, http::StatusCode, response::Json};
use model::entities::user::{self, UserJson};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new user
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Username (must be unique)
    #[validate(required, length(max = 50))]
    pub name: Option<String>,
    /// Plaintext password, hashed before it is stored
    #[validate(required, length(max = 100))]
    pub password: Option<String>,
    /// Contact email
    #[validate(length(max = 100))]
    pub email: Option<String>,
}

impl Schema for CreateUserRequest {
    const FIELDS: &'static [&'static str] = &["name", "password", "email"];
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .finish()
    }
}

impl CreateUserRequest {
    /// Builds the row to insert, leaving unset fields `NotSet`.
    async fn into_active_model(self) -> Result<user::ActiveModel, AppError> {
        let password = match self.password {
            Some(password) => Set(hash_password(password).await?),
            None => NotSet,
        };

        Ok(user::ActiveModel {
            name: self.name.map_or(NotSet, Set),
            password,
            email: self.email.map_or(NotSet, |email| Set(Some(email))),
            ..Default::default()
        })
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/user",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserJson),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(session))]
pub async fn create_user(
    session: DbSession,
    Validated(request): Validated<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserJson>), AppError> {
    trace!("Entering create_user function");
    let name = request.name.clone().unwrap_or_default();
    debug!("Creating user with name: {}", name);

    let new_user = request.into_active_model().await?;

    trace!("Attempting to insert new user into database");
    match new_user.insert(session.conn()).await {
        Ok(user_model) => {
            info!(
                "User created successfully with ID: {}, name: {}",
                user_model.id, user_model.name
            );
            Ok((StatusCode::CREATED, Json(user_model.to_json())))
        }
        Err(db_error) if is_unique_violation(&db_error) => {
            warn!("User '{}' already exists", name);
            Err(AppError::Conflict("user already exists".to_string()))
        }
        Err(db_error) => {
            error!("Failed to create user '{}': {}", name, db_error);
            Err(db_error.into())
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserJson),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(session))]
pub async fn get_user(
    Path(user_id): Path<i32>,
    session: DbSession,
) -> Result<Json<UserJson>, AppError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    match user::Entity::find_by_id(user_id).one(session.conn()).await {
        Ok(Some(user_model)) => {
            info!(
                "Successfully retrieved user with ID: {}, name: {}",
                user_model.id, user_model.name
            );
            Ok(Json(user_model.to_json()))
        }
        Ok(None) => {
            warn!("User with ID {} not found", user_id);
            Err(AppError::NotFound("user not found".to_string()))
        }
        Err(db_error) => {
            error!("Failed to retrieve user with ID {}: {}", user_id, db_error);
            Err(db_error.into())
        }
    }
}
