use model::entities::{advert::AdvertJson, user::UserJson};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{OpenApi, ToSchema};

use crate::handlers::{adverts::CreateAdvertRequest, users::CreateUserRequest};
use crate::validation::ValidationError;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// A short message, or a structured validation failure
    #[schema(value_type = Object)]
    pub error: Value,
}

/// Outcome of an operation that returns no resource
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::adverts::create_advert,
        crate::handlers::adverts::get_advert,
        crate::handlers::adverts::delete_advert,
    ),
    components(
        schemas(
            AdvertJson,
            CreateAdvertRequest,
            CreateUserRequest,
            ErrorResponse,
            HealthResponse,
            StatusResponse,
            UserJson,
            ValidationError,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User endpoints"),
        (name = "adverts", description = "Advert endpoints"),
    ),
    info(
        title = "Adverts API",
        description = "Classified adverts posted by registered users",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
