use crate::error::{is_integrity_violation, AppError};
use crate::schemas::{ErrorResponse, StatusResponse};
use crate::session::DbSession;
use crate::validation::{Schema, Validated};
use axum::{extract::Path, http::StatusCode, response::Json};
use model::entities::{
    advert::{self, AdvertJson},
    user,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, EntityTrait, ModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new advert
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateAdvertRequest {
    /// Short headline
    #[validate(required, length(max = 50))]
    pub title: Option<String>,
    /// Free-form description
    pub note: Option<String>,
    /// ID of the posting user
    #[validate(required)]
    pub owner_id: Option<i32>,
}

impl Schema for CreateAdvertRequest {
    const FIELDS: &'static [&'static str] = &["title", "note", "owner_id"];
}

impl CreateAdvertRequest {
    fn into_active_model(self) -> advert::ActiveModel {
        advert::ActiveModel {
            title: self.title.map_or(NotSet, Set),
            note: self.note.map_or(NotSet, |note| Set(Some(note))),
            owner_id: self.owner_id.map_or(NotSet, Set),
            ..Default::default()
        }
    }
}

/// Fetch an advert by id, mapping absence to a 404.
async fn get_advert_by_id<C>(db: &C, advert_id: i32) -> Result<advert::Model, AppError>
where
    C: ConnectionTrait,
{
    match advert::Entity::find_by_id(advert_id).one(db).await {
        Ok(Some(advert_model)) => Ok(advert_model),
        Ok(None) => {
            warn!("Advert with ID {} not found", advert_id);
            Err(AppError::NotFound("Advert not found".to_string()))
        }
        Err(db_error) => {
            error!("Failed to retrieve advert with ID {}: {}", advert_id, db_error);
            Err(db_error.into())
        }
    }
}

/// Create a new advert
#[utoipa::path(
    post,
    path = "/advert",
    tag = "adverts",
    request_body = CreateAdvertRequest,
    responses(
        (status = 201, description = "Advert created successfully", body = AdvertJson),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Owner does not exist", body = ErrorResponse),
        (status = 409, description = "Advert already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(session))]
pub async fn create_advert(
    session: DbSession,
    Validated(request): Validated<CreateAdvertRequest>,
) -> Result<(StatusCode, Json<AdvertJson>), AppError> {
    trace!("Entering create_advert function");
    debug!(
        "Creating advert with title: {:?}, owner_id: {:?}",
        request.title, request.owner_id
    );

    let owner_id = request.owner_id;
    let new_advert = request.into_active_model();

    // The owner must exist before anything is written
    trace!("Validating owner exists: {:?}", owner_id);
    let owner = match owner_id {
        Some(owner_id) => user::Entity::find_by_id(owner_id).one(session.conn()).await?,
        None => None,
    };
    let Some(owner) = owner else {
        warn!("Owner with ID {:?} not found", owner_id);
        return Err(AppError::NotFound("User (owner) doesn't exist".to_string()));
    };

    trace!("Attempting to insert new advert into database");
    match new_advert.insert(session.conn()).await {
        Ok(advert_model) => {
            info!(
                "Advert created successfully with ID: {}, owner: {}",
                advert_model.id, owner.name
            );
            Ok((StatusCode::CREATED, Json(advert_model.to_json(&owner))))
        }
        Err(db_error) if is_integrity_violation(&db_error) => {
            warn!("Advert rejected by integrity constraint: {}", db_error);
            Err(AppError::Conflict("Advert already exists".to_string()))
        }
        Err(db_error) => {
            error!("Failed to create advert: {}", db_error);
            Err(db_error.into())
        }
    }
}

/// Get a specific advert by ID
#[utoipa::path(
    get,
    path = "/advert/{advert_id}",
    tag = "adverts",
    params(
        ("advert_id" = i32, Path, description = "Advert ID"),
    ),
    responses(
        (status = 200, description = "Advert retrieved successfully", body = AdvertJson),
        (status = 404, description = "Advert not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(session))]
pub async fn get_advert(
    Path(advert_id): Path<i32>,
    session: DbSession,
) -> Result<Json<AdvertJson>, AppError> {
    trace!("Entering get_advert function for advert_id: {}", advert_id);

    let advert_model = get_advert_by_id(session.conn(), advert_id).await?;
    let advert_json = advert_model.load_json(session.conn()).await?;

    info!("Successfully retrieved advert with ID: {}", advert_id);
    Ok(Json(advert_json))
}

/// Delete an advert
#[utoipa::path(
    delete,
    path = "/advert/{advert_id}",
    tag = "adverts",
    params(
        ("advert_id" = i32, Path, description = "Advert ID"),
    ),
    responses(
        (status = 200, description = "Advert deleted successfully", body = StatusResponse),
        (status = 404, description = "Advert not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(session))]
pub async fn delete_advert(
    Path(advert_id): Path<i32>,
    session: DbSession,
) -> Result<Json<StatusResponse>, AppError> {
    trace!("Entering delete_advert function for advert_id: {}", advert_id);

    let advert_model = get_advert_by_id(session.conn(), advert_id).await?;
    let delete_result = advert_model.delete(session.conn()).await?;
    debug!(
        "Delete operation completed. Rows affected: {}",
        delete_result.rows_affected
    );

    info!("Advert with ID {} deleted successfully", advert_id);
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}
