//! One database transaction per request.
//!
//! The middleware opens the transaction before the handler runs and always
//! closes it afterwards: committed for a 2xx response, rolled back otherwise.

use std::{fmt, ops::Deref, sync::Arc};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::{debug, error, instrument, trace};

use crate::error::AppError;
use crate::schemas::AppState;

/// Handle to the request's unit of work.
#[derive(Clone)]
pub struct DbSession(Arc<DatabaseTransaction>);

impl DbSession {
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.0
    }
}

impl Deref for DbSession {
    type Target = DatabaseTransaction;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for DbSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DbSession")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DbSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DbSession>()
            .cloned()
            .ok_or_else(|| AppError::Internal("no database session for this request".to_string()))
    }
}

/// Opens a session, runs the handler, then commits or rolls back.
#[instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    trace!("Opening database session");
    let session = DbSession(Arc::new(state.db.begin().await?));
    req.extensions_mut().insert(session.clone());

    let response = next.run(req).await;

    // The request and its extensions are gone once the handler has finished,
    // so this is the last reference.
    let txn = match Arc::try_unwrap(session.0) {
        Ok(txn) => txn,
        Err(_) => {
            error!("Database session still referenced after the handler finished; rolling back");
            return Err(AppError::Internal(
                "database session outlived its request".to_string(),
            ));
        }
    };

    if response.status().is_success() {
        txn.commit().await?;
        debug!(status = %response.status(), "Database session committed");
    } else {
        txn.rollback().await?;
        debug!(status = %response.status(), "Database session rolled back");
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_app_state;
    use axum::{http::StatusCode, middleware, routing::post, Router};
    use axum_test::TestServer;
    use model::entities::{prelude::*, user};
    use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

    async fn insert_user(session: &DbSession, name: &str) -> Result<(), AppError> {
        user::ActiveModel {
            name: Set(name.to_string()),
            password: Set("not-a-real-hash".to_string()),
            ..Default::default()
        }
        .insert(session.conn())
        .await?;
        Ok(())
    }

    async fn insert_then_succeed(session: DbSession) -> Result<StatusCode, AppError> {
        insert_user(&session, "kept").await?;
        Ok(StatusCode::CREATED)
    }

    async fn insert_then_conflict(session: DbSession) -> Result<StatusCode, AppError> {
        insert_user(&session, "discarded").await?;
        Err(AppError::Conflict("refused after writing".to_string()))
    }

    async fn insert_then_not_found(session: DbSession) -> StatusCode {
        if insert_user(&session, "discarded").await.is_err() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        StatusCode::NOT_FOUND
    }

    async fn setup_session_server() -> (TestServer, DatabaseConnection) {
        let state = setup_test_app_state().await;
        let db = state.db.clone();
        let app = Router::new()
            .route("/succeed", post(insert_then_succeed))
            .route("/conflict", post(insert_then_conflict))
            .route("/not-found", post(insert_then_not_found))
            .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware))
            .with_state(state);
        (TestServer::new(app).unwrap(), db)
    }

    #[tokio::test]
    async fn test_success_commits_the_session() {
        let (server, db) = setup_session_server().await;

        server.post("/succeed").await.assert_status(StatusCode::CREATED);

        assert_eq!(User::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_error_rolls_back_writes() {
        let (server, db) = setup_session_server().await;

        server.post("/conflict").await.assert_status(StatusCode::CONFLICT);

        assert_eq!(User::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_success_status_rolls_back_writes() {
        let (server, db) = setup_session_server().await;

        server.post("/not-found").await.assert_status(StatusCode::NOT_FOUND);

        assert_eq!(User::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let (server, db) = setup_session_server().await;

        server.post("/conflict").await.assert_status(StatusCode::CONFLICT);
        server.post("/succeed").await.assert_status(StatusCode::CREATED);

        let names: Vec<String> = User::find()
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.name)
            .collect();
        assert_eq!(names, vec!["kept".to_string()]);
    }
}
