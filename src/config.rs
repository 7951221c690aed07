use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use tracing::{debug, info};
use crate::schemas::AppState;

/// SQLite file used when neither `DATABASE_URL` nor `DB_NAME` is set.
pub const DEFAULT_DB_NAME: &str = "adverts.db";

/// Address the server binds to unless `BIND_ADDRESS` says otherwise.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// SeaORM URL for a SQLite file, created on first use.
pub fn sqlite_url(db_name: &str) -> String {
    format!("sqlite://{}?mode=rwc", db_name)
}

/// Picks the database URL: an explicit URL wins, otherwise `DB_NAME` names a SQLite file.
pub fn resolve_database_url(explicit: Option<String>, db_name: Option<String>) -> String {
    match explicit {
        Some(url) => url,
        None => sqlite_url(db_name.as_deref().unwrap_or(DEFAULT_DB_NAME)),
    }
}

pub fn is_sqlite_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite:")
}

/// Connect to the store and make sure the schema exists.
pub async fn initialize_app_state(database_url: &str) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let mut options = ConnectOptions::new(database_url);
    if is_sqlite_url(database_url) {
        // SQLite has a single writer. A session that has read cannot take the
        // write lock once another connection commits, so sessions share one
        // connection and run one after another.
        debug!("SQLite store, limiting the pool to one connection");
        options.max_connections(1);
    }
    let db = Database::connect(options).await?;

    debug!("Creating tables if absent");
    Migrator::up(&db, None).await?;

    Ok(AppState { db })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url_wins() {
        let url = resolve_database_url(
            Some("postgres://localhost/adverts".to_string()),
            Some("ignored.db".to_string()),
        );
        assert_eq!(url, "postgres://localhost/adverts");
    }

    #[test]
    fn test_db_name_builds_sqlite_url() {
        assert_eq!(
            resolve_database_url(None, Some("board.db".to_string())),
            "sqlite://board.db?mode=rwc"
        );
        assert_eq!(resolve_database_url(None, None), "sqlite://adverts.db?mode=rwc");
    }

    #[test]
    fn test_sqlite_urls_are_recognised() {
        assert!(is_sqlite_url(&sqlite_url("board.db")));
        assert!(is_sqlite_url("sqlite::memory:"));
        assert!(!is_sqlite_url("postgres://localhost/adverts"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_on_sqlite_file() {
        use crate::router::create_router;
        use axum::{body::Body, http::{Request, StatusCode}};
        use model::entities::{advert, prelude::*, user};
        use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
        use tower::ServiceExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        let state = initialize_app_state(&sqlite_url(&path.to_string_lossy()))
            .await
            .unwrap();
        let db = state.db.clone();
        let app = create_router(state);

        let owner = user::ActiveModel {
            name: Set("seller".to_string()),
            password: Set("not-a-real-hash".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let mut existing = Vec::new();
        for n in 0..8 {
            let listed = advert::ActiveModel {
                title: Set(format!("Old item {}", n)),
                owner_id: Set(owner.id),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
            existing.push(listed.id);
        }

        let mut requests = Vec::new();
        for (n, advert_id) in existing.into_iter().enumerate() {
            let body = serde_json::json!({"title": format!("New item {}", n), "owner_id": owner.id});
            let create = Request::builder()
                .method("POST")
                .uri("/advert")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let delete = Request::builder()
                .method("DELETE")
                .uri(format!("/advert/{}", advert_id))
                .body(Body::empty())
                .unwrap();

            for (request, expected) in [(create, StatusCode::CREATED), (delete, StatusCode::OK)] {
                let app = app.clone();
                requests.push(tokio::spawn(async move {
                    let response = app.oneshot(request).await.unwrap();
                    (response.status(), expected)
                }));
            }
        }

        for request in requests {
            let (status, expected) = request.await.unwrap();
            assert_eq!(status, expected);
        }
        assert_eq!(Advert::find().count(&db).await.unwrap(), 8);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_app_state_creates_schema() {
        use model::entities::prelude::*;
        use sea_orm::EntityTrait;

        let state = initialize_app_state("sqlite::memory:").await.unwrap();

        assert!(User::find().all(&state.db).await.unwrap().is_empty());
        assert!(Advert::find().all(&state.db).await.unwrap().is_empty());
    }
}
