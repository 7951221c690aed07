use crate::router::create_router;
use crate::schemas::AppState;
use axum::Router;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Create an in-memory SQLite database for testing
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    AppState { db }
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level is determined by the RUST_LOG environment variable,
/// defaulting to WARN if not set.
fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// Create axum app for testing, with a handle on its database
pub async fn setup_test_app() -> (Router, DatabaseConnection) {
    let _ = init_test_tracing();

    let state = setup_test_app_state().await;
    let db = state.db.clone();
    (create_router(state), db)
}

/// Start a test server over a fresh database
pub async fn setup_test_server() -> (TestServer, DatabaseConnection) {
    let (app, db) = setup_test_app().await;
    let server = TestServer::new(app).expect("Failed to start test server");
    (server, db)
}

/// Create a user through the API and return its JSON projection
pub async fn create_test_user(server: &TestServer, name: &str) -> Value {
    let response = server
        .post("/user")
        .json(&json!({"name": name, "password": "correct horse", "email": format!("{}@example.com", name)}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}
