use crate::handlers::{
    adverts::{create_advert, delete_advert, get_advert},
    health::health_check,
    users::{create_user, get_user},
};
use crate::schemas::{ApiDoc, AppState};
use crate::session::session_middleware;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Every resource route runs inside its own database session
    let resources = Router::new()
        .route("/user", post(create_user))
        .route("/user/:user_id", get(get_user))
        .route("/advert", post(create_advert))
        .route("/advert/:advert_id", get(get_advert).delete(delete_advert))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(resources)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
