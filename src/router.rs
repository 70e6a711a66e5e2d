use crate::handlers::{
    dashboard::get_dashboard,
    health::health_check,
    sessions::{create_session, delete_session, get_session, set_horizon, set_region},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Dashboard layout
        .route("/api/v1/dashboard", get(get_dashboard))
        // Session routes
        .route("/api/v1/sessions", post(create_session))
        .route(
            "/api/v1/sessions/:session_id",
            get(get_session).delete(delete_session),
        )
        .route("/api/v1/sessions/:session_id/region", put(set_region))
        .route("/api/v1/sessions/:session_id/horizon", put(set_horizon))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
