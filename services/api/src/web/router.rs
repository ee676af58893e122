//! services/api/src/web/router.rs
//!
//! Assembles the Axum router: scheduling routes, CORS, request tracing and
//! the Swagger UI.

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::web::rest::{
    availability_handler, create_appointment_handler, get_appointment_handler, health_handler,
    update_status_handler, ApiDoc,
};
use crate::web::state::AppState;

pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            ApiError::Internal(format!(
                "Invalid CORS origin '{}': {}",
                app_state.config.cors_allowed_origin, e
            ))
        })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/appointments", post(create_appointment_handler))
        .route("/appointments/availability", get(availability_handler))
        .route("/appointments/{id}", get(get_appointment_handler))
        .route("/appointments/{id}/status", patch(update_status_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
