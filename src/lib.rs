pub mod audio;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::expiry::ExpiryService;
use crate::services::storage::ArtifactStore;
use crate::services::transform::AudioTransform;
use crate::services::upload_log::UploadLog;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::pages::index,
        handlers::pages::about,
        handlers::health::health_check,
        handlers::upload::upload_audio,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "pages", description = "Static pages"),
        (name = "audio", description = "Audio transformation endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<dyn ArtifactStore>,
    pub transform: Arc<dyn AudioTransform>,
    pub expiry: Arc<ExpiryService>,
    pub upload_log: Arc<UploadLog>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::pages::index))
        .route("/about", get(handlers::pages::about))
        .route("/health", get(handlers::health::health_check))
        .route("/upload", post(handlers::upload::upload_audio))
        .layer(from_fn(middleware::request_id::request_id_middleware))
        .with_state(state)
}
