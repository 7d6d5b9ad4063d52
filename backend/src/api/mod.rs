//! API module
//!
//! Contains the HTTP router, shared handler state and request handlers for
//! the recipe endpoints.

pub mod form;
pub mod middleware;
pub mod recipes;

use crate::config::Config;
use crate::recipes::RecipeRepository;
use crate::services::{ImageStore, RecipeService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// State shared by every handler
///
/// Everything here is read-only; durable state lives in the store and the
/// upload directory.
#[derive(Clone)]
pub struct AppState {
    /// Recipe operations
    pub recipes: Arc<RecipeService>,
    /// Upload directory writer
    pub images: Arc<ImageStore>,
    /// Whether the seed route inserts data
    pub seed_enabled: bool,
    /// Request body limit applied to the router
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the service and image store from configuration
    pub fn new(config: &Config, repo: Arc<dyn RecipeRepository>) -> Self {
        Self {
            recipes: Arc::new(RecipeService::new(repo)),
            images: Arc::new(ImageStore::new(config.upload.dir.clone())),
            seed_enabled: config.seed_enabled,
            max_upload_bytes: config.upload.max_bytes,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Recipe manager is healthy".to_string(),
    })
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images.upload_dir());

    Router::new()
        .route("/", get(recipes::list_recipes))
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::save_recipe),
        )
        .route("/recipes/new", get(recipes::new_recipe_form))
        .route("/recipes/edit/:id", get(recipes::edit_recipe_form))
        .route("/recipes/delete/:id", post(recipes::delete_recipe))
        .route("/recipes/seed", post(recipes::seed_recipes))
        .route("/api/health", get(health_check))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
