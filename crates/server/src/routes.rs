pub mod attributes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use common::types::Health;
use service::attributes::AttributeService;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub attributes: Arc<AttributeService>,
}

impl AppState {
    pub fn new(attributes: Arc<AttributeService>) -> Self {
        Self { attributes }
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn attribute_routes() -> Router<AppState> {
    Router::new()
        .route("/attributes", post(attributes::create_attributes))
        .route(
            "/attributes/:urn",
            get(attributes::get_attributes).put(attributes::replace_attributes),
        )
}

/// Build the full application router: health, attribute routes (also under `/api`), and API docs
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let attrs = attribute_routes();

    Router::new()
        .route("/health", get(health))
        .merge(attrs.clone())
        .nest("/api", attrs)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request; headers stay out of the logs since they carry credentials
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
