pub mod esim_routes;
pub mod view_routes;

use axum::{routing::get, Json, Router};

use crate::dto::esim_dto::HealthResponse;
use crate::state::AppState;

/// Router de la API, montado bajo `/api`
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .nest("/esims", esim_routes::create_esim_router())
        .nest("/view", view_routes::create_view_router())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
