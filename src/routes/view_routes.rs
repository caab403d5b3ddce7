use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::controllers::view_controller::ViewController;
use crate::middleware::session::session_id;
use crate::models::view_state::ViewState;
use crate::state::AppState;

/// Rutas de la vista; cada sesión (`x-session-id`) tiene su propio estado
pub fn create_view_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_view))
        .route("/toggle", post(toggle_view))
        .route("/dark-mode", post(toggle_dark_mode))
        .route("/details/:id", post(show_detail))
        .route("/details/:id", delete(close_detail))
}

fn controller(state: AppState, headers: &HeaderMap) -> ViewController {
    ViewController::new(state, session_id(headers))
}

async fn get_view(State(state): State<AppState>, headers: HeaderMap) -> Json<ViewState> {
    Json(controller(state, &headers).current().await)
}

async fn toggle_view(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let view_mode = controller(state, &headers).toggle_view().await;
    Json(json!({ "view_mode": view_mode }))
}

async fn toggle_dark_mode(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let dark_mode = controller(state, &headers).toggle_dark_mode().await;
    Json(json!({ "dark_mode": dark_mode }))
}

async fn show_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Json<ViewState> {
    Json(controller(state, &headers).show_detail(id).await)
}

async fn close_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Json<ViewState> {
    Json(controller(state, &headers).close_detail(id).await)
}
