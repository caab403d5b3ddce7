use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::controllers::esim_controller::EsimController;
use crate::middleware::session::session_id;
use crate::dto::esim_dto::{
    filters_from_query, AssignEsimRequest, CreateEsimRequest, EsimDetailResponse,
    EsimListResponse, ImportResponse, StatsResponse, UpdateEsimRequest,
};
use crate::repositories::{LoadResult, OperationResult};
use crate::services::template_service::{TEMPLATE_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

/// Tamaño máximo del archivo de importación
const IMPORT_BODY_LIMIT: usize = 20 * 1024 * 1024;

type QueryPairs = Query<Vec<(String, String)>>;

pub fn create_esim_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_esims))
        .route("/", post(create_esim))
        .route("/refresh", post(refresh_esims))
        .route("/export", get(export_esims))
        .route("/template", get(download_template))
        .route(
            "/import",
            post(import_esims).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/stats", get(get_stats))
        .route("/:id", get(get_esim))
        .route("/:id", put(update_esim))
        .route("/:id", delete(delete_esim))
        .route("/:id/assign", post(assign_esim))
}

/// Código HTTP de una operación de escritura: los fallos vienen del store
fn operation_response(result: OperationResult, success: StatusCode) -> (StatusCode, Json<OperationResult>) {
    let status = if result.ok { success } else { StatusCode::BAD_GATEWAY };
    (status, Json(result))
}

fn xlsx_download(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn list_esims(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): QueryPairs,
) -> Result<Json<EsimListResponse>, AppError> {
    let filters = filters_from_query(&pairs)?;
    let controller = EsimController::new(state);
    Ok(Json(controller.list(&filters, &session_id(&headers)).await))
}

async fn create_esim(
    State(state): State<AppState>,
    Json(request): Json<CreateEsimRequest>,
) -> Result<(StatusCode, Json<OperationResult>), AppError> {
    let controller = EsimController::new(state);
    let result = controller.create(request).await?;
    Ok(operation_response(result, StatusCode::CREATED))
}

async fn refresh_esims(State(state): State<AppState>, headers: HeaderMap) -> Json<LoadResult> {
    let controller = EsimController::new(state);
    Json(controller.refresh(&session_id(&headers)).await)
}

async fn export_esims(State(state): State<AppState>) -> Result<Response, AppError> {
    let controller = EsimController::new(state);
    let download = controller.export().await?;
    Ok(xlsx_download(&download.file_name, download.bytes))
}

async fn download_template() -> Result<Response, AppError> {
    let bytes = EsimController::template()?;
    Ok(xlsx_download(TEMPLATE_FILE_NAME, bytes))
}

async fn import_esims(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("❌ Formulario inválido: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request_error("❌ El archivo no tiene nombre"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("❌ Error leyendo archivo: {}", e)))?;
        upload = Some((file_name, bytes));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| bad_request_error("❌ Falta el archivo (campo 'file')"))?;

    let controller = EsimController::new(state);
    let response = controller.import(&file_name, &bytes).await?;

    let status = match &response.summary {
        None => StatusCode::UNPROCESSABLE_ENTITY,
        Some(summary) if !summary.ok => StatusCode::BAD_GATEWAY,
        Some(_) => StatusCode::OK,
    };
    Ok((status, Json(response)))
}

async fn get_stats(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<StatsResponse>, AppError> {
    let filters = filters_from_query(&pairs)?;
    let controller = EsimController::new(state);
    Ok(Json(controller.stats(&filters).await))
}

async fn get_esim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EsimDetailResponse>, AppError> {
    let controller = EsimController::new(state);
    let response = controller.get_detail(id).await?;
    Ok(Json(response))
}

async fn update_esim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEsimRequest>,
) -> Result<(StatusCode, Json<OperationResult>), AppError> {
    let controller = EsimController::new(state);
    let result = controller.update(id, request).await?;
    Ok(operation_response(result, StatusCode::OK))
}

async fn assign_esim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AssignEsimRequest>,
) -> Result<(StatusCode, Json<OperationResult>), AppError> {
    let controller = EsimController::new(state);
    let result = controller.assign(id, request).await?;
    Ok(operation_response(result, StatusCode::OK))
}

async fn delete_esim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<OperationResult>) {
    let controller = EsimController::new(state);
    operation_response(controller.delete(id).await, StatusCode::OK)
}
