use chrono::Local;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::esim_dto::{
    AssignEsimRequest, CreateEsimRequest, EsimCard, EsimDetailResponse, EsimListResponse,
    ImportResponse, StatsResponse, UpdateEsimRequest,
};
use crate::models::esim::EsimRecord;
use crate::models::view_state::{card_rows, ViewMode, ViewState, CARDS_PER_ROW};
use crate::repositories::{LoadResult, OperationResult};
use crate::services::filter_service::{apply_filters, ip_options, EsimFilters};
use crate::services::import_service::{bulk_import, parse_import_file, validate_import};
use crate::services::stats_service::dashboard_stats;
use crate::services::template_service::{export_file_name, export_records, generate_template};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Archivo generado para descarga
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct EsimController {
    state: AppState,
}

impl EsimController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Listado cargado; un fallo del store se convierte en error de la API
    async fn load_checked(&self) -> AppResult<Vec<EsimRecord>> {
        let LoadResult { records, error } = self.state.repository.load_all().await;
        match error {
            Some(message) => Err(AppError::ExternalApi(message)),
            None => Ok(records),
        }
    }

    async fn find(&self, id: i64) -> AppResult<EsimRecord> {
        self.load_checked()
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| not_found_error("eSIM", &id.to_string()))
    }

    fn card(&self, record: &EsimRecord, view: &ViewState) -> EsimCard {
        EsimCard {
            id: record.id,
            iccid: record.iccid.clone(),
            msisdn: record.msisdn.clone(),
            producto: record.producto,
            ip: record.ip.clone(),
            asignado_a: record.asignado_a.clone(),
            estado: record.estado,
            color: record.estado.color(),
            qr_url: self.state.qr.qr_url(&record.iccid),
            expanded: view.is_expanded(record.id),
        }
    }

    /// Listado filtrado con el estado de la vista de `session`.
    ///
    /// Un fallo de carga no es un error HTTP: se devuelve la lista vacía y
    /// el mensaje en `error`.
    pub async fn list(&self, filters: &EsimFilters, session: &str) -> EsimListResponse {
        let loaded = self.state.repository.load_all().await;
        let filtered = apply_filters(&loaded.records, filters);
        let view = self.state.view(session).await;

        let cards: Option<Vec<Vec<EsimCard>>> = (view.view_mode == ViewMode::Tarjetas).then(|| {
            card_rows(&filtered, CARDS_PER_ROW)
                .iter()
                .map(|row| row.iter().map(|record| self.card(record, &view)).collect())
                .collect()
        });

        EsimListResponse {
            total: loaded.records.len(),
            filtrados: filtered.len(),
            summary: format!(
                "💡 Mostrando {} de {} registros totales",
                filtered.len(),
                loaded.records.len()
            ),
            ip_options: ip_options(&loaded.records),
            view_mode: view.view_mode,
            expanded: view.expanded_ids(),
            cards,
            error: loaded.error,
            records: filtered,
        }
    }

    pub async fn stats(&self, filters: &EsimFilters) -> StatsResponse {
        let loaded = self.state.repository.load_all().await;
        let filtered = apply_filters(&loaded.records, filters);

        StatsResponse {
            stats: dashboard_stats(&loaded.records, &filtered),
            cache: self.state.repository.cache_stats().await,
            error: loaded.error,
        }
    }

    /// Detalle de un registro con la información de su QR
    pub async fn get_detail(&self, id: i64) -> AppResult<EsimDetailResponse> {
        let record = self.find(id).await?;
        let qr = self.state.qr.resolve(&record.iccid).await;

        Ok(EsimDetailResponse {
            color: record.estado.color(),
            record,
            qr,
        })
    }

    pub async fn create(&self, request: CreateEsimRequest) -> AppResult<OperationResult> {
        request.validate()?;

        let record = request.into_new_record(Local::now());
        info!("➕ Alta manual de eSIM {}", record.iccid);
        Ok(self.state.repository.insert(vec![record]).await)
    }

    pub async fn update(&self, id: i64, request: UpdateEsimRequest) -> AppResult<OperationResult> {
        request.validate()?;

        let fields = request.into_update();
        if fields.is_empty() {
            return Err(AppError::BadRequest("❌ No hay cambios para guardar".to_string()));
        }

        self.find(id).await?;
        Ok(self
            .state
            .repository
            .update(id, fields.stamped(Local::now()))
            .await)
    }

    pub async fn assign(&self, id: i64, request: AssignEsimRequest) -> AppResult<OperationResult> {
        self.find(id).await?;

        let fields = request.into_update(Local::now());
        info!(
            "📌 Asignando eSIM {} a '{}'",
            id,
            fields.asignado_a.as_deref().unwrap_or_default()
        );
        Ok(self.state.repository.update(id, fields).await)
    }

    pub async fn delete(&self, id: i64) -> OperationResult {
        self.state.repository.delete(id).await
    }

    /// Forzar recarga: vacía el cache y cierra los detalles abiertos de la sesión
    pub async fn refresh(&self, session: &str) -> LoadResult {
        self.state.repository.refresh().await;
        self.state.reset_details(session).await;

        let loaded = self.state.repository.load_all().await;
        if loaded.is_ok() {
            info!("🔄 Datos recargados: {} registros", loaded.records.len());
        }
        loaded
    }

    /// Exportar el inventario completo; los filtros del listado no aplican
    pub async fn export(&self) -> AppResult<Download> {
        let records = self.load_checked().await?;

        Ok(Download {
            file_name: export_file_name(Local::now()),
            bytes: export_records(&records)?,
        })
    }

    pub fn template() -> AppResult<Vec<u8>> {
        generate_template()
    }

    /// Validar e importar un archivo; un archivo inválido no inserta nada
    pub async fn import(&self, file_name: &str, bytes: &[u8]) -> AppResult<ImportResponse> {
        let table = parse_import_file(file_name, bytes)?;
        let mut validation = validate_import(&table);

        if !validation.valid {
            warn!("⚠️ Importación rechazada ({}): {}", file_name, validation.message);
            return Ok(ImportResponse {
                file_name: file_name.to_string(),
                rows: table.len(),
                validation,
                summary: None,
            });
        }

        if table.is_empty() {
            return Err(AppError::Unprocessable(format!(
                "❌ El archivo {} no contiene registros para importar",
                file_name
            )));
        }

        let records = std::mem::take(&mut validation.records);
        let summary = bulk_import(&self.state.repository, records, Local::now()).await;

        Ok(ImportResponse {
            file_name: file_name.to_string(),
            rows: table.len(),
            validation,
            summary: Some(summary),
        })
    }
}
