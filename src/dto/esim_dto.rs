use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cache::CacheStats;
use crate::models::esim::{
    EsimRecord, EsimUpdate, Estado, NewEsimRecord, Producto, DEFAULT_DISTRIBUIDOR, DEFAULT_PIN,
};
use crate::models::stats::DashboardStats;
use crate::models::view_state::ViewMode;
use crate::services::filter_service::{EsimFilters, EstadoFilter, ProductoFilter};
use crate::services::import_service::{ImportSummary, ImportValidation};
use crate::services::qr_service::QrInfo;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::validate_not_blank;

fn default_producto() -> Producto {
    Producto::Mov
}

fn default_estado() -> Estado {
    Estado::Disponible
}

/// Texto opcional de formulario: vacío equivale a ausente
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Request para alta manual
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEsimRequest {
    #[validate(custom = "validate_not_blank")]
    pub iccid: String,

    #[validate(custom = "validate_not_blank")]
    pub msisdn: String,

    #[serde(default)]
    pub imsi: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub puk: Option<String>,
    #[serde(default)]
    pub serie: Option<String>,
    #[serde(default)]
    pub asignado_a: Option<String>,
    #[serde(default)]
    pub distribuidor: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default = "default_producto")]
    pub producto: Producto,

    #[serde(default = "default_estado")]
    pub estado: Estado,
}

impl CreateEsimRequest {
    /// Registro listo para insertar, con valores por defecto y fechas selladas
    pub fn into_new_record(self, now: DateTime<Local>) -> NewEsimRecord {
        let mut record = NewEsimRecord {
            iccid: self.iccid.trim().to_string(),
            msisdn: self.msisdn.trim().to_string(),
            imsi: non_blank(self.imsi),
            pin: non_blank(self.pin).or_else(|| Some(DEFAULT_PIN.to_string())),
            puk: non_blank(self.puk),
            serie: non_blank(self.serie),
            asignado_a: non_blank(self.asignado_a),
            distribuidor: non_blank(self.distribuidor)
                .or_else(|| Some(DEFAULT_DISTRIBUIDOR.to_string())),
            ip: non_blank(self.ip),
            producto: self.producto,
            estado: self.estado,
            fecha_creacion: None,
            fecha_ultimo_cambio: None,
            image_index: None,
        };
        record.stamp_missing_dates(now);
        record
    }
}

// Request de asignación
#[derive(Debug, Deserialize)]
pub struct AssignEsimRequest {
    pub asignado_a: String,
    /// Sin valor: `Usado` al asignar, `Disponible` al liberar
    #[serde(default)]
    pub estado: Option<Estado>,
}

impl AssignEsimRequest {
    pub fn into_update(self, now: DateTime<Local>) -> EsimUpdate {
        let asignado_a = self.asignado_a.trim().to_string();
        let estado = self.estado.unwrap_or(if asignado_a.is_empty() {
            Estado::Disponible
        } else {
            Estado::Usado
        });

        EsimUpdate {
            asignado_a: Some(asignado_a),
            estado: Some(estado),
            ..Default::default()
        }
        .stamped(now)
    }
}

// Request de edición de campos
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEsimRequest {
    #[validate(custom = "validate_not_blank")]
    pub iccid: Option<String>,
    #[validate(custom = "validate_not_blank")]
    pub msisdn: Option<String>,
    pub imsi: Option<String>,
    pub pin: Option<String>,
    pub puk: Option<String>,
    pub serie: Option<String>,
    pub asignado_a: Option<String>,
    pub distribuidor: Option<String>,
    pub ip: Option<String>,
    pub producto: Option<Producto>,
    pub estado: Option<Estado>,
    pub image_index: Option<String>,
}

impl UpdateEsimRequest {
    /// Campos a enviar, sin sellar; vacío si no trae ningún cambio
    pub fn into_update(self) -> EsimUpdate {
        EsimUpdate {
            iccid: self.iccid,
            msisdn: self.msisdn,
            imsi: self.imsi,
            pin: self.pin,
            puk: self.puk,
            serie: self.serie,
            asignado_a: self.asignado_a,
            distribuidor: self.distribuidor,
            ip: self.ip,
            producto: self.producto,
            estado: self.estado,
            fecha_ultimo_cambio: None,
            image_index: self.image_index,
        }
    }
}

/// Filtros del listado a partir de la query cruda.
///
/// Claves: `estado`, `producto`, `q` e `ip`; `ip` admite valores repetidos
/// y separados por comas. Las claves desconocidas se ignoran.
pub fn filters_from_query(pairs: &[(String, String)]) -> AppResult<EsimFilters> {
    let mut filters = EsimFilters::default();

    for (key, value) in pairs {
        match key.as_str() {
            "estado" => filters.estado = EstadoFilter::parse(value).map_err(AppError::BadRequest)?,
            "producto" => {
                filters.producto = ProductoFilter::parse(value).map_err(AppError::BadRequest)?
            }
            "q" => filters.query = Some(value.clone()),
            "ip" => filters.ip_in.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(str::to_string),
            ),
            _ => {}
        }
    }

    Ok(filters)
}

// Tarjeta de la vista en cuadrícula
#[derive(Debug, Clone, Serialize)]
pub struct EsimCard {
    pub id: i64,
    pub iccid: String,
    pub msisdn: String,
    pub producto: Producto,
    pub ip: Option<String>,
    pub asignado_a: Option<String>,
    pub estado: Estado,
    pub color: &'static str,
    pub qr_url: String,
    /// Detalle (QR) abierto en la sesión
    pub expanded: bool,
}

// Response del listado
#[derive(Debug, Serialize)]
pub struct EsimListResponse {
    pub records: Vec<EsimRecord>,
    pub total: usize,
    pub filtrados: usize,
    pub ip_options: Vec<String>,
    pub view_mode: ViewMode,
    pub expanded: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Vec<EsimCard>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// "Mostrando N de M registros totales"
    pub summary: String,
}

// Response del detalle
#[derive(Debug, Serialize)]
pub struct EsimDetailResponse {
    pub record: EsimRecord,
    pub color: &'static str,
    pub qr: QrInfo,
}

// Response de estadísticas
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// Response de importación
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub file_name: String,
    pub rows: usize,
    pub validation: ImportValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ImportSummary>,
}

// Response de health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 9, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_create_request_requires_iccid_and_msisdn() {
        let request: CreateEsimRequest =
            serde_json::from_value(serde_json::json!({"iccid": "  ", "msisdn": "2219592008"})).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("iccid"));
        assert!(!errors.field_errors().contains_key("msisdn"));
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateEsimRequest = serde_json::from_value(serde_json::json!({
            "iccid": "8952140063883316310F",
            "msisdn": "2219592008",
            "pin": "",
            "ip": "CB127"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let record = request.into_new_record(now());
        assert_eq!(record.pin.as_deref(), Some(DEFAULT_PIN));
        assert_eq!(record.distribuidor.as_deref(), Some(DEFAULT_DISTRIBUIDOR));
        assert_eq!(record.producto, Producto::Mov);
        assert_eq!(record.estado, Estado::Disponible);
        assert_eq!(record.fecha_creacion.as_deref(), Some("2025-03-09"));
        assert!(record.fecha_ultimo_cambio.is_some());
        assert_eq!(record.asignado_a, None);
    }

    #[test]
    fn test_assign_request_infers_estado() {
        let update = AssignEsimRequest {
            asignado_a: "Tienda Centro".to_string(),
            estado: None,
        }
        .into_update(now());
        assert_eq!(update.estado, Some(Estado::Usado));
        assert!(update.fecha_ultimo_cambio.is_some());

        let release = AssignEsimRequest {
            asignado_a: " ".to_string(),
            estado: None,
        }
        .into_update(now());
        assert_eq!(release.estado, Some(Estado::Disponible));
        assert_eq!(release.asignado_a.as_deref(), Some(""));
    }

    #[test]
    fn test_filters_from_query() {
        let pairs: Vec<(String, String)> = [
            ("estado", "Usado"),
            ("producto", "Todos"),
            ("ip", "CB127,CB200"),
            ("ip", "ZX9"),
            ("q", "maría"),
            ("page", "2"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let filters = filters_from_query(&pairs).unwrap();
        assert_eq!(filters.estado, EstadoFilter::Only(Estado::Usado));
        assert_eq!(filters.producto, ProductoFilter::All);
        assert_eq!(filters.ip_in.len(), 3);
        assert_eq!(filters.query.as_deref(), Some("maría"));

        let bad = vec![("estado".to_string(), "Roto".to_string())];
        assert!(matches!(filters_from_query(&bad), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_request_blank_key_fields_rejected() {
        let request = UpdateEsimRequest {
            msisdn: Some(String::new()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
        assert!(UpdateEsimRequest::default().into_update().is_empty());
    }
}
