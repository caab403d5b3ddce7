//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: filtros,
//! importación, generación de Excel, QR y estadísticas.

pub mod filter_service;
pub mod import_service;
pub mod qr_service;
pub mod stats_service;
pub mod template_service;

pub use filter_service::{apply_filters, ip_options, EsimFilters, EstadoFilter, ProductoFilter};
pub use import_service::{bulk_import, parse_import_file, validate_import, ImportSummary, ImportValidation};
pub use qr_service::{QrInfo, QrService};
pub use stats_service::dashboard_stats;
