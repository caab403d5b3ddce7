//! Modelos de estadísticas del dashboard

use serde::Serialize;

/// Conteo de registros para una etiqueta (estado, producto o ip)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Resumen mostrado sobre la tabla de inventario
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub disponibles: usize,
    pub usadas: usize,
    pub filtrados: usize,
    pub por_estado: Vec<LabelCount>,
    pub por_producto: Vec<LabelCount>,
    /// Los 10 pools de ip con más eSIMs
    pub top_ips: Vec<LabelCount>,
}

impl LabelCount {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}
