//! Estado de la vista del inventario
//!
//! Estado explícito del lado cliente: modo de vista, modo oscuro y qué
//! registros tienen el detalle (QR) abierto, indexado por id de registro.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::esim::EsimRecord;

/// Tarjetas por fila en la vista de tarjetas
pub const CARDS_PER_ROW: usize = 3;

/// Modo de presentación del inventario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Lista,
    Tarjetas,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub view_mode: ViewMode,
    pub dark_mode: bool,
    pub expanded: HashMap<i64, bool>,
}

impl ViewState {
    pub fn toggle_view(&mut self) -> ViewMode {
        self.view_mode = match self.view_mode {
            ViewMode::Lista => ViewMode::Tarjetas,
            ViewMode::Tarjetas => ViewMode::Lista,
        };
        self.view_mode
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn show_detail(&mut self, id: i64) {
        self.expanded.insert(id, true);
    }

    pub fn close_detail(&mut self, id: i64) {
        self.expanded.insert(id, false);
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// Ids con el detalle abierto, ordenados
    pub fn expanded_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .expanded
            .iter()
            .filter(|(_, open)| **open)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Cerrar todos los detalles; se llama en cada recarga de datos
    pub fn reset_details(&mut self) {
        self.expanded.clear();
    }
}

/// Agrupar registros en filas de `per_row` tarjetas
pub fn card_rows(records: &[EsimRecord], per_row: usize) -> Vec<Vec<EsimRecord>> {
    if per_row == 0 {
        return Vec::new();
    }
    records.chunks(per_row).map(|chunk| chunk.to_vec()).collect()
}
