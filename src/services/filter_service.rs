//! Motor de filtros y búsqueda
//!
//! Funciones puras sobre el listado cargado. Todos los filtros se combinan
//! con AND y el orden original se conserva.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::esim::{EsimRecord, Estado, Producto};

/// Valor centinela del selector que desactiva el filtro
pub const ALL_SENTINEL: &str = "Todos";

/// Filtro por estado; `All` no filtra
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum EstadoFilter {
    #[default]
    All,
    Only(Estado),
}

/// Filtro por producto; `All` no filtra
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ProductoFilter {
    #[default]
    All,
    Only(Producto),
}

fn is_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL_SENTINEL) || value.eq_ignore_ascii_case("All")
}

impl EstadoFilter {
    pub fn parse(value: &str) -> Result<Self, String> {
        if is_sentinel(value) {
            return Ok(EstadoFilter::All);
        }
        value.trim().parse().map(EstadoFilter::Only)
    }

    fn accepts(&self, estado: Estado) -> bool {
        match self {
            EstadoFilter::All => true,
            EstadoFilter::Only(wanted) => *wanted == estado,
        }
    }
}

impl ProductoFilter {
    pub fn parse(value: &str) -> Result<Self, String> {
        if is_sentinel(value) {
            return Ok(ProductoFilter::All);
        }
        value.trim().parse().map(ProductoFilter::Only)
    }

    fn accepts(&self, producto: Producto) -> bool {
        match self {
            ProductoFilter::All => true,
            ProductoFilter::Only(wanted) => *wanted == producto,
        }
    }
}

/// Criterios de filtrado del inventario
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EsimFilters {
    pub estado: EstadoFilter,
    pub producto: ProductoFilter,
    /// Pools de ip aceptados; vacío no filtra
    pub ip_in: BTreeSet<String>,
    /// Texto libre; vacío o solo espacios no filtra
    pub query: Option<String>,
}

impl EsimFilters {
    /// Todos los filtros en su valor neutro
    pub fn is_noop(&self) -> bool {
        self.estado == EstadoFilter::All
            && self.producto == ProductoFilter::All
            && self.ip_in.is_empty()
            && self.active_query().is_none()
    }

    fn active_query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Proyección de cada registro a sus campos en minúsculas, calculada una
/// sola vez por registro.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    fields: Vec<Vec<String>>,
}

impl SearchIndex {
    pub fn build(records: &[EsimRecord]) -> Self {
        let fields = records
            .iter()
            .map(|record| {
                record
                    .field_strings()
                    .into_iter()
                    .map(|(_, value)| value.to_lowercase())
                    .collect()
            })
            .collect();
        Self { fields }
    }

    /// ¿Algún campo del registro `index` contiene `needle`? (`needle` en minúsculas)
    pub fn matches(&self, index: usize, needle: &str) -> bool {
        self.fields
            .get(index)
            .map_or(false, |fields| fields.iter().any(|f| f.contains(needle)))
    }
}

/// Aplicar los filtros conservando el orden de entrada
pub fn apply_filters(records: &[EsimRecord], filters: &EsimFilters) -> Vec<EsimRecord> {
    if filters.is_noop() {
        return records.to_vec();
    }

    let needle = filters.active_query().map(str::to_lowercase);
    let index = needle.as_ref().map(|_| SearchIndex::build(records));

    records
        .iter()
        .enumerate()
        .filter(|(_, record)| filters.estado.accepts(record.estado))
        .filter(|(_, record)| filters.producto.accepts(record.producto))
        .filter(|(_, record)| {
            filters.ip_in.is_empty()
                || record
                    .ip
                    .as_ref()
                    .map_or(false, |ip| filters.ip_in.contains(ip))
        })
        .filter(|(i, _)| match (&index, &needle) {
            (Some(index), Some(needle)) => index.matches(*i, needle),
            _ => true,
        })
        .map(|(_, record)| record.clone())
        .collect()
}

/// Valores distintos de ip para el selector múltiple, ordenados
pub fn ip_options(records: &[EsimRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.ip.as_deref())
        .filter(|ip| !ip.trim().is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
