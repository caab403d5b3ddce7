//! Capa de acceso a datos del inventario
//!
//! Envuelve las operaciones del store detrás de cuatro funciones y una
//! lectura cacheada. Ningún error del store sale de esta capa: todo se
//! convierte en `LoadResult` / `OperationResult` con un mensaje listo para
//! mostrar.
//!
//! No hay campo de versión: dos actualizaciones concurrentes del mismo
//! registro se pisan y gana la última.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cache::{CacheStats, EsimCache};
use crate::client::EsimStore;
use crate::models::esim::{EsimRecord, EsimUpdate, NewEsimRecord};

/// Resultado de `load_all`: lista vacía y error cuando el store falla
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadResult {
    pub records: Vec<EsimRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Resultado de una operación de escritura
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationResult {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl OperationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            count: None,
        }
    }

    pub fn success_with_count(message: impl Into<String>, count: usize) -> Self {
        Self {
            ok: true,
            message: message.into(),
            count: Some(count),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            count: None,
        }
    }
}

pub struct EsimRepository {
    store: Arc<dyn EsimStore>,
    cache: EsimCache,
}

impl EsimRepository {
    pub fn new(store: Arc<dyn EsimStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: EsimCache::new(cache_ttl),
        }
    }

    /// Todas las eSIMs ordenadas por id descendente, desde el cache si está vigente
    pub async fn load_all(&self) -> LoadResult {
        let store = Arc::clone(&self.store);
        match self.cache.get_or_load(|| async move { store.select_all().await }).await {
            Ok(records) => LoadResult {
                records,
                error: None,
            },
            Err(e) => {
                error!("❌ Error cargando datos: {}", e);
                LoadResult {
                    records: Vec::new(),
                    error: Some(format!("Error cargando datos: {}", e)),
                }
            }
        }
    }

    pub async fn insert(&self, records: Vec<NewEsimRecord>) -> OperationResult {
        if records.is_empty() {
            return OperationResult::failure("❌ No hay registros para agregar");
        }

        let result = match self.store.insert(&records).await {
            Ok(count) => {
                info!("➕ {} registro(s) insertado(s)", count);
                let message = if count == 1 {
                    "✅ Registro agregado exitosamente".to_string()
                } else {
                    format!("✅ {} registros agregados exitosamente", count)
                };
                OperationResult::success_with_count(message, count)
            }
            Err(e) => {
                error!("❌ Error insertando registros: {}", e);
                OperationResult::failure(format!("❌ Error: {}", e))
            }
        };

        self.cache.invalidate().await;
        result
    }

    /// Actualización parcial; el llamador sella `fecha_ultimo_cambio`
    pub async fn update(&self, id: i64, fields: EsimUpdate) -> OperationResult {
        if fields.is_empty() {
            warn!("⚠️ Actualización vacía para id {}", id);
            return OperationResult::failure("❌ No hay cambios para guardar");
        }

        let result = match self.store.update(id, &fields).await {
            Ok(()) => {
                info!("✏️ Registro {} actualizado", id);
                OperationResult::success("✅ Registro actualizado exitosamente")
            }
            Err(e) => {
                error!("❌ Error actualizando registro {}: {}", id, e);
                OperationResult::failure(format!("❌ Error: {}", e))
            }
        };

        self.cache.invalidate().await;
        result
    }

    pub async fn delete(&self, id: i64) -> OperationResult {
        let result = match self.store.delete(id).await {
            Ok(()) => {
                info!("🗑️ Registro {} eliminado", id);
                OperationResult::success("✅ Registro eliminado exitosamente")
            }
            Err(e) => {
                error!("❌ Error eliminando registro {}: {}", id, e);
                OperationResult::failure(format!("❌ Error: {}", e))
            }
        };

        self.cache.invalidate().await;
        result
    }

    /// Descartar el cache para forzar una recarga
    pub async fn refresh(&self) {
        self.cache.invalidate().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats().await
    }
}
