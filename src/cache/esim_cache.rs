//! Cache de lecturas con invalidación manual
//!
//! Guarda el último resultado de `load_all` durante una ventana corta para
//! acotar el tráfico de lectura. Toda mutación debe llamar a `invalidate()`
//! para que la siguiente lectura refleje el estado confirmado.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::models::esim::EsimRecord;
use crate::utils::errors::AppResult;

/// Cache del listado completo de eSIMs
pub type EsimCache = ReadCache<Vec<EsimRecord>>;

/// Valor en cache con su instante de carga
#[derive(Debug, Clone)]
struct CachedValue<T> {
    value: T,
    loaded_at: Instant,
}

/// Estadísticas del cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Cache de un único valor con TTL.
///
/// `generation` avanza en cada `invalidate()`; una carga iniciada antes de
/// una invalidación no vuelve a guardar su resultado.
pub struct ReadCache<T> {
    ttl: Duration,
    entry: RwLock<Option<CachedValue<T>>>,
    generation: AtomicU64,
    stats: RwLock<CacheStats>,
}

impl<T: Clone> ReadCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Valor vigente, si lo hay
    pub async fn get(&self) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| cached.value.clone())
    }

    /// Guardar solo si no hubo invalidación desde `generation`
    async fn set_if_current(&self, generation: u64, value: T) -> bool {
        let mut entry = self.entry.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *entry = Some(CachedValue {
            value,
            loaded_at: Instant::now(),
        });
        true
    }

    /// Devolver el valor vigente o cargarlo con `loader`.
    ///
    /// Solo se guardan las cargas exitosas; un error se propaga sin tocar
    /// el cache. Si una mutación invalida el cache mientras la carga está en
    /// curso, el valor se devuelve pero no se guarda.
    pub async fn get_or_load<F, Fut>(&self, loader: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.get().await {
            self.stats.write().await.hits += 1;
            debug!("📥 Cache HIT");
            return Ok(value);
        }

        self.stats.write().await.misses += 1;
        debug!("❌ Cache MISS, cargando desde el store");

        let generation = self.generation.load(Ordering::SeqCst);
        let value = loader().await?;
        if !self.set_if_current(generation, value.clone()).await {
            debug!("⏭️ Carga descartada: el cache se invalidó durante la lectura");
        }
        Ok(value)
    }

    /// Descartar el valor guardado
    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if entry.take().is_some() {
            info!("🧹 Cache invalidado");
        }
        self.stats.write().await.invalidations += 1;
    }

    pub async fn get_stats(&self) -> CacheStats {
        *self.stats.read().await
    }
}
