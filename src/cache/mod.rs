//! Cache
//!
//! Este módulo contiene el cache de lecturas del inventario.

pub mod esim_cache;

pub use esim_cache::{CacheStats, EsimCache, ReadCache};
