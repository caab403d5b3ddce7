//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Las credenciales del
//! store son obligatorias: sin ellas el servicio no arranca.

use std::env;
use std::time::Duration;

use crate::utils::errors::ConfigError;

/// URL base por defecto del repositorio de imágenes QR
pub const DEFAULT_QR_BASE_URL: &str = "https://raw.githubusercontent.com/Kratoslar69/esim-qr-baitel/main/";

/// Tabla de inventario en el store
pub const DEFAULT_TABLE: &str = "esim_data";

/// Ventana del cache de lecturas
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 10;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub host: String,
    pub port: u16,
    pub supabase_url: String,
    pub supabase_key: String,
    pub table: String,
    pub qr_base_url: String,
    pub cache_ttl: Duration,
    /// Orígenes CORS permitidos; vacío deja CORS abierto
    pub cors_origins: Vec<String>,
}

impl EnvironmentConfig {
    /// Leer la configuración del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construir la configuración a partir de una función de búsqueda
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let supabase_url = required("SUPABASE_URL")?;
        let supabase_key = required("SUPABASE_KEY")?;

        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value })?,
            None => 3000,
        };

        let cache_ttl_seconds = match lookup("CACHE_TTL_SECONDS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "CACHE_TTL_SECONDS", value })?,
            None => DEFAULT_CACHE_TTL_SECONDS,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            table: lookup("ESIM_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            qr_base_url: lookup("QR_BASE_URL").unwrap_or_else(|| DEFAULT_QR_BASE_URL.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
