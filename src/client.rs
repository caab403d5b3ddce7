//! Cliente HTTP para el store de inventario (Supabase / PostgREST)
//!
//! Cada operación del store se traduce en una llamada REST sobre la tabla
//! de inventario. El trait `EsimStore` es la costura que usa el repositorio,
//! de modo que los tests pueden sustituir el store remoto por uno en memoria.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::environment::EnvironmentConfig;
use crate::models::esim::{EsimRecord, EsimUpdate, NewEsimRecord};
use crate::utils::errors::{AppError, AppResult};

/// Filas máximas que devuelve el store en una respuesta
pub const STORE_PAGE_SIZE: usize = 1000;

/// Operaciones de la tabla de inventario
#[async_trait]
pub trait EsimStore: Send + Sync {
    /// Todas las filas ordenadas por id descendente
    async fn select_all(&self) -> AppResult<Vec<EsimRecord>>;

    /// Insertar filas; devuelve cuántas se insertaron
    async fn insert(&self, records: &[NewEsimRecord]) -> AppResult<usize>;

    /// Actualización parcial por id
    async fn update(&self, id: i64, fields: &EsimUpdate) -> AppResult<()>;

    /// Borrado por id
    async fn delete(&self, id: i64) -> AppResult<()>;
}

/// Cliente REST de Supabase para la tabla de eSIMs
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseClient {
    /// Crear nuevo cliente con las credenciales configuradas
    pub fn new(config: &EnvironmentConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        info!("🔗 Cliente del store configurado: {}", config.supabase_url);

        Ok(Self {
            client,
            base_url: config.supabase_url.clone(),
            api_key: config.supabase_key.clone(),
            table: config.table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    /// Convertir una respuesta no exitosa en error con la causa del store
    async fn check(response: Response, operation: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalApi(format!(
            "{} falló ({}): {}",
            operation,
            status,
            store_error_message(&body)
        )))
    }
}

/// Extraer el campo `message` de un error de PostgREST, o el cuerpo tal cual
pub fn store_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Filtro de igualdad sobre el id
fn id_filter(id: i64) -> String {
    format!("eq.{}", id)
}

#[async_trait]
impl EsimStore for SupabaseClient {
    async fn select_all(&self) -> AppResult<Vec<EsimRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let request = self
                .client
                .get(self.table_url())
                .query(&[
                    ("select", "*".to_string()),
                    ("order", "id.desc".to_string()),
                    ("offset", offset.to_string()),
                    ("limit", STORE_PAGE_SIZE.to_string()),
                ]);

            let response = Self::check(self.with_auth(request).send().await?, "select").await?;
            let page: Vec<EsimRecord> = response
                .json()
                .await
                .map_err(|e| AppError::ExternalApi(format!("Respuesta inválida del store: {}", e)))?;

            let page_len = page.len();
            records.extend(page);
            debug!("📄 Página del store: offset={} filas={}", offset, page_len);

            if page_len < STORE_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }

        Ok(records)
    }

    async fn insert(&self, records: &[NewEsimRecord]) -> AppResult<usize> {
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(records);

        Self::check(self.with_auth(request).send().await?, "insert").await?;
        Ok(records.len())
    }

    async fn update(&self, id: i64, fields: &EsimUpdate) -> AppResult<()> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", id_filter(id))])
            .header("Prefer", "return=minimal")
            .json(fields);

        Self::check(self.with_auth(request).send().await?, "update").await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let request = self
            .client
            .delete(self.table_url())
            .query(&[("id", id_filter(id))]);

        Self::check(self.with_auth(request).send().await?, "delete").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_message() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert_eq!(
            store_error_message(body),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(store_error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_table_url_and_filter() {
        let config = EnvironmentConfig::from_lookup(|key| match key {
            "SUPABASE_URL" => Some("https://demo.supabase.co/".to_string()),
            "SUPABASE_KEY" => Some("anon".to_string()),
            _ => None,
        })
        .unwrap();
        let client = SupabaseClient::new(&config).unwrap();
        assert_eq!(client.table_url(), "https://demo.supabase.co/rest/v1/esim_data");
        assert_eq!(id_filter(42), "eq.42");
    }
}
