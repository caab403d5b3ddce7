//! Resolución de imágenes QR
//!
//! Cada eSIM tiene (o no) una imagen `<iccid>.png` en un repositorio
//! público. Solo se comprueba su existencia con un HEAD corto; la imagen
//! la descarga el cliente.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::utils::errors::AppResult;

/// Tiempo máximo de la comprobación de existencia
pub const QR_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Texto que se muestra en lugar de la imagen cuando no existe
pub const QR_FALLBACK_TEXT: &str = "QR no disponible";

/// Resultado de resolver el QR de una eSIM
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QrInfo {
    pub url: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

#[derive(Clone)]
pub struct QrService {
    client: Client,
    base_url: String,
}

impl QrService {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let client = Client::builder().timeout(QR_PROBE_TIMEOUT).build()?;

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    /// URL de la imagen para un ICCID
    pub fn qr_url(&self, iccid: &str) -> String {
        format!("{}{}.png", self.base_url, urlencoding::encode(iccid))
    }

    /// ¿Existe la imagen? Cualquier fallo de red o timeout cuenta como "no"
    pub async fn exists(&self, iccid: &str) -> bool {
        let url = self.qr_url(iccid);
        match self.client.head(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("QR no verificable para {}: {}", iccid, e);
                false
            }
        }
    }

    pub async fn resolve(&self, iccid: &str) -> QrInfo {
        let available = self.exists(iccid).await;
        QrInfo {
            url: self.qr_url(iccid),
            available,
            fallback: (!available).then(|| QR_FALLBACK_TEXT.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};

    async fn serve_images() -> String {
        let app = Router::new().route("/8952140063883316310F.png", get(|| async { AxumStatus::OK }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_qr_url_appends_png() {
        let service = QrService::new("https://example.com/qr").unwrap();
        assert_eq!(
            service.qr_url("8952140063883316310F"),
            "https://example.com/qr/8952140063883316310F.png"
        );
        assert_eq!(service.qr_url("a b"), "https://example.com/qr/a%20b.png");
    }

    #[tokio::test]
    async fn test_exists_and_fallback() {
        let base = serve_images().await;
        let service = QrService::new(&base).unwrap();

        assert!(service.exists("8952140063883316310F").await);

        let missing = service.resolve("SIN-IMAGEN").await;
        assert!(!missing.available);
        assert_eq!(missing.fallback.as_deref(), Some(QR_FALLBACK_TEXT));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_available() {
        // Puerto cerrado: la conexión falla y no se propaga el error
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = QrService::new(&format!("http://{}", addr)).unwrap();
        assert!(!service.exists("8952140063883316310F").await);
    }
}
