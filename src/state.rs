//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::EsimStore;
use crate::config::environment::EnvironmentConfig;
use crate::models::view_state::ViewState;
use crate::repositories::EsimRepository;
use crate::services::qr_service::QrService;
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub repository: Arc<EsimRepository>,
    pub qr: QrService,
    /// Estado de presentación por sesión de cliente
    pub views: Arc<RwLock<HashMap<String, ViewState>>>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, store: Arc<dyn EsimStore>) -> AppResult<Self> {
        let qr = QrService::new(&config.qr_base_url)?;
        let repository = EsimRepository::new(store, config.cache_ttl);

        Ok(Self {
            config: Arc::new(config),
            repository: Arc::new(repository),
            qr,
            views: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Vista de una sesión; una sesión nueva arranca con los valores por defecto
    pub async fn view(&self, session: &str) -> ViewState {
        self.views
            .read()
            .await
            .get(session)
            .cloned()
            .unwrap_or_default()
    }

    /// Modificar la vista de una sesión y devolver lo que produzca `f`
    pub async fn update_view<R>(&self, session: &str, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut views = self.views.write().await;
        f(views.entry(session.to_string()).or_default())
    }

    /// Cerrar los detalles abiertos de la sesión; se llama en cada recarga
    pub async fn reset_details(&self, session: &str) {
        self.update_view(session, ViewState::reset_details).await;
    }
}
