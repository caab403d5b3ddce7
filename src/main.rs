use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use esim_inventory::build_router;
use esim_inventory::client::SupabaseClient;
use esim_inventory::config::environment::EnvironmentConfig;
use esim_inventory::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("📱 Sistema de Inventario eSIM");
    info!("============================");

    // Sin credenciales del store no se arranca
    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            error!("   Configura SUPABASE_URL y SUPABASE_KEY en el entorno o en .env");
            std::process::exit(1);
        }
    };

    let store = SupabaseClient::new(&config)?;
    let addr: SocketAddr = config.server_url().parse()?;
    let cache_ttl = config.cache_ttl;

    let app_state = AppState::new(config, Arc::new(store))?;
    let app = build_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🗄️ Cache de lecturas: {}s", cache_ttl.as_secs());
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /api/health - Health check");
    info!("   GET    /api/esims - Listado con filtros (estado, producto, ip, q)");
    info!("   POST   /api/esims - Alta manual");
    info!("   POST   /api/esims/refresh - Recargar datos");
    info!("   GET    /api/esims/export - Exportar inventario completo a Excel");
    info!("   GET    /api/esims/template - Descargar plantilla");
    info!("   POST   /api/esims/import - Importar CSV / Excel");
    info!("   GET    /api/esims/stats - Estadísticas");
    info!("   GET    /api/esims/:id - Detalle con QR");
    info!("   PUT    /api/esims/:id - Editar campos");
    info!("   POST   /api/esims/:id/assign - Asignar");
    info!("   DELETE /api/esims/:id - Eliminar");
    info!("   GET    /api/view - Estado de la vista (por sesión, header x-session-id)");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
