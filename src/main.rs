use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bus_station_ops::cache::CacheConfig;
use bus_station_ops::clients::FirebaseClient;
use bus_station_ops::config::{DatabaseConfig, DispatchStore, EnvironmentConfig};
use bus_station_ops::database::DatabaseConnection;
use bus_station_ops::repositories::{DispatchRepository, MemoryDispatchRepository, PgDispatchRepository};
use bus_station_ops::services::auth_service::AuthService;
use bus_station_ops::services::DispatchService;
use bus_station_ops::utils::jwt::JwtConfig;
use bus_station_ops::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bus_station_ops=debug,tower_http=info")),
        )
        .init();

    info!("🚌 Bus Station Ops - API de despacho");
    info!("====================================");

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;
    if config.is_production() {
        info!("🏭 Modo producción");
    }

    // Base de datos y almacén de despachos
    let db_config = DatabaseConfig::new(config.database_url.clone());
    let (pool, repository) = match config.dispatch_store {
        DispatchStore::Postgres => {
            let pool = match DatabaseConnection::connect(&db_config).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };
            let repository: Arc<dyn DispatchRepository> = Arc::new(PgDispatchRepository::new(pool.clone()));
            (pool, repository)
        }
        DispatchStore::Memory => {
            warn!("⚠️ DISPATCH_STORE=memory: los despachos no se persisten");
            let pool = DatabaseConnection::connect_lazy(&db_config)?;
            let repository: Arc<dyn DispatchRepository> = Arc::new(MemoryDispatchRepository::new());
            (pool, repository)
        }
    };

    // Operador administrador inicial
    if let (DispatchStore::Postgres, Some(username), Some(password)) = (
        config.dispatch_store,
        config.admin_username.as_deref(),
        config.admin_password.as_deref(),
    ) {
        let auth = AuthService::new(pool.clone(), JwtConfig::from(&config));
        if let Err(e) = auth.bootstrap_admin(username, password).await {
            error!("❌ No se pudo crear el operador administrador: {}", e);
        }
    }

    let dispatch = DispatchService::new(
        repository,
        config.workflow_policy()?,
        CacheConfig::with_ttl_secs(config.dispatch_cache_ttl_secs),
    );

    let mut state = AppState::new(pool, config.clone(), dispatch);

    // Sistema anterior (Firebase), sólo lectura
    match config.firebase_database_url.as_deref() {
        Some(url) => {
            let client = FirebaseClient::new(url, config.firebase_auth_token.clone())?;
            info!("🔥 Fuente legacy Firebase: {}", client.dispatch_url());
            state = state.with_firebase(client);
        }
        None => info!("ℹ️ FIREBASE_DATABASE_URL no configurada, importación legacy deshabilitada"),
    }

    let app = create_app(state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🔐 Autenticación:");
    info!("   POST /api/auth/login - Login de operador");
    info!("   GET  /api/auth/me - Operador actual");
    info!("🚏 Despacho:");
    info!("   GET  /api/dispatch/board - Tablero por columnas");
    info!("   POST /api/dispatch - Registrar entrada");
    info!("   POST /api/dispatch/:id/passenger-drop | permit | payment | departure-order | exit");
    info!("   GET  /api/dispatch/:id/charges - Servicios facturables");
    info!("📚 Catálogos: /api/vehicles, /api/drivers, /api/routes, /api/locations");
    info!("📊 Reportes: GET /api/reports/summary");
    info!("🔥 Legacy: GET /api/legacy/dispatch, POST /api/legacy/dispatch/import");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
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
