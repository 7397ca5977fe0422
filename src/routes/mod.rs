//! Rutas HTTP
//!
//! `create_app` monta todos los routers bajo `/api`. Sólo `/health` y
//! `/api/auth/login` son públicos; el resto pasa por `auth_middleware`.

pub mod auth_routes;
pub mod dispatch_routes;
pub mod driver_routes;
pub mod legacy_routes;
pub mod location_routes;
pub mod report_routes;
pub mod route_routes;
pub mod vehicle_routes;

use axum::{extract::State, middleware, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::config::DispatchStore;
use crate::database::DatabaseConnection;
use crate::middleware::{auth_middleware, cors_for, rate_limit_middleware};
use crate::state::AppState;

/// Construye el router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/dispatch", dispatch_routes::create_dispatch_router())
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/drivers", driver_routes::create_driver_router())
        .nest("/routes", route_routes::create_route_router())
        .nest("/locations", location_routes::create_location_router())
        .nest("/reports", report_routes::create_report_router())
        .nest("/legacy", legacy_routes::create_legacy_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .nest("/auth", auth_routes::create_auth_router(&state))
        .merge(protected);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors_for(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(state.config.max_concurrent_requests))
        .with_state(state)
}

/// Health check
async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.config.dispatch_store {
        DispatchStore::Postgres => Some(DatabaseConnection::ping(&state.pool).await),
        DispatchStore::Memory => None,
    };

    Json(json!({
        "status": "ok",
        "environment": state.config.environment,
        "dispatchStore": format!("{:?}", state.config.dispatch_store).to_lowercase(),
        "database": database,
        "legacySource": state.firebase.is_some(),
        "cache": state.dispatch.cache_stats().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
