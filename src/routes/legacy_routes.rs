use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::legacy_controller::LegacyController;
use crate::dto::legacy_dto::{ImportSummary, LegacyDispatchEntry};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Lectura e importación de despachos de la base Firebase anterior
pub fn create_legacy_router() -> Router<AppState> {
    Router::new()
        .route("/dispatch", get(list_legacy))
        .route("/dispatch/import", post(import_legacy))
}

async fn list_legacy(State(state): State<AppState>) -> Result<Json<Vec<LegacyDispatchEntry>>, AppError> {
    Ok(Json(LegacyController::new(&state).list().await?))
}

async fn import_legacy(State(state): State<AppState>) -> Result<Json<ImportSummary>, AppError> {
    Ok(Json(LegacyController::new(&state).import().await?))
}
