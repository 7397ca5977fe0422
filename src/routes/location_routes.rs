use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::location_controller::LocationController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::location_dto::{CreateLocationRequest, LocationResponse, UpdateLocationRequest};
use crate::dto::vehicle_dto::CatalogQuery;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_location_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", get(get_location).put(update_location).delete(delete_location))
}

async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<Json<ApiResponse<LocationResponse>>, AppError> {
    let controller = LocationController::new(state.pool.clone());
    Ok(Json(controller.create(request).await?))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationResponse>, AppError> {
    let controller = LocationController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<LocationResponse>>, AppError> {
    let controller = LocationController::new(state.pool.clone());
    Ok(Json(controller.list(query.include_inactive).await?))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<LocationResponse>>, AppError> {
    let controller = LocationController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = LocationController::new(state.pool.clone());
    Ok(Json(controller.deactivate(id).await?))
}
