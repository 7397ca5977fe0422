use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::route_controller::RouteController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::route_dto::{
    CreateRouteRequest, CreateScheduleRequest, RouteResponse, RouteScheduleResponse,
    UpdateRouteRequest,
};
use crate::dto::vehicle_dto::CatalogQuery;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_routes).post(create_route))
        .route("/:id", get(get_route).put(update_route).delete(delete_route))
        .route("/:id/schedules", get(list_schedules).post(create_schedule))
}

async fn create_route(
    State(state): State<AppState>,
    Json(request): Json<CreateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.create(request).await?))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn list_routes(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.list(query.include_inactive).await?))
}

async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRouteRequest>,
) -> Result<Json<ApiResponse<RouteResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.deactivate(id).await?))
}

async fn list_schedules(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RouteScheduleResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.list_schedules(id).await?))
}

async fn create_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<ApiResponse<RouteScheduleResponse>>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    Ok(Json(controller.create_schedule(id, request).await?))
}
