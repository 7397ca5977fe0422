use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::dispatch_controller::DispatchController;
use crate::dto::common_dto::ApiResponse;
use crate::dto::dispatch_dto::{
    BoardQuery, BoardResponse, CreateServiceChargeRequest, DepartureOrderRequest,
    DispatchListQuery, DispatchRecordResponse, EntryImageRequest, ExitRequest,
    IssuePermitRequest, PassengerDropRequest, PaymentRequest, RecordEntryRequest,
    ServiceChargeListResponse, ServiceChargeResponse,
};
use crate::middleware::auth::AuthenticatedOperator;
use crate::services::permit_validation::{PermitForm, PermitValidation};
use crate::state::AppState;
use crate::utils::errors::AppError;

type DispatchJson = Json<ApiResponse<DispatchRecordResponse>>;

pub fn create_dispatch_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_entry).get(list_dispatches))
        .route("/board", get(get_board))
        .route("/refresh", post(refresh_board))
        .route("/:id", get(get_dispatch))
        .route("/:id/entry-image", patch(update_entry_image))
        .route("/:id/passenger-drop", post(passenger_drop))
        .route("/:id/permit", post(issue_permit))
        .route("/:id/permit/validate", post(validate_permit))
        .route("/:id/payment", post(process_payment))
        .route("/:id/departure-order", post(departure_order))
        .route("/:id/exit", post(record_exit))
        .route("/:id/charges", get(list_charges).post(add_charge))
        .route("/:id/charges/:charge_id", delete(delete_charge))
}

fn controller(state: &AppState) -> DispatchController {
    DispatchController::new(state.dispatch.clone())
}

async fn record_entry(
    State(state): State<AppState>,
    Json(request): Json<RecordEntryRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).record_entry(request).await?))
}

async fn list_dispatches(
    State(state): State<AppState>,
    Query(query): Query<DispatchListQuery>,
) -> Result<Json<Vec<DispatchRecordResponse>>, AppError> {
    Ok(Json(controller(&state).list(query).await?))
}

async fn get_board(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    Ok(Json(controller(&state).board(query).await?))
}

async fn refresh_board(State(state): State<AppState>) -> Result<Json<BoardResponse>, AppError> {
    Ok(Json(controller(&state).refresh().await?))
}

async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchRecordResponse>, AppError> {
    Ok(Json(controller(&state).get_by_id(id).await?))
}

async fn update_entry_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EntryImageRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).update_entry_image(id, request).await?))
}

async fn passenger_drop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PassengerDropRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).passenger_drop(id, request).await?))
}

async fn validate_permit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<PermitForm>,
) -> Result<Json<PermitValidation>, AppError> {
    Ok(Json(controller(&state).validate_permit(id, form).await?))
}

async fn issue_permit(
    State(state): State<AppState>,
    Extension(operator): Extension<AuthenticatedOperator>,
    Path(id): Path<Uuid>,
    Json(request): Json<IssuePermitRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).issue_permit(id, request, &operator).await?))
}

async fn process_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).payment(id, request).await?))
}

async fn departure_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DepartureOrderRequest>,
) -> Result<DispatchJson, AppError> {
    Ok(Json(controller(&state).departure_order(id, request).await?))
}

async fn record_exit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<ExitRequest>>,
) -> Result<DispatchJson, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(controller(&state).exit(id, request).await?))
}

async fn list_charges(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceChargeListResponse>, AppError> {
    Ok(Json(controller(&state).list_charges(id).await?))
}

async fn add_charge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateServiceChargeRequest>,
) -> Result<Json<ApiResponse<ServiceChargeResponse>>, AppError> {
    Ok(Json(controller(&state).add_charge(id, request).await?))
}

async fn delete_charge(
    State(state): State<AppState>,
    Path((id, charge_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    Ok(Json(controller(&state).delete_charge(id, charge_id).await?))
}
