use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::middleware::auth::{auth_middleware, AuthenticatedOperator};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::JwtConfig;

/// `/login` es público; `/me` exige token
pub fn create_auth_router(state: &AppState) -> Router<AppState> {
    Router::new().route("/login", post(login)).route(
        "/me",
        get(me).route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
    )
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let controller = AuthController::new(state.pool.clone(), JwtConfig::from(&state.config));
    Ok(Json(controller.login(request).await?))
}

async fn me(Extension(operator): Extension<AuthenticatedOperator>) -> Json<SessionResponse> {
    Json(AuthController::me(&operator))
}
