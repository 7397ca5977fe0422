//! Middleware de autenticación JWT
//!
//! Verifica el token Bearer e inyecta el `AuthenticatedOperator` en las
//! extensions de la request.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    models::operator::OperatorRole,
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_token_from_header, verify_token, JwtConfig},
};

/// Operador autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedOperator {
    pub operator_id: Uuid,
    pub username: String,
    pub role: OperatorRole,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &JwtConfig::from(&state.config))?;

    let operator = AuthenticatedOperator {
        operator_id: claims.operator_id()?,
        username: claims.username,
        role: claims.role,
    };

    request.extensions_mut().insert(operator);

    Ok(next.run(request).await)
}
