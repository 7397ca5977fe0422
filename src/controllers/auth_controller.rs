use sqlx::PgPool;
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, LoginResponse, SessionResponse};
use crate::middleware::auth::AuthenticatedOperator;
use crate::services::auth_service::AuthService;
use crate::utils::errors::AppError;
use crate::utils::jwt::JwtConfig;

pub struct AuthController {
    service: AuthService,
}

impl AuthController {
    pub fn new(pool: PgPool, jwt: JwtConfig) -> Self {
        Self {
            service: AuthService::new(pool, jwt),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;
        self.service.login(request).await
    }

    pub fn me(operator: &AuthenticatedOperator) -> SessionResponse {
        SessionResponse {
            operator_id: operator.operator_id,
            username: operator.username.clone(),
            role: operator.role,
        }
    }
}
