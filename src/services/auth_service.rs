//! Autenticación de operadores
//!
//! Login con bcrypt y emisión de JWT. El administrador inicial se crea al
//! arrancar si `ADMIN_USERNAME`/`ADMIN_PASSWORD` están definidos.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::models::operator::OperatorRole;
use crate::repositories::operator_repository::OperatorRepository;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::jwt::{generate_token, JwtConfig};

const INVALID_CREDENTIALS: &str = "Usuario o contraseña incorrectos";

pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Hash(format!("Error hasheando contraseña: {}", e)))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| AppError::Hash(format!("Error verificando contraseña: {}", e)))
}

pub struct AuthService {
    repository: OperatorRepository,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtConfig) -> Self {
        Self {
            repository: OperatorRepository::new(pool),
            jwt,
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let username = request.username.trim();
        let operator = match self.repository.find_by_username(username).await? {
            Some(operator) if operator.is_active => operator,
            _ => {
                warn!("🔒 Login fallido para '{}'", username);
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&request.password, &operator.password_hash)? {
            warn!("🔒 Contraseña incorrecta para '{}'", username);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = generate_token(operator.id, &operator.username, operator.role, &self.jwt)?;
        self.repository.touch_last_login(operator.id).await?;
        info!("🔑 Operador '{}' autenticado", operator.username);

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiration,
            operator: operator.into(),
        })
    }

    /// Crea el operador administrador si todavía no existe
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> AppResult<()> {
        if self.repository.find_by_username(username).await?.is_some() {
            return Ok(());
        }

        let hash = hash_password(password)?;
        self.repository
            .create(username, "Administrador", &hash, OperatorRole::Admin)
            .await?;
        info!("👤 Operador administrador '{}' creado", username);
        Ok(())
    }
}
