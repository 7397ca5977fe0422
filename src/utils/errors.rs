//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::dispatch_workflow::WorkflowError;

/// Código de Postgres para violación de restricción UNIQUE
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Código de Postgres para violación de FOREIGN KEY
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Nombre de la restricción UNIQUE sobre el código de orden de transporte
pub const TRANSPORT_ORDER_CODE_CONSTRAINT: &str = "dispatch_records_transport_order_code_key";

/// Errores por campo (campo -> mensaje), tal y como los muestra el formulario
pub type FieldErrors = BTreeMap<String, String>;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid fields: {0:?}")]
    InvalidFields(FieldErrors),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Duplicate transport order code: {0}")]
    DuplicateTransportOrderCode(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();

            if code == PG_UNIQUE_VIOLATION {
                if db_err.constraint() == Some(TRANSPORT_ORDER_CODE_CONSTRAINT) {
                    return AppError::DuplicateTransportOrderCode(
                        "El código de orden de transporte ya existe".to_string(),
                    );
                }
                return AppError::Conflict(format!(
                    "Registro duplicado ({})",
                    db_err.constraint().unwrap_or("unique")
                ));
            }

            if code == PG_FOREIGN_KEY_VIOLATION {
                return AppError::BadRequest(format!(
                    "Referencia inexistente ({})",
                    db_err.constraint().unwrap_or("foreign key")
                ));
            }
        }

        AppError::Database(e)
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::InvalidFields(fields) => AppError::InvalidFields(fields),
            other @ WorkflowError::InvalidTransition { .. } => {
                AppError::InvalidTransition(other.to_string())
            }
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Database Error",
                        "Ha ocurrido un error al acceder a la base de datos, inténtelo de nuevo".to_string(),
                        "DB_ERROR",
                    ),
                )
            }

            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new(
                        "Validation Error",
                        "Los datos enviados no son válidos".to_string(),
                        "VALIDATION_ERROR",
                    )
                    .with_details(json!(e)),
                )
            }

            AppError::InvalidFields(fields) => {
                warn!("Invalid fields: {:?}", fields);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse::new(
                        "Validation Error",
                        "Faltan campos obligatorios o son inválidos".to_string(),
                        "VALIDATION_ERROR",
                    )
                    .with_details(json!({ "fields": fields })),
                )
            }

            AppError::InvalidTransition(msg) => {
                warn!("Invalid transition: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("Invalid Transition", msg, "INVALID_TRANSITION"),
                )
            }

            AppError::DuplicateTransportOrderCode(msg) => {
                warn!("Duplicate transport order code: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("Conflict", msg, "DUPLICATE_TRANSPORT_ORDER_CODE"),
                )
            }

            AppError::Unauthorized(msg) => {
                warn!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED"),
                )
            }

            AppError::NotFound(msg) => {
                warn!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("Not Found", msg, "NOT_FOUND"),
                )
            }

            AppError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("Conflict", msg, "CONFLICT"),
                )
            }

            AppError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),
                )
            }

            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Internal Server Error",
                        "Ha ocurrido un error inesperado, inténtelo de nuevo".to_string(),
                        "INTERNAL_ERROR",
                    ),
                )
            }

            AppError::RateLimitExceeded => {
                warn!("Rate limit exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    ErrorResponse::new(
                        "Rate Limit Exceeded",
                        "Demasiadas peticiones, inténtelo más tarde".to_string(),
                        "RATE_LIMIT_EXCEEDED",
                    ),
                )
            }

            AppError::ServiceUnavailable(msg) => {
                warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("Service Unavailable", msg, "SERVICE_UNAVAILABLE"),
                )
            }

            AppError::Jwt(msg) => {
                warn!("JWT error: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("JWT Error", msg, "JWT_ERROR"),
                )
            }

            AppError::Hash(msg) => {
                error!("❌ Hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "Hash Error",
                        "Error procesando las credenciales".to_string(),
                        "HASH_ERROR",
                    ),
                )
            }

            AppError::ExternalApi(msg) => {
                error!("❌ External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::new(
                        "External API Error",
                        "Error comunicando con el servicio externo".to_string(),
                        "EXTERNAL_API_ERROR",
                    )
                    .with_details(json!({ "external_api_error": msg })),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de un solo campo
pub fn field_error(field: &str, message: &str) -> AppError {
    let mut fields = FieldErrors::new();
    fields.insert(field.to_string(), message.to_string());
    AppError::InvalidFields(fields)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} con {} '{}' ya existe", resource, field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dispatch::DispatchStatus;

    #[test]
    fn test_workflow_errors_keep_their_shape() {
        let mut fields = FieldErrors::new();
        fields.insert("transportOrderCode".to_string(), "requerido".to_string());

        match AppError::from(WorkflowError::InvalidFields(fields)) {
            AppError::InvalidFields(f) => assert!(f.contains_key("transportOrderCode")),
            other => panic!("unexpected error: {:?}", other),
        }

        let transition = WorkflowError::InvalidTransition {
            action: "record_exit",
            status: DispatchStatus::Entered,
        };
        assert!(matches!(AppError::from(transition), AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_status_codes() {
        let resp = AppError::DuplicateTransportOrderCode("dup".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = field_error("seatCount", "debe ser mayor que 0").into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = not_found_error("DispatchRecord", "x").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_non_database_sqlx_errors_stay_database_errors() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
    }
}
