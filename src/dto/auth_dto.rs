use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::operator::{Operator, OperatorRole};

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: OperatorRole,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Operator> for OperatorResponse {
    fn from(o: Operator) -> Self {
        Self {
            id: o.id,
            username: o.username,
            full_name: o.full_name,
            role: o.role,
            last_login: o.last_login,
        }
    }
}

// Login response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub operator: OperatorResponse,
}

// Operador de la sesión actual (GET /api/auth/me), tal y como viene en el token
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub operator_id: Uuid,
    pub username: String,
    pub role: OperatorRole,
}
