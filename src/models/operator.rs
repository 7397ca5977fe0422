//! Modelo de Operator
//!
//! Personal de la estación que opera el tablero. Mapea a la tabla
//! `operators` y al ENUM `operator_role`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "operator_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OperatorRole {
    Admin,
    Dispatcher,
}

impl OperatorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorRole::Admin => "admin",
            OperatorRole::Dispatcher => "dispatcher",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(OperatorRole::Admin),
            "dispatcher" => Some(OperatorRole::Dispatcher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Operator {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: OperatorRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [OperatorRole::Admin, OperatorRole::Dispatcher] {
            assert_eq!(OperatorRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(OperatorRole::parse("livreur"), None);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let operator = Operator {
            id: Uuid::new_v4(),
            username: "ops".into(),
            full_name: "Ops".into(),
            password_hash: "$2b$secret".into(),
            role: OperatorRole::Dispatcher,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&operator).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "dispatcher");
    }
}
