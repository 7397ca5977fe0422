//! Modelo de Vehicle
//!
//! Mapea a la tabla `vehicles`. Los vehículos no se borran: se desactivan
//! para conservar el historial de despachos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    pub seat_capacity: i32,
    pub transport_company: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
