//! Modelo de Route
//!
//! Rutas servidas desde la estación y sus horarios de salida. Mapea a las
//! tablas `routes` y `route_schedules`.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Horario de salida; `departure_time` es hora local de la estación
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RouteSchedule {
    pub id: Uuid,
    pub route_id: Uuid,
    pub departure_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
