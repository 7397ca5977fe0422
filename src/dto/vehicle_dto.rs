use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::vehicle::Vehicle;
use crate::utils::validation::validate_plate_number;

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_plate_number")]
    pub plate_number: String,
    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: String,
    #[validate(range(min = 1, max = 100))]
    pub seat_capacity: i32,
    #[validate(length(max = 150))]
    pub transport_company: Option<String>,
}

// Request para actualizar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(custom = "validate_plate_number")]
    pub plate_number: Option<String>,
    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub seat_capacity: Option<i32>,
    #[validate(length(max = 150))]
    pub transport_company: Option<String>,
    pub is_active: Option<bool>,
}

// Filtro del listado (`?includeInactive=true`), compartido por los catálogos
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// Response de vehículo
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: Uuid,
    pub plate_number: String,
    pub vehicle_type: String,
    pub seat_capacity: i32,
    pub transport_company: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            plate_number: v.plate_number,
            vehicle_type: v.vehicle_type,
            seat_capacity: v.seat_capacity,
            transport_company: v.transport_company,
            is_active: v.is_active,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}
