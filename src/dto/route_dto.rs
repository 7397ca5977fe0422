use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::route::{Route, RouteSchedule};
use crate::utils::validation::validate_route_code;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRequest {
    #[validate(custom = "validate_route_code")]
    pub code: String,
    #[validate(length(min = 2, max = 150))]
    pub name: String,
    #[validate(length(min = 2, max = 100))]
    pub origin: String,
    #[validate(length(min = 2, max = 100))]
    pub destination: String,
    pub distance_km: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouteRequest {
    #[validate(custom = "validate_route_code")]
    pub code: Option<String>,
    #[validate(length(min = 2, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub origin: Option<String>,
    #[validate(length(min = 2, max = 100))]
    pub destination: Option<String>,
    pub distance_km: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub departure_time: NaiveTime,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
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

impl From<Route> for RouteResponse {
    fn from(r: Route) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            origin: r.origin,
            destination: r.destination,
            distance_km: r.distance_km,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteScheduleResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub departure_time: NaiveTime,
    pub is_active: bool,
}

impl From<RouteSchedule> for RouteScheduleResponse {
    fn from(s: RouteSchedule) -> Self {
        Self {
            id: s.id,
            route_id: s.route_id,
            departure_time: s.departure_time,
            is_active: s.is_active,
        }
    }
}
