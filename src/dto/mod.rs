//! Data Transfer Objects
//!
//! Requests y responses de la API (camelCase) y el formato del sistema
//! anterior en Firebase.

pub mod auth_dto;
pub mod common_dto;
pub mod dispatch_dto;
pub mod driver_dto;
pub mod legacy_dto;
pub mod location_dto;
pub mod report_dto;
pub mod route_dto;
pub mod vehicle_dto;

pub use common_dto::ApiResponse;
