//! Controladores
//!
//! Validan el request, llaman al servicio o repositorio y arman la
//! respuesta de la API.

pub mod auth_controller;
pub mod dispatch_controller;
pub mod driver_controller;
pub mod legacy_controller;
pub mod location_controller;
pub mod report_controller;
pub mod route_controller;
pub mod vehicle_controller;
