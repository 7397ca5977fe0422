//! Backend de operaciones de la estación de buses
//!
//! Registro de entradas, permisos, cobros y salidas de vehículos, con el
//! tablero de despacho, los catálogos y los reportes.

pub mod cache;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_app;
pub use state::AppState;
