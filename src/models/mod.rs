//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL.

pub mod dispatch;
pub mod driver;
pub mod location;
pub mod operator;
pub mod route;
pub mod service_charge;
pub mod vehicle;
