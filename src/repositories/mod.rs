//! Repositorios de acceso a datos

pub mod dispatch_repository;
pub mod driver_repository;
pub mod location_repository;
pub mod memory_dispatch_repository;
pub mod operator_repository;
pub mod route_repository;
pub mod vehicle_repository;

pub use dispatch_repository::{DispatchRepository, PgDispatchRepository};
pub use memory_dispatch_repository::MemoryDispatchRepository;
