//! Services module
//!
//! Lógica de negocio: máquina de estados del despacho, validación del
//! permiso, tablero, reportes, autenticación e importación legacy.

pub mod auth_service;
pub mod dispatch_service;
pub mod dispatch_workflow;
pub mod display_status;
pub mod legacy_sync_service;
pub mod permit_validation;
pub mod report_service;

pub use dispatch_service::DispatchService;
pub use dispatch_workflow::{DispatchWorkflow, WorkflowError, WorkflowPolicy};
