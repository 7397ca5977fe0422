//! Modelo de DispatchRecord
//!
//! Un registro por cada visita de un vehículo a la estación. Mapea a la
//! tabla `dispatch_records` y a los ENUM de Postgres del mismo nombre.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del despacho - mapea al ENUM dispatch_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "dispatch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Entered,
    PassengersDropped,
    PermitIssued,
    PermitRejected,
    Paid,
    DepartureOrdered,
    Departed,
}

impl DispatchStatus {
    pub const ALL: [DispatchStatus; 7] = [
        DispatchStatus::Entered,
        DispatchStatus::PassengersDropped,
        DispatchStatus::PermitIssued,
        DispatchStatus::PermitRejected,
        DispatchStatus::Paid,
        DispatchStatus::DepartureOrdered,
        DispatchStatus::Departed,
    ];

    /// Posición en la secuencia; `permit_issued` y `permit_rejected` comparten etapa.
    pub fn stage(self) -> u8 {
        match self {
            DispatchStatus::Entered => 0,
            DispatchStatus::PassengersDropped => 1,
            DispatchStatus::PermitIssued | DispatchStatus::PermitRejected => 2,
            DispatchStatus::Paid => 3,
            DispatchStatus::DepartureOrdered => 4,
            DispatchStatus::Departed => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStatus::Entered => "entered",
            DispatchStatus::PassengersDropped => "passengers_dropped",
            DispatchStatus::PermitIssued => "permit_issued",
            DispatchStatus::PermitRejected => "permit_rejected",
            DispatchStatus::Paid => "paid",
            DispatchStatus::DepartureOrdered => "departure_ordered",
            DispatchStatus::Departed => "departed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado del permiso - mapea al ENUM permit_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "permit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermitStatus {
    Approved,
    Rejected,
}

/// Forma de pago - mapea al ENUM payment_method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    Card,
}

/// DispatchRecord principal - mapea exactamente a la tabla dispatch_records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DispatchRecord {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,

    // Un timestamp por evento del ciclo de vida
    pub entry_time: DateTime<Utc>,
    pub passenger_drop_time: Option<DateTime<Utc>>,
    pub boarding_permit_time: Option<DateTime<Utc>>,
    pub planned_departure_time: Option<DateTime<Utc>>,
    pub payment_time: Option<DateTime<Utc>>,
    pub departure_order_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,

    pub current_status: DispatchStatus,

    pub passengers_arrived: Option<i32>,
    pub passengers_departing: Option<i32>,
    pub entry_image_url: Option<String>,

    // Permiso
    pub transport_order_code: Option<String>,
    pub seat_count: Option<i32>,
    pub permit_status: Option<PermitStatus>,
    pub rejection_reason: Option<String>,
    pub permit_issued_by: Option<Uuid>,

    // Pago
    pub payment_amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub invoice_number: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtros para listar registros de despacho
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DispatchFilter {
    pub status: Option<DispatchStatus>,
    pub vehicle_id: Option<Uuid>,
    pub entered_from: Option<DateTime<Utc>>,
    pub entered_to: Option<DateTime<Utc>>,
}

impl DispatchFilter {
    /// Clave estable para el cache de listados
    pub fn cache_key(&self) -> String {
        format!(
            "status={}|vehicle={}|from={}|to={}",
            self.status.map(|s| s.as_str()).unwrap_or("*"),
            self.vehicle_id.map(|v| v.to_string()).unwrap_or_else(|| "*".to_string()),
            self.entered_from.map(|t| t.to_rfc3339()).unwrap_or_else(|| "*".to_string()),
            self.entered_to.map(|t| t.to_rfc3339()).unwrap_or_else(|| "*".to_string()),
        )
    }

    pub fn matches(&self, record: &DispatchRecord) -> bool {
        self.status.map_or(true, |s| record.current_status == s)
            && self.vehicle_id.map_or(true, |v| record.vehicle_id == v)
            && self.entered_from.map_or(true, |from| record.entry_time >= from)
            && self.entered_to.map_or(true, |to| record.entry_time < to)
    }
}

/// Horario de salida de una ruta, usado para calcular la salida prevista
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub route_id: Uuid,
    pub departure_time: chrono::NaiveTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in DispatchStatus::ALL {
            assert_eq!(DispatchStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DispatchStatus::parse("boarding"), None);
    }

    #[test]
    fn test_stages_only_move_forward() {
        assert!(DispatchStatus::Entered.stage() < DispatchStatus::PassengersDropped.stage());
        assert_eq!(
            DispatchStatus::PermitIssued.stage(),
            DispatchStatus::PermitRejected.stage()
        );
        assert!(DispatchStatus::DepartureOrdered.stage() < DispatchStatus::Departed.stage());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DispatchStatus::PassengersDropped).unwrap();
        assert_eq!(json, "\"passengers_dropped\"");
    }
}
