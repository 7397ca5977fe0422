use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::dispatch::{DispatchRecord, DispatchStatus, PaymentMethod, PermitStatus};
use crate::services::display_status::{project, Board, DisplayStatus};
use crate::services::permit_validation::PermitForm;
use crate::utils::validation::validate_amount;

// Request de entrada de un vehículo a la estación
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordEntryRequest {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    #[validate(url)]
    pub entry_image_url: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryImageRequest {
    #[validate(url)]
    pub entry_image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerDropRequest {
    pub passengers_arrived: i32,
    pub event_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermitDecisionDto {
    Approved,
    Rejected,
}

// Request del diálogo de permiso: campos del formulario + decisión
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePermitRequest {
    pub decision: PermitDecisionDto,
    #[serde(flatten)]
    pub form: PermitForm,
    #[serde(default)]
    pub rejection_reasons: Vec<String>,
    pub event_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Si no se indica, se cobra la suma de los servicios del despacho
    pub payment_amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub invoice_number: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureOrderRequest {
    pub passengers_departing: i32,
    pub event_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    pub event_time: Option<DateTime<Utc>>,
}

// Filtros del listado
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchListQuery {
    pub status: Option<DispatchStatus>,
    pub vehicle_id: Option<Uuid>,
    /// Día de entrada (hora local de la estación)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub date: Option<NaiveDate>,
}

// Response de despacho
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecordResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub entry_time: DateTime<Utc>,
    pub passenger_drop_time: Option<DateTime<Utc>>,
    pub boarding_permit_time: Option<DateTime<Utc>>,
    pub planned_departure_time: Option<DateTime<Utc>>,
    pub payment_time: Option<DateTime<Utc>>,
    pub departure_order_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub current_status: DispatchStatus,
    pub display_status: DisplayStatus,
    pub passengers_arrived: Option<i32>,
    pub passengers_departing: Option<i32>,
    pub entry_image_url: Option<String>,
    pub transport_order_code: Option<String>,
    pub seat_count: Option<i32>,
    pub permit_status: Option<PermitStatus>,
    pub rejection_reason: Option<String>,
    pub permit_issued_by: Option<Uuid>,
    pub payment_amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub invoice_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DispatchRecord> for DispatchRecordResponse {
    fn from(r: DispatchRecord) -> Self {
        Self {
            display_status: project(r.current_status),
            id: r.id,
            vehicle_id: r.vehicle_id,
            driver_id: r.driver_id,
            route_id: r.route_id,
            schedule_id: r.schedule_id,
            entry_time: r.entry_time,
            passenger_drop_time: r.passenger_drop_time,
            boarding_permit_time: r.boarding_permit_time,
            planned_departure_time: r.planned_departure_time,
            payment_time: r.payment_time,
            departure_order_time: r.departure_order_time,
            exit_time: r.exit_time,
            current_status: r.current_status,
            passengers_arrived: r.passengers_arrived,
            passengers_departing: r.passengers_departing,
            entry_image_url: r.entry_image_url,
            transport_order_code: r.transport_order_code,
            seat_count: r.seat_count,
            permit_status: r.permit_status,
            rejection_reason: r.rejection_reason,
            permit_issued_by: r.permit_issued_by,
            payment_amount: r.payment_amount,
            payment_method: r.payment_method,
            invoice_number: r.invoice_number,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// Response del tablero kanban
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardResponse {
    pub in_station: Vec<DispatchRecordResponse>,
    pub permit_issued: Vec<DispatchRecordResponse>,
    pub paid: Vec<DispatchRecordResponse>,
    pub departed: Vec<DispatchRecordResponse>,
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        let total = board.len();
        let convert = |records: Vec<DispatchRecord>| -> Vec<DispatchRecordResponse> {
            records.into_iter().map(Into::into).collect()
        };
        Self {
            in_station: convert(board.in_station),
            permit_issued: convert(board.permit_issued),
            paid: convert(board.paid),
            departed: convert(board.departed),
            total,
            generated_at: Utc::now(),
        }
    }
}

// Request para añadir un servicio facturable
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceChargeRequest {
    #[validate(length(min = 1, max = 100))]
    pub service_type: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom = "validate_amount")]
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChargeResponse {
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub service_type: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::service_charge::ServiceCharge> for ServiceChargeResponse {
    fn from(c: crate::models::service_charge::ServiceCharge) -> Self {
        Self {
            id: c.id,
            dispatch_id: c.dispatch_id,
            service_type: c.service_type,
            quantity: c.quantity,
            unit_price: c.unit_price,
            total: c.total,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChargeListResponse {
    pub charges: Vec<ServiceChargeResponse>,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permit_request_flattens_form_fields() {
        let request: IssuePermitRequest = serde_json::from_value(json!({
            "decision": "approved",
            "transportOrderCode": "LENH-001",
            "routeId": "550e8400-e29b-41d4-a716-446655440000",
            "departureDate": "2026-10-19",
            "departureTime": "08:30:00",
            "seatCount": 40
        }))
        .unwrap();

        assert_eq!(request.decision, PermitDecisionDto::Approved);
        assert_eq!(request.form.transport_order_code.as_deref(), Some("LENH-001"));
        assert_eq!(request.form.seat_count, Some(40));
        assert!(request.rejection_reasons.is_empty());
    }

    #[test]
    fn test_entry_image_must_be_url() {
        let request = EntryImageRequest {
            entry_image_url: "not a url".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_list_query_parses_snake_case_status() {
        let query: DispatchListQuery =
            serde_json::from_value(json!({ "status": "permit_issued" })).unwrap();
        assert_eq!(query.status, Some(DispatchStatus::PermitIssued));
    }
}
