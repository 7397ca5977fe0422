//! Registros de despacho del sistema anterior (Firebase Realtime Database)
//!
//! Firebase guarda los despachos como objetos snake_case sin tipos. La única
//! conversión al modelo tipado es `FirebaseDispatchRecord::into_record`.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::dispatch::{DispatchRecord, DispatchStatus, PaymentMethod, PermitStatus};
use crate::models::service_charge::max_amount;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LegacyMappingError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("unknown payment method '{0}'")]
    UnknownPaymentMethod(String),

    #[error("unknown permit status '{0}'")]
    UnknownPermitStatus(String),

    #[error("invalid payment amount {0}")]
    InvalidAmount(f64),
}

/// Firebase escribe las fechas como RFC 3339 o como milisegundos epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyTimestamp {
    Millis(i64),
    Text(String),
}

impl LegacyTimestamp {
    fn to_utc(&self, field: &'static str) -> Result<DateTime<Utc>, LegacyMappingError> {
        let invalid = || LegacyMappingError::InvalidTimestamp {
            field,
            value: match self {
                LegacyTimestamp::Millis(ms) => ms.to_string(),
                LegacyTimestamp::Text(s) => s.clone(),
            },
        };
        match self {
            LegacyTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single().ok_or_else(invalid),
            LegacyTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| invalid()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FirebaseDispatchRecord {
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub route_id: Option<String>,
    pub schedule_id: Option<String>,
    pub entry_time: Option<LegacyTimestamp>,
    pub passenger_drop_time: Option<LegacyTimestamp>,
    pub boarding_permit_time: Option<LegacyTimestamp>,
    pub planned_departure_time: Option<LegacyTimestamp>,
    pub payment_time: Option<LegacyTimestamp>,
    pub departure_order_time: Option<LegacyTimestamp>,
    pub exit_time: Option<LegacyTimestamp>,
    pub current_status: Option<String>,
    pub passengers_arrived: Option<i32>,
    pub passengers_departing: Option<i32>,
    pub entry_image_url: Option<String>,
    pub transport_order_code: Option<String>,
    pub seat_count: Option<i32>,
    pub permit_status: Option<String>,
    pub rejection_reason: Option<String>,
    pub payment_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub invoice_number: Option<String>,
}

/// Id estable derivado de la clave Firebase; reimportar no duplica registros
pub fn legacy_record_id(firebase_key: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("firebase:dispatch/{}", firebase_key).as_bytes(),
    )
}

/// Las referencias legacy pueden ser UUID o claves Firebase
fn legacy_ref(kind: &str, value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or_else(|_| {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("firebase:{}/{}", kind, value).as_bytes())
    })
}

fn optional_ref(kind: &str, value: &Option<String>) -> Option<Uuid> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| legacy_ref(kind, v))
}

fn optional_time(
    value: &Option<LegacyTimestamp>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, LegacyMappingError> {
    value.as_ref().map(|t| t.to_utc(field)).transpose()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl FirebaseDispatchRecord {
    pub fn into_record(self, firebase_key: &str) -> Result<DispatchRecord, LegacyMappingError> {
        let vehicle_id = optional_ref("vehicle", &self.vehicle_id)
            .ok_or(LegacyMappingError::MissingField("vehicle_id"))?;
        let entry_time = optional_time(&self.entry_time, "entry_time")?
            .ok_or(LegacyMappingError::MissingField("entry_time"))?;

        let current_status = match self.current_status.as_deref() {
            Some(raw) => DispatchStatus::parse(raw.trim())
                .ok_or_else(|| LegacyMappingError::UnknownStatus(raw.to_string()))?,
            None => DispatchStatus::Entered,
        };

        let permit_status = match self.permit_status.as_deref() {
            Some("approved") => Some(PermitStatus::Approved),
            Some("rejected") => Some(PermitStatus::Rejected),
            Some(other) => return Err(LegacyMappingError::UnknownPermitStatus(other.to_string())),
            None => None,
        };

        let payment_method = match self.payment_method.as_deref() {
            Some("cash") => Some(PaymentMethod::Cash),
            Some("bank_transfer") => Some(PaymentMethod::BankTransfer),
            Some("card") => Some(PaymentMethod::Card),
            Some(other) => return Err(LegacyMappingError::UnknownPaymentMethod(other.to_string())),
            None => None,
        };

        let payment_amount = self
            .payment_amount
            .map(|amount| {
                Decimal::try_from(amount)
                    .ok()
                    .filter(|d| !d.is_sign_negative() && *d <= max_amount())
                    .ok_or(LegacyMappingError::InvalidAmount(amount))
            })
            .transpose()?;

        let passenger_drop_time = optional_time(&self.passenger_drop_time, "passenger_drop_time")?;
        let boarding_permit_time = optional_time(&self.boarding_permit_time, "boarding_permit_time")?;
        let planned_departure_time =
            optional_time(&self.planned_departure_time, "planned_departure_time")?;
        let payment_time = optional_time(&self.payment_time, "payment_time")?;
        let departure_order_time = optional_time(&self.departure_order_time, "departure_order_time")?;
        let exit_time = optional_time(&self.exit_time, "exit_time")?;

        let updated_at = [
            passenger_drop_time,
            boarding_permit_time,
            payment_time,
            departure_order_time,
            exit_time,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(entry_time)
        .max(entry_time);

        Ok(DispatchRecord {
            id: legacy_record_id(firebase_key),
            vehicle_id,
            driver_id: optional_ref("driver", &self.driver_id),
            route_id: optional_ref("route", &self.route_id),
            schedule_id: optional_ref("schedule", &self.schedule_id),
            entry_time,
            passenger_drop_time,
            boarding_permit_time,
            planned_departure_time,
            payment_time,
            departure_order_time,
            exit_time,
            current_status,
            passengers_arrived: self.passengers_arrived,
            passengers_departing: self.passengers_departing,
            entry_image_url: non_blank(self.entry_image_url),
            transport_order_code: non_blank(self.transport_order_code),
            seat_count: self.seat_count,
            permit_status,
            rejection_reason: non_blank(self.rejection_reason),
            permit_issued_by: None,
            payment_amount,
            payment_method,
            invoice_number: non_blank(self.invoice_number),
            created_at: entry_time,
            updated_at,
        })
    }
}

// Registro legacy tal y como se expone en GET /api/legacy/dispatch
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDispatchEntry {
    pub firebase_key: String,
    pub record: Option<crate::dto::dispatch_dto::DispatchRecordResponse>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub fetched: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_rfc3339_and_millis_timestamps() {
        let legacy: FirebaseDispatchRecord = serde_json::from_value(json!({
            "vehicle_id": "-NxVehicle01",
            "entry_time": "2026-10-19T08:00:00+07:00",
            "exit_time": 1_792_378_800_000_i64,
            "current_status": "departed",
            "payment_amount": 150000.0,
            "payment_method": "bank_transfer",
            "permit_status": "approved",
            "transport_order_code": "  LENH-9  "
        }))
        .unwrap();

        let record = legacy.into_record("-NxKey").unwrap();
        assert_eq!(record.id, legacy_record_id("-NxKey"));
        assert_eq!(record.entry_time, Utc.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap());
        assert_eq!(record.exit_time, Utc.timestamp_millis_opt(1_792_378_800_000).single());
        assert_eq!(record.current_status, DispatchStatus::Departed);
        assert_eq!(record.payment_method, Some(PaymentMethod::BankTransfer));
        assert_eq!(record.payment_amount, Some(Decimal::from(150_000)));
        assert_eq!(record.transport_order_code.as_deref(), Some("LENH-9"));
        assert_eq!(record.vehicle_id, legacy_ref("vehicle", "-NxVehicle01"));
    }

    #[test]
    fn test_record_id_is_stable() {
        assert_eq!(legacy_record_id("abc"), legacy_record_id("abc"));
        assert_ne!(legacy_record_id("abc"), legacy_record_id("abd"));
    }

    #[test]
    fn test_uuid_references_are_kept() {
        let vehicle = Uuid::new_v4();
        assert_eq!(legacy_ref("vehicle", &vehicle.to_string()), vehicle);
    }

    #[test]
    fn test_missing_and_unknown_fields_are_errors() {
        let missing = FirebaseDispatchRecord {
            entry_time: Some(LegacyTimestamp::Millis(0)),
            ..Default::default()
        };
        assert_eq!(
            missing.into_record("k").unwrap_err(),
            LegacyMappingError::MissingField("vehicle_id")
        );

        let unknown = FirebaseDispatchRecord {
            vehicle_id: Some("v".into()),
            entry_time: Some(LegacyTimestamp::Millis(0)),
            current_status: Some("teleported".into()),
            ..Default::default()
        };
        assert_eq!(
            unknown.into_record("k").unwrap_err(),
            LegacyMappingError::UnknownStatus("teleported".into())
        );

        let bad_time = FirebaseDispatchRecord {
            vehicle_id: Some("v".into()),
            entry_time: Some(LegacyTimestamp::Text("yesterday".into())),
            ..Default::default()
        };
        assert!(matches!(
            bad_time.into_record("k").unwrap_err(),
            LegacyMappingError::InvalidTimestamp { field: "entry_time", .. }
        ));
    }
}
