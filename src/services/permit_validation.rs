//! Validación del formulario de permiso de salida
//!
//! Cinco comprobaciones independientes; se ejecutan todas siempre para que
//! el formulario pueda mostrar todos los errores a la vez.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::FieldErrors;
use crate::utils::validation::is_valid_transport_order_code;

/// Valores actuales del formulario de permiso
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitForm {
    pub transport_order_code: Option<String>,
    pub route_id: Option<Uuid>,
    pub departure_date: Option<NaiveDate>,
    pub schedule_id: Option<Uuid>,
    pub departure_time: Option<NaiveTime>,
    pub seat_count: Option<i32>,
}

/// Resultado de validar el formulario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitValidation {
    pub is_valid: bool,
    pub field_errors: FieldErrors,
}

pub fn validate_permit(form: &PermitForm) -> PermitValidation {
    let mut errors = FieldErrors::new();

    match form.transport_order_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            if !is_valid_transport_order_code(code) {
                errors.insert(
                    "transportOrderCode".to_string(),
                    "Formato de código de orden de transporte inválido".to_string(),
                );
            }
        }
        _ => {
            errors.insert(
                "transportOrderCode".to_string(),
                "El código de orden de transporte es obligatorio".to_string(),
            );
        }
    }

    if form.route_id.is_none() {
        errors.insert("routeId".to_string(), "Seleccione una ruta".to_string());
    }

    if form.departure_date.is_none() {
        errors.insert(
            "departureDate".to_string(),
            "Seleccione la fecha de salida".to_string(),
        );
    }

    if form.schedule_id.is_none() && form.departure_time.is_none() {
        errors.insert(
            "departureTime".to_string(),
            "Indique la hora de salida o seleccione un horario".to_string(),
        );
    }

    if !form.seat_count.map(|s| s > 0).unwrap_or(false) {
        errors.insert(
            "seatCount".to_string(),
            "El número de asientos debe ser mayor que 0".to_string(),
        );
    }

    PermitValidation {
        is_valid: errors.is_empty(),
        field_errors: errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> PermitForm {
        PermitForm {
            transport_order_code: Some("LENH-001".to_string()),
            route_id: Some(Uuid::new_v4()),
            departure_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            schedule_id: None,
            departure_time: NaiveTime::from_hms_opt(8, 30, 0),
            seat_count: Some(40),
        }
    }

    #[test]
    fn test_complete_form_is_valid() {
        let result = validate_permit(&complete_form());
        assert!(result.is_valid);
        assert!(result.field_errors.is_empty());
    }

    #[test]
    fn test_schedule_replaces_departure_time() {
        let form = PermitForm {
            departure_time: None,
            schedule_id: Some(Uuid::new_v4()),
            ..complete_form()
        };
        assert!(validate_permit(&form).is_valid);
    }

    #[test]
    fn test_blank_code_is_reported() {
        let form = PermitForm {
            transport_order_code: Some("   ".to_string()),
            ..complete_form()
        };
        let result = validate_permit(&form);
        assert!(!result.is_valid);
        assert_eq!(result.field_errors.len(), 1);
        assert!(result.field_errors.contains_key("transportOrderCode"));
    }

    #[test]
    fn test_malformed_code_is_reported() {
        let form = PermitForm {
            transport_order_code: Some("LENH 001".to_string()),
            ..complete_form()
        };
        let result = validate_permit(&form);
        assert_eq!(
            result.field_errors.get("transportOrderCode").map(String::as_str),
            Some("Formato de código de orden de transporte inválido")
        );
    }

    #[test]
    fn test_empty_form_accumulates_all_five_errors() {
        let result = validate_permit(&PermitForm::default());
        assert!(!result.is_valid);
        let keys: Vec<&str> = result.field_errors.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["departureDate", "departureTime", "routeId", "seatCount", "transportOrderCode"]
        );
    }

    #[test]
    fn test_seat_count_must_be_positive() {
        for seats in [Some(0), Some(-3), None] {
            let form = PermitForm { seat_count: seats, ..complete_form() };
            let result = validate_permit(&form);
            assert!(result.field_errors.contains_key("seatCount"));
        }
    }
}
