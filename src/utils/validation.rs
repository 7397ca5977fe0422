//! Utilidades de validación
//!
//! Funciones para `#[validate(custom = "...")]` y comprobaciones de formato
//! compartidas entre controladores y servicios.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::models::service_charge::max_amount;

lazy_static! {
    /// Matrícula: provincia (2 dígitos), serie (1-2 letras y dígito opcional),
    /// número de 4-5 dígitos o `123.45`. Ej.: 51B-123.45, 29A-12345, 51LD-1234
    static ref PLATE_NUMBER_RE: Regex =
        Regex::new(r"^\d{2}[A-Z]{1,2}\d?-(\d{4,5}|\d{3}\.\d{2})$").unwrap();

    static ref TRANSPORT_ORDER_CODE_RE: Regex =
        Regex::new(r"(?i)^[A-Z0-9][A-Z0-9./-]{2,49}$").unwrap();

    static ref ROUTE_CODE_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9-]{1,19}$").unwrap();
}

/// Normaliza una matrícula: mayúsculas y sin espacios
pub fn normalize_plate_number(value: &str) -> String {
    value.split_whitespace().collect::<String>().to_uppercase()
}

pub fn is_valid_plate_number(value: &str) -> bool {
    PLATE_NUMBER_RE.is_match(&normalize_plate_number(value))
}

/// Validar formato de matrícula de vehículo
pub fn validate_plate_number(value: &str) -> Result<(), ValidationError> {
    if !is_valid_plate_number(value) {
        let mut error = ValidationError::new("plate_number");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"51B-123.45".to_string());
        return Err(error);
    }
    Ok(())
}

pub fn is_valid_transport_order_code(value: &str) -> bool {
    TRANSPORT_ORDER_CODE_RE.is_match(value.trim())
}

/// Validar código de ruta (mayúsculas, dígitos y guiones)
pub fn validate_route_code(value: &str) -> Result<(), ValidationError> {
    if !ROUTE_CODE_RE.is_match(value) {
        let mut error = ValidationError::new("route_code");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    if !(9..=15).contains(&digits) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Importes (`Decimal`): no negativos y representables en `NUMERIC(14,2)`
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)?;
    if *value > max_amount() || value.normalize().scale() > 2 {
        let mut error = ValidationError::new("amount_precision");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}
