//! Modelo de ServiceCharge
//!
//! Línea facturable asociada a un DispatchRecord. Inmutable: se borra en
//! lugar de editarse.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ServiceCharge {
    pub id: Uuid,
    pub dispatch_id: Uuid,
    pub service_type: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Mayor importe que cabe en las columnas `NUMERIC(14,2)`
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

impl ServiceCharge {
    /// Crea la línea calculando el total a partir de cantidad y precio
    /// unitario. `None` si el total no cabe en la columna.
    pub fn new(dispatch_id: Uuid, service_type: String, quantity: i32, unit_price: Decimal) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            dispatch_id,
            service_type,
            quantity,
            unit_price,
            total: line_total(quantity, unit_price)?,
            created_at: Utc::now(),
        })
    }
}

/// Total de una línea: cantidad x precio unitario
pub fn line_total(quantity: i32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .filter(|total| total.abs() <= max_amount())
}

/// Suma de todas las líneas de un registro. `None` si se desborda.
pub fn sum_charges(charges: &[ServiceCharge]) -> Option<Decimal> {
    charges
        .iter()
        .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_quantity_times_unit_price() {
        let charge = ServiceCharge::new(Uuid::new_v4(), "parking".into(), 3, Decimal::new(25_000, 0)).unwrap();
        assert_eq!(charge.total, Decimal::new(75_000, 0));
    }

    #[test]
    fn test_line_total_overflow_is_none() {
        assert_eq!(line_total(2, Decimal::MAX), None);
        assert_eq!(line_total(1, max_amount()), Some(max_amount()));
        assert_eq!(line_total(10, max_amount()), None);
        assert!(ServiceCharge::new(Uuid::new_v4(), "parking".into(), 2, Decimal::MAX).is_none());
    }

    #[test]
    fn test_sum_charges() {
        let dispatch_id = Uuid::new_v4();
        let charges = vec![
            ServiceCharge::new(dispatch_id, "parking".into(), 1, Decimal::new(50_000, 0)).unwrap(),
            ServiceCharge::new(dispatch_id, "cleaning".into(), 2, Decimal::new(12_500, 1)).unwrap(),
        ];
        assert_eq!(sum_charges(&charges), Some(Decimal::new(52_500, 0)));
        assert_eq!(sum_charges(&[]), Some(Decimal::ZERO));
    }

    #[test]
    fn test_sum_charges_overflow_is_none() {
        let huge = ServiceCharge {
            total: Decimal::MAX,
            ..ServiceCharge::new(Uuid::new_v4(), "parking".into(), 1, Decimal::ONE).unwrap()
        };
        assert_eq!(sum_charges(&[huge.clone(), huge]), None);
    }
}
