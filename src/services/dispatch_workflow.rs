//! Máquina de estados del despacho
//!
//! entered → passengers_dropped → permit_issued | permit_rejected → paid →
//! departure_ordered → departed
//!
//! Las transiciones son funciones puras sobre un `DispatchRecord`; la
//! persistencia y el control de concurrencia viven en `DispatchService`.
//! El estado sólo avanza (o se desvía a `permit_rejected`) y ninguna
//! transición borra un timestamp anterior.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::dispatch::{
    DispatchRecord, DispatchStatus, PaymentMethod, PermitStatus, ScheduleSlot,
};
use crate::models::service_charge::max_amount;
use crate::services::permit_validation::{validate_permit, PermitForm};
use crate::utils::errors::FieldErrors;
use crate::utils::validation::is_valid_transport_order_code;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("invalid fields: {0:?}")]
    InvalidFields(FieldErrors),

    #[error("cannot {action} while dispatch is '{status}'")]
    InvalidTransition {
        action: &'static str,
        status: DispatchStatus,
    },
}

impl WorkflowError {
    fn field(field: &str, message: &str) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), message.to_string());
        WorkflowError::InvalidFields(fields)
    }
}

/// Reglas de negocio configurables
#[derive(Debug, Clone, Copy)]
pub struct WorkflowPolicy {
    /// Si es true, sólo se cobra a vehículos con permiso aprobado
    pub require_permit_before_payment: bool,
    /// Zona horaria de la estación para interpretar fecha + hora de salida
    pub station_offset: FixedOffset,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            require_permit_before_payment: true,
            station_offset: FixedOffset::east_opt(7 * 3600).unwrap_or(Utc.fix()),
        }
    }
}

/// Datos de entrada de un vehículo
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub entry_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PermitDecision {
    Approved,
    Rejected { reasons: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub invoice_number: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchWorkflow {
    policy: WorkflowPolicy,
}

impl DispatchWorkflow {
    pub fn new(policy: WorkflowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    pub fn record_entry(&self, entry: NewEntry, at: DateTime<Utc>) -> Result<DispatchRecord, WorkflowError> {
        if entry.vehicle_id.is_nil() {
            return Err(WorkflowError::field("vehicleId", "Seleccione un vehículo"));
        }

        Ok(DispatchRecord {
            id: Uuid::new_v4(),
            vehicle_id: entry.vehicle_id,
            driver_id: entry.driver_id,
            route_id: entry.route_id,
            schedule_id: None,
            entry_time: at,
            passenger_drop_time: None,
            boarding_permit_time: None,
            planned_departure_time: None,
            payment_time: None,
            departure_order_time: None,
            exit_time: None,
            current_status: DispatchStatus::Entered,
            passengers_arrived: None,
            passengers_departing: None,
            entry_image_url: entry.entry_image_url,
            transport_order_code: None,
            seat_count: None,
            permit_status: None,
            rejection_reason: None,
            permit_issued_by: None,
            payment_amount: None,
            payment_method: None,
            invoice_number: None,
            created_at: at,
            updated_at: at,
        })
    }

    /// Devuelve `Ok(false)` sin tocar el registro cuando no llegan pasajeros.
    pub fn record_passenger_drop(
        &self,
        record: &mut DispatchRecord,
        passengers_arrived: i32,
        at: DateTime<Utc>,
    ) -> Result<bool, WorkflowError> {
        ensure_from(record, "record passenger drop", &[DispatchStatus::Entered])?;
        ensure_not_before_last_event(record, at)?;

        if passengers_arrived < 0 {
            return Err(WorkflowError::field(
                "passengersArrived",
                "El número de pasajeros no puede ser negativo",
            ));
        }
        if passengers_arrived == 0 {
            return Ok(false);
        }

        record.passengers_arrived = Some(passengers_arrived);
        record.passenger_drop_time = Some(at);
        record.current_status = DispatchStatus::PassengersDropped;
        record.updated_at = at;
        Ok(true)
    }

    /// `schedule` es el horario referenciado por `form.schedule_id`, si existe.
    pub fn issue_permit(
        &self,
        record: &mut DispatchRecord,
        form: &PermitForm,
        decision: &PermitDecision,
        schedule: Option<ScheduleSlot>,
        issued_by: Option<Uuid>,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        ensure_from(
            record,
            "issue permit",
            &[
                DispatchStatus::Entered,
                DispatchStatus::PassengersDropped,
                DispatchStatus::PermitRejected,
            ],
        )?;
        ensure_not_before_last_event(record, at)?;

        match decision {
            PermitDecision::Approved => {
                let validation = validate_permit(form);
                if !validation.is_valid {
                    return Err(WorkflowError::InvalidFields(validation.field_errors));
                }

                let (Some(code), Some(route_id), Some(date), Some(seats)) = (
                    form.transport_order_code.as_deref(),
                    form.route_id,
                    form.departure_date,
                    form.seat_count,
                ) else {
                    return Err(WorkflowError::field("permit", "Formulario de permiso incompleto"));
                };

                if let (Some(_), Some(slot)) = (form.schedule_id, schedule) {
                    if slot.route_id != route_id {
                        return Err(WorkflowError::field(
                            "scheduleId",
                            "El horario no pertenece a la ruta seleccionada",
                        ));
                    }
                }

                let departure_time = match form.departure_time.or(schedule.map(|s| s.departure_time)) {
                    Some(t) => t,
                    None => {
                        return Err(WorkflowError::field(
                            "scheduleId",
                            "El horario seleccionado no existe",
                        ))
                    }
                };

                let planned = self
                    .policy
                    .station_offset
                    .from_local_datetime(&date.and_time(departure_time))
                    .single()
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok_or_else(|| {
                        WorkflowError::field("departureTime", "Hora de salida inválida")
                    })?;

                record.transport_order_code = Some(code.trim().to_string());
                record.route_id = Some(route_id);
                record.schedule_id = form.schedule_id;
                record.seat_count = Some(seats);
                record.planned_departure_time = Some(planned);
                record.permit_status = Some(PermitStatus::Approved);
                record.rejection_reason = None;
                record.current_status = DispatchStatus::PermitIssued;
            }
            PermitDecision::Rejected { reasons } => {
                let reasons: Vec<&str> = reasons
                    .iter()
                    .map(|r| r.trim())
                    .filter(|r| !r.is_empty())
                    .collect();
                if reasons.is_empty() {
                    return Err(WorkflowError::field(
                        "rejectionReasons",
                        "Indique al menos un motivo de rechazo",
                    ));
                }

                let code = form
                    .transport_order_code
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty());
                if let Some(code) = code {
                    if !is_valid_transport_order_code(code) {
                        return Err(WorkflowError::field(
                            "transportOrderCode",
                            "Formato de código de orden de transporte inválido",
                        ));
                    }
                    record.transport_order_code = Some(code.to_string());
                }
                if form.route_id.is_some() {
                    record.route_id = form.route_id;
                }
                if form.seat_count.is_some() {
                    record.seat_count = form.seat_count;
                }
                record.permit_status = Some(PermitStatus::Rejected);
                record.rejection_reason = Some(reasons.join("; "));
                record.current_status = DispatchStatus::PermitRejected;
            }
        }

        record.boarding_permit_time = Some(at);
        record.permit_issued_by = issued_by;
        record.updated_at = at;
        Ok(())
    }

    pub fn process_payment(
        &self,
        record: &mut DispatchRecord,
        payment: Payment,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let allowed: &[DispatchStatus] = if self.policy.require_permit_before_payment {
            &[DispatchStatus::PermitIssued]
        } else {
            &[
                DispatchStatus::Entered,
                DispatchStatus::PassengersDropped,
                DispatchStatus::PermitIssued,
                DispatchStatus::PermitRejected,
            ]
        };
        ensure_from(record, "process payment", allowed)?;
        ensure_not_before_last_event(record, at)?;

        if payment.amount.is_sign_negative() {
            return Err(WorkflowError::field(
                "paymentAmount",
                "El importe no puede ser negativo",
            ));
        }
        if payment.amount > max_amount() {
            return Err(WorkflowError::field(
                "paymentAmount",
                "El importe excede el máximo permitido",
            ));
        }

        let invoice_number = payment
            .invoice_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| generate_invoice_number(record.id, at));

        record.payment_amount = Some(payment.amount);
        record.payment_method = Some(payment.method);
        record.invoice_number = Some(invoice_number);
        record.payment_time = Some(at);
        record.current_status = DispatchStatus::Paid;
        record.updated_at = at;
        Ok(())
    }

    pub fn issue_departure_order(
        &self,
        record: &mut DispatchRecord,
        passengers_departing: i32,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        ensure_from(record, "issue departure order", &[DispatchStatus::Paid])?;
        ensure_not_before_last_event(record, at)?;

        if passengers_departing < 0 {
            return Err(WorkflowError::field(
                "passengersDeparting",
                "El número de pasajeros no puede ser negativo",
            ));
        }
        if let Some(seats) = record.seat_count {
            if passengers_departing > seats {
                return Err(WorkflowError::field(
                    "passengersDeparting",
                    "Los pasajeros superan los asientos autorizados",
                ));
            }
        }

        record.passengers_departing = Some(passengers_departing);
        record.departure_order_time = Some(at);
        record.current_status = DispatchStatus::DepartureOrdered;
        record.updated_at = at;
        Ok(())
    }

    pub fn record_exit(&self, record: &mut DispatchRecord, at: DateTime<Utc>) -> Result<(), WorkflowError> {
        ensure_from(record, "record exit", &[DispatchStatus::DepartureOrdered])?;
        ensure_not_before_last_event(record, at)?;

        record.exit_time = Some(at);
        record.current_status = DispatchStatus::Departed;
        record.updated_at = at;
        Ok(())
    }
}

fn ensure_from(
    record: &DispatchRecord,
    action: &'static str,
    allowed: &[DispatchStatus],
) -> Result<(), WorkflowError> {
    if allowed.contains(&record.current_status) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            action,
            status: record.current_status,
        })
    }
}

/// Último instante registrado en la visita (entrada o cualquier hito posterior)
fn last_event_time(record: &DispatchRecord) -> DateTime<Utc> {
    [
        record.passenger_drop_time,
        record.boarding_permit_time,
        record.payment_time,
        record.departure_order_time,
        record.exit_time,
    ]
    .into_iter()
    .flatten()
    .fold(record.entry_time, DateTime::max)
}

fn ensure_not_before_last_event(record: &DispatchRecord, at: DateTime<Utc>) -> Result<(), WorkflowError> {
    if at < last_event_time(record) {
        return Err(WorkflowError::field(
            "eventTime",
            "La hora del evento es anterior al último hito registrado",
        ));
    }
    Ok(())
}

/// Número de factura por defecto: HD-<yyyymmdd>-<8 hex del id>
pub fn generate_invoice_number(dispatch_id: Uuid, at: DateTime<Utc>) -> String {
    let hex = dispatch_id.simple().to_string();
    format!("HD-{}-{}", at.format("%Y%m%d"), hex[..8].to_uppercase())
}
