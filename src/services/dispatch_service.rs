//! Servicio de despachos
//!
//! Orquesta el repositorio, la máquina de estados y el cache de listados.
//! Cada transición lee el registro, aplica la regla pura de
//! `DispatchWorkflow` y lo guarda condicionado al estado leído.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{CacheConfig, CacheStats, DispatchCache};
use crate::dto::dispatch_dto::{
    CreateServiceChargeRequest, DepartureOrderRequest, IssuePermitRequest, PassengerDropRequest,
    PaymentRequest, PermitDecisionDto, RecordEntryRequest,
};
use crate::models::dispatch::{DispatchFilter, DispatchRecord, DispatchStatus};
use crate::models::service_charge::{sum_charges, ServiceCharge};
use crate::repositories::dispatch_repository::DispatchRepository;
use crate::services::dispatch_workflow::{
    DispatchWorkflow, NewEntry, Payment, PermitDecision, WorkflowPolicy,
};
use crate::services::display_status::{build_board, Board};
use crate::services::permit_validation::{validate_permit, PermitForm, PermitValidation};
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult};

/// Estados en los que todavía se pueden añadir o quitar servicios
const CHARGEABLE: [DispatchStatus; 4] = [
    DispatchStatus::Entered,
    DispatchStatus::PassengersDropped,
    DispatchStatus::PermitIssued,
    DispatchStatus::PermitRejected,
];

const DUPLICATE_CODE_MESSAGE: &str = "El código de orden de transporte ya existe";

pub struct DispatchService {
    repository: Arc<dyn DispatchRepository>,
    workflow: DispatchWorkflow,
    cache: DispatchCache,
}

impl DispatchService {
    pub fn new(
        repository: Arc<dyn DispatchRepository>,
        policy: WorkflowPolicy,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            repository,
            workflow: DispatchWorkflow::new(policy),
            cache: DispatchCache::new(cache_config),
        }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        self.workflow.policy()
    }

    /// Rango UTC [inicio, fin) de un día local de la estación
    pub fn station_day_range(&self, date: NaiveDate) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| self.policy().station_offset.from_local_datetime(&midnight).single())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AppError::BadRequest(format!("Fecha inválida: {}", date)))?;
        Ok((start, start + Duration::days(1)))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<DispatchRecord> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("DispatchRecord", &id.to_string()))
    }

    pub async fn list(&self, filter: &DispatchFilter) -> AppResult<Vec<DispatchRecord>> {
        let repository = Arc::clone(&self.repository);
        self.cache
            .get_or_load(&filter.cache_key(), || async move { repository.list(filter).await })
            .await
    }

    /// Listado del día local indicado (hoy si no se indica)
    pub async fn list_day(&self, date: Option<NaiveDate>) -> AppResult<Vec<DispatchRecord>> {
        let date = date.unwrap_or_else(|| self.today());
        let (from, to) = self.station_day_range(date)?;
        self.list(&DispatchFilter {
            entered_from: Some(from),
            entered_to: Some(to),
            ..Default::default()
        })
        .await
    }

    pub async fn board(&self, date: Option<NaiveDate>) -> AppResult<Board> {
        Ok(build_board(self.list_day(date).await?))
    }

    /// Descarta el cache y recarga el tablero del día
    pub async fn refresh(&self) -> AppResult<Board> {
        self.cache.invalidate().await;
        let (from, to) = self.station_day_range(self.today())?;
        let filter = DispatchFilter {
            entered_from: Some(from),
            entered_to: Some(to),
            ..Default::default()
        };
        let repository = Arc::clone(&self.repository);
        let records = self
            .cache
            .refresh(&filter.cache_key(), || async move { repository.list(&filter).await })
            .await?;
        info!("🔄 Tablero de despachos recargado ({} registros)", records.len());
        Ok(build_board(records))
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn record_entry(&self, request: RecordEntryRequest) -> AppResult<DispatchRecord> {
        let at = request.entry_time.unwrap_or_else(Utc::now);
        let record = self.workflow.record_entry(
            NewEntry {
                vehicle_id: request.vehicle_id,
                driver_id: request.driver_id,
                route_id: request.route_id,
                entry_image_url: request.entry_image_url,
            },
            at,
        )?;

        let saved = self.repository.insert(&record).await?;
        self.cache.invalidate().await;
        info!("🚌 Vehículo {} entra en la estación (despacho {})", saved.vehicle_id, saved.id);
        Ok(saved)
    }

    pub async fn update_entry_image(&self, id: Uuid, url: &str) -> AppResult<DispatchRecord> {
        let saved = self
            .repository
            .update_entry_image(id, url, Utc::now())
            .await?
            .ok_or_else(|| not_found_error("DispatchRecord", &id.to_string()))?;
        self.cache.invalidate().await;
        Ok(saved)
    }

    /// Devuelve el registro y si la transición se aplicó
    pub async fn record_passenger_drop(
        &self,
        id: Uuid,
        request: PassengerDropRequest,
    ) -> AppResult<(DispatchRecord, bool)> {
        let mut record = self.get(id).await?;
        let expected = record.current_status;
        let at = request.event_time.unwrap_or_else(Utc::now);

        let changed = self
            .workflow
            .record_passenger_drop(&mut record, request.passengers_arrived, at)?;
        if !changed {
            return Ok((record, false));
        }

        let saved = self.persist(&record, expected).await?;
        info!("👥 Despacho {}: {} pasajeros desembarcados", id, request.passengers_arrived);
        Ok((saved, true))
    }

    /// Validación en seco del formulario de permiso, sin tocar el registro
    pub async fn validate_permit(&self, id: Uuid, form: &PermitForm) -> AppResult<PermitValidation> {
        self.get(id).await?;
        let mut validation = validate_permit(form);
        if let Some(code) = non_blank(form.transport_order_code.as_deref()) {
            if self.repository.transport_order_code_taken(code, id).await? {
                validation
                    .field_errors
                    .insert("transportOrderCode".to_string(), DUPLICATE_CODE_MESSAGE.to_string());
                validation.is_valid = false;
            }
        }
        Ok(validation)
    }

    pub async fn issue_permit(
        &self,
        id: Uuid,
        request: IssuePermitRequest,
        issued_by: Option<Uuid>,
    ) -> AppResult<DispatchRecord> {
        let mut record = self.get(id).await?;
        let expected = record.current_status;
        let at = request.event_time.unwrap_or_else(Utc::now);

        let decision = match request.decision {
            PermitDecisionDto::Approved => PermitDecision::Approved,
            PermitDecisionDto::Rejected => PermitDecision::Rejected {
                reasons: request.rejection_reasons,
            },
        };

        if let Some(code) = non_blank(request.form.transport_order_code.as_deref()) {
            if self.repository.transport_order_code_taken(code, id).await? {
                return Err(AppError::DuplicateTransportOrderCode(
                    DUPLICATE_CODE_MESSAGE.to_string(),
                ));
            }
        }

        let schedule = match request.form.schedule_id {
            Some(schedule_id) => {
                let slot = self.repository.find_schedule(schedule_id).await?;
                if slot.is_none() && decision == PermitDecision::Approved {
                    return Err(field_error("scheduleId", "El horario seleccionado no existe"));
                }
                slot
            }
            None => None,
        };

        self.workflow
            .issue_permit(&mut record, &request.form, &decision, schedule, issued_by, at)?;
        let saved = self.persist(&record, expected).await?;

        match saved.current_status {
            DispatchStatus::PermitIssued => info!(
                "✅ Permiso emitido para despacho {} (orden {})",
                id,
                saved.transport_order_code.as_deref().unwrap_or("-")
            ),
            _ => warn!(
                "⛔ Permiso rechazado para despacho {}: {}",
                id,
                saved.rejection_reason.as_deref().unwrap_or("-")
            ),
        }
        Ok(saved)
    }

    pub async fn process_payment(&self, id: Uuid, request: PaymentRequest) -> AppResult<DispatchRecord> {
        let mut record = self.get(id).await?;
        let expected = record.current_status;
        let at = request.event_time.unwrap_or_else(Utc::now);

        let amount = match request.payment_amount {
            Some(amount) => amount,
            None => sum_charges(&self.repository.list_charges(&[id]).await?).ok_or_else(|| {
                field_error("paymentAmount", "El importe excede el máximo permitido")
            })?,
        };

        self.workflow.process_payment(
            &mut record,
            Payment {
                amount,
                method: request.payment_method.unwrap_or_default(),
                invoice_number: request.invoice_number,
            },
            at,
        )?;
        let saved = self.persist(&record, expected).await?;
        info!(
            "💰 Despacho {} pagado: {} (factura {})",
            id,
            amount,
            saved.invoice_number.as_deref().unwrap_or("-")
        );
        Ok(saved)
    }

    pub async fn issue_departure_order(
        &self,
        id: Uuid,
        request: DepartureOrderRequest,
    ) -> AppResult<DispatchRecord> {
        let mut record = self.get(id).await?;
        let expected = record.current_status;
        let at = request.event_time.unwrap_or_else(Utc::now);

        self.workflow
            .issue_departure_order(&mut record, request.passengers_departing, at)?;
        let saved = self.persist(&record, expected).await?;
        info!("🚦 Orden de salida para despacho {} ({} pasajeros)", id, request.passengers_departing);
        Ok(saved)
    }

    pub async fn record_exit(&self, id: Uuid, at: Option<DateTime<Utc>>) -> AppResult<DispatchRecord> {
        let mut record = self.get(id).await?;
        let expected = record.current_status;

        self.workflow.record_exit(&mut record, at.unwrap_or_else(Utc::now))?;
        let saved = self.persist(&record, expected).await?;
        info!("🏁 Vehículo {} sale de la estación (despacho {})", saved.vehicle_id, id);
        Ok(saved)
    }

    pub async fn add_charge(
        &self,
        id: Uuid,
        request: CreateServiceChargeRequest,
    ) -> AppResult<ServiceCharge> {
        let record = self.get(id).await?;
        ensure_chargeable(&record, "add service charge")?;

        if request.unit_price.is_sign_negative() {
            return Err(field_error("unitPrice", "El precio unitario no puede ser negativo"));
        }
        let service_type = request.service_type.trim();
        if service_type.is_empty() {
            return Err(field_error("serviceType", "Indique el tipo de servicio"));
        }

        let charge = ServiceCharge::new(id, service_type.to_string(), request.quantity, request.unit_price)
            .ok_or_else(|| field_error("unitPrice", "El total del servicio excede el máximo permitido"))?;
        let saved = self
            .repository
            .insert_charge(&charge, &CHARGEABLE)
            .await?
            .ok_or_else(|| {
                warn!("⚠️ Despacho {} cambió de estado antes de añadir el servicio", id);
                AppError::InvalidTransition(
                    "cannot add service charge: dispatch is no longer open for charges".to_string(),
                )
            })?;
        info!("🧾 Servicio '{}' añadido al despacho {}: {}", saved.service_type, id, saved.total);
        Ok(saved)
    }

    pub async fn list_charges(&self, id: Uuid) -> AppResult<Vec<ServiceCharge>> {
        self.get(id).await?;
        self.repository.list_charges(&[id]).await
    }

    /// Servicios de varios despachos a la vez (informes)
    pub async fn charges_for(&self, ids: &[Uuid]) -> AppResult<Vec<ServiceCharge>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repository.list_charges(ids).await
    }

    pub async fn delete_charge(&self, id: Uuid, charge_id: Uuid) -> AppResult<()> {
        let record = self.get(id).await?;
        ensure_chargeable(&record, "delete service charge")?;

        if !self.repository.delete_charge(id, charge_id).await? {
            return Err(not_found_error("ServiceCharge", &charge_id.to_string()));
        }
        info!("🗑️ Servicio {} eliminado del despacho {}", charge_id, id);
        Ok(())
    }

    /// Inserta un registro ya construido (importación). Devuelve `false` si
    /// ya existía.
    pub async fn import_record(&self, record: &DispatchRecord) -> AppResult<bool> {
        if self.repository.find_by_id(record.id).await?.is_some() {
            return Ok(false);
        }
        self.repository.insert(record).await?;
        Ok(true)
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    async fn persist(&self, record: &DispatchRecord, expected: DispatchStatus) -> AppResult<DispatchRecord> {
        let saved = self
            .repository
            .save_transition(record, expected)
            .await?
            .ok_or_else(|| {
                warn!("⚠️ Despacho {} modificado concurrentemente (esperado '{}')", record.id, expected);
                AppError::Conflict(
                    "El despacho fue modificado por otro operador, recargue el tablero".to_string(),
                )
            })?;
        self.cache.invalidate().await;
        Ok(saved)
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.policy().station_offset).date_naive()
    }
}

fn ensure_chargeable(record: &DispatchRecord, action: &str) -> AppResult<()> {
    if CHARGEABLE.contains(&record.current_status) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "cannot {} while dispatch is '{}'",
            action, record.current_status
        )))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::dispatch_dto::ExitRequest;
    use crate::models::dispatch::ScheduleSlot;
    use crate::repositories::memory_dispatch_repository::MemoryDispatchRepository;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn service_with(repo: Arc<MemoryDispatchRepository>) -> DispatchService {
        DispatchService::new(repo, WorkflowPolicy::default(), CacheConfig::default())
    }

    fn service() -> DispatchService {
        service_with(Arc::new(MemoryDispatchRepository::new()))
    }

    fn entry_request() -> RecordEntryRequest {
        RecordEntryRequest {
            vehicle_id: Uuid::new_v4(),
            driver_id: None,
            route_id: None,
            entry_image_url: None,
            entry_time: None,
        }
    }

    fn permit_request(code: &str) -> IssuePermitRequest {
        IssuePermitRequest {
            decision: PermitDecisionDto::Approved,
            form: PermitForm {
                transport_order_code: Some(code.to_string()),
                route_id: Some(Uuid::new_v4()),
                departure_date: NaiveDate::from_ymd_opt(2026, 10, 19),
                schedule_id: None,
                departure_time: NaiveTime::from_hms_opt(8, 30, 0),
                seat_count: Some(40),
            },
            rejection_reasons: Vec::new(),
            event_time: None,
        }
    }

    fn drop_request(n: i32) -> PassengerDropRequest {
        PassengerDropRequest {
            passengers_arrived: n,
            event_time: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_transport_order_code_is_rejected() {
        let service = service();
        let first = service.record_entry(entry_request()).await.unwrap();
        let second = service.record_entry(entry_request()).await.unwrap();

        service.issue_permit(first.id, permit_request("LENH-001"), None).await.unwrap();
        let err = service
            .issue_permit(second.id, permit_request("LENH-001"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateTransportOrderCode(_)));

        // El segundo registro queda intacto
        assert_eq!(service.get(second.id).await.unwrap().current_status, DispatchStatus::Entered);
    }

    #[tokio::test]
    async fn test_validate_permit_reports_duplicate_code() {
        let service = service();
        let first = service.record_entry(entry_request()).await.unwrap();
        let second = service.record_entry(entry_request()).await.unwrap();
        service.issue_permit(first.id, permit_request("LENH-002"), None).await.unwrap();

        let validation = service
            .validate_permit(second.id, &permit_request("LENH-002").form)
            .await
            .unwrap();
        assert!(!validation.is_valid);
        assert!(validation.field_errors.contains_key("transportOrderCode"));
    }

    #[tokio::test]
    async fn test_zero_passenger_drop_is_not_persisted() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();

        let (unchanged, changed) = service.record_passenger_drop(record.id, drop_request(0)).await.unwrap();
        assert!(!changed);
        assert_eq!(unchanged.current_status, DispatchStatus::Entered);

        let (dropped, changed) = service.record_passenger_drop(record.id, drop_request(15)).await.unwrap();
        assert!(changed);
        assert_eq!(dropped.current_status, DispatchStatus::PassengersDropped);
        assert_eq!(dropped.passengers_arrived, Some(15));
    }

    #[tokio::test]
    async fn test_payment_defaults_to_sum_of_charges() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();
        service
            .add_charge(
                record.id,
                CreateServiceChargeRequest {
                    service_type: "parking".into(),
                    quantity: 2,
                    unit_price: Decimal::from(15_000),
                },
            )
            .await
            .unwrap();
        service
            .add_charge(
                record.id,
                CreateServiceChargeRequest {
                    service_type: "wash".into(),
                    quantity: 1,
                    unit_price: Decimal::from(50_000),
                },
            )
            .await
            .unwrap();
        service.issue_permit(record.id, permit_request("LENH-003"), None).await.unwrap();

        let paid = service
            .process_payment(
                record.id,
                PaymentRequest {
                    payment_amount: None,
                    payment_method: None,
                    invoice_number: None,
                    event_time: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.current_status, DispatchStatus::Paid);
        assert_eq!(paid.payment_amount, Some(Decimal::from(80_000)));
        assert!(paid.invoice_number.unwrap().starts_with("HD-"));

        // Ya pagado: no se aceptan más servicios
        let err = service
            .add_charge(
                record.id,
                CreateServiceChargeRequest {
                    service_type: "late".into(),
                    quantity: 1,
                    unit_price: Decimal::from(1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_charge_total_overflow_is_a_field_error() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();

        let err = service
            .add_charge(
                record.id,
                CreateServiceChargeRequest {
                    service_type: "parking".into(),
                    quantity: 2,
                    unit_price: Decimal::MAX,
                },
            )
            .await
            .unwrap_err();
        match err {
            AppError::InvalidFields(fields) => assert!(fields.contains_key("unitPrice")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(service.list_charges(record.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_requires_permit_by_default() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();
        let err = service
            .process_payment(
                record.id,
                PaymentRequest {
                    payment_amount: Some(Decimal::from(10)),
                    payment_method: None,
                    invoice_number: None,
                    event_time: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_unknown_schedule_is_a_field_error() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();
        let mut request = permit_request("LENH-004");
        request.form.schedule_id = Some(Uuid::new_v4());

        let err = service.issue_permit(record.id, request, None).await.unwrap_err();
        match err {
            AppError::InvalidFields(fields) => assert!(fields.contains_key("scheduleId")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_schedule_supplies_departure_time() {
        let repo = Arc::new(MemoryDispatchRepository::new());
        let service = service_with(Arc::clone(&repo));
        let record = service.record_entry(entry_request()).await.unwrap();

        let route_id = Uuid::new_v4();
        let schedule_id = Uuid::new_v4();
        repo.add_schedule(
            schedule_id,
            ScheduleSlot {
                route_id,
                departure_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            },
        )
        .await;

        let mut request = permit_request("LENH-005");
        request.form.route_id = Some(route_id);
        request.form.schedule_id = Some(schedule_id);
        request.form.departure_time = None;

        let issued = service.issue_permit(record.id, request, None).await.unwrap();
        // 09:00 en UTC+7 son las 02:00 UTC
        assert_eq!(
            issued.planned_departure_time,
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 2, 0, 0).unwrap())
        );
        assert_eq!(issued.schedule_id, Some(schedule_id));
    }

    #[tokio::test]
    async fn test_board_reflects_mutations_despite_cache() {
        let service = service();
        let record = service.record_entry(entry_request()).await.unwrap();

        let board = service.board(None).await.unwrap();
        assert_eq!(board.in_station.len(), 1);

        service.issue_permit(record.id, permit_request("LENH-006"), None).await.unwrap();
        let board = service.board(None).await.unwrap();
        assert!(board.in_station.is_empty());
        assert_eq!(board.permit_issued.len(), 1);
    }

    #[tokio::test]
    async fn test_full_lifecycle_through_service() {
        let service = service();
        let operator = Uuid::new_v4();
        let record = service.record_entry(entry_request()).await.unwrap();

        service.record_passenger_drop(record.id, drop_request(20)).await.unwrap();
        service
            .issue_permit(record.id, permit_request("LENH-007"), Some(operator))
            .await
            .unwrap();
        service
            .process_payment(
                record.id,
                PaymentRequest {
                    payment_amount: Some(Decimal::from(120_000)),
                    payment_method: None,
                    invoice_number: Some("INV-1".into()),
                    event_time: None,
                },
            )
            .await
            .unwrap();
        service
            .issue_departure_order(
                record.id,
                DepartureOrderRequest {
                    passengers_departing: 35,
                    event_time: None,
                },
            )
            .await
            .unwrap();
        let exit = ExitRequest::default();
        let departed = service.record_exit(record.id, exit.event_time).await.unwrap();

        assert_eq!(departed.current_status, DispatchStatus::Departed);
        assert_eq!(departed.permit_issued_by, Some(operator));
        assert_eq!(departed.invoice_number.as_deref(), Some("INV-1"));
        assert!(departed.passenger_drop_time.is_some());
        assert!(departed.boarding_permit_time.is_some());
        assert!(departed.payment_time.is_some());
        assert!(departed.departure_order_time.is_some());
        assert!(departed.exit_time.is_some());

        // Transición fuera de orden
        let err = service.record_exit(record.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let service = service();
        let err = service.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_station_day_range_uses_station_offset() {
        let service = service();
        let (from, to) = service
            .station_day_range(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
            .unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2026, 10, 18, 17, 0, 0).unwrap());
        assert_eq!(to - from, Duration::days(1));
    }
}
