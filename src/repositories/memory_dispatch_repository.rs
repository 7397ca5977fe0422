//! Repositorio de despachos en memoria
//!
//! Mismo contrato que `PgDispatchRepository`, incluida la unicidad del
//! código de orden de transporte y la escritura condicionada al estado.
//! Se usa con `DISPATCH_STORE=memory` y en los tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::dispatch::{DispatchFilter, DispatchRecord, DispatchStatus, ScheduleSlot};
use crate::models::service_charge::ServiceCharge;
use crate::repositories::dispatch_repository::DispatchRepository;
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
pub struct MemoryDispatchRepository {
    records: RwLock<HashMap<Uuid, DispatchRecord>>,
    charges: RwLock<Vec<ServiceCharge>>,
    schedules: RwLock<HashMap<Uuid, ScheduleSlot>>,
}

impl MemoryDispatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un horario de ruta (en PostgreSQL viven en `route_schedules`)
    pub async fn add_schedule(&self, schedule_id: Uuid, slot: ScheduleSlot) {
        self.schedules.write().await.insert(schedule_id, slot);
    }
}

#[async_trait]
impl DispatchRepository for MemoryDispatchRepository {
    async fn insert(&self, record: &DispatchRecord) -> AppResult<DispatchRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(AppError::Conflict(format!(
                "DispatchRecord '{}' already exists",
                record.id
            )));
        }
        if let Some(code) = record.transport_order_code.as_deref() {
            if records.values().any(|r| r.transport_order_code.as_deref() == Some(code)) {
                return Err(AppError::DuplicateTransportOrderCode(
                    "El código de orden de transporte ya existe".to_string(),
                ));
            }
        }
        records.insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DispatchRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &DispatchFilter) -> AppResult<Vec<DispatchRecord>> {
        let mut records: Vec<DispatchRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.entry_time);
        Ok(records)
    }

    async fn save_transition(
        &self,
        record: &DispatchRecord,
        expected: DispatchStatus,
    ) -> AppResult<Option<DispatchRecord>> {
        let mut records = self.records.write().await;

        if let Some(code) = record.transport_order_code.as_deref() {
            let taken = records
                .values()
                .any(|r| r.id != record.id && r.transport_order_code.as_deref() == Some(code));
            if taken {
                return Err(AppError::DuplicateTransportOrderCode(
                    "El código de orden de transporte ya existe".to_string(),
                ));
            }
        }

        match records.get_mut(&record.id) {
            Some(stored) if stored.current_status == expected => {
                let entry_image_url = stored.entry_image_url.clone();
                *stored = record.clone();
                stored.entry_image_url = entry_image_url;
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_entry_image(
        &self,
        id: Uuid,
        url: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<DispatchRecord>> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(&id).map(|stored| {
            stored.entry_image_url = Some(url.to_string());
            stored.updated_at = at;
            stored.clone()
        }))
    }

    async fn transport_order_code_taken(&self, code: &str, exclude_id: Uuid) -> AppResult<bool> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .any(|r| r.id != exclude_id && r.transport_order_code.as_deref() == Some(code)))
    }

    async fn find_schedule(&self, schedule_id: Uuid) -> AppResult<Option<ScheduleSlot>> {
        Ok(self.schedules.read().await.get(&schedule_id).copied())
    }

    async fn insert_charge(
        &self,
        charge: &ServiceCharge,
        allowed: &[DispatchStatus],
    ) -> AppResult<Option<ServiceCharge>> {
        // El lock de lectura impide que una transición cambie el estado a mitad
        let records = self.records.read().await;
        let chargeable = records
            .get(&charge.dispatch_id)
            .is_some_and(|r| allowed.contains(&r.current_status));
        if !chargeable {
            return Ok(None);
        }
        self.charges.write().await.push(charge.clone());
        Ok(Some(charge.clone()))
    }

    async fn list_charges(&self, dispatch_ids: &[Uuid]) -> AppResult<Vec<ServiceCharge>> {
        let mut charges: Vec<ServiceCharge> = self
            .charges
            .read()
            .await
            .iter()
            .filter(|c| dispatch_ids.contains(&c.dispatch_id))
            .cloned()
            .collect();
        charges.sort_by_key(|c| c.created_at);
        Ok(charges)
    }

    async fn delete_charge(&self, dispatch_id: Uuid, charge_id: Uuid) -> AppResult<bool> {
        let mut charges = self.charges.write().await;
        let before = charges.len();
        charges.retain(|c| !(c.id == charge_id && c.dispatch_id == dispatch_id));
        Ok(charges.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatch_workflow::{DispatchWorkflow, NewEntry};
    use rust_decimal::Decimal;

    fn new_record() -> DispatchRecord {
        DispatchWorkflow::default()
            .record_entry(
                NewEntry {
                    vehicle_id: Uuid::new_v4(),
                    driver_id: None,
                    route_id: None,
                    entry_image_url: None,
                },
                Utc::now(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_transition_is_conditional_on_status() {
        let repo = MemoryDispatchRepository::new();
        let record = repo.insert(&new_record()).await.unwrap();

        let mut updated = record.clone();
        updated.current_status = DispatchStatus::PassengersDropped;

        // El estado almacenado no coincide con el esperado
        let stale = repo
            .save_transition(&updated, DispatchStatus::PermitIssued)
            .await
            .unwrap();
        assert!(stale.is_none());

        let saved = repo
            .save_transition(&updated, DispatchStatus::Entered)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.current_status, DispatchStatus::PassengersDropped);
    }

    #[tokio::test]
    async fn test_transport_order_code_is_unique() {
        let repo = MemoryDispatchRepository::new();
        let mut first = repo.insert(&new_record()).await.unwrap();
        let mut second = repo.insert(&new_record()).await.unwrap();

        first.transport_order_code = Some("LENH-001".into());
        repo.save_transition(&first, DispatchStatus::Entered).await.unwrap();

        assert!(repo.transport_order_code_taken("LENH-001", second.id).await.unwrap());
        assert!(!repo.transport_order_code_taken("LENH-001", first.id).await.unwrap());

        second.transport_order_code = Some("LENH-001".into());
        let err = repo
            .save_transition(&second, DispatchStatus::Entered)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateTransportOrderCode(_)));
    }

    const OPEN: [DispatchStatus; 1] = [DispatchStatus::Entered];

    #[tokio::test]
    async fn test_insert_rejects_repeated_transport_order_code() {
        let repo = MemoryDispatchRepository::new();
        let mut first = new_record();
        first.transport_order_code = Some("LENH-9".into());
        repo.insert(&first).await.unwrap();

        let mut second = new_record();
        second.transport_order_code = Some("LENH-9".into());
        let err = repo.insert(&second).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateTransportOrderCode(_)));
        assert!(repo.find_by_id(second.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_charge_is_refused_once_record_left_allowed_states() {
        let repo = MemoryDispatchRepository::new();
        let mut record = repo.insert(&new_record()).await.unwrap();
        record.current_status = DispatchStatus::Paid;
        repo.save_transition(&record, DispatchStatus::Entered).await.unwrap();

        let charge = ServiceCharge::new(record.id, "parking".into(), 1, Decimal::from(10)).unwrap();
        assert!(repo.insert_charge(&charge, &OPEN).await.unwrap().is_none());
        assert!(repo.list_charges(&[record.id]).await.unwrap().is_empty());

        let missing = ServiceCharge::new(Uuid::new_v4(), "parking".into(), 1, Decimal::from(10)).unwrap();
        assert!(repo.insert_charge(&missing, &OPEN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_charges_are_scoped_to_their_record() {
        let repo = MemoryDispatchRepository::new();
        let a = repo.insert(&new_record()).await.unwrap().id;
        let b = repo.insert(&new_record()).await.unwrap().id;
        let charge = ServiceCharge::new(a, "parking".into(), 1, Decimal::from(10)).unwrap();
        repo.insert_charge(&charge, &OPEN).await.unwrap().unwrap();
        repo.insert_charge(&ServiceCharge::new(b, "wash".into(), 1, Decimal::from(5)).unwrap(), &OPEN)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repo.list_charges(&[a]).await.unwrap().len(), 1);
        assert!(!repo.delete_charge(b, charge.id).await.unwrap());
        assert!(repo.delete_charge(a, charge.id).await.unwrap());
        assert!(repo.list_charges(&[a]).await.unwrap().is_empty());
    }
}
