//! Repositorio de despachos
//!
//! El almacén de `DispatchRecord` y sus `ServiceCharge` queda detrás de un
//! trait para poder usar PostgreSQL en producción y memoria en desarrollo y
//! tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::dispatch::{DispatchFilter, DispatchRecord, DispatchStatus, ScheduleSlot};
use crate::models::service_charge::ServiceCharge;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait DispatchRepository: Send + Sync {
    async fn insert(&self, record: &DispatchRecord) -> AppResult<DispatchRecord>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DispatchRecord>>;

    async fn list(&self, filter: &DispatchFilter) -> AppResult<Vec<DispatchRecord>>;

    /// Guarda el registro sólo si el estado almacenado sigue siendo `expected`.
    /// Devuelve `None` si otro operador lo cambió entretanto.
    async fn save_transition(
        &self,
        record: &DispatchRecord,
        expected: DispatchStatus,
    ) -> AppResult<Option<DispatchRecord>>;

    async fn update_entry_image(
        &self,
        id: Uuid,
        url: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<DispatchRecord>>;

    async fn transport_order_code_taken(&self, code: &str, exclude_id: Uuid) -> AppResult<bool>;

    async fn find_schedule(&self, schedule_id: Uuid) -> AppResult<Option<ScheduleSlot>>;

    /// Inserta la línea sólo si el despacho sigue en uno de los estados
    /// `allowed`. Devuelve `None` si no existe o ya cambió de estado.
    async fn insert_charge(
        &self,
        charge: &ServiceCharge,
        allowed: &[DispatchStatus],
    ) -> AppResult<Option<ServiceCharge>>;

    async fn list_charges(&self, dispatch_ids: &[Uuid]) -> AppResult<Vec<ServiceCharge>>;

    async fn delete_charge(&self, dispatch_id: Uuid, charge_id: Uuid) -> AppResult<bool>;
}

pub struct PgDispatchRepository {
    pool: PgPool,
}

impl PgDispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchRepository for PgDispatchRepository {
    async fn insert(&self, record: &DispatchRecord) -> AppResult<DispatchRecord> {
        let saved = sqlx::query_as::<_, DispatchRecord>(
            r#"
            INSERT INTO dispatch_records (
                id, vehicle_id, driver_id, route_id, schedule_id,
                entry_time, passenger_drop_time, boarding_permit_time,
                planned_departure_time, payment_time, departure_order_time, exit_time,
                current_status, passengers_arrived, passengers_departing, entry_image_url,
                transport_order_code, seat_count, permit_status, rejection_reason,
                permit_issued_by, payment_amount, payment_method, invoice_number,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.vehicle_id)
        .bind(record.driver_id)
        .bind(record.route_id)
        .bind(record.schedule_id)
        .bind(record.entry_time)
        .bind(record.passenger_drop_time)
        .bind(record.boarding_permit_time)
        .bind(record.planned_departure_time)
        .bind(record.payment_time)
        .bind(record.departure_order_time)
        .bind(record.exit_time)
        .bind(record.current_status)
        .bind(record.passengers_arrived)
        .bind(record.passengers_departing)
        .bind(&record.entry_image_url)
        .bind(&record.transport_order_code)
        .bind(record.seat_count)
        .bind(record.permit_status)
        .bind(&record.rejection_reason)
        .bind(record.permit_issued_by)
        .bind(record.payment_amount)
        .bind(record.payment_method)
        .bind(&record.invoice_number)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DispatchRecord>> {
        let record = sqlx::query_as::<_, DispatchRecord>("SELECT * FROM dispatch_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(&self, filter: &DispatchFilter) -> AppResult<Vec<DispatchRecord>> {
        let records = sqlx::query_as::<_, DispatchRecord>(
            r#"
            SELECT * FROM dispatch_records
            WHERE ($1::dispatch_status IS NULL OR current_status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::timestamptz IS NULL OR entry_time >= $3)
              AND ($4::timestamptz IS NULL OR entry_time < $4)
            ORDER BY entry_time ASC
            "#,
        )
        .bind(filter.status)
        .bind(filter.vehicle_id)
        .bind(filter.entered_from)
        .bind(filter.entered_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn save_transition(
        &self,
        record: &DispatchRecord,
        expected: DispatchStatus,
    ) -> AppResult<Option<DispatchRecord>> {
        let saved = sqlx::query_as::<_, DispatchRecord>(
            r#"
            UPDATE dispatch_records
            SET driver_id = $3, route_id = $4, schedule_id = $5,
                passenger_drop_time = $6, boarding_permit_time = $7,
                planned_departure_time = $8, payment_time = $9,
                departure_order_time = $10, exit_time = $11,
                current_status = $12, passengers_arrived = $13,
                passengers_departing = $14, transport_order_code = $15,
                seat_count = $16, permit_status = $17, rejection_reason = $18,
                permit_issued_by = $19, payment_amount = $20,
                payment_method = $21, invoice_number = $22, updated_at = $23
            WHERE id = $1 AND current_status = $2
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(expected)
        .bind(record.driver_id)
        .bind(record.route_id)
        .bind(record.schedule_id)
        .bind(record.passenger_drop_time)
        .bind(record.boarding_permit_time)
        .bind(record.planned_departure_time)
        .bind(record.payment_time)
        .bind(record.departure_order_time)
        .bind(record.exit_time)
        .bind(record.current_status)
        .bind(record.passengers_arrived)
        .bind(record.passengers_departing)
        .bind(&record.transport_order_code)
        .bind(record.seat_count)
        .bind(record.permit_status)
        .bind(&record.rejection_reason)
        .bind(record.permit_issued_by)
        .bind(record.payment_amount)
        .bind(record.payment_method)
        .bind(&record.invoice_number)
        .bind(record.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn update_entry_image(
        &self,
        id: Uuid,
        url: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Option<DispatchRecord>> {
        let record = sqlx::query_as::<_, DispatchRecord>(
            "UPDATE dispatch_records SET entry_image_url = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn transport_order_code_taken(&self, code: &str, exclude_id: Uuid) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM dispatch_records WHERE transport_order_code = $1 AND id <> $2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    async fn find_schedule(&self, schedule_id: Uuid) -> AppResult<Option<ScheduleSlot>> {
        let row: Option<(Uuid, NaiveTime)> = sqlx::query_as(
            "SELECT route_id, departure_time FROM route_schedules WHERE id = $1 AND is_active",
        )
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(route_id, departure_time)| ScheduleSlot {
            route_id,
            departure_time,
        }))
    }

    async fn insert_charge(
        &self,
        charge: &ServiceCharge,
        allowed: &[DispatchStatus],
    ) -> AppResult<Option<ServiceCharge>> {
        let allowed: Vec<String> = allowed.iter().map(|s| s.as_str().to_string()).collect();

        // FOR SHARE bloquea el cambio de estado hasta que termine la inserción
        let saved = sqlx::query_as::<_, ServiceCharge>(
            r#"
            INSERT INTO service_charges (id, dispatch_id, service_type, quantity, unit_price, total, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (
                SELECT 1 FROM dispatch_records
                WHERE id = $2 AND current_status::text = ANY($8)
                FOR SHARE
            )
            RETURNING *
            "#,
        )
        .bind(charge.id)
        .bind(charge.dispatch_id)
        .bind(&charge.service_type)
        .bind(charge.quantity)
        .bind(charge.unit_price)
        .bind(charge.total)
        .bind(charge.created_at)
        .bind(allowed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn list_charges(&self, dispatch_ids: &[Uuid]) -> AppResult<Vec<ServiceCharge>> {
        let charges = sqlx::query_as::<_, ServiceCharge>(
            "SELECT * FROM service_charges WHERE dispatch_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(dispatch_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(charges)
    }

    async fn delete_charge(&self, dispatch_id: Uuid, charge_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM service_charges WHERE id = $1 AND dispatch_id = $2")
            .bind(charge_id)
            .bind(dispatch_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
