use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::dispatch_dto::{
    BoardQuery, BoardResponse, CreateServiceChargeRequest, DepartureOrderRequest,
    DispatchListQuery, DispatchRecordResponse, EntryImageRequest, ExitRequest,
    IssuePermitRequest, PassengerDropRequest, PaymentRequest, RecordEntryRequest,
    ServiceChargeListResponse, ServiceChargeResponse,
};
use crate::middleware::auth::AuthenticatedOperator;
use crate::models::dispatch::DispatchFilter;
use crate::models::service_charge::sum_charges;
use crate::services::dispatch_service::DispatchService;
use crate::services::permit_validation::{PermitForm, PermitValidation};
use crate::utils::errors::AppError;

pub struct DispatchController {
    service: Arc<DispatchService>,
}

impl DispatchController {
    pub fn new(service: Arc<DispatchService>) -> Self {
        Self { service }
    }

    pub async fn record_entry(
        &self,
        request: RecordEntryRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        request.validate()?;
        let record = self.service.record_entry(request).await?;
        Ok(ApiResponse::success_with_message(
            record.into(),
            "Entrada registrada",
        ))
    }

    pub async fn list(&self, query: DispatchListQuery) -> Result<Vec<DispatchRecordResponse>, AppError> {
        let (entered_from, entered_to) = match query.date {
            Some(date) => {
                let (from, to) = self.service.station_day_range(date)?;
                (Some(from), Some(to))
            }
            None => (None, None),
        };

        let filter = DispatchFilter {
            status: query.status,
            vehicle_id: query.vehicle_id,
            entered_from,
            entered_to,
        };

        let records = self.service.list(&filter).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn board(&self, query: BoardQuery) -> Result<BoardResponse, AppError> {
        Ok(self.service.board(query.date).await?.into())
    }

    pub async fn refresh(&self) -> Result<BoardResponse, AppError> {
        Ok(self.service.refresh().await?.into())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DispatchRecordResponse, AppError> {
        Ok(self.service.get(id).await?.into())
    }

    pub async fn update_entry_image(
        &self,
        id: Uuid,
        request: EntryImageRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        request.validate()?;
        let record = self.service.update_entry_image(id, &request.entry_image_url).await?;
        Ok(ApiResponse::success_with_message(record.into(), "Imagen de entrada actualizada"))
    }

    pub async fn passenger_drop(
        &self,
        id: Uuid,
        request: PassengerDropRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        let (record, changed) = self.service.record_passenger_drop(id, request).await?;
        let message = if changed {
            "Desembarque de pasajeros registrado"
        } else {
            "Sin pasajeros: el estado no cambia"
        };
        Ok(ApiResponse::success_with_message(record.into(), message))
    }

    pub async fn validate_permit(&self, id: Uuid, form: PermitForm) -> Result<PermitValidation, AppError> {
        self.service.validate_permit(id, &form).await
    }

    pub async fn issue_permit(
        &self,
        id: Uuid,
        request: IssuePermitRequest,
        operator: &AuthenticatedOperator,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        let record = self
            .service
            .issue_permit(id, request, Some(operator.operator_id))
            .await?;
        Ok(ApiResponse::success_with_message(record.into(), "Permiso registrado"))
    }

    pub async fn payment(
        &self,
        id: Uuid,
        request: PaymentRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        let record = self.service.process_payment(id, request).await?;
        Ok(ApiResponse::success_with_message(record.into(), "Pago registrado"))
    }

    pub async fn departure_order(
        &self,
        id: Uuid,
        request: DepartureOrderRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        let record = self.service.issue_departure_order(id, request).await?;
        Ok(ApiResponse::success_with_message(record.into(), "Orden de salida emitida"))
    }

    pub async fn exit(
        &self,
        id: Uuid,
        request: ExitRequest,
    ) -> Result<ApiResponse<DispatchRecordResponse>, AppError> {
        let record = self.service.record_exit(id, request.event_time).await?;
        Ok(ApiResponse::success_with_message(record.into(), "Salida registrada"))
    }

    pub async fn list_charges(&self, id: Uuid) -> Result<ServiceChargeListResponse, AppError> {
        let charges = self.service.list_charges(id).await?;
        let total = sum_charges(&charges).ok_or_else(|| {
            AppError::Internal("El total de servicios excede el máximo representable".to_string())
        })?;
        Ok(ServiceChargeListResponse {
            charges: charges.into_iter().map(Into::into).collect(),
            total,
        })
    }

    pub async fn add_charge(
        &self,
        id: Uuid,
        request: CreateServiceChargeRequest,
    ) -> Result<ApiResponse<ServiceChargeResponse>, AppError> {
        request.validate()?;
        let charge = self.service.add_charge(id, request).await?;
        Ok(ApiResponse::success_with_message(charge.into(), "Servicio añadido"))
    }

    pub async fn delete_charge(&self, id: Uuid, charge_id: Uuid) -> Result<ApiResponse<()>, AppError> {
        self.service.delete_charge(id, charge_id).await?;
        Ok(ApiResponse::message_only("Servicio eliminado"))
    }
}
