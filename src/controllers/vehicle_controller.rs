use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{conflict_error, AppError};
use crate::utils::validation::normalize_plate_number;

pub struct VehicleController {
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    pub async fn create(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        // La matrícula es única en toda la estación
        let plate = normalize_plate_number(&request.plate_number);
        if self.repository.plate_number_exists(&plate, None).await? {
            return Err(conflict_error("Vehículo", "matrícula", &plate));
        }

        let vehicle = self.repository.create(request).await?;
        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo creado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<VehicleResponse, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;

        Ok(vehicle.into())
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.repository.list(include_inactive).await?;
        Ok(vehicles.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        if let Some(plate) = request.plate_number.as_deref() {
            let plate = normalize_plate_number(plate);
            if self.repository.plate_number_exists(&plate, Some(id)).await? {
                return Err(conflict_error("Vehículo", "matrícula", &plate));
            }
        }

        let vehicle = self
            .repository
            .update(id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if !self.repository.deactivate(id).await? {
            return Err(AppError::NotFound("Vehículo no encontrado".to_string()));
        }
        Ok(ApiResponse::message_only("Vehículo desactivado exitosamente"))
    }
}
