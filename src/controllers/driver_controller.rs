use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::driver_dto::{CreateDriverRequest, DriverResponse, UpdateDriverRequest};
use crate::repositories::driver_repository::DriverRepository;
use crate::utils::errors::AppError;

pub struct DriverController {
    repository: DriverRepository,
}

impl DriverController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DriverRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;
        let driver = self.repository.create(request).await?;
        Ok(ApiResponse::success_with_message(driver.into(), "Conductor creado exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<DriverResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Conductor no encontrado".to_string()))
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<DriverResponse>, AppError> {
        let drivers = self.repository.list(include_inactive).await?;
        Ok(drivers.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDriverRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;
        let driver = self
            .repository
            .update(id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Conductor no encontrado".to_string()))?;
        Ok(ApiResponse::success_with_message(driver.into(), "Conductor actualizado exitosamente"))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if !self.repository.deactivate(id).await? {
            return Err(AppError::NotFound("Conductor no encontrado".to_string()));
        }
        Ok(ApiResponse::message_only("Conductor desactivado exitosamente"))
    }
}
