use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::location_dto::{CreateLocationRequest, LocationResponse, UpdateLocationRequest};
use crate::repositories::location_repository::LocationRepository;
use crate::utils::errors::AppError;

pub struct LocationController {
    repository: LocationRepository,
}

impl LocationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LocationRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateLocationRequest) -> Result<ApiResponse<LocationResponse>, AppError> {
        request.validate()?;
        let location = self.repository.create(request).await?;
        Ok(ApiResponse::success_with_message(location.into(), "Ubicación creada exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<LocationResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Ubicación no encontrada".to_string()))
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<LocationResponse>, AppError> {
        let locations = self.repository.list(include_inactive).await?;
        Ok(locations.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateLocationRequest,
    ) -> Result<ApiResponse<LocationResponse>, AppError> {
        request.validate()?;
        let location = self
            .repository
            .update(id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Ubicación no encontrada".to_string()))?;
        Ok(ApiResponse::success_with_message(location.into(), "Ubicación actualizada exitosamente"))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if !self.repository.deactivate(id).await? {
            return Err(AppError::NotFound("Ubicación no encontrada".to_string()));
        }
        Ok(ApiResponse::message_only("Ubicación desactivada exitosamente"))
    }
}
