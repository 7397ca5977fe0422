use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common_dto::ApiResponse;
use crate::dto::route_dto::{
    CreateRouteRequest, CreateScheduleRequest, RouteResponse, RouteScheduleResponse,
    UpdateRouteRequest,
};
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::AppError;

pub struct RouteController {
    repository: RouteRepository,
}

impl RouteController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: RouteRepository::new(pool),
        }
    }

    pub async fn create(&self, request: CreateRouteRequest) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;
        let route = self.repository.create(request).await?;
        Ok(ApiResponse::success_with_message(route.into(), "Ruta creada exitosamente"))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<RouteResponse, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Ruta no encontrada".to_string()))
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<RouteResponse>, AppError> {
        let routes = self.repository.list(include_inactive).await?;
        Ok(routes.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateRouteRequest,
    ) -> Result<ApiResponse<RouteResponse>, AppError> {
        request.validate()?;
        let route = self
            .repository
            .update(id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Ruta no encontrada".to_string()))?;
        Ok(ApiResponse::success_with_message(route.into(), "Ruta actualizada exitosamente"))
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<ApiResponse<()>, AppError> {
        if !self.repository.deactivate(id).await? {
            return Err(AppError::NotFound("Ruta no encontrada".to_string()));
        }
        Ok(ApiResponse::message_only("Ruta desactivada exitosamente"))
    }

    pub async fn list_schedules(&self, route_id: Uuid) -> Result<Vec<RouteScheduleResponse>, AppError> {
        self.get_by_id(route_id).await?;
        let schedules = self.repository.list_schedules(route_id).await?;
        Ok(schedules.into_iter().map(Into::into).collect())
    }

    pub async fn create_schedule(
        &self,
        route_id: Uuid,
        request: CreateScheduleRequest,
    ) -> Result<ApiResponse<RouteScheduleResponse>, AppError> {
        self.get_by_id(route_id).await?;
        let schedule = self
            .repository
            .create_schedule(route_id, request.departure_time)
            .await?;
        Ok(ApiResponse::success_with_message(schedule.into(), "Horario creado exitosamente"))
    }
}
