use chrono::{NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::route_dto::{CreateRouteRequest, UpdateRouteRequest};
use crate::models::route::{Route, RouteSchedule};
use crate::utils::errors::AppError;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateRouteRequest) -> Result<Route, AppError> {
        let now = Utc::now();
        let route = sqlx::query_as::<_, Route>(
            r#"
            INSERT INTO routes (id, code, name, origin, destination, distance_km, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.code)
        .bind(request.name.trim())
        .bind(request.origin.trim())
        .bind(request.destination.trim())
        .bind(request.distance_km)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(route)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Route>, AppError> {
        let routes = sqlx::query_as::<_, Route>(
            "SELECT * FROM routes WHERE is_active OR $1 ORDER BY code ASC",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    pub async fn update(&self, id: Uuid, request: UpdateRouteRequest) -> Result<Option<Route>, AppError> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                origin = COALESCE($4, origin),
                destination = COALESCE($5, destination),
                distance_km = COALESCE($6, distance_km),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.code)
        .bind(request.name)
        .bind(request.origin)
        .bind(request.destination)
        .bind(request.distance_km)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE routes SET is_active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_schedules(&self, route_id: Uuid) -> Result<Vec<RouteSchedule>, AppError> {
        let schedules = sqlx::query_as::<_, RouteSchedule>(
            "SELECT * FROM route_schedules WHERE route_id = $1 AND is_active ORDER BY departure_time ASC",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    pub async fn create_schedule(&self, route_id: Uuid, departure_time: NaiveTime) -> Result<RouteSchedule, AppError> {
        let schedule = sqlx::query_as::<_, RouteSchedule>(
            r#"
            INSERT INTO route_schedules (id, route_id, departure_time, is_active, created_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(route_id)
        .bind(departure_time)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }
}
