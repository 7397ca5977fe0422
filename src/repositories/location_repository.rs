use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::location_dto::{CreateLocationRequest, UpdateLocationRequest};
use crate::models::location::Location;
use crate::utils::errors::AppError;

pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateLocationRequest) -> Result<Location, AppError> {
        let now = Utc::now();
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (id, name, location_type, address, latitude, longitude, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.location_type.trim())
        .bind(request.address)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE is_active OR $1 ORDER BY name ASC",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    pub async fn update(&self, id: Uuid, request: UpdateLocationRequest) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = COALESCE($2, name),
                location_type = COALESCE($3, location_type),
                address = COALESCE($4, address),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.name)
        .bind(request.location_type)
        .bind(request.address)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE locations SET is_active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
