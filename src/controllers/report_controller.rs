use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::dto::report_dto::{ReportQuery, ReportSummary};
use crate::models::dispatch::DispatchFilter;
use crate::services::dispatch_service::DispatchService;
use crate::services::report_service::summarize;
use crate::utils::errors::AppError;

pub struct ReportController {
    service: Arc<DispatchService>,
}

impl ReportController {
    pub fn new(service: Arc<DispatchService>) -> Self {
        Self { service }
    }

    /// Resumen de los días locales `from..=to` (hoy si no se indican)
    pub async fn summary(&self, query: ReportQuery) -> Result<ReportSummary, AppError> {
        let today = Utc::now()
            .with_timezone(&self.service.policy().station_offset)
            .date_naive();
        let from_date = query.from.unwrap_or(today);
        let to_date = query.to.unwrap_or(from_date);
        if to_date < from_date {
            return Err(AppError::BadRequest(
                "'to' no puede ser anterior a 'from'".to_string(),
            ));
        }

        let (from, _) = self.service.station_day_range(from_date)?;
        let (_, to) = self.service.station_day_range(to_date)?;

        let records = self
            .service
            .list(&DispatchFilter {
                entered_from: Some(from),
                entered_to: Some(to),
                ..Default::default()
            })
            .await?;
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let charges = self.service.charges_for(&ids).await?;

        Ok(summarize(&records, &charges, from, to))
    }
}
