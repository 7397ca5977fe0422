use crate::dto::legacy_dto::{ImportSummary, LegacyDispatchEntry};
use crate::services::legacy_sync_service::LegacySyncService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct LegacyController<'a> {
    state: &'a AppState,
}

impl<'a> LegacyController<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn service(&self) -> Result<LegacySyncService<'a>, AppError> {
        let client = self.state.firebase.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("FIREBASE_DATABASE_URL no está configurada".to_string())
        })?;
        Ok(LegacySyncService::new(client, &self.state.dispatch))
    }

    pub async fn list(&self) -> Result<Vec<LegacyDispatchEntry>, AppError> {
        self.service()?.list().await
    }

    pub async fn import(&self) -> Result<ImportSummary, AppError> {
        self.service()?.import().await
    }
}
