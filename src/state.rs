//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::clients::FirebaseClient;
use crate::config::environment::EnvironmentConfig;
use crate::middleware::rate_limit::RateLimitState;
use crate::services::dispatch_service::DispatchService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub dispatch: Arc<DispatchService>,
    pub firebase: Option<Arc<FirebaseClient>>,
    pub rate_limit: RateLimitState,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, dispatch: DispatchService) -> Self {
        let rate_limit = RateLimitState::from_config(&config);
        Self {
            pool,
            config,
            dispatch: Arc::new(dispatch),
            firebase: None,
            rate_limit,
        }
    }

    pub fn with_firebase(mut self, client: FirebaseClient) -> Self {
        self.firebase = Some(Arc::new(client));
        self
    }
}
