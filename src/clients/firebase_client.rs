//! Cliente de sólo lectura para Firebase Realtime Database (API REST)

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, info};

use crate::dto::legacy_dto::FirebaseDispatchRecord;
use crate::utils::errors::{AppError, AppResult};

pub struct FirebaseClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseClient {
    pub fn new(base_url: &str, auth_token: Option<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn dispatch_url(&self) -> String {
        format!("{}/dispatch.json", self.base_url)
    }

    /// Todos los despachos legacy, indexados por su clave Firebase
    pub async fn fetch_dispatch_records(&self) -> AppResult<BTreeMap<String, FirebaseDispatchRecord>> {
        let url = self.dispatch_url();
        info!("🔥 Leyendo despachos legacy de Firebase: {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Firebase request failed: {}", e)))?;

        let status = response.status();
        debug!("📡 Firebase response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Firebase respondió {}: {}", status, body);
            return Err(AppError::ExternalApi(format!("Firebase returned {}", status)));
        }

        // Un nodo vacío llega como `null`
        let records: Option<BTreeMap<String, FirebaseDispatchRecord>> = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Invalid Firebase payload: {}", e)))?;

        let records = records.unwrap_or_default();
        info!("✅ {} despachos legacy recibidos", records.len());
        Ok(records)
    }
}
