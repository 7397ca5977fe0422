//! Lectura e importación de despachos legacy de Firebase

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::clients::FirebaseClient;
use crate::dto::legacy_dto::{FirebaseDispatchRecord, ImportSummary, LegacyDispatchEntry};
use crate::services::dispatch_service::DispatchService;
use crate::utils::errors::AppResult;

pub struct LegacySyncService<'a> {
    client: &'a FirebaseClient,
    dispatch: &'a DispatchService,
}

impl<'a> LegacySyncService<'a> {
    pub fn new(client: &'a FirebaseClient, dispatch: &'a DispatchService) -> Self {
        Self { client, dispatch }
    }

    pub async fn list(&self) -> AppResult<Vec<LegacyDispatchEntry>> {
        let records = self.client.fetch_dispatch_records().await?;
        Ok(map_entries(records))
    }

    /// Importa los registros que aún no existen. Repetirlo no duplica nada.
    pub async fn import(&self) -> AppResult<ImportSummary> {
        let records = self.client.fetch_dispatch_records().await?;
        import_records(self.dispatch, records).await
    }
}

pub fn map_entries(records: BTreeMap<String, FirebaseDispatchRecord>) -> Vec<LegacyDispatchEntry> {
    records
        .into_iter()
        .map(|(key, legacy)| match legacy.into_record(&key) {
            Ok(record) => LegacyDispatchEntry {
                firebase_key: key,
                record: Some(record.into()),
                error: None,
            },
            Err(e) => LegacyDispatchEntry {
                firebase_key: key,
                record: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

pub async fn import_records(
    dispatch: &DispatchService,
    records: BTreeMap<String, FirebaseDispatchRecord>,
) -> AppResult<ImportSummary> {
    let mut summary = ImportSummary {
        fetched: records.len(),
        ..Default::default()
    };

    for (key, legacy) in records {
        let record = match legacy.into_record(&key) {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️ Despacho legacy {} descartado: {}", key, e);
                summary.failed += 1;
                summary.errors.push(format!("{}: {}", key, e));
                continue;
            }
        };

        match dispatch.import_record(&record).await {
            Ok(true) => summary.imported += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                warn!("⚠️ Despacho legacy {} no se pudo guardar: {}", key, e);
                summary.failed += 1;
                summary.errors.push(format!("{}: {}", key, e));
            }
        }
    }

    if summary.imported > 0 {
        dispatch.invalidate_cache().await;
    }
    info!(
        "📦 Importación legacy: {} leídos, {} importados, {} existentes, {} con error",
        summary.fetched, summary.imported, summary.skipped, summary.failed
    );
    Ok(summary)
}
