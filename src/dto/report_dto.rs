use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Rango del informe en días locales de la estación (ambos incluidos)
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub in_station: usize,
    pub permit_issued: usize,
    pub paid: usize,
    pub departed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_visits: usize,
    pub buckets: BucketCounts,
    pub permits_approved: usize,
    pub permits_rejected: usize,
    pub revenue: Decimal,
    pub passengers_arrived: i64,
    pub passengers_departing: i64,
    pub service_totals: BTreeMap<String, Decimal>,
    pub average_dwell_minutes: Option<f64>,
}
