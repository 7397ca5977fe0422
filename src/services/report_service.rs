//! Resumen de operación de la estación para un rango de fechas

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::dto::report_dto::{BucketCounts, ReportSummary};
use crate::models::dispatch::{DispatchRecord, DispatchStatus, PermitStatus};
use crate::models::service_charge::ServiceCharge;
use crate::services::display_status::{project, DisplayStatus};

pub fn summarize(
    records: &[DispatchRecord],
    charges: &[ServiceCharge],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> ReportSummary {
    let mut buckets = BucketCounts::default();
    let mut permits_approved = 0;
    let mut permits_rejected = 0;
    let mut revenue = Decimal::ZERO;
    let mut passengers_arrived: i64 = 0;
    let mut passengers_departing: i64 = 0;
    let mut dwell_total_secs: i64 = 0;
    let mut dwell_count: i64 = 0;

    for record in records {
        match project(record.current_status) {
            DisplayStatus::InStation => buckets.in_station += 1,
            DisplayStatus::PermitIssued => buckets.permit_issued += 1,
            DisplayStatus::Paid => buckets.paid += 1,
            DisplayStatus::Departed => buckets.departed += 1,
        }

        match record.permit_status {
            Some(PermitStatus::Approved) => permits_approved += 1,
            Some(PermitStatus::Rejected) => permits_rejected += 1,
            None => {}
        }

        revenue = revenue.saturating_add(record.payment_amount.unwrap_or(Decimal::ZERO));
        passengers_arrived += i64::from(record.passengers_arrived.unwrap_or(0));
        passengers_departing += i64::from(record.passengers_departing.unwrap_or(0));

        if record.current_status == DispatchStatus::Departed {
            if let Some(exit) = record.exit_time {
                dwell_total_secs += (exit - record.entry_time).num_seconds();
                dwell_count += 1;
            }
        }
    }

    let mut service_totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for charge in charges {
        let total = service_totals.entry(charge.service_type.clone()).or_insert(Decimal::ZERO);
        *total = total.saturating_add(charge.total);
    }

    ReportSummary {
        from,
        to,
        total_visits: records.len(),
        buckets,
        permits_approved,
        permits_rejected,
        revenue,
        passengers_arrived,
        passengers_departing,
        service_totals,
        average_dwell_minutes: (dwell_count > 0)
            .then(|| dwell_total_secs as f64 / dwell_count as f64 / 60.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatch_workflow::{DispatchWorkflow, NewEntry};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn record_at(at: DateTime<Utc>) -> DispatchRecord {
        DispatchWorkflow::default()
            .record_entry(
                NewEntry {
                    vehicle_id: Uuid::new_v4(),
                    driver_id: None,
                    route_id: None,
                    entry_image_url: None,
                },
                at,
            )
            .unwrap()
    }

    #[test]
    fn test_empty_range() {
        let now = Utc::now();
        let summary = summarize(&[], &[], now, now);
        assert_eq!(summary.total_visits, 0);
        assert_eq!(summary.revenue, Decimal::ZERO);
        assert!(summary.average_dwell_minutes.is_none());
    }

    #[test]
    fn test_summary_aggregates_records_and_charges() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap();

        let mut departed = record_at(t0);
        departed.current_status = DispatchStatus::Departed;
        departed.permit_status = Some(PermitStatus::Approved);
        departed.payment_amount = Some(Decimal::from(100_000));
        departed.passengers_arrived = Some(15);
        departed.passengers_departing = Some(30);
        departed.exit_time = Some(t0 + Duration::minutes(60));

        let mut rejected = record_at(t0 + Duration::minutes(5));
        rejected.current_status = DispatchStatus::PermitRejected;
        rejected.permit_status = Some(PermitStatus::Rejected);

        let waiting = record_at(t0 + Duration::minutes(10));

        let charges = vec![
            ServiceCharge::new(departed.id, "parking".into(), 2, Decimal::from(10_000)).unwrap(),
            ServiceCharge::new(departed.id, "wash".into(), 1, Decimal::from(30_000)).unwrap(),
            ServiceCharge::new(waiting.id, "parking".into(), 1, Decimal::from(10_000)).unwrap(),
        ];

        let summary = summarize(
            &[departed, rejected, waiting],
            &charges,
            t0,
            t0 + Duration::days(1),
        );

        assert_eq!(summary.total_visits, 3);
        assert_eq!(summary.buckets.in_station, 2);
        assert_eq!(summary.buckets.departed, 1);
        assert_eq!(summary.permits_approved, 1);
        assert_eq!(summary.permits_rejected, 1);
        assert_eq!(summary.revenue, Decimal::from(100_000));
        assert_eq!(summary.passengers_arrived, 15);
        assert_eq!(summary.passengers_departing, 30);
        assert_eq!(summary.service_totals["parking"], Decimal::from(30_000));
        assert_eq!(summary.service_totals["wash"], Decimal::from(30_000));
        assert_eq!(summary.average_dwell_minutes, Some(60.0));
    }
}
