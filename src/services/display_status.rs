//! Proyección de estados a columnas del tablero
//!
//! Cada estado fino del despacho cae en exactamente una de las cuatro
//! columnas del tablero kanban.

use serde::{Deserialize, Serialize};

use crate::models::dispatch::{DispatchRecord, DispatchStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStatus {
    InStation,
    PermitIssued,
    Paid,
    Departed,
}

pub fn project(status: DispatchStatus) -> DisplayStatus {
    match status {
        DispatchStatus::Entered
        | DispatchStatus::PassengersDropped
        | DispatchStatus::PermitRejected => DisplayStatus::InStation,
        DispatchStatus::PermitIssued => DisplayStatus::PermitIssued,
        DispatchStatus::Paid => DisplayStatus::Paid,
        DispatchStatus::DepartureOrdered | DispatchStatus::Departed => DisplayStatus::Departed,
    }
}

/// Registros agrupados por columna
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub in_station: Vec<DispatchRecord>,
    pub permit_issued: Vec<DispatchRecord>,
    pub paid: Vec<DispatchRecord>,
    pub departed: Vec<DispatchRecord>,
}

impl Board {
    pub fn column_mut(&mut self, bucket: DisplayStatus) -> &mut Vec<DispatchRecord> {
        match bucket {
            DisplayStatus::InStation => &mut self.in_station,
            DisplayStatus::PermitIssued => &mut self.permit_issued,
            DisplayStatus::Paid => &mut self.paid,
            DisplayStatus::Departed => &mut self.departed,
        }
    }

    pub fn len(&self) -> usize {
        self.in_station.len() + self.permit_issued.len() + self.paid.len() + self.departed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Agrupa los registros en columnas, ordenados por hora de entrada
pub fn build_board(mut records: Vec<DispatchRecord>) -> Board {
    records.sort_by_key(|r| r.entry_time);

    let mut board = Board::default();
    for record in records {
        board.column_mut(project(record.current_status)).push(record);
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatch_workflow::{DispatchWorkflow, NewEntry};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_projection_is_total() {
        for status in DispatchStatus::ALL {
            let bucket = project(status);
            assert!(matches!(
                bucket,
                DisplayStatus::InStation
                    | DisplayStatus::PermitIssued
                    | DisplayStatus::Paid
                    | DisplayStatus::Departed
            ));
        }
    }

    #[test]
    fn test_projection_table() {
        assert_eq!(project(DispatchStatus::Entered), DisplayStatus::InStation);
        assert_eq!(project(DispatchStatus::PassengersDropped), DisplayStatus::InStation);
        assert_eq!(project(DispatchStatus::PermitRejected), DisplayStatus::InStation);
        assert_eq!(project(DispatchStatus::PermitIssued), DisplayStatus::PermitIssued);
        assert_eq!(project(DispatchStatus::Paid), DisplayStatus::Paid);
        assert_eq!(project(DispatchStatus::DepartureOrdered), DisplayStatus::Departed);
        assert_eq!(project(DispatchStatus::Departed), DisplayStatus::Departed);
        assert_ne!(project(DispatchStatus::Departed), DisplayStatus::InStation);
    }

    #[test]
    fn test_bucket_serializes_kebab_case() {
        let json = serde_json::to_string(&DisplayStatus::InStation).unwrap();
        assert_eq!(json, "\"in-station\"");
    }

    #[test]
    fn test_board_groups_and_orders_by_entry_time() {
        let workflow = DispatchWorkflow::default();
        let t0 = Utc::now();
        let entry = |offset: i64| {
            workflow
                .record_entry(
                    NewEntry {
                        vehicle_id: Uuid::new_v4(),
                        driver_id: None,
                        route_id: None,
                        entry_image_url: None,
                    },
                    t0 + Duration::minutes(offset),
                )
                .unwrap()
        };

        let late = entry(20);
        let early = entry(5);
        let mut paid = entry(10);
        paid.current_status = DispatchStatus::Paid;

        let board = build_board(vec![late.clone(), paid, early.clone()]);
        assert_eq!(board.len(), 3);
        assert_eq!(board.in_station, vec![early, late]);
        assert_eq!(board.paid.len(), 1);
        assert!(board.permit_issued.is_empty());
        assert!(board.departed.is_empty());
    }
}
