use std::collections::HashSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sheets_api::table::Table;
use tracing::{debug, warn};

use super::{ScanEvent, Student};
use crate::normalize::{canonical_id, parse_timestamp};

/// Where the two worksheets live and which columns hold the ids. Names must match the sheet
/// exactly (after trimming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceConfig {
    pub roster_sheet: String,
    pub log_sheet: String,
    pub roster_id_column: String,
    pub log_id_column: String,
    pub timestamp_column: String,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            roster_sheet: "Roster".to_owned(),
            log_sheet: "Form Responses 1".to_owned(),
            roster_id_column: "Student ID".to_owned(),
            log_id_column: "ID".to_owned(),
            timestamp_column: "Timestamp".to_owned(),
        }
    }
}

/// Roster rows with a usable id. Rows without one are dropped. Duplicate ids are kept as
/// separate students and only logged.
pub fn students_from_table(table: &Table, id_column: &str) -> Result<Vec<Student>> {
    let id_index = table
        .column(id_column)
        .context("roster has no id column")?;

    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let students = table
        .rows()
        .filter_map(|row| {
            let Some(id) = canonical_id(row.get(id_index)) else {
                dropped += 1;
                return None;
            };
            if !seen.insert(id.clone()) {
                warn!(%id, "duplicate student id in roster");
            }
            let fields = row
                .iter()
                .enumerate()
                .filter(|(index, (header, _))| *index != id_index && !header.is_empty())
                .map(|(_, (header, cell))| (header.to_owned(), cell.to_string()))
                .collect();
            Some(Student::new(id, fields))
        })
        .collect::<Vec<_>>();

    debug!(students = students.len(), dropped, "loaded roster");
    Ok(students)
}

/// Scan events with a usable id. A missing timestamp column is tolerated: every event then has
/// an unknown time.
pub fn scans_from_table(
    table: &Table,
    id_column: &str,
    timestamp_column: &str,
) -> Result<Vec<ScanEvent>> {
    let id_index = table
        .column(id_column)
        .context("scan log has no id column")?;
    let timestamp_index = match table.column(timestamp_column) {
        Ok(index) => Some(index),
        Err(err) => {
            warn!(%err, "scan log has no timestamp column; scan times are unknown");
            None
        }
    };

    let mut dropped = 0usize;
    let mut unreadable = 0usize;
    let scans = table
        .rows()
        .filter_map(|row| {
            let Some(id) = canonical_id(row.get(id_index)) else {
                dropped += 1;
                return None;
            };
            let timestamp = timestamp_index.and_then(|index| parse_timestamp(row.get(index)));
            if timestamp.is_none() {
                unreadable += 1;
            }
            Some(ScanEvent::new(id, timestamp))
        })
        .collect::<Vec<_>>();

    debug!(scans = scans.len(), dropped, unreadable, "loaded scan log");
    Ok(scans)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use sheets_api::table::Cell;

    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_owned())
    }

    fn roster_table() -> Table {
        Table::from_values(
            "Roster".to_owned(),
            vec![
                vec![text("Student ID"), text("Student Name"), text("Bus")],
                vec![Cell::Number(1.0), text("Avery Lee"), text("A")],
                vec![Cell::Empty, text("No Id"), text("A")],
                vec![text("2"), text("Jules Moreno")],
                vec![text("2.0"), text("Jules Again"), text("B")],
            ],
        )
    }

    #[test]
    fn roster_rows_keep_passthrough_fields() {
        let students = students_from_table(&roster_table(), "Student ID").unwrap();

        assert_eq!(students.len(), 3);
        assert_eq!(students[0].id().as_str(), "1");
        assert_eq!(students[0].name(), Some("Avery Lee"));
        assert_eq!(students[0].field("Bus"), Some("A"));
        assert_eq!(students[0].field("Student ID"), None);
        assert_eq!(students[1].field("Bus"), Some(""));
    }

    #[test]
    fn duplicate_roster_ids_are_kept() {
        let students = students_from_table(&roster_table(), "Student ID").unwrap();
        let ids = students.iter().map(|s| s.id().as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "2"]);
    }

    #[test]
    fn missing_roster_id_column_is_an_error() {
        let err = students_from_table(&roster_table(), "ID").unwrap_err();
        assert!(format!("{err:#}").contains("no column `ID`"));
    }

    #[test]
    fn scans_parse_ids_and_timestamps() {
        let table = Table::from_values(
            "Form Responses 1".to_owned(),
            vec![
                vec![text("Timestamp"), text("ID")],
                vec![text("10/19/2026 8:01:00"), Cell::Number(2.0)],
                vec![text("not a time"), text("3")],
                vec![text("10/19/2026 8:02:00"), Cell::Empty],
            ],
        );

        let scans = scans_from_table(&table, "ID", "Timestamp").unwrap();

        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 1, 0)
            .unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].id().as_str(), "2");
        assert_eq!(scans[0].timestamp(), Some(expected));
        assert_eq!(scans[1].timestamp(), None);
    }

    #[test]
    fn missing_timestamp_column_is_tolerated() {
        let table = Table::from_values(
            "Form Responses 1".to_owned(),
            vec![vec![text("ID")], vec![text("5")]],
        );
        let scans = scans_from_table(&table, "ID", "Timestamp").unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].timestamp(), None);
    }

    #[test]
    fn serial_and_day_first_timestamps_count_under_a_cutoff() {
        // 46314.33405 is 2026-10-19 08:01:02, as a sheet reports it in serial form
        let table = Table::from_values(
            "Form Responses 1".to_owned(),
            vec![
                vec![text("Timestamp"), text("ID")],
                vec![Cell::Number(46314.33405), text("1")],
                vec![text("19/10/2026 08:01:02"), text("2")],
            ],
        );
        let roster = [
            Student::new("1".parse().unwrap(), Vec::new()),
            Student::new("2".parse().unwrap(), Vec::new()),
        ];
        let cutoff = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let scans = scans_from_table(&table, "ID", "Timestamp").unwrap();
        let report = crate::attendance::resolve(&roster, &scans, Some(cutoff));

        assert!(scans.iter().all(|scan| scan.timestamp().is_some()));
        assert_eq!(report.present_count(), 2);
        assert!(report.warnings().is_empty());
    }
}
