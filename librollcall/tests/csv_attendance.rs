use std::fs;
use std::time::Duration;

use chrono::NaiveDate;
use librollcall::attendance::{AttendanceConfig, AttendanceService, CacheTtls, LastScan};
use librollcall::cache::ManualClock;
use pretty_assertions::assert_eq;
use sheets_api::csv_source::CsvDirSource;

const ROSTER: &str = "\
Student ID,Student Name,Homeroom
1001,Avery Lee,7A
1002,Jules Moreno,7B
,Nobody,7B
1003,Sam Okafor,7A
";

const LOG: &str = "\
Timestamp,ID
10/19/2026 7:58:10,1002
10/19/2026 8:03:45,1002
10/19/2026 8:05:00,1003.0
garbage,1001
10/19/2026 8:06:30,4242
";

fn at(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn service(dir: &tempfile::TempDir, clock: ManualClock) -> AttendanceService<CsvDirSource, ManualClock> {
    AttendanceService::with_clock(
        CsvDirSource::new(dir.path()),
        AttendanceConfig::default(),
        CacheTtls::default(),
        clock,
    )
}

#[tokio::test]
async fn dashboard_from_csv_exports() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Roster.csv"), ROSTER).unwrap();
    fs::write(dir.path().join("Form Responses 1.csv"), LOG).unwrap();
    let svc = service(&dir, ManualClock::new());

    let report = svc.report(None).await;
    assert!(report.is_available());
    assert_eq!(report.total(), 3);
    assert_eq!(report.present_count(), 3);
    assert_eq!(report.absent_count(), 0);
    assert_eq!(
        report.unknown_ids().iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        vec!["4242"]
    );
    assert_eq!(report.last_scan(), LastScan::At(at(8, 6, 30)));
    assert_eq!(report.last_scan().to_string(), "2026-10-19 08:06:30 AM");

    let report = svc.report(Some(at(8, 0, 0))).await;
    let present = report
        .present()
        .filter_map(|entry| entry.student().name())
        .collect::<Vec<_>>();
    assert_eq!(present, vec!["Jules Moreno", "Sam Okafor"]);
    assert_eq!(report.warnings().len(), 1);
}

#[tokio::test]
async fn new_scans_show_up_after_refresh() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Roster.csv"), ROSTER).unwrap();
    fs::write(dir.path().join("Form Responses 1.csv"), "Timestamp,ID\n").unwrap();
    let clock = ManualClock::new();
    let svc = service(&dir, clock.clone());

    let before = svc.report(None).await;
    assert_eq!(before.present_count(), 0);
    assert_eq!(before.last_scan(), LastScan::NoScans);

    fs::write(dir.path().join("Form Responses 1.csv"), LOG).unwrap();
    assert_eq!(svc.report(None).await.present_count(), 0);

    clock.advance(Duration::from_secs(10));
    assert_eq!(svc.report(None).await.present_count(), 3);
}

#[tokio::test]
async fn missing_roster_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service(&dir, ManualClock::new());

    let report = svc.report(None).await;

    assert!(!report.is_available());
    assert!(report.is_empty());
}
