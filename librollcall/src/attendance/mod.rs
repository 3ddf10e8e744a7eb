//! Live trip attendance: who on the roster has checked in by scanning their QR code.
//!
//! Two worksheets feed this: the roster (one row per enrolled student) and the scan log (one row
//! per scan, appended by the check-in form, duplicates and all). A student is PRESENT if their id
//! appears anywhere in the scan log, or, when a cutoff is set, in a scan at or after the cutoff.
//!
//! # Terminology:
//! - Roster: authoritative list of enrolled students
//! - Scan log: append-only record of check-in events, one per scan
//! - Cutoff: an instant chosen by trip staff; only scans at/after it count toward presence

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_with::{SerializeDisplay, serde_as};

use crate::types::StudentId;

pub use self::load::{AttendanceConfig, scans_from_table, students_from_table};
pub use self::service::{AttendanceService, CacheTtls};

pub mod load;
pub mod service;

pub const STATUS_COLUMN: &str = "Attendance Status";
pub const NAME_COLUMN: &str = "Student Name";

/// Display format for the last scan time, e.g. `2026-10-19 08:01:02 AM`.
pub const LAST_SCAN_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A roster row. Columns other than the id are carried through untouched, in sheet order.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Student {
    id: StudentId,
    #[serde_as(as = "serde_with::Map<_, _>")]
    fields: Vec<(String, String)>,
}

impl Student {
    pub fn new(id: StudentId, fields: Vec<(String, String)>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &StudentId {
        &self.id
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.field(NAME_COLUMN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEvent {
    id: StudentId,
    timestamp: Option<NaiveDateTime>,
}

impl ScanEvent {
    pub fn new(id: StudentId, timestamp: Option<NaiveDateTime>) -> Self {
        Self { id, timestamp }
    }

    pub fn id(&self) -> &StudentId {
        &self.id
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    /// Without a cutoff every scan counts. With one, only scans known to be at or after it do; a
    /// scan whose time could not be read is not counted.
    pub fn counts_toward_presence(&self, cutoff: Option<NaiveDateTime>) -> bool {
        match (cutoff, self.timestamp) {
            (None, _) => true,
            (Some(cutoff), Some(timestamp)) => timestamp >= cutoff,
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    #[serde(flatten)]
    student: Student,
    status: AttendanceStatus,
}

impl RosterEntry {
    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn status(&self) -> AttendanceStatus {
        self.status
    }

    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay)]
pub enum LastScan {
    At(NaiveDateTime),
    NoScans,
}

impl LastScan {
    pub fn at(self) -> Option<NaiveDateTime> {
        match self {
            Self::At(at) => Some(at),
            Self::NoScans => None,
        }
    }
}

impl fmt::Display for LastScan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::At(at) => write!(f, "{}", at.format(LAST_SCAN_FORMAT)),
            Self::NoScans => f.write_str("N/A (No scans recorded yet)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum Availability {
    Loaded,
    /// The roster could not be loaded; the message carries the diagnostic detail.
    Unavailable(String),
}

/// Result of one refresh. Built once, never mutated, replaced wholesale on the next refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    roster: Vec<RosterEntry>,
    present_ids: BTreeSet<StudentId>,
    unknown_ids: BTreeSet<StudentId>,
    last_scan: LastScan,
    cutoff: Option<NaiveDateTime>,
    availability: Availability,
    warnings: Vec<String>,
}

impl AttendanceReport {
    /// The empty report rendered when the roster cannot be loaded.
    pub fn unavailable(message: String) -> Self {
        Self {
            roster: Vec::new(),
            present_ids: BTreeSet::new(),
            unknown_ids: BTreeSet::new(),
            last_scan: LastScan::NoScans,
            cutoff: None,
            availability: Availability::Unavailable(message),
            warnings: Vec::new(),
        }
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn present(&self) -> impl Iterator<Item = &RosterEntry> {
        self.roster.iter().filter(|entry| entry.is_present())
    }

    pub fn absent(&self) -> impl Iterator<Item = &RosterEntry> {
        self.roster.iter().filter(|entry| !entry.is_present())
    }

    pub fn total(&self) -> usize {
        self.roster.len()
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    pub fn absent_count(&self) -> usize {
        self.absent().count()
    }

    /// Distinct roster ids with at least one counted scan.
    pub fn present_ids(&self) -> &BTreeSet<StudentId> {
        &self.present_ids
    }

    /// Distinct counted scan ids that match nobody on the roster (typos, visitors, wrong form).
    pub fn unknown_ids(&self) -> &BTreeSet<StudentId> {
        &self.unknown_ids
    }

    pub fn last_scan(&self) -> LastScan {
        self.last_scan
    }

    pub fn cutoff(&self) -> Option<NaiveDateTime> {
        self.cutoff
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Loaded
    }

    /// An available report with nobody on the roster is a valid, if dull, state.
    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Classifies every roster entry as PRESENT or ABSENT against the scan log.
///
/// The last scan time is taken over the whole log regardless of the cutoff, ignoring scans whose
/// time could not be read. Duplicate roster ids are not merged: each row is classified on its
/// own, so `present_count() + absent_count() == roster.len()` always holds.
pub fn resolve(
    roster: &[Student],
    log: &[ScanEvent],
    cutoff: Option<NaiveDateTime>,
) -> AttendanceReport {
    let scanned: HashSet<&StudentId> = log
        .iter()
        .filter(|scan| scan.counts_toward_presence(cutoff))
        .map(ScanEvent::id)
        .collect();

    let roster_ids: HashSet<&StudentId> = roster.iter().map(Student::id).collect();

    let entries = roster
        .iter()
        .map(|student| RosterEntry {
            student: student.clone(),
            status: if scanned.contains(student.id()) {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
        })
        .collect();

    let (present_ids, unknown_ids): (BTreeSet<StudentId>, BTreeSet<StudentId>) = scanned
        .into_iter()
        .cloned()
        .partition(|id| roster_ids.contains(id));

    let last_scan = log
        .iter()
        .filter_map(ScanEvent::timestamp)
        .max()
        .map_or(LastScan::NoScans, LastScan::At);

    let mut warnings = Vec::new();
    if cutoff.is_some() {
        let unreadable = log.iter().filter(|scan| scan.timestamp.is_none()).count();
        if unreadable > 0 {
            warnings.push(format!(
                "{unreadable} scan(s) had no readable timestamp and were not counted against the cutoff"
            ));
        }
    }

    AttendanceReport {
        roster: entries,
        present_ids,
        unknown_ids,
        last_scan,
        cutoff,
        availability: Availability::Loaded,
        warnings,
    }
}
