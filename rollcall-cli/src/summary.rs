use std::fmt;

use itertools::Itertools;
use librollcall::attendance::AttendanceReport;
use librollcall::blueprint::Blueprint;

pub struct ReportSummary<'a> {
    report: &'a AttendanceReport,
}

impl<'a> ReportSummary<'a> {
    pub fn new(report: &'a AttendanceReport) -> Self {
        Self { report }
    }
}

impl fmt::Display for ReportSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let report = self.report;
        if let Some(cutoff) = report.cutoff() {
            writeln!(f, "Cutoff:         {cutoff}")?;
        }
        writeln!(f, "Total Students: {}", report.total())?;
        writeln!(f, "PRESENT:        {}", report.present_count())?;
        writeln!(f, "ABSENT:         {}", report.absent_count())?;
        writeln!(f, "Last Scan Time: {}", report.last_scan())?;
        if !report.unknown_ids().is_empty() {
            writeln!(f, "Not on roster:  {}", report.unknown_ids().iter().format(", "))?;
        }
        for warning in report.warnings() {
            writeln!(f, "warning: {warning}")?;
        }
        Ok(())
    }
}

pub struct BlueprintSummary<'a> {
    blueprint: &'a Blueprint,
}

impl<'a> BlueprintSummary<'a> {
    pub fn new(blueprint: &'a Blueprint) -> Self {
        Self { blueprint }
    }
}

impl fmt::Display for BlueprintSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.blueprint.is_empty() {
            return writeln!(f, "Please tag questions to generate blueprint.");
        }
        for row in &self.blueprint.rows {
            writeln!(
                f,
                "{}: {} x1, {} x2, {} x3 = {} marks",
                row.unit, row.one_mark, row.two_marks, row.three_marks, row.total_marks
            )?;
        }
        writeln!(f, "Total Marks Covered: {}", self.blueprint.total_marks)
    }
}
