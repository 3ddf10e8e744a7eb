use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, Query, State};
use axum::response::{Html, Redirect};
use chrono::NaiveDateTime;
use librollcall::attendance::{
    AttendanceReport, Availability, NAME_COLUMN, RosterEntry, STATUS_COLUMN,
};
use librollcall::normalize::parse_timestamp_text;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::templates::DASHBOARD;
use crate::{AppError, AppState, REFRESH_SECS};

/// Value format of a `datetime-local` input. Sub-second digits are only written when present.
const CUTOFF_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Default, Deserialize)]
pub struct CutoffParams {
    cutoff: Option<String>,
}

impl CutoffParams {
    fn parse(&self) -> Result<Option<NaiveDateTime>, AppError> {
        let Some(text) = self.cutoff.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        parse_timestamp_text(text)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("invalid cutoff `{text}`")))
    }
}

#[derive(Serialize)]
struct RowView {
    cells: Vec<String>,
    present: bool,
}

#[derive(Serialize)]
struct DashboardView<'a> {
    refresh_secs: u64,
    cutoff: String,
    error: Option<&'a str>,
    empty: bool,
    total: usize,
    present_count: usize,
    absent_count: usize,
    last_scan: String,
    no_scans: bool,
    warnings: &'a [String],
    unknown_ids: Vec<&'a str>,
    columns: Vec<&'a str>,
    present_rows: Vec<RowView>,
    absent_rows: Vec<RowView>,
}

impl<'a> DashboardView<'a> {
    fn new(report: &'a AttendanceReport, id_column: &'a str) -> Self {
        let error = match report.availability() {
            Availability::Loaded => None,
            Availability::Unavailable(message) => Some(message.as_str()),
        };

        let columns = vec![id_column, NAME_COLUMN, STATUS_COLUMN];

        Self {
            refresh_secs: REFRESH_SECS,
            cutoff: report
                .cutoff()
                .map(|cutoff| cutoff.format(CUTOFF_INPUT_FORMAT).to_string())
                .unwrap_or_default(),
            error,
            empty: report.is_available() && report.is_empty(),
            total: report.total(),
            present_count: report.present_count(),
            absent_count: report.absent_count(),
            last_scan: report.last_scan().to_string(),
            no_scans: report.last_scan().at().is_none(),
            warnings: report.warnings(),
            unknown_ids: report.unknown_ids().iter().map(|id| id.as_str()).collect(),
            columns,
            present_rows: report.present().map(row_view).collect(),
            absent_rows: report.absent().map(row_view).collect(),
        }
    }
}

fn row_view(entry: &RosterEntry) -> RowView {
    let student = entry.student();
    let cells = vec![
        student.id().to_string(),
        student.name().unwrap_or_default().to_owned(),
        entry.status().to_string(),
    ];
    RowView {
        cells,
        present: entry.is_present(),
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CutoffParams>,
) -> Result<Html<String>, AppError> {
    let report = state.attendance.report(params.parse()?).await;
    let view = DashboardView::new(&report, &state.attendance.config().roster_id_column);
    Ok(state.templates.render(DASHBOARD, &view)?)
}

pub async fn report_json(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CutoffParams>,
) -> Result<Json<Arc<AttendanceReport>>, AppError> {
    Ok(Json(state.attendance.report(params.parse()?).await))
}

/// Drops every cached read and report, then sends the browser back to the dashboard with the same
/// cutoff.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Form(params): Form<CutoffParams>,
) -> Result<Redirect, AppError> {
    let cutoff = params.parse()?;
    info!(?cutoff, "manual refresh");
    state.attendance.clear_cache();
    Ok(match cutoff {
        Some(cutoff) => Redirect::to(&format!("/?cutoff={}", cutoff.format(CUTOFF_INPUT_FORMAT))),
        None => Redirect::to("/"),
    })
}
