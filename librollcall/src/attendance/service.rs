use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures::future;
use sheets_api::source::TableSource;
use tracing::{error, info, instrument, warn};

use super::load::{AttendanceConfig, scans_from_table, students_from_table};
use super::{AttendanceReport, resolve};
use crate::cache::{CachedSource, Clock, SystemClock, TtlCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// How long a computed report is reused for the same cutoff.
    pub report: Duration,
    /// How long a raw worksheet read is reused.
    pub read: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            report: Duration::from_secs(10),
            read: Duration::from_secs(5),
        }
    }
}

/// Fetches the roster and scan log, resolves attendance and memoizes the result.
///
/// Errors never escape [`AttendanceService::report`]: an unreadable roster yields an
/// [unavailable](AttendanceReport::unavailable) report, an unreadable scan log is treated as empty
/// and noted in the report's warnings. Neither degraded report is cached.
#[derive(Debug)]
pub struct AttendanceService<S, C = SystemClock> {
    tables: CachedSource<S, C>,
    reports: TtlCache<Option<NaiveDateTime>, Arc<AttendanceReport>, C>,
    config: AttendanceConfig,
}

impl<S: TableSource> AttendanceService<S, SystemClock> {
    pub fn new(source: S, config: AttendanceConfig, ttls: CacheTtls) -> Self {
        Self::with_clock(source, config, ttls, SystemClock)
    }
}

impl<S: TableSource, C: Clock + Clone> AttendanceService<S, C> {
    pub fn with_clock(source: S, config: AttendanceConfig, ttls: CacheTtls, clock: C) -> Self {
        Self {
            tables: CachedSource::with_clock(source, ttls.read, clock.clone()),
            reports: TtlCache::with_clock(ttls.report, clock),
            config,
        }
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        self.tables.source()
    }

    #[instrument(skip(self))]
    pub async fn report(&self, cutoff: Option<NaiveDateTime>) -> Arc<AttendanceReport> {
        if let Some(report) = self.reports.get(&cutoff) {
            return report;
        }

        let (roster, log) = future::join(
            self.tables.read(&self.config.roster_sheet),
            self.tables.read(&self.config.log_sheet),
        )
        .await;

        let students = match roster.and_then(|table| {
            students_from_table(&table, &self.config.roster_id_column)
        }) {
            Ok(students) => students,
            Err(err) => {
                error!(?err, "failed to load roster");
                return Arc::new(AttendanceReport::unavailable(format!("{err:#}")));
            }
        };

        let scans = log.and_then(|table| {
            scans_from_table(
                &table,
                &self.config.log_id_column,
                &self.config.timestamp_column,
            )
        });
        let (scans, log_error) = match scans {
            Ok(scans) => (scans, None),
            Err(err) => {
                warn!(?err, "failed to load scan log; treating it as empty");
                (Vec::new(), Some(format!("scan log could not be loaded: {err:#}")))
            }
        };

        let mut report = resolve(&students, &scans, cutoff);
        info!(
            total = report.total(),
            present = report.present_count(),
            absent = report.absent_count(),
            unknown = report.unknown_ids().len(),
            "resolved attendance"
        );

        let degraded = log_error.is_some();
        if let Some(message) = log_error {
            report.add_warning(message);
        }
        let report = Arc::new(report);
        if !degraded {
            self.reports.put(cutoff, report.clone());
        }
        report
    }

    /// Forgets every cached read and report so the next request fetches fresh data.
    pub fn clear_cache(&self) {
        info!("clearing attendance caches");
        self.tables.clear();
        self.reports.clear();
    }
}
