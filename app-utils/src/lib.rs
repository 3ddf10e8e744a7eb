//! Startup plumbing shared by the server and the CLI: environment configuration, tracing and the
//! choice of data backend.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use librollcall::attendance::{AttendanceConfig, AttendanceService, CacheTtls};
use sheets_api::client::Client;
use sheets_api::creds::Creds;
use sheets_api::csv_source::CsvDirSource;
use sheets_api::services::sheets_service::{BoxSheetsService, ServiceOptions};
use sheets_api::source::TableSource;
use sheets_api::table::Table;
use sheets_api::types::SpreadsheetId;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, registry};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

/// Where worksheets come from.
#[derive(Debug, Clone)]
pub enum Backend {
    Sheets {
        spreadsheet: SpreadsheetId,
        creds: Creds,
    },
    /// A directory of `<worksheet>.csv` exports.
    CsvDir(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub attendance: AttendanceConfig,
    pub ttls: CacheTtls,
    pub fetch_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("failed to load .env");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `ROLLCALL_DATA_DIR` selects the CSV backend and wins over the spreadsheet settings.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match var("ROLLCALL_DATA_DIR") {
            Some(dir) => Backend::CsvDir(dir.into()),
            None => {
                let spreadsheet = var("SPREADSHEET_ID")
                    .context("set SPREADSHEET_ID, or ROLLCALL_DATA_DIR to read CSV exports")?;
                let creds = match (var("SHEETS_ACCESS_TOKEN"), var("SHEETS_API_KEY")) {
                    (Some(token), _) => Creds::access_token(token),
                    (None, Some(key)) => Creds::api_key(key),
                    (None, None) => bail!("set SHEETS_ACCESS_TOKEN or SHEETS_API_KEY"),
                };
                Backend::Sheets {
                    spreadsheet: SpreadsheetId::new(spreadsheet),
                    creds,
                }
            }
        };

        let defaults = AttendanceConfig::default();
        let attendance = AttendanceConfig {
            roster_sheet: var("ROSTER_SHEET").unwrap_or(defaults.roster_sheet),
            log_sheet: var("LOG_SHEET").unwrap_or(defaults.log_sheet),
            roster_id_column: var("ROSTER_ID_COLUMN").unwrap_or(defaults.roster_id_column),
            log_id_column: var("LOG_ID_COLUMN").unwrap_or(defaults.log_id_column),
            timestamp_column: var("TIMESTAMP_COLUMN").unwrap_or(defaults.timestamp_column),
        };

        let default_ttls = CacheTtls::default();
        let ttls = CacheTtls {
            report: secs(&var, "REPORT_TTL_SECS")?.unwrap_or(default_ttls.report),
            read: secs(&var, "READ_TTL_SECS")?.unwrap_or(default_ttls.read),
        };
        let fetch_timeout =
            secs(&var, "FETCH_TIMEOUT_SECS")?.unwrap_or(ServiceOptions::default().timeout);

        let bind_addr = match parse(&var, "BIND_ADDR")? {
            Some(addr) => addr,
            None => DEFAULT_BIND_ADDR.parse()?,
        };

        Ok(Self {
            backend,
            attendance,
            ttls,
            fetch_timeout,
            bind_addr,
        })
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            timeout: self.fetch_timeout,
            ..ServiceOptions::default()
        }
    }

    pub fn source(&self) -> Result<AnySource> {
        match &self.backend {
            Backend::Sheets { spreadsheet, creds } => {
                info!(%spreadsheet, "reading from spreadsheet");
                let client =
                    Client::connect(spreadsheet.clone(), creds.clone(), &self.service_options())?;
                Ok(AnySource::Sheets(client))
            }
            Backend::CsvDir(dir) => {
                info!(dir = %dir.display(), "reading from csv exports");
                Ok(AnySource::Csv(CsvDirSource::new(dir.clone())))
            }
        }
    }

    pub fn attendance_service(&self) -> Result<AttendanceService<AnySource>> {
        Ok(AttendanceService::new(
            self.source()?,
            self.attendance.clone(),
            self.ttls,
        ))
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|value| value.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("invalid value for {key}"))
}

fn secs(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    Ok(parse::<u64>(var, key)?.map(Duration::from_secs))
}

/// The concrete backends, so callers can hold one source type whichever is configured.
#[derive(Debug)]
pub enum AnySource {
    Sheets(Client<BoxSheetsService>),
    Csv(CsvDirSource),
}

impl TableSource for AnySource {
    async fn read_table(&self, worksheet: &str) -> Result<Table> {
        match self {
            Self::Sheets(client) => client.read_table(worksheet).await,
            Self::Csv(source) => source.read_table(worksheet).await,
        }
    }
}

pub fn init_tracing() -> Result<()> {
    registry()
        .with(fmt::layer().event_format(format().pretty()))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_owned())
        })
    }

    #[test]
    fn csv_dir_wins_and_defaults_apply() {
        let config = load(&[
            ("ROLLCALL_DATA_DIR", "demo-data"),
            ("SPREADSHEET_ID", "abc"),
        ])
        .unwrap();

        assert!(matches!(&config.backend, Backend::CsvDir(dir) if dir == &PathBuf::from("demo-data")));
        assert_eq!(config.attendance, AttendanceConfig::default());
        assert_eq!(config.ttls, CacheTtls::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn spreadsheet_prefers_access_token() {
        let config = load(&[
            ("SPREADSHEET_ID", "abc"),
            ("SHEETS_API_KEY", "key"),
            ("SHEETS_ACCESS_TOKEN", "token"),
            ("LOG_SHEET", "Scans"),
            ("REPORT_TTL_SECS", "30"),
            ("BIND_ADDR", "0.0.0.0:9000"),
        ])
        .unwrap();

        let Backend::Sheets { spreadsheet, creds } = &config.backend else {
            panic!("expected the spreadsheet backend");
        };
        assert_eq!(spreadsheet.as_str(), "abc");
        assert!(matches!(creds, Creds::AccessToken(token) if token == "token"));
        assert_eq!(config.attendance.log_sheet, "Scans");
        assert_eq!(config.ttls.report, Duration::from_secs(30));
        assert_eq!(config.ttls.read, Duration::from_secs(5));
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn missing_backend_is_an_error() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("SPREADSHEET_ID"));

        let err = load(&[("SPREADSHEET_ID", "abc")]).unwrap_err();
        assert!(err.to_string().contains("SHEETS_API_KEY"));
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = load(&[
            ("ROLLCALL_DATA_DIR", "d"),
            ("READ_TTL_SECS", "soon"),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid value for READ_TTL_SECS");
    }
}
