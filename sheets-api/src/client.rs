use anyhow::{Context, Result};
use reqwest::Response;
use serde::Deserialize;
use tokio::sync::Mutex;
use tower::ServiceExt;
use tracing::{debug, info};
use url::Url;

use crate::creds::Creds;
use crate::services::sheets_service::{
    self, BoxSheetsService, ServiceOptions, SheetsRequest, SheetsService,
};
use crate::source::TableSource;
use crate::table::{Cell, Table};
use crate::types::SpreadsheetId;
use crate::util::BASE_URL;

/// Reads worksheets from one spreadsheet. Requests go through `Service`, which in production is
/// the rate-limited stack from [`sheets_service::service`].
#[derive(Debug)]
pub struct Client<Service> {
    service: Mutex<Service>,
    base_url: Url,
    spreadsheet: SpreadsheetId,
    creds: Creds,
}

impl Client<BoxSheetsService> {
    pub fn connect(
        spreadsheet: SpreadsheetId,
        creds: Creds,
        options: &ServiceOptions,
    ) -> Result<Self> {
        let http_client = sheets_service::http_client(options)?;
        let service = sheets_service::service(http_client, options);
        let base_url = Url::parse(BASE_URL)?;
        Ok(Self::new(service, base_url, spreadsheet, creds))
    }
}

impl<S: SheetsService> Client<S> {
    pub fn new(service: S, base_url: Url, spreadsheet: SpreadsheetId, creds: Creds) -> Self {
        Self {
            service: Mutex::new(service),
            base_url,
            spreadsheet,
            creds,
        }
    }

    async fn send(&self, request: SheetsRequest) -> Result<Response> {
        let mut service = self.service.lock().await;
        let response = ServiceExt::<SheetsRequest>::ready(&mut *service)
            .await?
            .call(request)
            .await
            .context("spreadsheet request failed")?
            .error_for_status()
            .context("spreadsheet backend responded with an error")?;
        Ok(response)
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn get_values(&self, range: &str) -> Result<ValueRange> {
        let request = SheetsRequest::values(&self.base_url, &self.spreadsheet, range)?
            .with_creds(&self.creds);
        info!(url = %request.url(), "preparing spreadsheet request");

        let response = self.send(request).await?;
        let values = response
            .json::<ValueRange>()
            .await
            .with_context(|| format!("could not parse values for range `{range}`"))?;
        debug!(range = %values.range, rows = values.values.len(), "got values");

        Ok(values)
    }

    /// Reads a whole worksheet; the first row is taken as the header row.
    pub async fn read_worksheet(&self, worksheet: &str) -> Result<Table> {
        let values = self
            .get_values(worksheet)
            .await
            .with_context(|| format!("could not read worksheet `{worksheet}`"))?;
        Ok(Table::from_values(worksheet.to_owned(), values.values))
    }
}

impl<S> TableSource for Client<S>
where
    S: SheetsService + Send,
    S::Future: Send,
{
    async fn read_table(&self, worksheet: &str) -> Result<Table> {
        self.read_worksheet(worksheet).await
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    // omitted entirely when the worksheet is empty
    #[serde(default)]
    pub values: Vec<Vec<Cell>>,
}
