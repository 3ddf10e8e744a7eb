use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, anyhow};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response};
use tower::util::BoxService;
use tower::{BoxError, Service, ServiceBuilder};
use url::Url;

use crate::creds::Creds;
use crate::types::SpreadsheetId;
use crate::util::{API_VERSION, join_segments};

/// Knobs for the HTTP stack in front of the spreadsheet backend.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Upper bound on a single request, so a stalled backend fails the refresh instead of hanging it.
    pub timeout: Duration,
    pub rate_limit: u64,
    pub rate_window: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            rate_limit: 5,
            rate_window: Duration::from_secs(1),
        }
    }
}

pub type BoxSheetsService = BoxService<SheetsRequest, Response, anyhow::Error>;

/// HTTP stack for the spreadsheet backend. Responsible for rate limiting, timeouts and executing
/// requests, but not for anything at a higher level such as building requests for particular
/// resources or interpreting responses.
pub fn service(http_client: HttpClient, options: &ServiceOptions) -> BoxSheetsService {
    let service = ServiceBuilder::new()
        .map_err(|err: BoxError| anyhow!(err))
        .timeout(options.timeout)
        .rate_limit(options.rate_limit, options.rate_window)
        .map_request(move |request: SheetsRequest| request.request_builder(&http_client))
        .service_fn(|request_builder: RequestBuilder| request_builder.send());
    BoxService::new(service)
}

pub fn http_client(options: &ServiceOptions) -> Result<HttpClient> {
    let client = HttpClient::builder().timeout(options.timeout).build()?;
    Ok(client)
}

pub trait SheetsService: Service<SheetsRequest, Response = Response, Error = anyhow::Error> {}
impl<T: Service<SheetsRequest, Response = Response, Error = anyhow::Error>> SheetsService for T {}

#[derive(Debug, Clone)]
pub struct SheetsRequest {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
}

impl SheetsRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            headers: HashMap::new(),
        }
    }

    /// `GET /v4/spreadsheets/{spreadsheet}/values/{range}`. Values come back unformatted so
    /// numeric ids stay numeric, and date-times come back as serial day numbers so they do not
    /// depend on the spreadsheet's locale.
    pub fn values(base: &Url, spreadsheet: &SpreadsheetId, range: &str) -> Result<Self> {
        let url = join_segments(
            base,
            [API_VERSION, "spreadsheets", spreadsheet.as_str(), "values", range],
        )?;

        Ok(Self::new(Method::GET, url)
            .with_query("majorDimension", "ROWS")
            .with_query("valueRenderOption", "UNFORMATTED_VALUE")
            .with_query("dateTimeRenderOption", "SERIAL_NUMBER"))
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn with_header(mut self, key: &str, value: String) -> Self {
        self.headers.insert(key.to_owned(), value);
        self
    }

    pub fn with_creds(self, creds: &Creds) -> Self {
        match creds {
            Creds::ApiKey(key) => self.with_query("key", key),
            Creds::AccessToken(token) => self.with_header("Authorization", format!("Bearer {token}")),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn request_builder(&self, http_client: &HttpClient) -> RequestBuilder {
        let base = http_client
            .request(self.method.clone(), self.url.clone())
            .query(&self.query);

        self.headers
            .iter()
            .fold(base, |request_builder, (key, value)| {
                request_builder.header(key, value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::BASE_URL;

    fn base() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn values_request_targets_the_worksheet() {
        let spreadsheet = SpreadsheetId::new("sheet-123".to_owned());
        let request = SheetsRequest::values(&base(), &spreadsheet, "Form Responses 1").unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Form%20Responses%201"
        );
        assert_eq!(request.query("valueRenderOption"), Some("UNFORMATTED_VALUE"));
        assert_eq!(request.query("dateTimeRenderOption"), Some("SERIAL_NUMBER"));
    }

    #[test]
    fn api_key_goes_in_the_query() {
        let spreadsheet = SpreadsheetId::new("s".to_owned());
        let request = SheetsRequest::values(&base(), &spreadsheet, "Roster")
            .unwrap()
            .with_creds(&Creds::api_key("k".to_owned()));
        assert_eq!(request.query("key"), Some("k"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn access_token_goes_in_a_header() {
        let spreadsheet = SpreadsheetId::new("s".to_owned());
        let request = SheetsRequest::values(&base(), &spreadsheet, "Roster")
            .unwrap()
            .with_creds(&Creds::access_token("t".to_owned()));
        assert_eq!(request.query("key"), None);
        assert_eq!(request.header("Authorization"), Some("Bearer t"));
    }

    #[test]
    fn request_builder_carries_query_and_headers() {
        let spreadsheet = SpreadsheetId::new("s".to_owned());
        let request = SheetsRequest::values(&base(), &spreadsheet, "Roster")
            .unwrap()
            .with_creds(&Creds::access_token("t".to_owned()))
            .request_builder(&HttpClient::new())
            .build()
            .unwrap();

        assert_eq!(request.url().query_pairs().count(), 3);
        assert_eq!(request.headers()["Authorization"], "Bearer t");
    }
}
