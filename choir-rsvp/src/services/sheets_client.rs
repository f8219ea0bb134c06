//! Google Sheets API client
//!
//! Thin transport over the Sheets v4 `values` REST endpoints. Scheduling and
//! retries are not done here; see [`SheetsGateway`](super::SheetsGateway).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use choir_common::cell::{row_from_values, Row};
use choir_common::config::SheetsCredentials;
use choir_common::{Error, Result, UpstreamError};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const USER_AGENT: &str = concat!("choir-rsvp/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tabular storage holding the members and responses sheets
#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// All rows of an A1 range, ragged as stored
    async fn get_values(&self, range: &str) -> Result<Vec<Row>>;

    /// Append one row after the last row of the range's table
    async fn append_row(&self, range: &str, row: Row) -> Result<()>;
}

/// `values.get` response body
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets v4 REST client
pub struct GoogleSheetsClient {
    http_client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    credentials: SheetsCredentials,
}

impl GoogleSheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, credentials: SheetsCredentials) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: SHEETS_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
        })
    }

    /// Point the client at a different API root (emulators, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `<base>/<spreadsheet id>/values/<last segment>`, each segment percent-encoded
    fn values_url(&self, last_segment: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Sheets base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend([self.spreadsheet_id.as_str(), "values", last_segment]);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            SheetsCredentials::AccessToken(token) => request.bearer_auth(token),
            SheetsCredentials::ApiKey(key) => request.query(&[("key", key)]),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::http(status.as_u16(), body).into());
        }

        Ok(response)
    }
}

/// Map a reqwest failure to the classifier's error shape
fn map_transport_error(e: reqwest::Error) -> Error {
    let upstream = if e.is_timeout() {
        UpstreamError::transport("ETIMEDOUT", e.to_string())
    } else if e.is_connect() {
        UpstreamError::transport("ECONNRESET", e.to_string())
    } else if let Some(status) = e.status() {
        UpstreamError::http(status.as_u16(), e.to_string())
    } else {
        UpstreamError::message(e.to_string())
    };
    Error::Upstream(upstream)
}

#[async_trait]
impl SheetsBackend for GoogleSheetsClient {
    async fn get_values(&self, range: &str) -> Result<Vec<Row>> {
        let url = self.values_url(range)?;
        tracing::debug!(range, "Reading sheet range");

        let request = self
            .http_client
            .get(url)
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")]);
        let body: ValueRange = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| Error::Upstream(UpstreamError::message(format!("Invalid values response: {}", e))))?;

        Ok(body.values.into_iter().map(row_from_values).collect())
    }

    async fn append_row(&self, range: &str, row: Row) -> Result<()> {
        let url = self.values_url(&format!("{}:append", range))?;
        tracing::debug!(range, columns = row.len(), "Appending sheet row");

        let request = self
            .http_client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [row] }));
        self.send(request).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleSheetsClient {
        GoogleSheetsClient::new("sheet-123", SheetsCredentials::ApiKey("k".to_string())).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = client().values_url("Members!A:B").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Members!A:B"));

        let url = client().values_url("Choir Responses!A:H:append").unwrap();
        assert!(url.as_str().contains("/values/Choir%20Responses!A:H:append"));
    }

    #[test]
    fn test_base_url_override() {
        let client = client().with_base_url("http://127.0.0.1:9999/v4/spreadsheets/");
        let url = client.values_url("R!A:A").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/v4/spreadsheets/sheet-123/values/R!A:A");
    }

    #[test]
    fn test_value_range_without_values() {
        let body: ValueRange = serde_json::from_str(r#"{"range":"Members!A1:B1"}"#).unwrap();
        assert!(body.values.is_empty());
    }
}
