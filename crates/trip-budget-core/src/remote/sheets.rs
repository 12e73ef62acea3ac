//! Google Sheets v4 values API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::row::{record_to_row, rows_to_records, HEADER};
use super::{RemoteError, RemoteTable};
use crate::auth::Session;
use crate::error::{Error, Result};
use crate::models::Record;
use crate::util::{has_http_scheme, summarize_body};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_SHEET_NAME: &str = "Sheet1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote table backed by one sheet of a spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    client: Client,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SheetsClient")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .finish_non_exhaustive()
    }
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>) -> std::result::Result<Self, RemoteError> {
        let spreadsheet_id = spreadsheet_id.into().trim().to_string();
        if spreadsheet_id.is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "spreadsheet id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            client: Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
        })
    }

    /// Target a sheet other than `Sheet1`.
    pub fn with_sheet_name(
        mut self,
        sheet_name: impl Into<String>,
    ) -> std::result::Result<Self, RemoteError> {
        let sheet_name = sheet_name.into().trim().to_string();
        if sheet_name.is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "sheet name must not be empty".to_string(),
            ));
        }
        self.sheet_name = sheet_name;
        Ok(self)
    }

    /// Point the client at a different API host.
    pub fn with_base_url(
        mut self,
        base_url: impl AsRef<str>,
    ) -> std::result::Result<Self, RemoteError> {
        let trimmed = base_url.as_ref().trim().trim_end_matches('/');
        if !has_http_scheme(trimmed) {
            return Err(RemoteError::InvalidConfiguration(
                "API base URL must include http:// or https://".to_string(),
            ));
        }
        self.base_url = trimmed.to_string();
        Ok(self)
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn range(&self, cells: &str) -> String {
        format!("{}!{cells}", quote_sheet_name(&self.sheet_name))
    }

    fn values_url(&self, range: &str, action: Option<&str>) -> String {
        let mut url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        );
        if let Some(action) = action {
            url.push(':');
            url.push_str(action);
        }
        url
    }

    async fn send(&self, request: RequestBuilder, session: &Session) -> Result<Response> {
        let token = session.access_token()?;
        let response = request
            .bearer_auth(&token.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(RemoteError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::AuthRequired(message));
        }
        Err(RemoteError::Api(message).into())
    }

    async fn clear(&self, session: &Session) -> Result<()> {
        let url = self.values_url(&self.range("A:Z"), Some("clear"));
        self.send(self.client.post(url).json(&json!({})), session)
            .await?;
        Ok(())
    }

    async fn write_header(&self, session: &Session) -> Result<()> {
        let range = self.range("A1:I1");
        let url = self.values_url(&range, None);
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [HEADER],
        });
        self.send(
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
            session,
        )
        .await?;
        Ok(())
    }

    async fn append_rows(&self, session: &Session, rows: Vec<Vec<Value>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.values_url(&self.range("A1"), Some("append"));
        let body = json!({
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.send(
            self.client
                .post(url)
                .query(&[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&body),
            session,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteTable for SheetsClient {
    async fn fetch_all(&self, session: &Session) -> Result<Vec<Record>> {
        let url = self.values_url(&self.range("A:I"), None);
        let response = self
            .send(
                self.client.get(url).query(&[
                    ("majorDimension", "ROWS"),
                    ("valueRenderOption", "UNFORMATTED_VALUE"),
                ]),
                session,
            )
            .await?;

        let payload = response
            .json::<ValueRange>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        let records = rows_to_records(&payload.values);
        tracing::debug!(
            "Fetched {} records from sheet {}",
            records.len(),
            self.sheet_name
        );
        Ok(records)
    }

    async fn replace_all(&self, session: &Session, records: &[Record]) -> Result<()> {
        self.clear(session).await?;
        self.write_header(session).await?;
        self.append_rows(session, records.iter().map(record_to_row).collect())
            .await?;
        tracing::info!(
            "Rewrote sheet {} with {} records",
            self.sheet_name,
            records.len()
        );
        Ok(())
    }

    async fn append_one(&self, session: &Session, record: &Record) -> Result<()> {
        self.append_rows(session, vec![record_to_row(record)]).await?;
        tracing::debug!("Appended record {} to sheet {}", record.id, self.sheet_name);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(ApiErrorBody {
        error: Some(detail),
    }) = serde_json::from_str::<ApiErrorBody>(body)
    {
        if let Some(message) = detail.message.or(detail.status) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let compact = summarize_body(body);
    if compact.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact, status.as_u16())
    }
}

/// A1 notation requires quoting sheet names that are not plain identifiers.
fn quote_sheet_name(name: &str) -> String {
    if name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::AccessToken;
    use crate::models::{Category, RecordId};
    use pretty_assertions::assert_eq;

    const VALUES_PATH: &str = "/v4/spreadsheets/sheet-abc/values";

    fn signed() -> Session {
        Session::Signed(AccessToken::non_expiring("test-token"))
    }

    fn record(id: &str, created_at: i64) -> Record {
        Record {
            id: RecordId::parse(id).unwrap(),
            date: "2025-09-14".to_string(),
            category: Category::Transport,
            amount_primary: 1_200,
            amount_secondary: Some(7.5),
            conversion_rate: Some(160.0),
            conversion_markup: None,
            note: "train".to_string(),
            created_at,
        }
    }

    fn client_for(server: &MockServer) -> SheetsClient {
        SheetsClient::new("sheet-abc")
            .unwrap()
            .with_base_url(server.uri())
            .unwrap()
    }

    #[test]
    fn new_rejects_blank_spreadsheet_id() {
        assert!(SheetsClient::new("  ").is_err());
    }

    #[test]
    fn values_url_encodes_range_and_action() {
        let client = SheetsClient::new("abc123").unwrap();
        let url = client.values_url(&client.range("A:Z"), Some("clear"));
        assert_eq!(
            url,
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1%21A%3AZ:clear"
        );
    }

    #[test]
    fn sheet_names_with_spaces_are_quoted() {
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(quote_sheet_name("Trip Log"), "'Trip Log'");
        assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
    }

    #[test]
    fn with_base_url_requires_http_scheme() {
        let client = SheetsClient::new("abc").unwrap();
        assert!(client.clone().with_base_url("localhost:8080").is_err());
        let client = client.with_base_url("http://localhost:8080/").unwrap();
        assert!(client
            .values_url("A1", None)
            .starts_with("http://localhost:8080/v4/"));
    }

    #[test]
    fn parse_api_error_reads_google_error_shape() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            parse_api_error(StatusCode::TOO_MANY_REQUESTS, body),
            "Quota exceeded (429)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, " "), "HTTP 502");
    }

    #[tokio::test]
    async fn remote_calls_require_a_session() {
        let client = SheetsClient::new("abc").unwrap();
        let error = client.fetch_all(&Session::SignedOut).await.unwrap_err();
        assert!(error.requires_sign_in());
    }

    #[tokio::test]
    async fn replace_all_clears_then_writes_header_then_appends_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{VALUES_PATH}/Sheet1%21A%3AZ:clear")))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{VALUES_PATH}/Sheet1%21A1%3AI1")))
            .and(query_param("valueInputOption", "RAW"))
            .and(body_json(json!({
                "range": "Sheet1!A1:I1",
                "majorDimension": "ROWS",
                "values": [HEADER],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{VALUES_PATH}/Sheet1%21A1:append")))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let oldest_first = [record("old", 10), record("new", 20)];
        client_for(&server)
            .replace_all(&signed(), &oldest_first)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let calls: Vec<(String, String)> = requests
            .iter()
            .map(|request| (request.method.to_string(), request.url.path().to_string()))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("POST".to_string(), format!("{VALUES_PATH}/Sheet1%21A%3AZ:clear")),
                ("PUT".to_string(), format!("{VALUES_PATH}/Sheet1%21A1%3AI1")),
                ("POST".to_string(), format!("{VALUES_PATH}/Sheet1%21A1:append")),
            ]
        );
        let appended: Value = requests[2].body_json().unwrap();
        assert_eq!(
            appended["values"],
            json!([record_to_row(&oldest_first[0]), record_to_row(&oldest_first[1])])
        );
    }

    #[tokio::test]
    async fn fetch_all_skips_header_and_rows_without_id() {
        let server = MockServer::start().await;
        let kept = record("kept", 5);
        Mock::given(method("GET"))
            .and(path(format!("{VALUES_PATH}/Sheet1%21A%3AI")))
            .and(query_param("valueRenderOption", "UNFORMATTED_VALUE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Sheet1!A1:I3",
                "majorDimension": "ROWS",
                "values": [HEADER, ["", "2025-09-14", "food", 300], record_to_row(&kept)],
            })))
            .mount(&server)
            .await;

        let records = client_for(&server).fetch_all(&signed()).await.unwrap();

        assert_eq!(records, vec![kept]);
    }

    #[tokio::test]
    async fn unauthorized_response_requires_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "message": "Invalid Credentials", "status": "UNAUTHENTICATED"}
            })))
            .mount(&server)
            .await;

        let error = client_for(&server).fetch_all(&signed()).await.unwrap_err();

        assert!(
            matches!(&error, Error::AuthRequired(message) if message == "Invalid Credentials (401)"),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn other_failures_surface_as_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend\n  unavailable"))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .append_one(&signed(), &record("x", 1))
            .await
            .unwrap_err();

        assert!(
            matches!(
                &error,
                Error::Remote(RemoteError::Api(message)) if message == "backend unavailable (500)"
            ),
            "unexpected error: {error:?}"
        );
        assert!(!error.requires_sign_in());
    }
}
