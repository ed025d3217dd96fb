//! BigQuery client implementation.
//!
//! Submits queries as jobs through the BigQuery v2 REST API and pages results with
//! `getQueryResults`. Submission waits for the job to finish; rows are pulled one
//! page at a time by `BigQueryCursor`.

use super::auth::{ServiceAccountKey, TokenSource};
use super::{Page, ResultCursor, Row, Value, WarehouseClient};
use crate::error::{Result, WordlistError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default BigQuery REST endpoint.
pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Default number of rows requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default delay between job status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// BigQuery client configuration.
#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    /// Project that runs (and is billed for) the query jobs.
    pub project: String,
    /// Path to a service-account JSON key.
    pub credentials: PathBuf,
    /// Base URL of the REST API.
    pub api_url: String,
    /// Rows requested per result page.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between job status polls.
    pub poll_interval: Duration,
    /// Job location (e.g. "US"), if pinned.
    pub location: Option<String>,
}

impl BigQueryConfig {
    /// Creates a config with default endpoint, paging and timeouts.
    pub fn new(project: impl Into<String>, credentials: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            credentials: credentials.into(),
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            location: None,
        }
    }

    /// Sets the REST API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the job poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// State shared between the client and the cursors it creates.
#[derive(Debug)]
struct Session {
    config: BigQueryConfig,
    http: Client,
    tokens: TokenSource,
}

impl Session {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.project,
            path
        )
    }

    /// Sends an authorized request and decodes the JSON body.
    ///
    /// Failures are reported through `on_error` so callers pick the error kind.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        on_error: fn(String) -> WordlistError,
    ) -> Result<T> {
        let token = self.tokens.token().await.map_err(|e| match e {
            WordlistError::Submission(msg) => on_error(msg),
            other => other,
        })?;
        let response = request.bearer_auth(token).send().await.map_err(|e| {
            if e.is_timeout() {
                on_error(format!(
                    "Request timed out after {} seconds",
                    self.config.timeout_secs
                ))
            } else if e.is_connect() {
                on_error("Failed to connect to BigQuery. Check your network.".to_string())
            } else {
                on_error(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| on_error(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(on_error(parse_error(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| on_error(format!("Failed to parse response: {e}")))
    }
}

/// Server-side wait for `getQueryResults`, in milliseconds.
fn timeout_ms(timeout_secs: u64) -> u64 {
    timeout_secs.saturating_mul(1000)
}

/// Turns an API error response into a readable message.
fn parse_error(status: StatusCode, body: &str) -> String {
    if status == StatusCode::UNAUTHORIZED {
        return "Authentication failed. Please check your credentials.".to_string();
    }

    if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) {
        return format!("BigQuery API error ({status}): {}", error_response.error.message);
    }

    format!("BigQuery API error ({status}): {body}")
}

/// BigQuery warehouse client.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    session: Arc<Session>,
}

impl BigQueryClient {
    /// Builds an authenticated client.
    ///
    /// Reads the credentials and exchanges them for an access token up front, so bad
    /// credentials fail here rather than on the first query.
    pub async fn connect(config: BigQueryConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&config.credentials)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WordlistError::submission(format!("Failed to create HTTP client: {e}")))?;

        let tokens = TokenSource::new(key, http.clone());
        tokens.token().await?;
        debug!(
            "Authenticated as {} for project {}",
            tokens.key().client_email,
            config.project
        );

        Ok(Self {
            session: Arc::new(Session {
                config,
                http,
                tokens,
            }),
        })
    }

    async fn insert_job(&self, query: &str) -> Result<Job> {
        let session = &self.session;
        let body = InsertJobRequest {
            job_reference: NewJobReference {
                project_id: &session.config.project,
                location: session.config.location.as_deref(),
            },
            configuration: JobConfiguration {
                query: QueryConfiguration {
                    query,
                    use_legacy_sql: false,
                },
            },
        };

        session
            .send(
                session.http.post(session.url("jobs")).json(&body),
                WordlistError::Submission,
            )
            .await
    }

    async fn get_job(&self, job: &JobReference) -> Result<Job> {
        let session = &self.session;
        let mut request = session.http.get(session.url(&format!("jobs/{}", job.job_id)));
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }
        session.send(request, WordlistError::Submission).await
    }
}

#[async_trait]
impl WarehouseClient for BigQueryClient {
    async fn submit(&self, query: &str) -> Result<Box<dyn ResultCursor>> {
        let start = Instant::now();
        let mut job = self.insert_job(query).await?;
        debug!("Inserted query job {}", job.job_reference.job_id);

        while !job.status.is_done() {
            tokio::time::sleep(self.session.config.poll_interval).await;
            job = self.get_job(&job.job_reference).await?;
            debug!(
                "Job {} is {} after {:?}",
                job.job_reference.job_id,
                job.status.state,
                start.elapsed()
            );
        }

        if let Some(error) = job.status.error_result {
            return Err(WordlistError::submission(format!(
                "Query rejected ({}): {}",
                error.reason.as_deref().unwrap_or("unknown"),
                error.message
            )));
        }

        Ok(Box::new(BigQueryCursor {
            session: Arc::clone(&self.session),
            job: job.job_reference,
            schema: None,
            page_token: None,
            exhausted: false,
        }))
    }
}

/// Cursor over a finished query job's results.
#[derive(Debug)]
pub struct BigQueryCursor {
    session: Arc<Session>,
    job: JobReference,
    schema: Option<Vec<FieldSchema>>,
    page_token: Option<String>,
    exhausted: bool,
}

impl BigQueryCursor {
    async fn fetch(&self) -> Result<QueryResultsResponse> {
        let session = &self.session;
        let mut params = vec![
            ("maxResults", session.config.page_size.to_string()),
            ("timeoutMs", timeout_ms(session.config.timeout_secs).to_string()),
        ];
        if let Some(token) = &self.page_token {
            params.push(("pageToken", token.clone()));
        }
        if let Some(location) = &self.job.location {
            params.push(("location", location.clone()));
        }

        let request = session
            .http
            .get(session.url(&format!("queries/{}", self.job.job_id)))
            .query(&params);
        session.send(request, WordlistError::Fetch).await
    }
}

#[async_trait]
impl ResultCursor for BigQueryCursor {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        while !self.exhausted {
            let response = self.fetch().await?;

            if !response.job_complete.unwrap_or(true) {
                tokio::time::sleep(self.session.config.poll_interval).await;
                continue;
            }

            if let Some(schema) = response.schema {
                self.schema = Some(schema.fields);
            }
            self.page_token = response.page_token;
            self.exhausted = self.page_token.is_none();

            let rows = response.rows.unwrap_or_default();
            if rows.is_empty() {
                continue;
            }

            let fields = self.schema.as_deref().ok_or_else(|| {
                WordlistError::fetch("Result page arrived without a schema")
            })?;
            let page = rows
                .into_iter()
                .map(|row| convert_row(fields, row))
                .collect::<Result<Page>>()?;
            return Ok(Some(page));
        }
        Ok(None)
    }
}

fn convert_row(fields: &[FieldSchema], row: TableRow) -> Result<Row> {
    if row.f.len() != fields.len() {
        return Err(WordlistError::fetch(format!(
            "Row has {} cells but schema has {} fields",
            row.f.len(),
            fields.len()
        )));
    }

    let mut out = Row::new();
    for (field, cell) in fields.iter().zip(row.f) {
        out.push(field.name.clone(), convert_value(field, cell.v));
    }
    Ok(out)
}

/// Converts a REST cell into a typed value.
///
/// Scalars arrive as strings; repeated and record values are kept as JSON.
fn convert_value(field: &FieldSchema, raw: serde_json::Value) -> Value {
    use serde_json::Value as Json;

    let nested = matches!(field.field_type.as_str(), "RECORD" | "STRUCT");
    if nested || field.mode.as_deref() == Some("REPEATED") {
        return match raw {
            Json::Null => Value::Null,
            other => Value::Json(other),
        };
    }

    let text = match raw {
        Json::Null => return Value::Null,
        Json::String(s) => s,
        other => return Value::Json(other),
    };

    match field.field_type.as_str() {
        "INTEGER" | "INT64" => text.parse().map(Value::Int).unwrap_or(Value::String(text)),
        "FLOAT" | "FLOAT64" => text.parse().map(Value::Float).unwrap_or(Value::String(text)),
        "BOOLEAN" | "BOOL" => match text.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        _ => Value::String(text),
    }
}

// === REST payloads ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertJobRequest<'a> {
    job_reference: NewJobReference<'a>,
    configuration: JobConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewJobReference<'a> {
    project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JobConfiguration<'a> {
    query: QueryConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryConfiguration<'a> {
    query: &'a str,
    use_legacy_sql: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_reference: JobReference,
    status: JobStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    #[serde(default)]
    error_result: Option<ErrorProto>,
}

impl JobStatus {
    fn is_done(&self) -> bool {
        self.state == "DONE"
    }
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultsResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Option<Vec<TableRow>>,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldSchema {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    #[serde(default)]
    v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
