//! Integration tests for bq-wordlist.

pub mod bigquery_test;
pub mod pipeline_test;

use std::io::Write;
use std::time::Duration;

use bq_wordlist::warehouse::{BigQueryClient, BigQueryConfig};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT: &str = "wordlist-test";
pub const JOB_ID: &str = "job_words_1";

const FIXTURE: &str = include_str!("../fixtures/service_account.json");

/// A mock BigQuery endpoint plus a credentials file that authenticates against it.
pub struct Warehouse {
    pub server: MockServer,
    credentials: NamedTempFile,
}

impl Warehouse {
    /// Starts the server and mounts the token endpoint.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.integration",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let mut key: Value = serde_json::from_str(FIXTURE).unwrap();
        key["token_uri"] = Value::String(format!("{}/token", server.uri()));
        let mut credentials = NamedTempFile::new().unwrap();
        write!(credentials, "{key}").unwrap();

        Self {
            server,
            credentials,
        }
    }

    pub fn config(&self) -> BigQueryConfig {
        BigQueryConfig::new(PROJECT, self.credentials.path())
            .with_api_url(self.server.uri())
            .with_page_size(2)
            .with_poll_interval(Duration::from_millis(1))
    }

    pub async fn client(&self) -> BigQueryClient {
        BigQueryClient::connect(self.config()).await.unwrap()
    }

    /// Mounts a job insert that starts RUNNING and a status poll that reports `status`.
    pub async fn mount_job(&self, status: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/projects/{PROJECT}/jobs")))
            .respond_with(ResponseTemplate::new(200).set_body_json(job("RUNNING", None)))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/projects/{PROJECT}/jobs/{JOB_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(status))
            .mount(&self.server)
            .await;
    }

    /// Mounts a finished job whose results are `pages`, linked by page tokens.
    pub async fn mount_results(&self, pages: &[&[(&str, i64)]]) {
        self.mount_job(job("DONE", None)).await;

        for (index, rows) in pages.iter().enumerate() {
            let next = (index + 1 < pages.len()).then(|| format!("token-{}", index + 1));
            let mut body = json!({
                "jobReference": {"projectId": PROJECT, "jobId": JOB_ID, "location": "US"},
                "jobComplete": true,
                "totalRows": pages.iter().map(|p| p.len()).sum::<usize>().to_string(),
                "schema": {"fields": [
                    {"name": "file", "type": "STRING", "mode": "NULLABLE"},
                    {"name": "occurrences", "type": "INTEGER", "mode": "NULLABLE"}
                ]},
                "rows": rows
                    .iter()
                    .map(|(file, n)| json!({"f": [{"v": file}, {"v": n.to_string()}]}))
                    .collect::<Vec<_>>(),
            });
            if let Some(token) = &next {
                body["pageToken"] = Value::String(token.clone());
            }

            let mock = Mock::given(method("GET"))
                .and(path(format!("/projects/{PROJECT}/queries/{JOB_ID}")));
            let mock = if index == 0 {
                mock.and(query_param_is_missing("pageToken"))
            } else {
                mock.and(query_param("pageToken", format!("token-{index}")))
            };
            mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&self.server)
                .await;
        }
    }

    /// Number of requests received whose path ends with `suffix`.
    pub async fn requests_to(&self, suffix: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .count()
    }

    /// The SQL text of the first submitted job.
    pub async fn submitted_query(&self) -> Option<String> {
        let requests = self.server.received_requests().await.unwrap_or_default();
        let insert = requests
            .iter()
            .find(|r| r.url.path() == format!("/projects/{PROJECT}/jobs"))?;
        let body: Value = serde_json::from_slice(&insert.body).ok()?;
        body["configuration"]["query"]["query"]
            .as_str()
            .map(String::from)
    }
}

/// A job resource in the given state.
pub fn job(state: &str, error: Option<Value>) -> Value {
    let mut status = json!({ "state": state });
    if let Some(error) = error {
        status["errorResult"] = error;
    }
    json!({
        "jobReference": {"projectId": PROJECT, "jobId": JOB_ID, "location": "US"},
        "status": status
    })
}
