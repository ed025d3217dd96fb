//! BigQuery client tests against a mock REST endpoint.

use super::{job, Warehouse, JOB_ID, PROJECT};
use bq_wordlist::error::WordlistError;
use bq_wordlist::warehouse::{BigQueryClient, Row, Value, WarehouseClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Scenario: Submission does not fetch rows
/// Given a finished query job
/// When the query is submitted
/// Then the job is inserted and polled
/// And no result page has been requested yet
#[tokio::test]
async fn test_submit_polls_job_without_fetching_rows() {
    let warehouse = Warehouse::start().await;
    warehouse.mount_results(&[&[("index.js", 10)]]).await;
    let client = warehouse.client().await;

    let _cursor = client.submit("SELECT 1").await.unwrap();

    assert_eq!(warehouse.requests_to("/jobs").await, 1);
    assert_eq!(warehouse.requests_to(&format!("/jobs/{JOB_ID}")).await, 1);
    assert_eq!(warehouse.requests_to(&format!("/queries/{JOB_ID}")).await, 0);
    assert_eq!(warehouse.submitted_query().await.as_deref(), Some("SELECT 1"));
}

/// Scenario: Pages follow page tokens in order
/// Given results split over three pages
/// When the cursor is advanced to exhaustion
/// Then every row arrives once, in warehouse order
/// And the exhausted cursor stays exhausted
#[tokio::test]
async fn test_cursor_follows_page_tokens() {
    let warehouse = Warehouse::start().await;
    warehouse
        .mount_results(&[
            &[("index.js", 10), ("app.js", 8)],
            &[("schema.sql", 4), ("main.js", 3)],
            &[("init.sql", 1)],
        ])
        .await;
    let client = warehouse.client().await;

    let mut cursor = client.submit("SELECT 1").await.unwrap();
    let mut rows: Vec<Row> = Vec::new();
    while let Some(page) = cursor.next_page().await.unwrap() {
        rows.extend(page);
    }

    let files: Vec<String> = rows
        .iter()
        .map(|r| r.get("file").unwrap().to_display_string())
        .collect();
    assert_eq!(files, ["index.js", "app.js", "schema.sql", "main.js", "init.sql"]);
    assert_eq!(rows[0].get("occurrences"), Some(&Value::Int(10)));
    assert!(cursor.next_page().await.unwrap().is_none());
    assert_eq!(warehouse.requests_to(&format!("/queries/{JOB_ID}")).await, 3);
}

/// Scenario: Rejected query
/// Given a job that finishes with an errorResult
/// When the query is submitted
/// Then a submission error carries the warehouse's reason and message
#[tokio::test]
async fn test_rejected_job_is_submission_error() {
    let warehouse = Warehouse::start().await;
    warehouse
        .mount_job(job(
            "DONE",
            Some(json!({
                "reason": "invalidQuery",
                "message": "Syntax error: Unexpected end of script at [1:9]"
            })),
        ))
        .await;
    let client = warehouse.client().await;

    let err = client.submit("SELECT (").await.err().unwrap();
    match err {
        WordlistError::Submission(msg) => {
            assert!(msg.contains("invalidQuery"), "{msg}");
            assert!(msg.contains("Syntax error"), "{msg}");
        }
        other => panic!("Expected Submission error, got {other:?}"),
    }
    assert_eq!(warehouse.requests_to(&format!("/queries/{JOB_ID}")).await, 0);
}

/// Scenario: Insert refused by the API
/// Given the jobs endpoint answers 403
/// When the query is submitted
/// Then a submission error carries the API message
#[tokio::test]
async fn test_insert_http_error_is_submission_error() {
    let warehouse = Warehouse::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/projects/{PROJECT}/jobs")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Access Denied: Project wordlist-test"}
        })))
        .mount(&warehouse.server)
        .await;
    let client = warehouse.client().await;

    let err = client.submit("SELECT 1").await.err().unwrap();
    assert!(matches!(err, WordlistError::Submission(ref m) if m.contains("Access Denied")));
}

/// Scenario: Page fetch fails mid-drain
/// Given a finished job whose results endpoint errors
/// When the cursor is advanced
/// Then a fetch error is returned
#[tokio::test]
async fn test_results_http_error_is_fetch_error() {
    let warehouse = Warehouse::start().await;
    warehouse.mount_job(job("DONE", None)).await;
    Mock::given(method("GET"))
        .and(path(format!("/projects/{PROJECT}/queries/{JOB_ID}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&warehouse.server)
        .await;
    let client = warehouse.client().await;

    let mut cursor = client.submit("SELECT 1").await.unwrap();
    let err = cursor.next_page().await.unwrap_err();
    assert!(matches!(err, WordlistError::Fetch(ref m) if m.contains("backend error")));
}

/// Scenario: Empty result set
/// Given a finished job with no rows
/// When the cursor is advanced
/// Then it is exhausted immediately
#[tokio::test]
async fn test_empty_result_set() {
    let warehouse = Warehouse::start().await;
    warehouse.mount_results(&[&[]]).await;
    let client = warehouse.client().await;

    let mut cursor = client.submit("SELECT 1").await.unwrap();
    assert!(cursor.next_page().await.unwrap().is_none());
}

/// Scenario: Bad credentials
/// Given a token endpoint that rejects the assertion
/// When the client connects
/// Then a submission error is returned before any query is sent
#[tokio::test]
async fn test_connect_with_rejected_credentials() {
    let warehouse = Warehouse::start().await;
    warehouse.server.reset().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&warehouse.server)
        .await;

    let err = BigQueryClient::connect(warehouse.config()).await.err().unwrap();
    assert!(matches!(err, WordlistError::Submission(_)));
    assert_eq!(warehouse.requests_to("/jobs").await, 0);
}

/// Scenario: Token refresh fails mid-drain
/// Given tokens that expire immediately and a token endpoint that stops issuing them
/// When the cursor fetches its first page
/// Then a fetch error is returned rather than a submission error
#[tokio::test]
async fn test_token_refresh_failure_during_fetch_is_fetch_error() {
    let warehouse = Warehouse::start().await;
    warehouse.server.reset().await;
    // connect, jobs.insert and jobs.get each need a fresh token.
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.short",
            "expires_in": 1
        })))
        .up_to_n_times(3)
        .mount(&warehouse.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&warehouse.server)
        .await;
    warehouse.mount_results(&[&[("index.js", 10)]]).await;
    let client = warehouse.client().await;

    let mut cursor = client.submit("SELECT 1").await.unwrap();
    let err = cursor.next_page().await.unwrap_err();

    assert!(matches!(err, WordlistError::Fetch(ref m) if m.contains("invalid_grant")));
    assert_eq!(warehouse.requests_to(&format!("/queries/{JOB_ID}")).await, 0);
}
