//! End-to-end words-with-ext runs against a mock warehouse.

use super::{Warehouse, JOB_ID};
use bq_wordlist::error::WordlistError;
use bq_wordlist::output::{OutputMode, RowFormat};
use bq_wordlist::pipeline::WordsWithExt;
use pretty_assertions::assert_eq;

/// Scenario: sql,js with limit 100
/// Given extensions "sql,js" and limit 100
/// When the pipeline runs with an output file
/// Then the submitted query filters on \.(sql|js)$ and limits to 100
/// And console and file both hold every row in order
#[tokio::test]
async fn test_words_with_ext_end_to_end() {
    let warehouse = Warehouse::start().await;
    warehouse
        .mount_results(&[&[("index.js", 10), ("schema.sql", 4)], &[("app.js", 2)]])
        .await;
    let client = warehouse.client().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("words.txt");
    let mut console = Vec::new();

    let job = WordsWithExt::new("sql,js", "100", Some(output.clone()), OutputMode::Normal);
    let summary = job.run(&client, &mut console).await.unwrap();

    let query = warehouse.submitted_query().await.unwrap();
    assert!(query.contains(r"REGEXP_CONTAINS(path, r'\.(sql|js)$')"), "{query}");
    assert!(query.contains("LIMIT 100"), "{query}");

    let expected = "index.js\t10\nschema.sql\t4\napp.js\t2\n";
    assert_eq!(String::from_utf8(console).unwrap(), expected);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), expected);
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.pages, 2);
}

/// Scenario: Silent mode
/// Given silent mode and an output file
/// When the pipeline runs
/// Then the console stays empty and the file holds the rows as JSON lines
#[tokio::test]
async fn test_silent_json_to_file() {
    let warehouse = Warehouse::start().await;
    warehouse.mount_results(&[&[("index.js", 10)]]).await;
    let client = warehouse.client().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("words.jsonl");
    let mut console = Vec::new();

    WordsWithExt::new("js", "1", Some(output.clone()), OutputMode::Silent)
        .with_format(RowFormat::Json)
        .run(&client, &mut console)
        .await
        .unwrap();

    assert!(console.is_empty());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "{\"file\":\"index.js\",\"occurrences\":10}\n"
    );
}

/// Scenario: Invalid filter
/// Given an extension token with regex metacharacters
/// When the pipeline runs
/// Then it fails with a filter error and nothing reaches the warehouse
#[tokio::test]
async fn test_invalid_filter_sends_no_query() {
    let warehouse = Warehouse::start().await;
    let client = warehouse.client().await;

    let err = WordsWithExt::new("js,.*", "100", None, OutputMode::Normal)
        .run(&client, Vec::<u8>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, WordlistError::InvalidFilter(ref m) if m.contains(".*")));
    assert_eq!(warehouse.requests_to("/jobs").await, 0);
}

/// Scenario: Unwritable output file
/// Given an output path inside a missing directory
/// When the pipeline runs
/// Then it fails with a drain error before any page is fetched
#[tokio::test]
async fn test_unwritable_output_fetches_nothing() {
    let warehouse = Warehouse::start().await;
    warehouse.mount_results(&[&[("index.js", 10)]]).await;
    let client = warehouse.client().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("missing").join("words.txt");
    let mut console = Vec::new();

    let err = WordsWithExt::new("js", "10", Some(output), OutputMode::Normal)
        .run(&client, &mut console)
        .await
        .unwrap_err();

    assert!(matches!(err, WordlistError::Drain(_)));
    assert!(console.is_empty());
    assert_eq!(warehouse.requests_to(&format!("/queries/{JOB_ID}")).await, 0);
}
