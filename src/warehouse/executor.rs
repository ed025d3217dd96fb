//! Query submission.
//!
//! Hands a rendered query to the warehouse and returns the cursor, without pulling
//! any rows.

use std::time::{Duration, Instant};

use tracing::debug;

use super::{ResultCursor, WarehouseClient};
use crate::error::{Result, WordlistError};
use crate::template::RenderedQuery;

/// Submits rendered queries to a warehouse client.
pub struct QueryExecutor<'a> {
    client: &'a dyn WarehouseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor over an authenticated client.
    pub fn new(client: &'a dyn WarehouseClient) -> Self {
        Self { client }
    }

    /// Submits the query and waits until the warehouse accepts it.
    ///
    /// Any failure is reported as a submission error; nothing is retried.
    pub async fn execute(&self, query: RenderedQuery) -> Result<Submitted> {
        let start = Instant::now();
        let cursor = self
            .client
            .submit(query.as_str())
            .await
            .map_err(into_submission)?;
        let submit_time = start.elapsed();

        debug!("Query accepted in {:?}", submit_time);

        Ok(Submitted {
            cursor,
            submit_time,
        })
    }
}

fn into_submission(err: WordlistError) -> WordlistError {
    match err {
        WordlistError::Submission(_) => err,
        other => WordlistError::submission(other.to_string()),
    }
}

/// A query the warehouse has accepted.
pub struct Submitted {
    /// Cursor over the result set; no rows have been fetched yet.
    pub cursor: Box<dyn ResultCursor>,
    /// How long submission took.
    pub submit_time: Duration,
}

/// Submits `query` through `client`.
pub async fn execute(
    client: &dyn WarehouseClient,
    query: RenderedQuery,
) -> Result<Box<dyn ResultCursor>> {
    Ok(QueryExecutor::new(client).execute(query).await?.cursor)
}
