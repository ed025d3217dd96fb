//! Warehouse abstraction layer.
//!
//! A `WarehouseClient` accepts a query and hands back a `ResultCursor`; rows are
//! only fetched when the cursor is advanced. BigQuery is the production backend,
//! the mock clients back tests.

pub mod auth;
mod bigquery;
pub mod executor;
mod mock;
mod types;

pub use bigquery::{
    BigQueryClient, BigQueryConfig, DEFAULT_API_URL, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_SECS,
};
pub use executor::{execute, QueryExecutor, Submitted};
pub use mock::{FailingWarehouseClient, FetchCounter, MockCursor, MockWarehouseClient};
pub use types::{Row, Value};

use crate::error::{Result, WordlistError};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// One fetched batch of rows.
pub type Page = Vec<Row>;

/// Trait defining the interface for warehouse clients.
///
/// Implementations are already authenticated when handed to the executor.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Submits a query and waits for the warehouse to accept it.
    ///
    /// Must not fetch row data; that happens through the returned cursor.
    async fn submit(&self, query: &str) -> Result<Box<dyn ResultCursor>>;
}

/// Forward-only, lazily fetched result set.
///
/// Once `next_page` has returned `Ok(None)` it keeps returning `Ok(None)`.
#[async_trait]
pub trait ResultCursor: Send {
    /// Fetches the next non-empty page, or `None` when the result set is exhausted.
    async fn next_page(&mut self) -> Result<Option<Page>>;
}

/// Adapts a cursor into a stream of pages, fetching each page on demand.
pub fn pages(cursor: Box<dyn ResultCursor>) -> BoxStream<'static, Result<Page>> {
    stream::try_unfold(cursor, |mut cursor| async move {
        let page = cursor.next_page().await?;
        Ok::<_, WordlistError>(page.map(|rows| (rows, cursor)))
    })
    .boxed()
}
