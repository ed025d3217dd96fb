//! Mock warehouse clients for testing.
//!
//! Serve predefined pages from memory and record what was submitted.

use super::{Page, ResultCursor, WarehouseClient};
use crate::error::{Result, WordlistError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Shared count of pages a cursor has fetched.
#[derive(Debug, Clone, Default)]
pub struct FetchCounter(Arc<AtomicUsize>);

impl FetchCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

/// An in-memory cursor over fixed pages.
#[derive(Debug)]
pub struct MockCursor {
    pages: VecDeque<Page>,
    fail_at_page: Option<usize>,
    fetched: FetchCounter,
}

impl MockCursor {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: pages.into_iter().filter(|p| !p.is_empty()).collect(),
            fail_at_page: None,
            fetched: FetchCounter::default(),
        }
    }

    /// Makes the fetch of page `index` (zero-based) fail.
    pub fn fail_at_page(mut self, index: usize) -> Self {
        self.fail_at_page = Some(index);
        self
    }

    /// Returns a handle that observes how many pages have been fetched.
    pub fn fetch_counter(&self) -> FetchCounter {
        self.fetched.clone()
    }
}

#[async_trait]
impl ResultCursor for MockCursor {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        let index = self.fetched.bump();
        if self.fail_at_page == Some(index) {
            self.pages.clear();
            return Err(WordlistError::fetch(format!(
                "mock failure fetching page {index}"
            )));
        }
        Ok(self.pages.pop_front())
    }
}

/// A mock warehouse client that returns the same pages for every query.
#[derive(Debug, Clone, Default)]
pub struct MockWarehouseClient {
    pages: Vec<Page>,
    fail_at_page: Option<usize>,
    submitted: Arc<Mutex<Vec<String>>>,
}

impl MockWarehouseClient {
    /// Creates a client whose queries return no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose queries return the given pages.
    pub fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Makes cursors from this client fail when fetching page `index`.
    pub fn failing_at_page(mut self, index: usize) -> Self {
        self.fail_at_page = Some(index);
        self
    }

    /// Returns every query submitted so far.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WarehouseClient for MockWarehouseClient {
    async fn submit(&self, query: &str) -> Result<Box<dyn ResultCursor>> {
        if let Ok(mut queries) = self.submitted.lock() {
            queries.push(query.to_string());
        }
        let mut cursor = MockCursor::new(self.pages.clone());
        cursor.fail_at_page = self.fail_at_page;
        Ok(Box::new(cursor))
    }
}

/// A warehouse client whose submissions are always rejected.
#[derive(Debug, Clone)]
pub struct FailingWarehouseClient {
    message: String,
}

impl FailingWarehouseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl WarehouseClient for FailingWarehouseClient {
    async fn submit(&self, _query: &str) -> Result<Box<dyn ResultCursor>> {
        Err(WordlistError::submission(self.message.clone()))
    }
}
