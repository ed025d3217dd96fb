//! bq-wordlist - file-name wordlists from the BigQuery GitHub dataset.
//!
//! This library exposes the pipeline stages for use by the binary and integration tests.

pub mod assets;
pub mod cli;
pub mod config;
pub mod drain;
pub mod error;
pub mod filter;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod template;
pub mod warehouse;
