//! The words-with-ext pipeline.
//!
//! filter → template → submit → drain, strictly in that order. Every stage returns
//! its error to the caller; only the binary's top level logs it and exits.

use std::io::Write;
use std::path::PathBuf;

use tracing::{error, info, Instrument};

use crate::assets::{load_template, WORDS_WITH_EXT};
use crate::drain::{drain, DrainSummary, Sinks};
use crate::error::{Result, WordlistError};
use crate::filter::FilterSpec;
use crate::output::{OutputMode, RowFormat};
use crate::template::{parse_limit, RenderedQuery, TemplateParameters};
use crate::warehouse::{QueryExecutor, WarehouseClient};

/// Data source every query in this crate runs against.
pub const SOURCE: &str = "Github";

/// Structured context attached to log lines and the terminal error of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub command: &'static str,
    pub source: &'static str,
    pub mode: OutputMode,
    pub limit: String,
    pub extensions: String,
}

impl InvocationContext {
    pub fn new(
        command: &'static str,
        mode: OutputMode,
        limit: impl Into<String>,
        extensions: impl Into<String>,
    ) -> Self {
        Self {
            command,
            source: SOURCE,
            mode,
            limit: limit.into(),
            extensions: extensions.into(),
        }
    }

    /// A span carrying these fields, for everything logged during the run.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "invocation",
            mode = %self.mode,
            source = self.source,
            limit = %self.limit,
            extensions = %self.extensions,
        )
    }

    /// Logs a fatal error together with the invocation fields.
    pub fn log_failure(&self, err: &WordlistError) {
        error!(
            command = self.command,
            mode = %self.mode,
            source = self.source,
            limit = %self.limit,
            extensions = %self.extensions,
            error = %err,
            "{}",
            err.category()
        );
    }
}

/// One `words-with-ext` invocation.
#[derive(Debug, Clone)]
pub struct WordsWithExt {
    pub extensions: String,
    pub limit: String,
    pub sinks: Sinks,
    pub mode: OutputMode,
    pub format: RowFormat,
    pub templates_dir: Option<PathBuf>,
}

impl WordsWithExt {
    /// Creates an invocation writing to the console (unless silent) and `output`.
    pub fn new(
        extensions: impl Into<String>,
        limit: impl Into<String>,
        output: Option<PathBuf>,
        mode: OutputMode,
    ) -> Self {
        Self {
            extensions: extensions.into(),
            limit: limit.into(),
            sinks: Sinks {
                console: !mode.is_silent(),
                file: output,
            },
            mode,
            format: RowFormat::default(),
            templates_dir: None,
        }
    }

    pub fn with_format(mut self, format: RowFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_templates_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.templates_dir = dir;
        self
    }

    pub fn context(&self) -> InvocationContext {
        InvocationContext::new("WordsWithExt", self.mode, &self.limit, &self.extensions)
    }

    /// Compiles the filter, checks the limit and renders the query. Touches no
    /// network and no sink.
    pub fn prepare(&self) -> Result<RenderedQuery> {
        let pattern = FilterSpec::parse(&self.extensions)?.compile();
        let limit = parse_limit(&self.limit)?;
        let template = load_template(WORDS_WITH_EXT, self.templates_dir.as_deref())?;
        let params = TemplateParameters::new(pattern.as_str(), limit.to_string());
        template.render(&params)
    }

    /// Submits a prepared query and drains its results.
    pub async fn execute<W>(
        &self,
        query: RenderedQuery,
        client: &dyn WarehouseClient,
        console: W,
    ) -> Result<DrainSummary>
    where
        W: Write + Send,
    {
        let context = self.context();
        async move {
            if self.mode.is_verbose() {
                info!("Compiled SQL template: {}", query);
            }
            if !self.mode.is_silent() {
                info!("Executing BigQuery SQL... this could take some time.");
            }

            let submitted = QueryExecutor::new(client).execute(query).await?;
            let summary = drain(
                submitted.cursor,
                &self.sinks,
                self.mode,
                self.format,
                console,
            )
            .await?;

            if !self.mode.is_silent() {
                info!(
                    rows = summary.rows,
                    pages = summary.pages,
                    "Finished writing results"
                );
            }
            Ok(summary)
        }
        .instrument(context.span())
        .await
    }

    /// Prepares, submits and drains in one call.
    pub async fn run<W>(&self, client: &dyn WarehouseClient, console: W) -> Result<DrainSummary>
    where
        W: Write + Send,
    {
        let query = self.prepare()?;
        self.execute(query, client, console).await
    }
}
