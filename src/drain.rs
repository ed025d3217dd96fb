//! Result draining.
//!
//! Pulls a cursor to exhaustion one page at a time and writes every row to the
//! active sinks. At most one page of rows is held in memory.
//!
//! Within a row, the console is written before the file. The file is flushed after
//! every row and the console after every page, before the next page is requested,
//! so a failure leaves a complete prefix of earlier pages on every sink. If the file
//! write of a row fails, the console has already received that row and the file
//! holds every row before it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use futures::TryStreamExt;
use tracing::info;

use crate::error::{Result, WordlistError};
use crate::output::{OutputMode, RowFormat};
use crate::warehouse::{pages, ResultCursor};

/// Where drained rows go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sinks {
    /// Write rows to the console stream (ignored in silent mode).
    pub console: bool,
    /// Write rows to this file, created or truncated when the drain starts.
    pub file: Option<PathBuf>,
}

impl Sinks {
    pub fn console() -> Self {
        Self {
            console: true,
            file: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Totals for a completed drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub rows: u64,
    pub pages: u64,
}

type SinkWriter<'a> = Box<dyn Write + Send + 'a>;

/// A configured drain over already-open writers.
pub struct Drain<'a> {
    mode: OutputMode,
    format: RowFormat,
    console: Option<SinkWriter<'a>>,
    file: Option<SinkWriter<'a>>,
}

impl<'a> Drain<'a> {
    pub fn new(mode: OutputMode, format: RowFormat) -> Self {
        Self {
            mode,
            format,
            console: None,
            file: None,
        }
    }

    /// Attaches the console writer. Silent mode never writes to it.
    pub fn with_console(mut self, writer: impl Write + Send + 'a) -> Self {
        self.console = Some(Box::new(writer));
        self
    }

    /// Attaches the file writer.
    pub fn with_file(mut self, writer: impl Write + Send + 'a) -> Self {
        self.file = Some(Box::new(writer));
        self
    }

    /// Drains `cursor` into the attached writers.
    pub async fn run(self, cursor: Box<dyn ResultCursor>) -> Result<DrainSummary> {
        let Drain {
            mode,
            format,
            console,
            mut file,
        } = self;
        let mut console = console.filter(|_| !mode.is_silent());

        let mut summary = DrainSummary::default();
        let mut stream = pages(cursor);

        while let Some(page) = stream.try_next().await? {
            summary.pages += 1;
            let page_rows = page.len();

            for row in &page {
                let mut line = format.format_row(row)?;
                line.push('\n');

                if let Some(out) = console.as_mut() {
                    out.write_all(line.as_bytes()).map_err(|e| {
                        WordlistError::drain(format!("Failed to write to console: {e}"))
                    })?;
                }
                if let Some(out) = file.as_mut() {
                    // Flushed per row so a failed write is reported on the row that hit it.
                    out.write_all(line.as_bytes())
                        .and_then(|_| out.flush())
                        .map_err(|e| {
                            WordlistError::drain(format!("Failed to write output file: {e}"))
                        })?;
                }
                summary.rows += 1;
            }

            flush(&mut console, &mut file)?;

            if mode.is_verbose() {
                info!(
                    page = summary.pages,
                    rows = page_rows,
                    total = summary.rows,
                    "Drained result page"
                );
            }
        }

        flush(&mut console, &mut file)?;
        Ok(summary)
    }
}

fn flush(
    console: &mut Option<SinkWriter<'_>>,
    file: &mut Option<SinkWriter<'_>>,
) -> Result<()> {
    if let Some(out) = console.as_mut() {
        out.flush()
            .map_err(|e| WordlistError::drain(format!("Failed to flush console: {e}")))?;
    }
    if let Some(out) = file.as_mut() {
        out.flush()
            .map_err(|e| WordlistError::drain(format!("Failed to flush output file: {e}")))?;
    }
    Ok(())
}

/// Drains `cursor` into `sinks`, using `console` as the console stream.
///
/// The output file is created before the first page is fetched; if that fails,
/// nothing is written anywhere.
pub async fn drain<W>(
    cursor: Box<dyn ResultCursor>,
    sinks: &Sinks,
    mode: OutputMode,
    format: RowFormat,
    console: W,
) -> Result<DrainSummary>
where
    W: Write + Send,
{
    let mut drain = Drain::new(mode, format);

    if let Some(path) = &sinks.file {
        let file = File::create(path).map_err(|e| {
            WordlistError::drain(format!(
                "Failed to create output file {}: {e}",
                path.display()
            ))
        })?;
        drain = drain.with_file(BufWriter::new(file));
    }

    if sinks.console {
        drain = drain.with_console(BufWriter::new(console));
    }

    drain.run(cursor).await
}
