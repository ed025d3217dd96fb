//! Output modes and row formats.

use crate::error::{Result, WordlistError};
use crate::warehouse::Row;

/// How much the invocation writes to the console and the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Rows go to the file sink only; no console output, no info logging.
    Silent,
    /// Rows go to the configured sinks; start/end logging.
    #[default]
    Normal,
    /// Normal plus the rendered query and per-page progress.
    Verbose,
}

impl OutputMode {
    /// Resolves the mode from the global `--verbose` / `--silent` switches.
    ///
    /// The CLI rejects both together; silent wins if a caller passes both anyway.
    pub fn from_flags(verbose: bool, silent: bool) -> Self {
        match (verbose, silent) {
            (_, true) => Self::Silent,
            (true, false) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Silent => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Normal => "normal",
            Self::Verbose => "verbose",
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format for drained rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowFormat {
    /// Column values joined by tabs.
    #[default]
    Text,
    /// One JSON object per line, keys in column order.
    Json,
}

impl std::str::FromStr for RowFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid row format: {s}. Expected: text or json")),
        }
    }
}

impl RowFormat {
    /// Formats one row as a single line, without the trailing newline.
    pub fn format_row(&self, row: &Row) -> Result<String> {
        match self {
            Self::Text => Ok(row
                .iter()
                .map(|(_, value)| value.to_display_string())
                .collect::<Vec<_>>()
                .join("\t")),
            Self::Json => serde_json::to_string(row)
                .map_err(|e| WordlistError::drain(format!("Failed to encode row: {e}"))),
        }
    }
}
