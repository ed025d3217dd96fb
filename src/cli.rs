//! Command-line argument parsing for bq-wordlist.

use crate::config::WarehouseOverrides;
use crate::output::{OutputMode, RowFormat};
use crate::pipeline::InvocationContext;
use crate::template;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build file-name wordlists from the BigQuery GitHub dataset.
#[derive(Parser, Debug)]
#[command(name = "bq-wordlist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Google Cloud project that runs the query jobs
    #[arg(long, global = true, value_name = "PROJECT")]
    pub project: Option<String>,

    /// Service-account credentials file (defaults to ./credentials.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log the compiled query and drain progress
    #[arg(short, long, global = true, conflicts_with = "silent")]
    pub verbose: bool,

    /// Write rows to the output file only, with no console output or progress logging
    #[arg(short, long, global = true)]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Most common file names with the given extensions
    #[command(name = "words-with-ext")]
    WordsWithExt(WordsWithExtArgs),
}

#[derive(Args, Debug)]
pub struct WordsWithExtArgs {
    /// Comma-separated list of extensions (e.g. "sql,js")
    #[arg(short, long, value_name = "EXTENSIONS", value_parser = NonEmptyStringValueParser::new())]
    pub extensions: String,

    /// Maximum number of rows to return
    #[arg(short, long, value_name = "N", default_value = "50000", value_parser = parse_limit)]
    pub limit: String,

    /// Write rows to this file (truncated if it exists)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Row format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    /// Rows fetched per result page (overrides config)
    #[arg(long, value_name = "ROWS")]
    pub page_size: Option<u32>,
}

/// Accepts a positive integer and normalizes it (e.g. "0100" becomes "100").
fn parse_limit(s: &str) -> std::result::Result<String, String> {
    template::parse_limit(s)
        .map(|n| n.to_string())
        .map_err(|e| e.to_string())
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the output mode selected by the global switches.
    pub fn mode(&self) -> OutputMode {
        OutputMode::from_flags(self.verbose, self.silent)
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the warehouse settings given on the command line.
    pub fn warehouse_overrides(&self) -> WarehouseOverrides {
        let page_size = match &self.command {
            Command::WordsWithExt(args) => args.page_size,
        };
        WarehouseOverrides {
            project: self.project.clone(),
            credentials: self.credentials.clone(),
            page_size,
        }
    }

    /// Builds the log/error context for this invocation.
    pub fn context(&self) -> InvocationContext {
        match &self.command {
            Command::WordsWithExt(args) => InvocationContext::new(
                "WordsWithExt",
                self.mode(),
                args.limit.clone(),
                args.extensions.clone(),
            ),
        }
    }
}

impl WordsWithExtArgs {
    /// Parses the row format from the --format argument.
    pub fn parse_format(&self) -> std::result::Result<RowFormat, String> {
        self.format.parse()
    }
}
