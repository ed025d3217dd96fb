//! bq-wordlist - file-name wordlists from the BigQuery GitHub dataset.

use bq_wordlist::cli::{Cli, Command};
use bq_wordlist::config::Config;
use bq_wordlist::error::{Result, WordlistError};
use bq_wordlist::logging::init_stderr_logging;
use bq_wordlist::pipeline::WordsWithExt;
use bq_wordlist::warehouse::BigQueryClient;
use tracing::debug;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_stderr_logging(cli.mode());

    if let Err(e) = run(&cli).await {
        cli.context().log_failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    // Load configuration file
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Resolve warehouse settings with precedence:
    // 1. CLI arguments (highest)
    // 2. Config file
    // 3. Environment variables
    // 4. ./credentials.json
    let warehouse = config.warehouse.resolve(&cli.warehouse_overrides())?;

    match &cli.command {
        Command::WordsWithExt(args) => {
            let format = args.parse_format().map_err(WordlistError::config)?;
            let job = WordsWithExt::new(
                args.extensions.as_str(),
                args.limit.as_str(),
                args.output.clone(),
                cli.mode(),
            )
            .with_format(format)
            .with_templates_dir(config.templates_dir.clone());

            // Filter and template errors surface before any network traffic.
            let query = job.prepare()?;
            let client = BigQueryClient::connect(warehouse).await?;
            job.execute(query, &client, std::io::stdout()).await?;
        }
    }

    Ok(())
}
