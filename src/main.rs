use anyhow::Result;
use clap::Parser;
use expense_tracker::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    // Logs go to stderr so reports written to stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("expense_tracker={}", settings.log_level).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.run(settings).await
}
