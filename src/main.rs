use anyhow::Result;
use clap::Parser;
use instarelay::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file before anything else (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli_args = cli::Cli::parse();

    cli::run(cli_args).await
}
