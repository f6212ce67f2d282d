mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use scrub_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so redacted output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Redact {
            roster,
            input,
            output,
            report,
            placeholder,
            policy,
        } => {
            let config = commands::with_overrides(config, placeholder, policy)?;
            commands::redact::handle(&config, &roster, &input, output.as_deref(), report.as_deref())
                .await
        }
        cli::Commands::Check {
            text,
            roster,
            placeholder,
        } => {
            let config = commands::with_overrides(config, placeholder, None)?;
            commands::check::handle(&config, roster.as_deref(), &text).await
        }
        cli::Commands::Config => commands::show_config(&config, cli.config.as_deref()),
    }
}
