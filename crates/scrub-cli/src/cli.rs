use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use scrub_config::FailurePolicy;

#[derive(Parser)]
#[command(name = "scrub")]
#[command(about = "Redact person names from course forum threads", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "SCRUB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Redact a file of posts (JSON lines or a JSON array)
    Redact {
        /// Roster file: [{"name": ..}] or {"id": "name"}
        #[arg(long)]
        roster: PathBuf,

        /// Posts to redact
        #[arg(long)]
        input: PathBuf,

        /// Where to write redacted posts as JSON lines (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Where to write the JSON report (default: summary on stderr)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Override the configured placeholder
        #[arg(long)]
        placeholder: Option<String>,

        /// Override the configured failure policy
        #[arg(long, value_enum)]
        policy: Option<Policy>,
    },

    /// Redact a single piece of text and print it
    Check {
        /// Text to redact
        text: String,

        /// Roster file; without one only recognizer names are redacted
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Override the configured placeholder
        #[arg(long)]
        placeholder: Option<String>,
    },

    /// Show the active configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Policy {
    Abort,
    Skip,
}

impl From<Policy> for FailurePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Abort => FailurePolicy::Abort,
            Policy::Skip => FailurePolicy::Skip,
        }
    }
}
