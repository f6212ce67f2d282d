use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use scrub_config::Config;
use scrub_engine::redactor_options;
use scrub_security::{NameRedactor, RosterIndex};

use super::load_roster;

pub async fn handle(config: &Config, roster: Option<&Path>, text: &str) -> Result<()> {
    let roster = match roster {
        Some(path) => load_roster(path)?,
        None => Arc::new(RosterIndex::empty()),
    };

    let redactor = NameRedactor::new(roster, redactor_options(config));
    let result = redactor.redact(text).await?;

    println!("{}", result.text);
    eprintln!("  Names redacted: {}", result.names);
    if result.degraded {
        eprintln!("  Recognizer unavailable; roster names only");
    }

    Ok(())
}
