use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use scrub_config::Config;
use scrub_core::Post;
use scrub_engine::{RedactionReport, Scrubber};

use super::{load_roster, read_posts};

pub async fn handle(
    config: &Config,
    roster: &Path,
    input: &Path,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let roster = load_roster(roster)?;
    let posts = read_posts(input)?;
    tracing::info!(posts = posts.len(), roster = roster.len(), "Loaded input");

    let scrubber = Scrubber::new(roster, config);
    let (redacted, report) = scrubber.redact_posts(posts).await?;

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_posts(std::io::BufWriter::new(file), &redacted)?;
        }
        None => write_posts(std::io::stdout().lock(), &redacted)?,
    }

    match report_path {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(&report)?)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
        }
        None => print_summary(&report),
    }

    Ok(())
}

fn write_posts<W: Write>(mut out: W, posts: &[Post]) -> Result<()> {
    for post in posts {
        serde_json::to_writer(&mut out, post)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn print_summary(report: &RedactionReport) {
    eprintln!("✓ Redacted {} of {} posts", report.posts_out, report.posts_in);
    eprintln!("  Nodes: {}", report.nodes);
    eprintln!("  Fields: {}", report.fields);
    eprintln!("  Names redacted: {}", report.names_redacted);
    if report.degraded_fields > 0 {
        eprintln!("  Fields without recognizer: {}", report.degraded_fields);
    }
    if !report.skipped.is_empty() {
        eprintln!("  Skipped ({}):", report.skipped.len());
        for skipped in &report.skipped {
            eprintln!("    {}: {}", skipped.post_id, skipped.reason);
        }
    }
    eprintln!("  Roster: {}", &report.roster_fingerprint[..12.min(report.roster_fingerprint.len())]);
    eprintln!("  Exclusions: {}", report.exclusions_version);
}
