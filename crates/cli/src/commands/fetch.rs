use std::path::Path;

use anyhow::Context;
use sketchport_core::config::design_token_from_lookup;
use sketchport_core::design::{write_export, FigmaClient};
use time::OffsetDateTime;

use crate::OutputFormat;

pub(crate) fn cmd_fetch(
    file_key: &str,
    node_id: Option<&str>,
    out: Option<&Path>,
    config: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let token =
        design_token_from_lookup(|key| std::env::var(key).ok()).context("missing credentials")?;

    let client = FigmaClient::new(&settings.design, token);
    let data = client
        .fetch_raw(file_key, node_id)
        .with_context(|| format!("failed to fetch design file {}", file_key))?;

    let dir = out.unwrap_or(settings.paths.exports_dir.as_path());
    let summary = write_export(dir, file_key, node_id, &data, OffsetDateTime::now_utc())?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            if !quiet {
                println!("Saved: {}", summary.path.display());
                println!("  File name:     {}", summary.name.as_deref().unwrap_or("-"));
                println!(
                    "  Last modified: {}",
                    summary.last_modified.as_deref().unwrap_or("-")
                );
                println!("  Version:       {}", summary.version.as_deref().unwrap_or("-"));
                println!("  Size:          {:.2} KB", summary.size_bytes as f64 / 1024.0);
            }
        }
    }
    Ok(())
}
