use std::path::Path;

use anyhow::Context;
use sketchport_core::brand::sync_brand_stylesheet;

use crate::OutputFormat;

pub(crate) fn cmd_sync_brand(
    config: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let paths = &settings.paths;

    let report = sync_brand_stylesheet(&paths.brand_stylesheet, &paths.app_stylesheet)
        .context("brand stylesheet sync failed")?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if !quiet {
                println!(
                    "Synced {} -> {}",
                    report.source.display(),
                    report.destination.display()
                );
                println!(
                    "  {} bytes, ~{} class definitions",
                    report.size_bytes, report.class_definitions
                );
            }
        }
    }
    Ok(())
}
