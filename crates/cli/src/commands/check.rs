use std::path::Path;
use std::process;

use anyhow::Context;
use sketchport_core::{validate, BrandStyleSet};

use crate::OutputFormat;

/// Validate an existing template. Exits 1 when unapproved classes are found.
pub(crate) fn cmd_check(
    template: &Path,
    config: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let settings = super::load_settings(config)?;
    let styles = BrandStyleSet::load(&settings.paths.brand_stylesheet)?;
    let markup = std::fs::read_to_string(template)
        .with_context(|| format!("failed to read template '{}'", template.display()))?;

    let report = validate(&markup, &styles);

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if !quiet {
                if report.is_valid {
                    println!(
                        "{}: {} classes, all approved",
                        template.display(),
                        report.total_classes
                    );
                } else {
                    println!(
                        "{}: {} of {} classes not approved",
                        template.display(),
                        report.violations.len(),
                        report.total_classes
                    );
                    for class in &report.violations {
                        println!("  {}", class);
                    }
                }
            }
        }
    }

    if !report.is_valid {
        process::exit(1);
    }
    Ok(())
}
