mod commands;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Format of log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Generate Angular components from design nodes with a hosted model.
#[derive(Parser)]
#[command(
    name = "sketchport",
    version,
    about = "Generate Angular components from design nodes with a hosted model"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output and lower logging to warnings
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log line format on stderr
    #[arg(long, global = true, default_value = "text", value_enum)]
    log_format: LogFormat,

    /// Settings file (defaults to ./sketchport.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, publish and review a component from a design node
    Run {
        /// Design file key (from the file URL)
        file_key: String,
        /// Node id, hyphenated (261-1272) or colon-delimited (261:1272)
        node_id: String,
        /// Kebab-case component name, e.g. hero-banner
        component_name: String,
        /// Consecutive regenerate choices allowed before giving up
        #[arg(long)]
        max_regenerations: Option<u32>,
    },

    /// Download raw design JSON for a file or a single node
    Fetch {
        /// Design file key
        file_key: String,
        /// Node id; omit to export the whole file
        node_id: Option<String>,
        /// Output directory (defaults to paths.exports_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Copy the master brand stylesheet into the application's global styles
    SyncBrand,

    /// Check a template's classes against the brand stylesheet
    Check {
        /// Path to the component template (.html)
        template: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.log_format);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run {
            file_key,
            node_id,
            component_name,
            max_regenerations,
        } => commands::run::cmd_run(
            commands::run::RunArgs {
                file_key,
                node_id,
                component_name,
                max_regenerations,
            },
            config,
            cli.output,
        ),
        Commands::Fetch {
            file_key,
            node_id,
            out,
        } => commands::fetch::cmd_fetch(
            &file_key,
            node_id.as_deref(),
            out.as_deref(),
            config,
            cli.output,
            cli.quiet,
        ),
        Commands::SyncBrand => commands::sync_brand::cmd_sync_brand(config, cli.output, cli.quiet),
        Commands::Check { template } => {
            commands::check::cmd_check(&template, config, cli.output, cli.quiet)
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        report_error(&format!("error: {:?}", e), cli.output, cli.quiet);
        process::exit(1);
    }
}

/// Print an error to stderr in the selected output format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet && output == OutputFormat::Text {
        eprintln!("{}", msg.lines().next().unwrap_or(msg));
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
