use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::Context;
use sketchport_core::{
    ComponentName, Credentials, Pipeline, PipelineConfig, RunOutcome, RunRequest,
};

use crate::OutputFormat;

pub(crate) struct RunArgs {
    pub file_key: String,
    pub node_id: String,
    pub component_name: String,
    pub max_regenerations: Option<u32>,
}

/// Validate inputs, then run the pipeline on a blocking thread raced against
/// Ctrl-C. An interrupt exits 0 and leaves everything as it is.
pub(crate) fn cmd_run(
    args: RunArgs,
    config: Option<&Path>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let component = ComponentName::parse(&args.component_name)?;

    let mut settings = super::load_settings(config)?;
    if let Some(n) = args.max_regenerations {
        anyhow::ensure!(n > 0, "--max-regenerations must be at least 1");
        settings.approval.max_regenerations = n;
    }
    let credentials = Credentials::from_env().context("missing credentials")?;
    let config = PipelineConfig::new(settings, credentials);

    let request = RunRequest {
        file_key: args.file_key,
        node_id: args.node_id,
        component,
    };

    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    let finished = rt.block_on(async move {
        let work = tokio::task::spawn_blocking(move || {
            let pipeline = Pipeline::from_config(&config);
            let stdin = io::stdin();
            let mut reader = stdin.lock();
            let mut writer = Console::for_output(output).writer();
            pipeline.run(&request, &mut reader, &mut writer)
        });

        tokio::select! {
            joined = work => Some(joined),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    let Some(joined) = finished else {
        eprintln!("\nInterrupted.");
        tracing::warn!("pipeline interrupted by user");
        process::exit(0);
    };

    let outcome = joined.context("pipeline task panicked")??;
    report_outcome(&outcome, output);
    Ok(())
}

/// Where the approval menu and preview summaries are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Console {
    Stdout,
    Stderr,
}

impl Console {
    /// JSON mode keeps stdout for the outcome document alone.
    fn for_output(output: OutputFormat) -> Self {
        match output {
            OutputFormat::Text => Console::Stdout,
            OutputFormat::Json => Console::Stderr,
        }
    }

    fn writer(self) -> Box<dyn Write> {
        match self {
            Console::Stdout => Box::new(io::stdout()),
            Console::Stderr => Box::new(io::stderr()),
        }
    }
}

fn report_outcome(outcome: &RunOutcome, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let value = match outcome {
                RunOutcome::Accepted { location, rounds } => serde_json::json!({
                    "status": "accepted",
                    "location": location.display().to_string(),
                    "rounds": rounds,
                }),
                RunOutcome::Rejected { rounds } => serde_json::json!({
                    "status": "rejected",
                    "rounds": rounds,
                }),
            };
            println!("{}", value);
        }
        OutputFormat::Text => {
            tracing::info!(?outcome, "pipeline complete");
        }
    }
}
