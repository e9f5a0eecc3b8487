//! stderr logging setup.

use tracing_subscriber::EnvFilter;

use crate::LogFormat;

/// Install the global subscriber. `RUST_LOG` wins over the flags.
pub(crate) fn init(verbose: bool, quiet: bool, format: LogFormat) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
