use std::path::PathBuf;

use crate::config::ConfigError;

/// All errors that can abort a pipeline run.
///
/// Recoverable conditions (locked directories, missing manifest markers,
/// a dev server that never comes up, bad approval input) are handled where
/// they occur and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The design API answered with a non-success status, the transport
    /// failed, or the requested node was absent from the response.
    #[error("design fetch failed: {0}")]
    RemoteFetch(String),

    /// The identity endpoint refused to issue an access token.
    #[error("access token request failed: {0}")]
    Auth(String),

    /// The model endpoint failed or returned no content.
    #[error("code generation failed: {0}")]
    Generation(String),

    /// Required configuration was missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The component name cannot be used as a directory, selector and route.
    #[error("invalid component name '{name}': {reason}")]
    InvalidComponentName { name: String, reason: String },

    /// The user asked for more regenerations than the configured cap.
    #[error("regeneration limit exceeded: gave up after {limit} regenerate choice(s)")]
    RegenerationLimitExceeded { limit: u32 },

    /// Standard input closed while waiting for an approval decision.
    #[error("input closed while waiting for an approval decision")]
    InputClosed,

    /// A filesystem operation failed outside the handled lock cases.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
