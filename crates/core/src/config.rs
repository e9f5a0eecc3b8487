//! Pipeline configuration.
//!
//! Settings come from an optional TOML file in which every field has a
//! default; credentials come from the environment. Both are loaded once at
//! startup into a [`PipelineConfig`] that is passed down to each component.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! staging_dir = "pipeline/.preview"
//! components_dir = "generated-app/src/app/components"
//! routes_manifest = "generated-app/src/app/app.routes.ts"
//!
//! [dev_server]
//! url = "http://localhost:4200"
//! start_command = "npm start"
//!
//! [approval]
//! max_regenerations = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sketchport.toml";

pub const ENV_DESIGN_TOKEN: &str = "FIGMA_ACCESS_TOKEN";
pub const ENV_MODEL_API_KEY: &str = "IBM_GRANITE_API_KEY";
pub const ENV_MODEL_PROJECT_ID: &str = "IBM_GRANITE_PROJECT_ID";

/// Errors raised while assembling configuration. Always fatal, and always
/// raised before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("could not read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── File settings ────────────────────────────────────────────────────────────

/// Everything that can be set from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub paths: PathSettings,
    pub design: DesignSettings,
    pub generation: GenerationSettings,
    pub dev_server: DevServerSettings,
    pub approval: ApprovalSettings,
}

/// `[paths]`: filesystem layout of the pipeline and the target application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// Scratch area; one sub-directory per component.
    pub staging_dir: PathBuf,
    /// Live component tree of the target application.
    pub components_dir: PathBuf,
    /// Routing manifest edited on promotion.
    pub routes_manifest: PathBuf,
    /// Master brand stylesheet supplying the approved class list.
    pub brand_stylesheet: PathBuf,
    /// Global stylesheet of the target application (`sync-brand` target).
    pub app_stylesheet: PathBuf,
    /// Root of the target application; the dev server is started here.
    pub app_dir: PathBuf,
    /// Where `fetch` writes raw design exports.
    pub exports_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("pipeline/.preview"),
            components_dir: PathBuf::from("generated-app/src/app/components"),
            routes_manifest: PathBuf::from("generated-app/src/app/app.routes.ts"),
            brand_stylesheet: PathBuf::from("pipeline/brand-css/brand.scss"),
            app_stylesheet: PathBuf::from("generated-app/src/styles.scss"),
            app_dir: PathBuf::from("generated-app"),
            exports_dir: PathBuf::from("design-exports"),
        }
    }
}

/// `[design]`: the design API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignSettings {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.figma.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[generation]`: identity endpoint and hosted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub iam_endpoint: String,
    pub model_id: String,
    pub timeout_secs: u64,
    pub token_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://us-south.ml.cloud.ibm.com/ml/v1/text/chat?version=2023-05-29"
                .to_string(),
            iam_endpoint: "https://iam.cloud.ibm.com/identity/token".to_string(),
            model_id: "ibm/granite-3-8b-instruct".to_string(),
            timeout_secs: 180,
            token_timeout_secs: 30,
        }
    }
}

/// `[dev_server]`: local preview server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevServerSettings {
    pub url: String,
    pub start_command: String,
    pub poll_interval_secs: u64,
    pub startup_timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for DevServerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:4200".to_string(),
            start_command: "npm start".to_string(),
            poll_interval_secs: 2,
            startup_timeout_secs: 120,
            probe_timeout_secs: 2,
        }
    }
}

impl DevServerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// `[approval]`: the human review loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApprovalSettings {
    /// Consecutive regenerate choices allowed before the run fails.
    pub max_regenerations: u32,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            max_regenerations: 3,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_CONFIG_FILE`] in the
    /// working directory when present, or fall back to defaults.
    ///
    /// Relative paths are resolved against the directory holding the file
    /// (the working directory when no file is used).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_file = PathBuf::from(DEFAULT_CONFIG_FILE);
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None if default_file.is_file() => Some(default_file),
            None => None,
        };

        match file {
            Some(file) => {
                let content = std::fs::read_to_string(&file).map_err(|source| {
                    ConfigError::Read {
                        path: file.clone(),
                        source,
                    }
                })?;
                let base = file
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Self::from_toml_str(&content, &base).map_err(|e| match e {
                    ConfigError::Parse { source, .. } => ConfigError::Parse { path: file, source },
                    other => other,
                })
            }
            None => {
                let mut settings = Settings::default();
                settings.validate()?;
                settings.resolve_paths(Path::new("."));
                Ok(settings)
            }
        }
    }

    /// Parse TOML settings and resolve relative paths against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut settings: Settings =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        settings.validate()?;
        settings.resolve_paths(base_dir);
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dev_server.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "dev_server.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.approval.max_regenerations == 0 {
            return Err(ConfigError::Invalid(
                "approval.max_regenerations must be at least 1".to_string(),
            ));
        }
        if self.dev_server.start_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "dev_server.start_command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let p = &mut self.paths;
        for path in [
            &mut p.staging_dir,
            &mut p.components_dir,
            &mut p.routes_manifest,
            &mut p.brand_stylesheet,
            &mut p.app_stylesheet,
            &mut p.app_dir,
            &mut p.exports_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// Secrets for the design API and the model host.
#[derive(Clone)]
pub struct Credentials {
    pub design_token: String,
    pub model_api_key: String,
    pub model_project_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("design_token", &"<redacted>")
            .field("model_api_key", &"<redacted>")
            .field("model_project_id", &self.model_project_id)
            .finish()
    }
}

impl Credentials {
    /// Read all credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read all credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            design_token: design_token_from_lookup(&lookup)?,
            model_api_key: required(&lookup, ENV_MODEL_API_KEY)?,
            model_project_id: required(&lookup, ENV_MODEL_PROJECT_ID)?,
        })
    }
}

/// Read only the design API token (all `fetch` needs).
pub fn design_token_from_lookup<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    required(&lookup, ENV_DESIGN_TOKEN)
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

// ── Assembled config ─────────────────────────────────────────────────────────

/// Settings plus credentials; constructed once per process.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub settings: Settings,
    pub credentials: Credentials,
}

impl PipelineConfig {
    pub fn new(settings: Settings, credentials: Credentials) -> Self {
        Self {
            settings,
            credentials,
        }
    }
}
