pub(crate) mod check;
pub(crate) mod fetch;
pub(crate) mod run;
pub(crate) mod sync_brand;

use std::path::Path;

use anyhow::Context;
use sketchport_core::Settings;

/// Load settings from `--config`, the default file, or built-in defaults.
pub(crate) fn load_settings(config: Option<&Path>) -> anyhow::Result<Settings> {
    Settings::load(config).context("failed to load settings")
}
