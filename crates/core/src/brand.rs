//! Brand stylesheet: the whitelist of class names generated markup may use.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::PipelineError;

/// Approved class names plus the stylesheet they came from. Loaded once per
/// run and never modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandStyleSet {
    classes: BTreeSet<String>,
    raw_css: String,
}

fn class_selector() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.(-?[_a-zA-Z][_a-zA-Z0-9-]*)").expect("class selector pattern is valid")
    })
}

impl BrandStyleSet {
    /// Every `.class` selector in `css`, collapsed into a set.
    pub fn from_css(css: &str) -> Self {
        let classes = class_selector()
            .captures_iter(css)
            .map(|c| c[1].to_string())
            .collect();
        Self {
            classes,
            raw_css: css.to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let css = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let set = Self::from_css(&css);
        tracing::info!(
            path = %path.display(),
            classes = set.len(),
            "brand stylesheet loaded"
        );
        Ok(set)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Approved class names in sorted order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn class_set(&self) -> &BTreeSet<String> {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn raw_css(&self) -> &str {
        &self.raw_css
    }
}

// ── Stylesheet sync ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: usize,
    /// Rough count: lines that open with a class selector.
    pub class_definitions: usize,
}

/// Copy the master brand stylesheet over the application's global
/// stylesheet, then read the copy back and compare.
pub fn sync_brand_stylesheet(source: &Path, destination: &Path) -> Result<SyncReport, PipelineError> {
    let content = std::fs::read_to_string(source).map_err(|e| PipelineError::io(source, e))?;
    if content.trim().is_empty() {
        return Err(PipelineError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "brand stylesheet is empty"),
        ));
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(destination, &content).map_err(|e| PipelineError::io(destination, e))?;

    let written =
        std::fs::read_to_string(destination).map_err(|e| PipelineError::io(destination, e))?;
    if written != content {
        return Err(PipelineError::io(
            destination,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "verification failed: written stylesheet differs from source",
            ),
        ));
    }

    let class_definitions = content.lines().filter(|l| l.starts_with('.')).count();
    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        class_definitions,
        "brand stylesheet synced"
    );

    Ok(SyncReport {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        size_bytes: content.len(),
        class_definitions,
    })
}
