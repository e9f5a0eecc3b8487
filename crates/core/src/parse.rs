//! Split raw model output into the three component files.

use crate::prompt::{MARKUP_FENCE, SCRIPT_FENCE, STYLESHEET_FENCE};

/// The three generated files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub script: String,
    pub markup: String,
    pub stylesheet: String,
}

impl GeneratedArtifact {
    pub fn is_empty(&self) -> bool {
        self.script.is_empty() && self.markup.is_empty() && self.stylesheet.is_empty()
    }
}

/// Extract the first block of each kind. A missing block leaves its slot
/// empty; downstream steps must cope with empty files.
pub fn parse(raw: &str) -> GeneratedArtifact {
    let artifact = GeneratedArtifact {
        script: fenced_block(raw, SCRIPT_FENCE).unwrap_or_default(),
        markup: fenced_block(raw, MARKUP_FENCE).unwrap_or_default(),
        stylesheet: fenced_block(raw, STYLESHEET_FENCE).unwrap_or_default(),
    };

    for (slot, body) in [
        ("script", &artifact.script),
        ("markup", &artifact.markup),
        ("stylesheet", &artifact.stylesheet),
    ] {
        if body.is_empty() {
            tracing::warn!(slot, "generated output has no {} block", slot);
        }
    }
    artifact
}

/// Body of the first block opened by `fence` followed by a newline, up to
/// the nearest closing fence, trimmed.
fn fenced_block(raw: &str, fence: &str) -> Option<String> {
    let opener = format!("{}\n", fence);
    let start = raw.find(&opener)? + opener.len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim().to_string())
}
