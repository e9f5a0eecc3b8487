//! Component naming: one kebab-case name drives the directory, the file
//! names, the selector, the route path and the exported class symbol.

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// A validated kebab-case component name such as `hero-banner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName(String);

/// The three generated files, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentFile {
    Script,
    Markup,
    Stylesheet,
}

impl ComponentFile {
    pub const ALL: [ComponentFile; 3] = [
        ComponentFile::Script,
        ComponentFile::Markup,
        ComponentFile::Stylesheet,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ComponentFile::Script => "ts",
            ComponentFile::Markup => "html",
            ComponentFile::Stylesheet => "scss",
        }
    }
}

impl ComponentName {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let invalid = |reason: &str| PipelineError::InvalidComponentName {
            name: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("name is empty"));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("use lowercase letters, digits and '-' only"));
        }
        if !raw.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(invalid("must start with a letter"));
        }
        if raw.ends_with('-') || raw.contains("--") {
            return Err(invalid("hyphens must separate words"));
        }
        Ok(ComponentName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exported class symbol: `hero-banner` → `HeroBannerComponent`.
    pub fn class_name(&self) -> String {
        let mut out: String = self.0.split('-').map(capitalize).collect();
        out.push_str("Component");
        out
    }

    /// File name for one of the generated files, e.g. `hero-banner.component.ts`.
    pub fn file_name(&self, file: ComponentFile) -> String {
        format!("{}.component.{}", self.0, file.extension())
    }

    /// Module path used by the routing manifest import.
    pub fn import_path(&self) -> String {
        format!("./components/{0}/{0}.component", self.0)
    }
}

impl FromStr for ComponentName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentName::parse(s)
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name() {
        let name = ComponentName::parse("hero-banner").unwrap();
        assert_eq!(name.class_name(), "HeroBannerComponent");

        let name = ComponentName::parse("demo-v2").unwrap();
        assert_eq!(name.class_name(), "DemoV2Component");

        let name = ComponentName::parse("track").unwrap();
        assert_eq!(name.class_name(), "TrackComponent");
    }

    #[test]
    fn test_file_names() {
        let name = ComponentName::parse("hero-banner").unwrap();
        assert_eq!(name.file_name(ComponentFile::Script), "hero-banner.component.ts");
        assert_eq!(name.file_name(ComponentFile::Markup), "hero-banner.component.html");
        assert_eq!(
            name.file_name(ComponentFile::Stylesheet),
            "hero-banner.component.scss"
        );
        assert_eq!(
            name.import_path(),
            "./components/hero-banner/hero-banner.component"
        );
    }

    #[test]
    fn test_rejects_bad_names() {
        for bad in ["", "Hero", "hero_banner", "../etc", "-hero", "hero-", "hero--x", "9lives"] {
            assert!(
                ComponentName::parse(bad).is_err(),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_from_str() {
        let name: ComponentName = "home-page-test".parse().unwrap();
        assert_eq!(name.to_string(), "home-page-test");
    }
}
