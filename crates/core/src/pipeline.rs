//! End-to-end run: design in, reviewed component out.
//!
//! The design node and brand stylesheet are fetched once. Each round then
//! builds the prompt, generates, parses, patches, validates, stages,
//! promotes, registers the route, opens a preview and asks for a decision.
//! Regenerate cleans up and starts a new round; the loop is bounded by
//! `approval.max_regenerations`.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::approval::{prompt_for_decision, ApprovalDecision};
use crate::auth::{CachedTokenSource, IamTokenClient, TokenSource};
use crate::brand::BrandStyleSet;
use crate::component::ComponentName;
use crate::config::{PipelineConfig, Settings};
use crate::design::{DesignNode, DesignSource, FigmaClient};
use crate::devserver::{DevServer, PreviewHost};
use crate::error::PipelineError;
use crate::generation::{CodeGenerator, GraniteClient};
use crate::parse::parse;
use crate::patcher::patch_properties;
use crate::prompt::build_prompt;
use crate::publish::{Publisher, StagedFile};
use crate::remover::RetryingRemover;
use crate::routes::{self, RouteChanges};
use crate::validate::{validate, ValidationReport};

/// What to generate.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub file_key: String,
    pub node_id: String,
    pub component: ComponentName,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Files and route stay in place.
    Accepted { location: PathBuf, rounds: u32 },
    /// Files and route were removed.
    Rejected { rounds: u32 },
}

pub struct Pipeline {
    settings: Settings,
    design: Box<dyn DesignSource>,
    tokens: Box<dyn TokenSource>,
    generator: Box<dyn CodeGenerator>,
    preview: Box<dyn PreviewHost>,
    publisher: Publisher,
}

impl Pipeline {
    pub fn new(
        settings: Settings,
        design: Box<dyn DesignSource>,
        tokens: Box<dyn TokenSource>,
        generator: Box<dyn CodeGenerator>,
        preview: Box<dyn PreviewHost>,
        publisher: Publisher,
    ) -> Self {
        Self {
            settings,
            design,
            tokens,
            generator,
            preview,
            publisher,
        }
    }

    /// Production wiring: HTTP clients, cached identity tokens, the local dev
    /// server and the retrying remover.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let settings = config.settings.clone();
        let creds = &config.credentials;

        let design = FigmaClient::new(&settings.design, creds.design_token.clone());
        let tokens = CachedTokenSource::new(IamTokenClient::new(
            &settings.generation,
            creds.model_api_key.clone(),
        ));
        let generator = GraniteClient::new(&settings.generation, creds.model_project_id.clone());
        let preview = DevServer::from_settings(&settings.dev_server, settings.paths.app_dir.clone());
        let publisher = Publisher::new(
            settings.paths.staging_dir.clone(),
            settings.paths.components_dir.clone(),
            Box::new(RetryingRemover::default()),
        );

        Self::new(
            settings,
            Box::new(design),
            Box::new(tokens),
            Box::new(generator),
            Box::new(preview),
            publisher,
        )
    }

    /// Run until the reviewer accepts or rejects, or the regeneration cap is
    /// hit. Prompts and summaries go to `writer`; choices come from `reader`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        request: &RunRequest,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<RunOutcome, PipelineError> {
        let component = &request.component;
        tracing::info!(
            file_key = %request.file_key,
            node_id = %request.node_id,
            component = %component,
            "pipeline started"
        );

        let node = self.design.fetch_node(&request.file_key, &request.node_id)?;
        let styles = BrandStyleSet::load(&self.settings.paths.brand_stylesheet)?;
        let limit = self.settings.approval.max_regenerations;

        let mut regenerations = 0u32;
        loop {
            let round = regenerations + 1;
            tracing::info!(round, "generation round");

            let changes = self.generate_and_publish(&node, &styles, component, writer)?;

            match prompt_for_decision(reader, writer)? {
                ApprovalDecision::Accept => {
                    let location = self.publisher.promoted_dir(component);
                    say(
                        writer,
                        &format!(
                            "Component accepted: {}\nRoute: {}/{}",
                            location.display(),
                            self.settings.dev_server.url.trim_end_matches('/'),
                            component
                        ),
                    )?;
                    tracing::info!(component = %component, round, "component accepted");
                    return Ok(RunOutcome::Accepted {
                        location,
                        rounds: round,
                    });
                }
                ApprovalDecision::Reject => {
                    self.discard(component, changes)?;
                    say(writer, "Component rejected and cleaned up.")?;
                    tracing::info!(component = %component, round, "component rejected");
                    return Ok(RunOutcome::Rejected { rounds: round });
                }
                ApprovalDecision::Regenerate => {
                    self.discard(component, changes)?;
                    regenerations += 1;
                    if regenerations >= limit {
                        return Err(PipelineError::RegenerationLimitExceeded { limit });
                    }
                    say(writer, "Regenerating component...")?;
                }
            }
        }
    }

    /// One round from prompt to preview. Returns what the round added to the
    /// routing manifest.
    fn generate_and_publish<W: Write>(
        &self,
        node: &DesignNode,
        styles: &BrandStyleSet,
        component: &ComponentName,
        writer: &mut W,
    ) -> Result<RouteChanges, PipelineError> {
        let prompt = build_prompt(node, styles, component);
        tracing::debug!(chars = prompt.chars().count(), "prompt built");

        let token = self.tokens.access_token()?;
        let raw = self.generator.generate(&prompt, &token)?;

        let mut artifact = parse(&raw);
        artifact.script = patch_properties(&artifact.script, &artifact.markup);
        let report = validate(&artifact.markup, styles);

        let staged = self.publisher.stage(component, &artifact)?;
        write_summary(writer, component, &staged, &report)?;

        self.publisher.promote(component)?;
        let changes = routes::update_routes(&self.settings.paths.routes_manifest, component)?;

        if self.preview.ensure_running() {
            self.preview.open_preview(component);
        } else {
            say(writer, "Preview unavailable; files are saved.")?;
        }
        Ok(changes)
    }

    /// Undo promotion: remove the component directory, then take back the
    /// round's manifest changes.
    fn discard(
        &self,
        component: &ComponentName,
        changes: RouteChanges,
    ) -> Result<(), PipelineError> {
        self.publisher.unpromote(component)?;
        routes::revert_routes(&self.settings.paths.routes_manifest, component, changes)?;
        Ok(())
    }
}

fn say<W: Write>(writer: &mut W, line: &str) -> Result<(), PipelineError> {
    writeln!(writer, "{}", line).map_err(|e| PipelineError::io("<stdout>", e))
}

/// Human-readable recap of what was staged and how it validated.
pub fn write_summary<W: Write>(
    writer: &mut W,
    component: &ComponentName,
    staged: &[StagedFile],
    report: &ValidationReport,
) -> Result<(), PipelineError> {
    let mut text = format!("\nPreview: {}\n", component);
    for file in staged {
        text.push_str(&format!(
            "  {} ({} bytes)\n",
            file.path.display(),
            file.size_bytes
        ));
    }
    if report.is_valid {
        text.push_str(&format!(
            "Classes: {} used, all approved\n",
            report.total_classes
        ));
    } else {
        text.push_str(&format!(
            "Classes: {} used, {} approved, {} not approved: {}\n",
            report.total_classes,
            report.approved_count,
            report.violations.len(),
            report.violations.join(", ")
        ));
    }
    write!(writer, "{}", text).map_err(|e| PipelineError::io("<stdout>", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_files_and_violations() {
        let component = ComponentName::parse("hero-banner").unwrap();
        let staged = vec![StagedFile {
            path: PathBuf::from("staging/hero-banner/hero-banner.component.ts"),
            size_bytes: 42,
        }];
        let report = ValidationReport {
            total_classes: 3,
            approved_count: 1,
            violations: vec!["py-2".to_string(), "text-lg".to_string()],
            is_valid: false,
        };

        let mut out = Vec::new();
        write_summary(&mut out, &component, &staged, &report).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Preview: hero-banner"));
        assert!(text.contains("hero-banner.component.ts (42 bytes)"));
        assert!(text.contains("2 not approved: py-2, text-lg"));
    }

    #[test]
    fn test_summary_all_approved() {
        let component = ComponentName::parse("card").unwrap();
        let report = ValidationReport {
            total_classes: 2,
            approved_count: 2,
            violations: vec![],
            is_valid: true,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &component, &[], &report).unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Classes: 2 used, all approved"));
    }
}
