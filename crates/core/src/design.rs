//! Design API access: fetch a node subtree, or export raw design JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use time::OffsetDateTime;

use crate::config::DesignSettings;
use crate::error::PipelineError;
use crate::http;

/// An opaque design subtree (`id`, `type`, nested `children`, ...).
///
/// Only ever consumed as serialized text, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignNode(Value);

impl DesignNode {
    pub fn new(value: Value) -> Self {
        DesignNode(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// Anything that can produce a design node for a file key and node id.
pub trait DesignSource {
    fn fetch_node(&self, file_key: &str, node_id: &str) -> Result<DesignNode, PipelineError>;
}

/// Node ids appear hyphenated in share URLs (`261-1272`) but the API
/// expects them colon-delimited (`261:1272`).
pub fn api_node_id(node_id: &str) -> String {
    node_id.replace('-', ":")
}

/// Pull `nodes[<id>].document` out of a nodes-endpoint response body.
pub fn extract_document(mut body: Value, api_node_id: &str) -> Result<DesignNode, PipelineError> {
    body.get_mut("nodes")
        .and_then(|nodes| nodes.get_mut(api_node_id))
        .and_then(|node| node.get_mut("document"))
        .filter(|doc| !doc.is_null())
        .map(|doc| DesignNode(doc.take()))
        .ok_or_else(|| {
            PipelineError::RemoteFetch(format!("node {} not found in design file", api_node_id))
        })
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Blocking client for the Figma REST API.
pub struct FigmaClient {
    api_base: String,
    token: String,
    agent: ureq::Agent,
}

impl FigmaClient {
    pub fn new(settings: &DesignSettings, token: String) -> Self {
        Self {
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token,
            agent: http::agent(Duration::from_secs(settings.timeout_secs)),
        }
    }

    /// Fetch the raw response for a whole file, or for one node of it.
    pub fn fetch_raw(&self, file_key: &str, node_id: Option<&str>) -> Result<Value, PipelineError> {
        let request = match node_id {
            Some(id) => self
                .agent
                .get(format!("{}/files/{}/nodes", self.api_base, file_key))
                .query("ids", api_node_id(id)),
            None => self.agent.get(format!("{}/files/{}", self.api_base, file_key)),
        };

        let response = request
            .header("X-Figma-Token", &self.token)
            .call()
            .map_err(|e| PipelineError::RemoteFetch(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = http::error_body(response, 300);
            return Err(PipelineError::RemoteFetch(format!(
                "design API returned {}{}: {}",
                code,
                status_hint(code),
                body
            )));
        }

        response
            .into_body()
            .read_json::<Value>()
            .map_err(|e| PipelineError::RemoteFetch(format!("invalid JSON response: {}", e)))
    }
}

impl DesignSource for FigmaClient {
    fn fetch_node(&self, file_key: &str, node_id: &str) -> Result<DesignNode, PipelineError> {
        let body = self.fetch_raw(file_key, Some(node_id))?;
        let node = extract_document(body, &api_node_id(node_id))?;
        tracing::info!(node_id, "fetched design node");
        Ok(node)
    }
}

fn status_hint(code: u16) -> &'static str {
    match code {
        404 => " (file or node not found; check the file key and node id)",
        403 => " (access denied; check the design API token and file permissions)",
        _ => "",
    }
}

// ── Raw export ───────────────────────────────────────────────────────────────

/// What `fetch` reports after writing an export.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub name: Option<String>,
    pub last_modified: Option<String>,
    pub version: Option<String>,
    pub size_bytes: u64,
}

/// Write `data` pretty-printed into `dir` under a timestamped file name.
pub fn write_export(
    dir: &Path,
    file_key: &str,
    node_id: Option<&str>,
    data: &Value,
    now: OffsetDateTime,
) -> Result<ExportSummary, PipelineError> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let path = dir.join(export_file_name(file_key, node_id, now));
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    std::fs::write(&path, &pretty).map_err(|e| PipelineError::io(&path, e))?;

    let field = |key: &str| {
        data.get(key).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
    };

    Ok(ExportSummary {
        name: field("name"),
        last_modified: field("lastModified"),
        version: field("version"),
        size_bytes: pretty.len() as u64,
        path,
    })
}

fn export_file_name(file_key: &str, node_id: Option<&str>, now: OffsetDateTime) -> String {
    let stamp = now
        .format(time::macros::format_description!(
            "[year]-[month]-[day]T[hour]-[minute]-[second]"
        ))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    match node_id {
        Some(id) => format!(
            "figma-{}-node-{}-{}.json",
            file_key,
            id.replace(':', "-"),
            stamp
        ),
        None => format!("figma-{}-full-{}.json", file_key, stamp),
    }
}
