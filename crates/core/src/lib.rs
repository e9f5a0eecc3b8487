#![allow(clippy::result_large_err)]
//! sketchport-core: design-to-component generation pipeline.
//!
//! Fetches a design node, asks a hosted model for an Angular standalone
//! component, repairs and checks the result, publishes it into a target
//! application and drives a human accept/reject/regenerate loop.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Pipeline`] -- the full run, with [`RunRequest`] and [`RunOutcome`]
//! - [`PipelineConfig`], [`Settings`], [`Credentials`] -- startup configuration
//! - [`PipelineError`], [`ConfigError`] -- error types
//! - [`ComponentName`] -- validated component identifier
//!
//! The individual steps (prompt building, parsing, patching, validation,
//! route editing) are plain functions in their modules and can be used on
//! their own.

pub mod approval;
pub mod auth;
pub mod brand;
pub mod component;
pub mod config;
pub mod design;
pub mod devserver;
pub mod error;
pub mod generation;
mod http;
pub mod markup;
pub mod parse;
pub mod patcher;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod remover;
pub mod routes;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use brand::BrandStyleSet;
pub use component::ComponentName;
pub use config::{ConfigError, Credentials, PipelineConfig, Settings};
pub use error::PipelineError;
pub use parse::GeneratedArtifact;
pub use pipeline::{Pipeline, RunOutcome, RunRequest};
pub use validate::ValidationReport;

// ── Convenience re-exports: step entry points ────────────────────────

pub use parse::parse;
pub use patcher::patch_properties;
pub use prompt::build_prompt;
pub use routes::{revert_routes, update_routes, RouteChanges};
pub use validate::validate;
