//! Declarative metadata providers.
//!
//! A provider is a JSON definition describing an ordered chain of HTTP calls
//! and an output shape. This module holds everything needed to run one:
//!
//! - [`definition`] -- the definition data model and file parsing.
//! - [`template`] -- placeholder substitution over the run environment.
//! - [`extract`] -- query-path extraction from response bodies.
//! - [`engine`] -- the endpoint pipeline interpreter.
//! - [`render`] -- JSON/XML output rendering.
//! - [`provider`] -- chapter sources and the multi-source merge.
//! - [`registry`] -- the concurrent, hot-reloadable provider registry.

pub mod definition;
pub mod engine;
pub mod extract;
pub mod provider;
pub mod registry;
pub mod render;
pub mod template;

pub use definition::{Endpoint, Output, Provider};
pub use engine::{
    build_env, Engine, EngineConfig, Inputs, PlaceholderPolicy, DEFAULT_REQUEST_TIMEOUT,
};
pub use extract::extract;
pub use provider::{merged_chapter, ChapterProvider, DeclarativeProvider};
pub use registry::{LoadMode, LoadOutcome, ProviderRegistry};
pub use render::{map_to_xml, render_projection, OutputFormat, Projection, Rendered};
pub use template::RunEnv;
