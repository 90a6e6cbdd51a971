//! Declarative provider definitions.
//!
//! A provider file describes one metadata source as an ordered list of HTTP
//! calls plus an output shape:
//!
//! ```json
//! {
//!   "id": "kitsu",
//!   "inputs": { "series": "{series}", "chapter": "{chapter}" },
//!   "envs": { "KITSU_TOKEN": "{token}" },
//!   "vars": { "{base}": "https://kitsu.io/api/edge" },
//!   "headers": { "Accept": "application/vnd.api+json" },
//!   "endpoints": [
//!     {
//!       "method": "GET",
//!       "url": "{base}/manga",
//!       "params": { "filter[text]": "{series}" },
//!       "result": { "{id}": "$.data[0].id" }
//!     }
//!   ],
//!   "output": { "type": "json", "content": { "Series": "{series}" } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;
use yuzu_common::paths::is_jsonc;
use yuzu_common::{Error, Result};

use super::render::OutputFormat;

/// A declarative metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Registry key. Must be non-empty.
    #[serde(default)]
    pub id: String,

    /// Caller-supplied field name -> placeholder token it binds.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,

    /// Process environment variable name -> placeholder token.
    #[serde(default)]
    pub envs: BTreeMap<String, String>,

    /// Static placeholder token -> literal value.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Headers sent with every endpoint call.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Prefix for endpoints that use `path` instead of a full `url`.
    #[serde(
        default,
        rename = "baseUrl",
        skip_serializing_if = "String::is_empty"
    )]
    pub base_url: String,

    /// Calls executed in order.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,

    #[serde(default)]
    pub output: Output,

    /// Informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,

    /// Placeholder -> value for every `envs` entry found at load time.
    #[serde(skip)]
    resolved_envs: BTreeMap<String, String>,
}

/// One HTTP call in a provider pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default = "default_method")]
    pub method: String,

    /// Full URL template.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// Path template appended to the provider's `baseUrl` when `url` is empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Query parameter name -> value template.
    #[serde(default, alias = "urlParams")]
    pub params: BTreeMap<String, String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Reserved; request bodies are never sent.
    #[serde(default, alias = "bodyParams", skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,

    /// Reserved; responses are never cached.
    #[serde(default)]
    pub cache: bool,

    /// New placeholder token -> query-path expression template.
    #[serde(default)]
    pub result: BTreeMap<String, String>,
}

/// Output shape of a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// `json` or `xml`; checked when rendering.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Reserved.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,

    /// Output field name -> value template.
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Endpoint {
    /// The URL template for this call, before substitution.
    pub fn url_template(&self, base_url: &str) -> String {
        if self.url.is_empty() {
            format!("{base_url}{}", self.path)
        } else {
            self.url.clone()
        }
    }

    /// Parsed HTTP method.
    pub fn http_method(&self) -> Result<Method> {
        Method::from_bytes(self.method.trim().to_uppercase().as_bytes())
            .map_err(|_| Error::Validation(format!("invalid HTTP method {:?}", self.method)))
    }
}

impl Provider {
    /// An empty definition with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Parse, validate and resolve envs for a definition.
    ///
    /// `origin` identifies the definition (usually its file path) in errors
    /// and log lines.
    pub fn from_slice(bytes: &[u8], origin: &str) -> Result<Self> {
        let mut provider: Provider = serde_json::from_slice(bytes)
            .map_err(|e| Error::definition(origin, format!("unmarshalling provider JSON: {e}")))?;
        provider.prepare(origin)?;
        Ok(provider)
    }

    /// Read and parse a definition file. `.jsonc` files may contain `//` and
    /// `/* */` comments.
    pub fn from_path(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::definition(&origin, format!("reading provider file: {e}")))?;

        if is_jsonc(path) {
            Self::from_slice(strip_json_comments(&text).as_bytes(), &origin)
        } else {
            Self::from_slice(text.as_bytes(), &origin)
        }
    }

    /// Validate the definition and resolve `envs` from the process
    /// environment.
    pub fn prepare(&mut self, origin: &str) -> Result<()> {
        self.validate()
            .map_err(|e| Error::definition(origin, e.to_string()))?;
        self.resolve_envs();
        Ok(())
    }

    /// Structural checks that do not depend on runtime values.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("config has no ID".into()));
        }
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            endpoint
                .http_method()
                .map_err(|e| Error::Validation(format!("endpoint {i}: {e}")))?;
            if endpoint.url.is_empty() && endpoint.path.is_empty() && self.base_url.is_empty() {
                return Err(Error::Validation(format!("endpoint {i}: no url")));
            }
        }
        Ok(())
    }

    /// Look up every `envs` variable. Missing variables are logged and stay
    /// unbound.
    pub fn resolve_envs(&mut self) {
        self.resolved_envs.clear();
        for (env, placeholder) in &self.envs {
            match std::env::var(env) {
                Ok(value) => {
                    self.resolved_envs.insert(placeholder.clone(), value);
                }
                Err(_) => {
                    warn!(
                        provider = %self.id,
                        env = %env,
                        placeholder = %placeholder,
                        "provider env is not configured"
                    );
                }
            }
        }
    }

    /// Placeholder -> value for envs resolved at load time.
    pub fn resolved_envs(&self) -> &BTreeMap<String, String> {
        &self.resolved_envs
    }

    /// Every placeholder token the definition declares: input targets, env
    /// targets, var keys and result keys.
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.inputs
            .values()
            .chain(self.envs.values())
            .chain(self.vars.keys())
            .chain(self.endpoints.iter().flat_map(|e| e.result.keys()))
            .filter(|token| !token.is_empty())
            .cloned()
            .collect()
    }

    /// MIME type of the rendered output, if the output type is supported.
    pub fn mime_type(&self) -> Option<&'static str> {
        OutputFormat::parse(&self.output.kind)
            .ok()
            .map(OutputFormat::mime_type)
    }
}

/// Remove `//` line comments and `/* */` block comments that appear outside
/// string literals.
pub fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
