//! Endpoint pipeline interpreter.
//!
//! [`Engine`] executes a [`Provider`] against live HTTP: it seeds a fresh
//! [`RunEnv`] from the definition and the caller's inputs, runs every endpoint
//! in order (each call may use values extracted by the previous ones), and
//! projects the final environment through the provider's output templates.
//!
//! Any failure aborts the invocation; there are no retries and no partial
//! results.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use yuzu_common::{ComicInfoChapter, Error, Result};

use super::definition::{Endpoint, Provider};
use super::extract::extract;
use super::provider::{merged_chapter, ChapterProvider, DeclarativeProvider};
use super::render::{render_projection, OutputFormat, Projection, Rendered};
use super::template::RunEnv;

/// Per-call timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Caller-supplied input values keyed by `inputs` field name.
pub type Inputs = HashMap<String, String>;

/// What to do when a declared placeholder survives substitution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderPolicy {
    /// Leave the token in place and continue.
    #[default]
    PassThrough,
    /// Leave the token in place and log a warning.
    Warn,
    /// Fail the invocation.
    Error,
}

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub request_timeout: Duration,
    pub unresolved_placeholders: PlaceholderPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            unresolved_placeholders: PlaceholderPolicy::default(),
        }
    }
}

/// Executes provider pipelines. Cheap to clone; clones share one HTTP
/// connection pool.
#[derive(Debug, Clone)]
pub struct Engine {
    client: reqwest::Client,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("yuzu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("building HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the pipeline and project `output.content` over the final
    /// environment.
    pub async fn execute(&self, provider: &Provider, inputs: &Inputs) -> Result<Projection> {
        let declared = provider.placeholders();
        let mut env = build_env(provider, inputs);

        debug!(
            provider = %provider.id,
            endpoints = provider.endpoints.len(),
            bindings = ?env.keys(),
            "executing provider"
        );

        for (index, endpoint) in provider.endpoints.iter().enumerate() {
            self.call_endpoint(provider, endpoint, index, &declared, &mut env)
                .await?;
        }

        provider
            .output
            .content
            .iter()
            .map(|(name, template)| {
                let value = self.resolve(
                    provider,
                    &env,
                    &declared,
                    template,
                    &format!("output {name}"),
                )?;
                Ok::<_, Error>((name.clone(), value))
            })
            .collect()
    }

    /// Run the pipeline and serialize the projection in the provider's output
    /// format.
    pub async fn run(&self, provider: &Provider, inputs: &Inputs) -> Result<Rendered> {
        let projection = self.execute(provider, inputs).await?;
        let format = OutputFormat::parse(&provider.output.kind)?;
        render_projection(format, &projection)
    }

    /// Execute each provider in order and merge their chapter records, first
    /// non-empty value per field winning. Any provider failure fails the
    /// merge.
    pub async fn merge_chapters(
        &self,
        providers: &[Arc<Provider>],
        inputs: &Inputs,
    ) -> Result<ComicInfoChapter> {
        let sources: Vec<Box<dyn ChapterProvider>> = providers
            .iter()
            .map(|p| {
                Box::new(DeclarativeProvider::new(self.clone(), Arc::clone(p)))
                    as Box<dyn ChapterProvider>
            })
            .collect();
        merged_chapter(&sources, inputs).await
    }

    /// Convert one projection into a chapter record. Keys that are not
    /// ComicInfo elements are logged and dropped.
    pub fn chapter_from_projection(
        provider: &Provider,
        projection: &Projection,
    ) -> Result<ComicInfoChapter> {
        let (chapter, unknown) = ComicInfoChapter::from_projection(projection)?;
        if !unknown.is_empty() {
            debug!(provider = %provider.id, fields = ?unknown, "ignoring non-ComicInfo output fields");
        }
        Ok(chapter)
    }

    async fn call_endpoint(
        &self,
        provider: &Provider,
        endpoint: &Endpoint,
        index: usize,
        declared: &BTreeSet<String>,
        env: &mut RunEnv,
    ) -> Result<()> {
        let raw_url = self.resolve(
            provider,
            env,
            declared,
            &endpoint.url_template(&provider.base_url),
            "url",
        )?;
        let mut url = Url::parse(&raw_url).map_err(|e| Error::Url {
            url: raw_url.clone(),
            message: e.to_string(),
        })?;

        if !endpoint.params.is_empty() {
            let mut values = Vec::with_capacity(endpoint.params.len());
            for (name, template) in &endpoint.params {
                let value =
                    self.resolve(provider, env, declared, template, &format!("param {name}"))?;
                values.push((name, value));
            }
            url.query_pairs_mut().extend_pairs(values);
        }

        let mut headers = HeaderMap::new();
        for (name, template) in provider.headers.iter().chain(&endpoint.headers) {
            let value =
                self.resolve(provider, env, declared, template, &format!("header {name}"))?;
            let header_error = |message: String| Error::Header {
                url: url.to_string(),
                name: name.clone(),
                message,
            };
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| header_error(format!("invalid name: {e}")))?;
            let header_value =
                HeaderValue::from_str(&value).map_err(|e| header_error(e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        let method = endpoint.http_method()?;
        debug!(provider = %provider.id, endpoint = index, %method, url = %url, "calling endpoint");

        let response = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(url.as_str(), e))?;

        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = match serde_json::from_str(&body) {
            Ok(document) => document,
            Err(e) => {
                return Err(Error::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                    body,
                })
            }
        };

        for (key, template) in &endpoint.result {
            let expr = self.resolve(provider, env, declared, template, &format!("result {key}"))?;
            let value = extract(&document, &expr, key)?;
            env.set(key, &value);
        }

        Ok(())
    }

    /// Substitute `template` and apply the unresolved-placeholder policy.
    fn resolve(
        &self,
        provider: &Provider,
        env: &RunEnv,
        declared: &BTreeSet<String>,
        template: &str,
        context: &str,
    ) -> Result<String> {
        let text = env.substitute(template);
        let unresolved = env.unresolved(&text, declared);
        if let Some(first) = unresolved.first() {
            match self.config.unresolved_placeholders {
                PlaceholderPolicy::PassThrough => {
                    debug!(provider = %provider.id, context, placeholders = ?unresolved, "unresolved placeholders");
                }
                PlaceholderPolicy::Warn => {
                    warn!(provider = %provider.id, context, placeholders = ?unresolved, "unresolved placeholders");
                }
                PlaceholderPolicy::Error => {
                    return Err(Error::UnresolvedPlaceholder {
                        placeholder: (*first).to_string(),
                        context: context.to_string(),
                    });
                }
            }
        }
        Ok(text)
    }
}

/// Seed a runtime environment: resolved envs, then vars, then caller inputs.
///
/// Each `inputs` entry binds its placeholder to the caller's value. A field
/// the caller did not supply binds the empty string unless an env or var
/// already bound that placeholder.
pub fn build_env(provider: &Provider, inputs: &Inputs) -> RunEnv {
    let mut env = RunEnv::new();
    for (placeholder, value) in provider.resolved_envs() {
        env.set(placeholder, value);
    }
    for (placeholder, value) in &provider.vars {
        env.set(placeholder, value);
    }
    for (field, placeholder) in &provider.inputs {
        match inputs.get(field) {
            Some(value) => env.set(placeholder, value),
            None if !env.contains(placeholder) => env.set(placeholder, ""),
            None => {}
        }
    }
    env
}
