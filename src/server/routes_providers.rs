//! Provider management and execution routes.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use yuzu_common::Error;

use crate::metadata::{Inputs, Provider};
use crate::server::{AppContext, AppError};

pub fn provider_routes() -> Router<AppContext> {
    Router::new()
        .route("/providers", get(list_providers))
        .route(
            "/providers/:id",
            get(get_provider).put(put_provider).delete(delete_provider),
        )
        .route("/providers/:id/run", get(run_provider))
}

async fn list_providers(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.registry.ids())
}

async fn get_provider(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, AppError> {
    let provider = ctx.registry.get(&id)?;
    Ok(Json(Provider::clone(&provider)))
}

/// Store a definition from the request body under `:id`. Nothing is written
/// to disk.
async fn put_provider(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Provider>, AppError> {
    let origin = format!("PUT /providers/{id}");
    let mut provider: Provider = serde_json::from_slice(&body)
        .map_err(|e| Error::definition(&origin, format!("unmarshalling provider JSON: {e}")))?;
    provider.id = id;
    provider.prepare(&origin)?;

    let replaced = ctx.registry.insert(provider.clone()).is_some();
    tracing::info!(provider = %provider.id, replaced, "provider stored via API");
    Ok(Json(provider))
}

async fn delete_provider(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    ctx.registry
        .remove(&id)
        .ok_or_else(|| Error::not_found("provider", &id))?;
    tracing::info!(provider = %id, "provider removed via API");
    Ok(StatusCode::NO_CONTENT)
}

/// Execute a provider. Query parameters become inputs; repeated keys are
/// joined with `,`.
async fn run_provider(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let provider = ctx.registry.get(&id)?;
    let inputs = join_repeated(params);

    let rendered = ctx.engine.run(&provider, &inputs).await?;
    Ok(([(header::CONTENT_TYPE, rendered.mime_type)], rendered.body))
}

fn join_repeated(params: Vec<(String, String)>) -> Inputs {
    let mut inputs: HashMap<String, String> = HashMap::new();
    for (key, value) in params {
        inputs
            .entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.clone());
    }
    inputs
}
