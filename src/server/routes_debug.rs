//! Query-path debugging aid.

use axum::{
    body::Bytes,
    extract::Query,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use yuzu_common::Error;

use crate::server::{AppContext, AppError};

pub fn debug_routes() -> Router<AppContext> {
    Router::new().route("/jsonpath", post(evaluate_json_path))
}

#[derive(Debug, Deserialize)]
struct JsonPathQuery {
    path: String,
}

/// Evaluate `?path=` against the JSON request body and return every match.
async fn evaluate_json_path(
    Query(query): Query<JsonPathQuery>,
    body: Bytes,
) -> Result<Json<Vec<Value>>, AppError> {
    let document: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::Validation(format!("request body is not JSON: {e}")))?;

    let matches = jsonpath_lib::select(&document, &query.path)
        .map_err(|e| Error::extraction(&query.path, format!("{e:?}")))?;

    Ok(Json(matches.into_iter().cloned().collect()))
}
