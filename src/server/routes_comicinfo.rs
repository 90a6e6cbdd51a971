//! Merged ComicInfo route.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use yuzu_common::Error;

use crate::metadata::Inputs;
use crate::server::{AppContext, AppError};

pub fn comicinfo_routes() -> Router<AppContext> {
    Router::new().route("/comicinfo", get(get_comicinfo))
}

#[derive(Debug, Deserialize)]
struct ComicInfoQuery {
    /// Series name.
    #[serde(default)]
    s: String,
    /// Chapter number.
    #[serde(default)]
    c: String,
    /// Comma-separated provider ids, highest precedence first.
    #[serde(default)]
    p: String,
}

async fn get_comicinfo(
    State(ctx): State<AppContext>,
    Query(query): Query<ComicInfoQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ids: Vec<&str> = query
        .p
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(Error::Validation("at least one provider is required (p)".into()).into());
    }

    let providers = ids
        .iter()
        .map(|id| ctx.registry.get(id))
        .collect::<Result<Vec<_>, _>>()?;

    let mut inputs = Inputs::new();
    inputs.insert("series".to_string(), query.s);
    inputs.insert("chapter".to_string(), query.c);

    let chapter = ctx.engine.merge_chapters(&providers, &inputs).await?;
    let xml = chapter.to_xml()?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}
