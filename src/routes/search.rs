use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use reqwest::Url;

use crate::error::AppError;
use crate::models::search::{PrelistenQuery, SearchQuery, SearchResult};
use crate::state::AppState;

pub async fn search(
    state: State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, AppError> {
    let results = state.search.search(&query.query).await?;
    Ok(Json(results))
}

/// Stream a remote clip through to the browser without storing it.
pub async fn prelisten(
    state: State<AppState>,
    Query(query): Query<PrelistenQuery>,
) -> Result<Response, AppError> {
    let url = Url::parse(&query.url)
        .map_err(|e| AppError::BadRequest(format!("invalid url {:?}: {e}", query.url)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::BadRequest("url must use http or https".to_string()));
    }

    let upstream = state
        .http
        .get(url.clone())
        .send()
        .await
        .map_err(|e| AppError::Download(format!("request to {url} failed: {e}")))?;

    let status = upstream.status();
    if !status.is_success() {
        return Err(AppError::Download(format!("{url} returned {status}")));
    }

    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::Internal(format!("failed to build prelisten response: {e}")))
}
