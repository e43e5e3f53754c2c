use super::request::RequestLog;
use super::server::AppState;
use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_kv(
    State(state): State<AppState>,
    Extension(log): Extension<RequestLog>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let value = state.kv.get(&key).await?;
    log.debug(format_args!("kv hit key={} bytes={}", key, value.len()));

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], value))
}

#[derive(Debug, Deserialize)]
pub struct PutKvParams {
    /// Seconds until the entry expires, must be positive
    pub max_age: Option<u64>,
}

pub async fn put_kv(
    State(state): State<AppState>,
    Extension(log): Extension<RequestLog>,
    Path(key): Path<String>,
    Query(params): Query<PutKvParams>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let max_age = match params.max_age {
        Some(0) => return Err(AppError::BadRequest("max_age must be positive".to_string())),
        Some(secs) => Duration::from_secs(secs),
        None => state.default_max_age,
    };

    if let Err(e) = state.kv.set(&key, &body, max_age).await {
        log.error(format_args!("kv set failed key={}: {}", key, e));
        return Err(e.into());
    }
    log.info(format_args!(
        "kv set key={} bytes={} max_age={}s",
        key,
        body.len(),
        max_age.as_secs()
    ));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(value)),
        None => Err(AppError::NotFound(format!("cache key '{}'", key))),
    }
}

pub async fn put_cache(
    State(state): State<AppState>,
    Extension(log): Extension<RequestLog>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, AppError> {
    state.cache.set(&key, value).await?;
    log.debug(format_args!("cache set key={}", key));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_cache(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.cache.remove(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
