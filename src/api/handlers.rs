//! Request handlers.
//!
//! Each handler decodes its input, makes one or two engine calls and maps the
//! outcome to a JSON response. No handler holds engine state across calls.

use crate::api::error::{ApiError, ApiResult};
use crate::api::model::{
    ApiAuth, ApiKeyExpires, ApiKeys, ApiMessage, SetRequest, ValueResponse,
};
use crate::api::AppState;
use crate::storage::{StoreError, StoreStats, Value};
use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;

fn decode<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejected request body");
        ApiError::undecodable_body()
    })
}

/// GET /api/v1/ping
pub async fn ping() -> Json<ApiMessage> {
    Json(ApiMessage::message("pong"))
}

/// GET /api/v1/stats
pub async fn stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.engine.stats())
}

/// POST /api/v1/login
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<ApiAuth>> {
    let req: ApiAuth = decode(&body)?;

    let token = state
        .auth
        .login(&req.login, &req.password)
        .ok_or_else(|| ApiError::bad_request("Invalid login and(or) password"))?;

    Ok(Json(ApiAuth {
        token,
        ..Default::default()
    }))
}

/// POST /api/v1/keys
pub async fn set_value(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiMessage>)> {
    let req: SetRequest = decode(&body)?;

    state.engine.set_json(&req.key, req.value).map_err(|e| match e {
        StoreError::InvalidValueShape => ApiError::bad_request("Invalid value"),
        other => ApiError::from(other),
    })?;

    Ok((StatusCode::CREATED, Json(ApiMessage::ok())))
}

/// GET /api/v1/keys/:key/values
pub async fn get_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ValueResponse<Value>>> {
    let value = state.engine.get(&key)?;
    Ok(Json(ValueResponse { value }))
}

/// GET /api/v1/keys/:key/values/:index
pub async fn get_indexed(
    State(state): State<AppState>,
    Path((key, index)): Path<(String, String)>,
) -> ApiResult<Json<ValueResponse<String>>> {
    let value = state.engine.get_indexed(&key, &index)?;
    Ok(Json(ValueResponse { value }))
}

/// GET /api/v1/keys/:pattern
///
/// No match is a successful empty list here, even though the engine reports
/// it as `NoMatch`.
pub async fn keys(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> ApiResult<Json<ApiKeys>> {
    let keys = match state.engine.keys(&pattern) {
        Ok(keys) => keys,
        Err(StoreError::NoMatch(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(Json(ApiKeys { keys }))
}

/// DELETE /api/v1/keys/:key
pub async fn remove(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ApiMessage>> {
    state.engine.remove(&key)?;
    Ok(Json(ApiMessage::ok()))
}

/// GET /api/v1/keys/:key/expires
pub async fn get_expires(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<ApiKeyExpires>> {
    if !state.engine.contains(&key) {
        return Err(StoreError::NotFound(key).into());
    }

    let expires = state.engine.get_expires_secs(&key).map_err(|_| {
        ApiError::NotFound(format!("Error: expiration time for key {} is not set", key))
    })?;

    Ok(Json(ApiKeyExpires { expires }))
}

/// POST /api/v1/keys/:key/expires
pub async fn set_expires(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiMessage>> {
    if !state.engine.contains(&key) {
        return Err(StoreError::NotFound(key).into());
    }

    let req: ApiKeyExpires = decode(&body)?;
    state.engine.set_expires(&key, req.expires).map_err(|e| match e {
        StoreError::InvalidTtl(_) => {
            ApiError::bad_request("Expiration time must be a positive int64 number")
        }
        other => ApiError::from(other),
    })?;

    Ok(Json(ApiMessage::ok()))
}

/// Fallback for unknown endpoints.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Invalid API endpoint".to_string())
}

/// Rewrites the router's bare 405 into the JSON error body.
pub async fn method_not_allowed_as_json(response: Response) -> Response {
    use axum::response::IntoResponse;

    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError::NotAllowed("Method Not Allowed".to_string()).into_response();
    }
    response
}

/// Rejects requests without a valid `Authorization: Token <token>` header.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split(' ').collect();
            match parts.as_slice() {
                ["Token", token] => Some(token.to_string()),
                _ => None,
            }
        });

    let Some(token) = token else {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    };

    if !state.auth.is_valid_token(&token) {
        tracing::warn!("Invalid token provided");
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Ok(next.run(request).await)
}
