//! HTTP API Module
//!
//! A thin JSON layer over the store engine.
//!
//! ## Endpoints
//!
//! ```text
//! GET    /api/v1/ping                       health check
//! GET    /api/v1/stats                      engine statistics
//! POST   /api/v1/login                      {login, password} -> {token}
//!
//! POST   /api/v1/keys                       {key, value}
//! GET    /api/v1/keys/{pattern}             {keys: [...]}
//! GET    /api/v1/keys/{key}/values          {value}
//! GET    /api/v1/keys/{key}/values/{index}  {value}
//! DELETE /api/v1/keys/{key}
//! GET    /api/v1/keys/{key}/expires         {expires: seconds}
//! POST   /api/v1/keys/{key}/expires         {expires: seconds}
//! ```
//!
//! Failures are `{"errors": [{"code", "message"}]}` with a matching status.

pub mod error;
pub mod handlers;
pub mod model;
pub mod router;

pub use error::{ApiError, ApiResult};
pub use router::create_router;

use crate::auth::Authenticator;
use crate::storage::StoreEngine;
use std::sync::Arc;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StoreEngine>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(engine: Arc<StoreEngine>, auth: Arc<Authenticator>) -> Self {
        Self { engine, auth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::User;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value as Json};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let auth = Authenticator::new(
            vec![User {
                login: "admin".into(),
                password: "admin".into(),
            }],
            "secret",
        );
        AppState::new(Arc::new(StoreEngine::new()), Arc::new(auth))
    }

    fn open_router() -> (Router, AppState) {
        let state = test_state();
        (create_router(state.clone(), false), state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
        send_with_token(app, method, uri, body, None).await
    }

    async fn send_with_token(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Json>,
        authorization: Option<&str>,
    ) -> (StatusCode, Json) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let body = match body {
            Some(json) => Body::from(serde_json::to_vec(&json).unwrap()),
            None => Body::empty(),
        };

        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Json::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn error_code(body: &Json) -> &str {
        body["errors"][0]["code"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_ping_returns_pong() {
        let (app, _) = open_router();
        let (status, body) = send(&app, "GET", "/api/v1/ping", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "pong"}));
    }

    #[tokio::test]
    async fn test_set_then_get_each_shape() {
        let (app, _) = open_router();

        for value in [json!("John Doe"), json!(["web", "sport"]), json!({"lang": "rust"})] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/v1/keys",
                Some(json!({"key": "k", "value": value})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({"message": "OK"}));

            let (status, body) = send(&app, "GET", "/api/v1/keys/k/values", None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"value": value}));
        }
    }

    #[tokio::test]
    async fn test_set_with_trailing_slash() {
        let (app, state) = open_router();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/keys/",
            Some(json!({"key": "k", "value": "v"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(state.engine.contains("k"));
    }

    #[tokio::test]
    async fn test_set_rejects_bad_input() {
        let (app, state) = open_router();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/keys",
            Some(json!({"key": "k", "value": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["message"], "Invalid value");

        let (status, _) = send(&app, "POST", "/api/v1/keys", Some(json!({"value": "v"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/api/v1/keys", Some(json!("not an object"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["message"], "Cannot decode request body");

        assert!(state.engine.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_404() {
        let (app, _) = open_router();
        let (status, body) = send(&app, "GET", "/api/v1/keys/ghost/values", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "NotFound");
        assert_eq!(body["errors"][0]["message"], "Key ghost not found");
    }

    #[tokio::test]
    async fn test_get_indexed_values() {
        let (app, state) = open_router();
        state
            .engine
            .set_json("list", json!(["x", "y", "z"]))
            .unwrap();
        state.engine.set_json("map", json!({"k": "v"})).unwrap();

        let (status, body) = send(&app, "GET", "/api/v1/keys/list/values/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "y"}));

        let (status, _) = send(&app, "GET", "/api/v1/keys/list/values/5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/keys/list/values/foo", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/v1/keys/map/values/k", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "v"}));

        let (status, _) = send(&app, "GET", "/api/v1/keys/map/values/missing", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/api/v1/keys/nope/values/0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_keys_by_pattern() {
        let (app, state) = open_router();
        for key in ["a", "ab", "b"] {
            state.engine.set_json(key, json!("v")).unwrap();
        }

        let (status, body) = send(&app, "GET", "/api/v1/keys/a*", None).await;
        assert_eq!(status, StatusCode::OK);
        let mut keys: Vec<String> = serde_json::from_value(body["keys"].clone()).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "ab"]);
    }

    #[tokio::test]
    async fn test_keys_without_match_is_empty_list() {
        let (app, _) = open_router();
        let (status, body) = send(&app, "GET", "/api/v1/keys/zzz*", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"keys": []}));
    }

    #[tokio::test]
    async fn test_delete_key() {
        let (app, state) = open_router();
        state.engine.set_json("k", json!("v")).unwrap();

        let (status, _) = send(&app, "DELETE", "/api/v1/keys/k", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!state.engine.contains("k"));

        let (status, _) = send(&app, "DELETE", "/api/v1/keys/k", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expires_round_trip() {
        let (app, state) = open_router();
        state.engine.set_json("k", json!("v")).unwrap();

        let (status, body) = send(&app, "GET", "/api/v1/keys/k/expires", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["errors"][0]["message"],
            "Error: expiration time for key k is not set"
        );

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/keys/k/expires",
            Some(json!({"expires": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/api/v1/keys/k/expires", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"expires": 10}));
    }

    #[tokio::test]
    async fn test_expires_with_extreme_restored_deadline() {
        let (app, state) = open_router();
        let mut snapshot = crate::storage::Snapshot::default();
        snapshot.data.insert("k".into(), crate::storage::Value::from("v"));
        snapshot.expires.insert("k".into(), i64::MIN);
        state.engine.restore(snapshot);

        let (status, body) = send(&app, "GET", "/api/v1/keys/k/expires", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["expires"].as_i64().unwrap() < 0);
    }

    #[tokio::test]
    async fn test_set_expires_validation() {
        let (app, state) = open_router();

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/keys/ghost/expires",
            Some(json!({"expires": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.engine.set_json("k", json!("v")).unwrap();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/keys/k/expires",
            Some(json!({"expires": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/keys/k/expires",
            Some(json!({"expires": "soon"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.engine.get_expires("k").is_err());
    }

    #[tokio::test]
    async fn test_unknown_endpoint_and_wrong_method() {
        let (app, _) = open_router();

        let (status, body) = send(&app, "GET", "/api/v2/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["message"], "Invalid API endpoint");

        let (status, body) = send(&app, "PUT", "/api/v1/ping", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error_code(&body), "NotAllowed");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (app, state) = open_router();
        state.engine.set_json("k", json!("v")).unwrap();

        let (status, body) = send(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["keys"], 1);
        assert_eq!(body["set_ops"], 1);
    }

    #[tokio::test]
    async fn test_authorization_flow() {
        let state = test_state();
        let app = create_router(state.clone(), true);
        state.engine.set_json("k", json!("v")).unwrap();

        // No header
        let (status, body) = send(&app, "GET", "/api/v1/keys/k/values", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["message"], "Unauthorized");

        // Malformed header
        let (status, _) =
            send_with_token(&app, "GET", "/api/v1/keys/k/values", None, Some("Bearer x")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Unknown token
        let (status, body) =
            send_with_token(&app, "GET", "/api/v1/keys/k/values", None, Some("Token nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["message"], "Invalid token");

        // Bad credentials
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/login",
            Some(json!({"login": "admin", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Login, then use the token
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/login",
            Some(json!({"login": "admin", "password": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let header = format!("Token {}", token);
        let (status, body) =
            send_with_token(&app, "GET", "/api/v1/keys/k/values", None, Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"value": "v"}));

        // Ping stays open
        let (status, _) = send(&app, "GET", "/api/v1/ping", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
