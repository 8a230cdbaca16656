//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Credentials in, token out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiAuth {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// Error list returned on every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrors {
    pub errors: Vec<ApiMessage>,
}

/// Status message with an optional code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiMessage {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }

    pub fn ok() -> Self {
        Self::message("OK")
    }
}

/// Body of a set request. `value` is left untyped until it is validated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// A single value, whole or indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse<T> {
    pub value: T,
}

/// Keys matching a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    pub keys: Vec<String>,
}

/// Seconds until expiry, in and out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApiKeyExpires {
    pub expires: i64,
}
