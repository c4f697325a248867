//! Request and response envelopes shared by every plugin endpoint
//!
//! Requests arrive as:
//!
//! ```json
//! {
//!   "plugin_id": 1, "tool_id": 2, "user_id": 3,
//!   "secrets": {"GITHUB_TOKEN": "..."},
//!   "model_call_token": "...", "model_call_limit": 0,
//!   "body": { ... endpoint specific ... }
//! }
//! ```
//!
//! and every response, successful or not, is `{"code": .., "msg": .., "data": ..}`.
//! Failures carry `data: null` and a message of the form
//! `"<code message>: <error kind>: <detail>"`.

use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::github::GithubError;
use crate::services::ReaderError;

/// Envelope status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    BadRequest,
    ServerInternal,
}

impl ResponseCode {
    pub fn as_u16(self) -> u16 {
        match self {
            ResponseCode::Success => 0,
            ResponseCode::BadRequest => 400,
            ResponseCode::ServerInternal => 500,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ResponseCode::Success => "success",
            ResponseCode::BadRequest => "bad request",
            ResponseCode::ServerInternal => "server internal error",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ResponseCode::Success => StatusCode::OK,
            ResponseCode::BadRequest => StatusCode::BAD_REQUEST,
            ResponseCode::ServerInternal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResponse<T> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> PluginResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::Success.as_u16(),
            msg: ResponseCode::Success.message().to_string(),
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for PluginResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A failed request, rendered as an error envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ResponseCode,
    /// Error class name, e.g. `ValueError` or `UpstreamError`
    pub kind: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::BadRequest,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn internal(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ResponseCode::ServerInternal,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The envelope `msg` for this error.
    pub fn envelope_message(&self) -> String {
        format!("{}: {}: {}", self.code.message(), self.kind, self.message)
    }
}

impl From<GithubError> for ApiError {
    fn from(e: GithubError) -> Self {
        ApiError::internal(e.kind(), e.to_string())
    }
}

impl From<ReaderError> for ApiError {
    fn from(e: ReaderError) -> Self {
        ApiError::internal(e.kind(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let msg = self.envelope_message();
        match self.code {
            ResponseCode::BadRequest => tracing::warn!("Rejected request: {}", msg),
            _ => tracing::error!("Request failed: {}", msg),
        }

        let body = PluginResponse::<()> {
            code: self.code.as_u16(),
            msg,
            data: None,
        };
        (self.code.status(), Json(body)).into_response()
    }
}

/// Request envelope with a typed `body`
#[derive(Debug, Clone)]
pub struct PluginRequest<T> {
    pub plugin_id: i64,
    pub tool_id: i64,
    pub user_id: i64,
    pub secrets: HashMap<String, String>,
    pub model_call_token: Option<String>,
    pub model_call_limit: i64,
    pub body: T,
}

impl<T: DeserializeOwned> PluginRequest<T> {
    /// Validates and decodes a JSON request envelope.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let Value::Object(mut fields) = value else {
            return Err(ApiError::bad_request(
                "ValueError",
                "request must be a JSON object",
            ));
        };

        let plugin_id = required_id(&fields, "plugin_id", "plugin")?;
        let tool_id = required_id(&fields, "tool_id", "tool")?;
        let user_id = required_id(&fields, "user_id", "user")?;

        let secrets = match fields.remove("secrets") {
            None | Some(Value::Null) => HashMap::new(),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::bad_request("ValueError", format!("invalid secrets: {}", e)))?,
        };

        let model_call_token = match fields.remove("model_call_token") {
            Some(Value::String(token)) => Some(token),
            _ => None,
        };

        let model_call_limit = match fields.get("model_call_limit") {
            None | Some(Value::Null) => 0,
            Some(value) => parse_int(value).ok_or_else(|| {
                ApiError::bad_request("ValueError", format!("invalid model call limit: {}", value))
            })?,
        };

        let body = match fields.remove("body") {
            None | Some(Value::Null) => {
                return Err(ApiError::bad_request("ValueError", "missing body"));
            }
            Some(body) => serde_json::from_value(body).map_err(|e| {
                ApiError::bad_request("TypeError", format!("invalid body: {}", e))
            })?,
        };

        Ok(Self {
            plugin_id,
            tool_id,
            user_id,
            secrets,
            model_call_token,
            model_call_limit,
            body,
        })
    }
}

impl<T> PluginRequest<T> {
    /// A secret supplied with the request, e.g. `GITHUB_TOKEN`.
    pub fn secret(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(String::as_str)
    }
}

/// Accepts integers and numeric strings.
fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_id(
    fields: &serde_json::Map<String, Value>,
    field: &str,
    name: &str,
) -> Result<i64, ApiError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ApiError::bad_request(
            "ValueError",
            format!("missing {} id", name),
        )),
        Some(value) => parse_int(value).ok_or_else(|| {
            ApiError::bad_request("ValueError", format!("invalid {} id: {}", name, value))
        }),
    }
}

impl<S, T> FromRequest<S> for PluginRequest<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request("ValueError", e.body_text()))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::bad_request("JSONDecodeError", e.to_string()))?;
        Self::from_value(value)
    }
}
