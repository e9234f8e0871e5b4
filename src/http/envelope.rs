//! Uniform response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::TraceContext;
use crate::outcome::Code;

/// `{"code": .., "trace": .., "message": .., "result": ..}`.
///
/// Every field is optional on decode; a missing code means SUCCESS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub code: Code,
    pub trace: String,
    pub message: String,
    pub result: Value,
}

impl Envelope {
    pub fn new(ctx: &TraceContext, code: Code, message: impl Into<String>, result: Value) -> Self {
        Self {
            code,
            trace: ctx.trace().to_string(),
            message: message.into(),
            result,
        }
    }

    pub fn success(ctx: &TraceContext, message: impl Into<String>, result: impl Serialize) -> Self {
        let result = serde_json::to_value(result).unwrap_or(Value::Null);
        Self::new(ctx, Code::SUCCESS, message, result)
    }

    /// Failure envelope with a null result.
    pub fn failure(ctx: &TraceContext, code: Code, message: impl Into<String>) -> Self {
        Self::new(ctx, code, message, Value::Null)
    }

    /// Decode a captured body. `None` when the bytes are not a JSON object.
    ///
    /// Fields decode independently: one of the wrong type keeps its default
    /// (SUCCESS for `code`) and the others are still taken.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let Ok(Value::Object(mut fields)) = serde_json::from_slice::<Value>(bytes) else {
            return None;
        };
        let text = |value: Option<Value>| match value {
            Some(Value::String(text)) => text,
            _ => String::new(),
        };

        let code = fields
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| u32::try_from(code).ok())
            .map(Code)
            .unwrap_or_default();
        Some(Self {
            code,
            trace: text(fields.remove("trace")),
            message: text(fields.remove("message")),
            result: fields.remove("result").unwrap_or(Value::Null),
        })
    }
}

/// Envelopes are always sent with HTTP 200; the outcome lives in `code`.
impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
