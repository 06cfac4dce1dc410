//! Error types for the English Assistant API client.
//!
//! # Design
//! Every failure a caller can observe from `ApiClient` is a `ClientError`: a
//! message, a numeric status and optional diagnostic details. The status is
//! the single classification axis. `0` means no response was obtained
//! (transport failure, or the request could not even be built), `408` means
//! the client deadline fired, and anything else is the HTTP status the
//! server answered with. `ErrorKind` is derived from it rather than stored.
//!
//! `ClientError` is `Clone` because one in-flight outcome is delivered to
//! every caller that joined the same request.

use serde_json::Value;

use crate::config::ErrorMessages;

/// Coarse classification of a `ClientError`, derived from its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Status 0: nothing reached the server, or no response came back.
    Network,
    /// Status 408: the request deadline was exceeded.
    Timeout,
    /// 4xx other than 408: the server rejected the caller's input.
    Client,
    /// 5xx: the server failed.
    Server,
    /// Any other status, e.g. a 2xx whose body was not valid JSON.
    Unclassified,
}

/// A classified request failure. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    message: String,
    status: u16,
    details: Option<Value>,
}

impl ClientError {
    pub const NETWORK_STATUS: u16 = 0;
    pub const TIMEOUT_STATUS: u16 = 408;

    pub fn new(message: impl Into<String>, status: u16, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status,
            details,
        }
    }

    /// A transport-level failure. `cause` is kept as a string detail.
    pub fn network(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::new(
            message,
            Self::NETWORK_STATUS,
            Some(Value::String(cause.into())),
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(message, Self::TIMEOUT_STATUS, None)
    }

    /// A non-2xx response. The server's own `message` (or FastAPI-style
    /// `detail`) wins over the generic `HTTP <status>` text.
    pub fn from_response(status: u16, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| format!("HTTP {status}"));
        Self::new(message, status, body)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            Self::NETWORK_STATUS => ErrorKind::Network,
            Self::TIMEOUT_STATUS => ErrorKind::Timeout,
            400..=499 => ErrorKind::Client,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unclassified,
        }
    }

    /// The text a view should show the end user.
    ///
    /// Total over every status: the well-known codes map to fixed templates,
    /// everything else falls back to the error's own message, or to the
    /// generic template when that is empty.
    pub fn display_message<'a>(&'a self, messages: &'a ErrorMessages) -> &'a str {
        match self.status {
            400 => &messages.validation,
            404 => &messages.not_found,
            408 => &messages.timeout,
            500 => &messages.server,
            _ if !self.message.trim().is_empty() => &self.message,
            _ => &messages.generic,
        }
    }
}

fn server_message(body: &Value) -> Option<String> {
    ["message", "detail"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Errors raised while assembling a client, before any request is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("could not construct HTTP transport: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn messages() -> ErrorMessages {
        ErrorMessages::default()
    }

    #[test]
    fn kind_follows_status() {
        assert_eq!(ClientError::network("x", "refused").kind(), ErrorKind::Network);
        assert_eq!(ClientError::timeout("x").kind(), ErrorKind::Timeout);
        assert_eq!(ClientError::from_response(422, None).kind(), ErrorKind::Client);
        assert_eq!(ClientError::from_response(503, None).kind(), ErrorKind::Server);
        assert_eq!(ClientError::new("x", 200, None).kind(), ErrorKind::Unclassified);
        assert_eq!(ClientError::new("x", 302, None).kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn server_message_is_preferred() {
        let err = ClientError::from_response(422, Some(json!({"message": "Query cannot be empty"})));
        assert_eq!(err.message(), "Query cannot be empty");
        assert_eq!(err.status(), 422);
        assert_eq!(err.details().unwrap()["message"], "Query cannot be empty");
    }

    #[test]
    fn fastapi_detail_is_used_when_message_missing() {
        let err = ClientError::from_response(400, Some(json!({"detail": "Must specify section"})));
        assert_eq!(err.message(), "Must specify section");
    }

    #[test]
    fn generic_http_message_when_body_has_none() {
        let err = ClientError::from_response(502, Some(json!({"error": "bad_gateway"})));
        assert_eq!(err.message(), "HTTP 502");
        let err = ClientError::from_response(503, None);
        assert_eq!(err.message(), "HTTP 503");
    }

    #[test]
    fn display_message_uses_fixed_templates() {
        let m = messages();
        let not_found = ClientError::from_response(404, Some(json!({"message": "verb 9 missing"})));
        assert_eq!(not_found.display_message(&m), m.not_found);
        assert_eq!(ClientError::from_response(400, None).display_message(&m), m.validation);
        assert_eq!(ClientError::timeout("late").display_message(&m), m.timeout);
        assert_eq!(ClientError::from_response(500, None).display_message(&m), m.server);
    }

    #[test]
    fn display_message_falls_back_to_own_then_generic() {
        let m = messages();
        let err = ClientError::from_response(422, Some(json!({"message": "Text too long"})));
        assert_eq!(err.display_message(&m), "Text too long");

        let err = ClientError::network(m.network.clone(), "connection refused");
        assert_eq!(err.display_message(&m), m.network);

        let err = ClientError::new("  ", 418, None);
        assert_eq!(err.display_message(&m), m.generic);
    }
}
