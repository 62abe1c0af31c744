//! Error types for the project API client.
//!
//! # Design
//! Non-2xx responses are rejected in one of two shapes, depending on the
//! operation: most carry the raw `HttpResponse` (`Status`), while project
//! creation extracts the `error_message` field from the failure body
//! (`Message`). Callers that only need the status code can use
//! [`ApiError::status`] for either.

use thiserror::Error;

use crate::http::HttpResponse;

/// Errors returned by the client, the transport and the `ProjectApi` facade.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (unreachable host, TLS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {}: {}", .0.status, .0.body)]
    Status(HttpResponse),

    /// The server answered with a non-2xx status and an `error_message`.
    #[error("HTTP {status}: {message}")]
    Message { status: u16, message: String },

    /// A response arrived but its body exceeded the transport's size limit.
    #[error("HTTP {status} response body exceeds the {limit} byte limit")]
    BodyTooLarge { status: u16, limit: u64 },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// HTTP status of the rejected response, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status(response) => Some(response.status),
            ApiError::Message { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
