//! Stdio Protocol Types and Messages
//!
//! This module defines the newline-delimited JSON request and response
//! framing spoken by the serve loop.

use serde::{Deserialize, Serialize};

use crate::NoteError;

/// Unique identifier echoed from a request to its response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// One request line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub op: String,
    pub params: Option<serde_json::Value>,
}

/// Success response line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: RequestId,
    pub result: serde_json::Value,
}

/// Error descriptor carried by an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Error response line; `id` is null when the request line itself could
/// not be parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub id: Option<RequestId>,
    pub error: ErrorBody,
}

/// Any response line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Response(Response),
    ErrorResponse(ErrorResponse),
}

/// Health of one backing component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    pub detail: String,
}

/// Result payload of the `status` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub embedder: ComponentStatus,
    pub index: ComponentStatus,
    pub registry: ComponentStatus,
}

/// Stable error codes reported on the wire
pub mod error_codes {
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const EMBEDDING_FAILED: &str = "embedding_failed";
    pub const INDEX_FAILED: &str = "index_failed";
    pub const REGISTRY_FAILED: &str = "registry_failed";
}

impl Response {
    /// Create a new success response
    #[inline]
    pub fn new(result: serde_json::Value, id: RequestId) -> Self {
        Self { id, result }
    }
}

impl ErrorResponse {
    /// Create a new error response
    #[inline]
    pub fn new(error: ErrorBody, id: Option<RequestId>) -> Self {
        Self { id, error }
    }
}

impl ErrorBody {
    /// Create a new error descriptor
    #[inline]
    pub fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
        }
    }

    /// Create an invalid request error
    #[inline]
    pub fn invalid_request(message: String) -> Self {
        Self::new(error_codes::INVALID_REQUEST, message)
    }

    /// Map a crate error onto its wire code. Registry and other internal
    /// faults share the registry code.
    #[inline]
    pub fn from_error(error: &NoteError) -> Self {
        let code = match error {
            NoteError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            NoteError::Embedding(_) => error_codes::EMBEDDING_FAILED,
            NoteError::Index(_) => error_codes::INDEX_FAILED,
            _ => error_codes::REGISTRY_FAILED,
        };
        Self::new(code, error.to_string())
    }
}

impl ComponentStatus {
    /// Component responded normally
    #[inline]
    pub fn healthy(detail: String) -> Self {
        Self {
            healthy: true,
            detail,
        }
    }

    /// Component probe failed
    #[inline]
    pub fn failed(detail: String) -> Self {
        Self {
            healthy: false,
            detail,
        }
    }
}
