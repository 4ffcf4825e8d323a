use serde_json::Value;
use thiserror::Error;

// Field names the backend has used for human-readable error text, in the order
// they are tried.
const MESSAGE_KEYS: [&str; 7] = [
    "message",
    "detail",
    "error",
    "error_description",
    "title",
    "msg",
    "data",
];

const MAX_MESSAGE_DEPTH: u8 = 3;

/// ApiError
///
/// Everything that can go wrong between the client core and the backend.
/// Authentication and role failures are not errors here: the session guard
/// answers those with redirects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: Value,
    },

    /// The response body could not be read as the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// A resolver was handed an empty candidate list.
    #[error("no request candidates for `{0}`")]
    NoCandidates(String),

    /// A successful response lacked a field the caller cannot do without.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Builds a status error, pulling the display message out of the body when
    /// the backend supplied one.
    pub fn from_status(status: u16, body: Value) -> Self {
        let message = message_from_body(&body).unwrap_or_else(|| format!("status {}", status));
        ApiError::Status {
            status,
            message,
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// user_message
    ///
    /// Best-effort text for an inline error line in the UI. The backend's error
    /// shape is not standardised, so this tries the known field names in turn
    /// (also inside nested `error`/`data` objects and FastAPI-style `detail`
    /// arrays) before falling back to the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { body, message, .. } => {
                message_from_body(body).unwrap_or_else(|| message.clone())
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return ApiError::from_status(status.as_u16(), Value::Null);
        }
        ApiError::Transport(e.to_string())
    }
}

/// message_from_body
///
/// Extracts the first non-blank human-readable message from an error body.
pub fn message_from_body(body: &Value) -> Option<String> {
    message_at_depth(body, 0)
}

fn message_at_depth(body: &Value, depth: u8) -> Option<String> {
    if depth > MAX_MESSAGE_DEPTH {
        return None;
    }
    match body {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| message_at_depth(item, depth + 1)),
        Value::Object(map) => MESSAGE_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| message_at_depth(value, depth + 1)),
        _ => None,
    }
}

/// StoreError
///
/// Failures of the local key-value store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("local store quota exceeded writing `{key}` ({needed} of {quota} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("could not encode local entry `{key}`: {reason}")]
    Encode { key: String, reason: String },
}
