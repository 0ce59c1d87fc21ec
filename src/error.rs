//! Error types for the AgroLink SDK
//!
//! Every failure that reaches a caller carries a classification ([`ErrorKind`])
//! so the UI can present "sign in again", "no connection", "server problem" or
//! "not found" instead of a raw transport message.

use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// SDK error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Credential missing or rejected (401/403). Never retried automatically.
    #[error("Unauthorized: server answered HTTP {status}")]
    Unauthorized { status: u16 },

    /// Every candidate endpoint for a read failed without an auth rejection
    #[error("No endpoint served {operation} after {attempts} attempt(s) (last status: {})", display_status(.last_status))]
    Exhausted {
        operation: String,
        last_status: Option<u16>,
        attempts: usize,
    },

    /// The network could not be reached at all
    #[error("Network error: {0}")]
    Transport(String),

    /// A local precondition was violated before any network call
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A single-endpoint write was refused by the server
    #[error("Server rejected request with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Persistent key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "none".to_string(),
    }
}

/// Human-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Auth,
    Network,
    Server,
    NotFound,
    Conflict,
    Validation,
    Other,
}

impl ErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            404 | 405 => Self::NotFound,
            409 => Self::Conflict,
            s if s >= 500 => Self::Server,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Server => "server",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ClientError {
    /// Build the error for a refused write from its status and raw body
    pub fn rejected(status: u16, body: Option<&str>) -> Self {
        if status == 401 || status == 403 {
            return Self::Unauthorized { status };
        }
        Self::Rejected {
            status,
            message: server_message(body).unwrap_or_default(),
        }
    }

    /// The HTTP status behind this error, if one was observed
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status } | Self::Rejected { status, .. } => Some(*status),
            Self::Exhausted { last_status, .. } => *last_status,
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Auth,
            Self::Transport(_) => ErrorKind::Network,
            Self::ValidationFailed(_) => ErrorKind::Validation,
            Self::Exhausted { last_status: Some(status), .. } => match ErrorKind::from_status(*status) {
                ErrorKind::Server => ErrorKind::Server,
                _ => ErrorKind::NotFound,
            },
            Self::Exhausted { last_status: None, .. } => ErrorKind::NotFound,
            Self::Rejected { status, .. } => ErrorKind::from_status(*status),
            Self::MalformedResponse(_) => ErrorKind::Server,
            Self::Storage(_) | Self::Serialization(_) => ErrorKind::Other,
        }
    }

    /// Whether a read that failed this way may be served from the local cache.
    ///
    /// Auth and network failures propagate: no local substitute is trustworthy
    /// for them.
    pub fn allows_local_fallback(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::MalformedResponse(_))
    }

    /// Sentence suitable for a banner or snackbar
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { status: 403 } => {
                "You do not have permission to perform this action.".to_string()
            }
            Self::Unauthorized { .. } => {
                "Your session has expired or is not valid. Please sign in again.".to_string()
            }
            Self::Transport(_) => {
                "No connection to the server. Check your network and try again.".to_string()
            }
            Self::ValidationFailed(reason) => reason.clone(),
            Self::Rejected { status: 409, message } if !message.is_empty() => message.clone(),
            Self::Rejected { status: 409, .. } => {
                "The request conflicts with the current state.".to_string()
            }
            _ => match self.kind() {
                ErrorKind::Server => {
                    "Something went wrong on the server. Please try again later.".to_string()
                }
                ErrorKind::NotFound => "Resource not found.".to_string(),
                _ => match self {
                    Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
                    _ => "Something went wrong. Please try again.".to_string(),
                },
            },
        }
    }
}

/// Extract a server-provided message: a plain string body, else its
/// `message` field, else its `error` field.
pub fn server_message(body: Option<&str>) -> Option<String> {
    let body = body?.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(text)) => Some(text),
        Ok(serde_json::Value::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| v.as_str()).map(str::to_string)),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}
