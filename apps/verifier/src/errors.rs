use serde::Deserialize;
use thiserror::Error;

/// Client-level error type.
/// Every variant displays as the single message a user should see; the raw
/// transport cause is logged where the error is built, never shown.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    ReverifyRejected(String),

    #[error("{message}")]
    Decode { message: String, detail: String },
}

impl ClientError {
    /// The display string for the UI error state.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

/// Login form rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter a username")]
    MissingUsername,

    #[error("Username must be alphanumeric only")]
    InvalidUsername,
}

/// Backend operations, used to pick the fallback message when a failure
/// carries no `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    List,
    ListMine,
    Get,
    Download,
    Export,
    Reverify,
    Health,
}

impl Operation {
    pub fn fallback_message(self) -> &'static str {
        match self {
            Operation::Upload => "Upload failed",
            Operation::List => "Failed to load records",
            Operation::ListMine => "Failed to load certificates",
            Operation::Get => "Failed to load record",
            Operation::Download => "Download failed",
            Operation::Export => "Export failed",
            Operation::Reverify => "Re-verification failed",
            Operation::Health => "Health check failed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
}

/// Pulls the human-readable `error` field out of a failure body.
/// Accepts both `{"error": "text"}` and `{"error": {"message": "text"}}`.
pub(crate) fn error_field(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.error? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Object(map) => map.get("message")?.as_str()?.to_string(),
        _ => return None,
    };
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Translates a non-2xx response into the client error taxonomy.
pub(crate) fn from_status(op: Operation, status: u16, body: &str) -> ClientError {
    let message = error_field(body).unwrap_or_else(|| op.fallback_message().to_string());
    if status == 404 {
        ClientError::NotFound(message)
    } else {
        ClientError::Server { status, message }
    }
}
