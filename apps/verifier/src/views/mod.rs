// Screen state for the upload, list and detail screens.
// Every network call goes through `CertificateApi`; a screen only moves to
// `Ready` with a projected view or to `Failed` with a display message.

pub mod detail;
pub mod list;
pub mod upload;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// One-shot message shown next to an already rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}
