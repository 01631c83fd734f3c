//! Webhook error types.

use crate::{HttpResponse, TriggerKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Result type for webhook operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors raised while configuring, normalizing or dispatching webhooks.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("webhook key is not configured; set PARSE_WEBHOOK_KEY")]
    MissingWebhookKey,

    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("unknown trigger name: {0}")]
    UnknownTrigger(String),

    #[error("trigger request has no triggerName")]
    MissingTriggerName,

    #[error("trigger request has no object")]
    MissingObject,

    #[error("object decode failed: {0}")]
    Object(#[from] cloudhook_model::Error),

    #[error("no {kind} trigger registered for class '{class_name}'")]
    UnregisteredTrigger {
        class_name: String,
        kind: TriggerKind,
    },

    #[error("handler finished without sending a response")]
    NoResponse,

    #[error("response already sent")]
    AlreadySent,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed with status {}", .0.status)]
    HttpStatus(Box<HttpResponse>),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CloudError {
    /// HTTP status used when this error escapes a webhook route.
    pub fn status(&self) -> StatusCode {
        match self {
            CloudError::UnknownTrigger(_)
            | CloudError::MissingTriggerName
            | CloudError::MissingObject
            | CloudError::Object(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CloudError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("webhook failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
