//! Success/error response envelopes and the one-shot responder.

use crate::{CloudError, CloudResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, error};

/// The webhook response body: exactly one of `{"success": ..}` or `{"error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Success(Value),
    Error(Value),
}

impl Envelope {
    /// Wraps `value`, substituting `true` when it is falsy.
    pub fn success(value: impl Into<Value>) -> Self {
        Envelope::Success(or_true(value.into()))
    }

    /// Wraps `value`, substituting `true` when it is falsy.
    pub fn error(value: impl Into<Value>) -> Self {
        Envelope::Error(or_true(value.into()))
    }

    /// The `{"success": {}}` acknowledgment sent for after-triggers.
    pub fn empty_success() -> Self {
        Envelope::Success(Value::Object(Default::default()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn value(&self) -> &Value {
        match self {
            Envelope::Success(value) | Envelope::Error(value) => value,
        }
    }
}

/// Values that stand for "nothing was passed": `null`, `false`, zero and `""`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn or_true(value: Value) -> Value {
    if is_falsy(&value) { Value::Bool(true) } else { value }
}

/// Delivers at most one [`Envelope`] for a request.
///
/// Clones share the same slot. Later sends are dropped and logged.
#[derive(Debug, Clone)]
pub struct Responder {
    slot: Arc<Mutex<Option<oneshot::Sender<Envelope>>>>,
}

impl Responder {
    /// Creates a responder and the receiver the route awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Envelope>) {
        let (tx, rx) = oneshot::channel();
        let responder = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (responder, rx)
    }

    /// Sends `envelope` if nothing has been sent yet.
    pub fn send(&self, envelope: Envelope) -> CloudResult<()> {
        self.try_send(envelope).map_err(|_| CloudError::AlreadySent)
    }

    /// Sends `{"success": value}`; a second send is logged, never raised.
    pub fn success(&self, value: impl Into<Value>) {
        self.send_or_log(Envelope::success(value));
    }

    /// Sends `{"error": value}`; a second send is logged, never raised.
    pub fn error(&self, value: impl Into<Value>) {
        self.send_or_log(Envelope::error(value));
    }

    pub fn is_sent(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn try_send(&self, envelope: Envelope) -> Result<(), Envelope> {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(sender) = sender else {
            return Err(envelope);
        };
        if sender.send(envelope).is_err() {
            debug!("webhook caller went away before the response was sent");
        }
        Ok(())
    }

    fn send_or_log(&self, envelope: Envelope) {
        if let Err(envelope) = self.try_send(envelope) {
            error!(?envelope, "response already sent; dropping second envelope");
        }
    }
}
