//! Request normalization.
//!
//! A [`Pipeline`] is an ordered list of [`Step`]s. Each step reads the parsed
//! webhook body and fills in one part of the [`CloudContext`]; steps share no
//! state besides the [`Exchange`] they are handed, so the three pipelines are
//! just different orderings of the same functions.

use crate::{
    CloudContext, CloudError, CloudResult, Envelope, HttpClient, Responder, TriggerKind,
    WebhookBody,
};
use cloudhook_model::{ObjectCodec, USER_CLASS};
use serde_json::Value;
use std::fmt;
use tokio::sync::oneshot;
use tracing::debug;

/// Per-request state the steps operate on.
pub struct Exchange<'a> {
    pub body: WebhookBody,
    pub context: CloudContext,
    responder: Responder,
    codec: &'a dyn ObjectCodec,
}

impl<'a> Exchange<'a> {
    /// Starts an exchange with an empty context, returning the receiver that
    /// resolves with the first envelope sent for this request.
    pub fn new(
        body: WebhookBody,
        http: HttpClient,
        codec: &'a dyn ObjectCodec,
    ) -> (Self, oneshot::Receiver<Envelope>) {
        let (responder, rx) = Responder::channel();
        let exchange = Self {
            body,
            context: CloudContext::new(http),
            responder,
            codec,
        };
        (exchange, rx)
    }

    pub fn with_trigger(mut self, kind: TriggerKind) -> Self {
        self.context.trigger = Some(kind);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.context.function_name = Some(name.into());
        self
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Hands over the finished context, releasing the exchange's responder handle.
    pub fn into_context(self) -> CloudContext {
        self.context
    }
}

/// One normalization step.
pub type Step = fn(&mut Exchange<'_>) -> CloudResult<()>;

/// A named, fixed sequence of steps.
#[derive(Clone, Copy)]
pub struct Pipeline {
    name: &'static str,
    steps: &'static [Step],
}

impl Pipeline {
    pub const FUNCTION: Pipeline = Pipeline {
        name: "function",
        steps: &[
            extract_installation_id,
            extract_params,
            attach_response_helpers,
            decode_user,
        ],
    };

    pub const BEFORE_TRIGGER: Pipeline = Pipeline {
        name: "before-trigger",
        steps: &[
            extract_installation_id,
            attach_response_helpers,
            decode_object,
            decode_user,
        ],
    };

    pub const AFTER_TRIGGER: Pipeline = Pipeline {
        name: "after-trigger",
        steps: &[
            extract_installation_id,
            attach_response_helpers,
            decode_object,
            decode_user,
            respond_empty_if_after,
        ],
    };

    pub fn for_trigger(kind: TriggerKind) -> Pipeline {
        if kind.is_after() {
            Self::AFTER_TRIGGER
        } else {
            Self::BEFORE_TRIGGER
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    /// Runs every step in order, stopping at the first error.
    pub fn run(&self, exchange: &mut Exchange<'_>) -> CloudResult<()> {
        debug!(pipeline = self.name, steps = self.steps.len(), "normalizing request");
        for step in self.steps {
            step(exchange)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

pub fn extract_installation_id(ex: &mut Exchange<'_>) -> CloudResult<()> {
    ex.context.installation_id = ex.body.installation_id.take();
    Ok(())
}

pub fn extract_params(ex: &mut Exchange<'_>) -> CloudResult<()> {
    ex.context.params = ex.body.params.take().unwrap_or(Value::Null);
    Ok(())
}

pub fn attach_response_helpers(ex: &mut Exchange<'_>) -> CloudResult<()> {
    ex.context.responder = Some(ex.responder.clone());
    Ok(())
}

/// Materializes the trigger object, merging `update` onto `original` when both are sent.
pub fn decode_object(ex: &mut Exchange<'_>) -> CloudResult<()> {
    let object = match (ex.body.original.take(), ex.body.update.take()) {
        (Some(original), Some(update)) => ex.codec.merge(original, update)?,
        _ => {
            let raw = ex.body.object.take().ok_or(CloudError::MissingObject)?;
            ex.codec.materialize(raw)?
        }
    };
    ex.context.object = Some(object);
    Ok(())
}

/// Materializes the requesting user (class `_User` unless stated) and copies the master flag.
pub fn decode_user(ex: &mut Exchange<'_>) -> CloudResult<()> {
    if let Some(mut raw) = ex.body.user.take() {
        if let Value::Object(map) = &mut raw {
            map.entry("className")
                .or_insert_with(|| Value::String(USER_CLASS.to_string()));
        }
        ex.context.user = Some(ex.codec.materialize(raw)?);
    }
    ex.context.master = ex.body.master;
    Ok(())
}

/// Acknowledges after-triggers with `{"success": {}}` straight away.
///
/// The pipeline keeps going: the handler still runs, but anything it sends
/// afterwards is dropped as a second response.
pub fn respond_empty_if_after(ex: &mut Exchange<'_>) -> CloudResult<()> {
    if ex.context.trigger.is_some_and(|kind| kind.is_after()) {
        ex.responder.send(Envelope::empty_success())?;
    }
    Ok(())
}
