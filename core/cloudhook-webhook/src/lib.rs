//! Cloud Code webhooks for axum.
//!
//! Handlers written in the Cloud Code style (named functions plus
//! before/after save/delete triggers) are registered on a [`Cloud`] builder
//! and served by two mountable routers:
//! - the function app: `POST /{name}` per defined function
//! - the trigger app: a single `POST /` that dispatches on the body's
//!   `triggerName` and object class
//!
//! Every request passes the webhook-key gate, is normalized into a
//! [`CloudContext`] by a fixed [`Pipeline`] of steps, and is answered with a
//! `{"success": ..}` / `{"error": ..}` [`Envelope`].

mod app;
mod auth;
mod cloud;
mod config;
mod context;
mod envelope;
mod error;
mod http;
pub mod pipeline;
mod registry;
mod trigger;

pub use app::WebhookApps;
pub use auth::{UNAUTHORIZED_MESSAGE, WEBHOOK_KEY_HEADER, require_webhook_key};
pub use cloud::{ClassTarget, Cloud};
pub use config::{WEBHOOK_KEY_ENV, WebhookConfig, WebhookKey};
pub use context::{CloudContext, WebhookBody};
pub use envelope::{Envelope, Responder, is_falsy};
pub use error::{CloudError, CloudResult};
pub use http::{HttpClient, HttpRequestOptions, HttpResponse, RequestBody};
pub use pipeline::{Exchange, Pipeline, Step};
pub use registry::{CloudHandler, HandlerRef, Registry};
pub use trigger::TriggerKind;

pub use cloudhook_model::{CloudObject, FieldOp, FieldUpdate, JsonCodec, ObjectCodec};
