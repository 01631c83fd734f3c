//! The two mountable sub-applications.

use crate::pipeline::{Exchange, Pipeline};
use crate::{
    CloudContext, CloudError, CloudResult, Envelope, HandlerRef, HttpClient, Registry, WebhookBody,
    WebhookKey, require_webhook_key,
};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router, middleware};
use cloudhook_model::ObjectCodec;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Routers produced by [`crate::Cloud::into_apps`], meant to be nested into
/// the embedding application's router.
#[derive(Debug)]
pub struct WebhookApps {
    /// `POST /{name}` for every defined cloud function.
    pub functions: Router,
    /// `POST /` for every trigger, dispatched on the request body.
    pub triggers: Router,
}

pub(crate) struct AppState {
    pub(crate) registry: Registry,
    pub(crate) codec: Arc<dyn ObjectCodec>,
    pub(crate) http: HttpClient,
}

impl WebhookApps {
    pub(crate) fn build(key: WebhookKey, state: AppState) -> Self {
        let state = Arc::new(state);
        Self {
            functions: function_app(key.clone(), state.clone()),
            triggers: trigger_app(key, state),
        }
    }
}

fn function_app(key: WebhookKey, state: Arc<AppState>) -> Router {
    let mut router = Router::new();
    for (name, handler) in state.registry.functions() {
        let path = format!("/{name}");
        let name = name.to_string();
        let handler = handler.clone();
        router = router.route(
            &path,
            post(
                move |State(state): State<Arc<AppState>>, Json(body): Json<WebhookBody>| {
                    run_function(state, name, handler, body)
                },
            ),
        );
    }
    router
        .layer(middleware::from_fn_with_state(key, require_webhook_key))
        .with_state(state)
}

fn trigger_app(key: WebhookKey, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(run_trigger))
        .layer(middleware::from_fn_with_state(key, require_webhook_key))
        .with_state(state)
}

async fn run_function(
    state: Arc<AppState>,
    name: String,
    handler: HandlerRef,
    body: WebhookBody,
) -> CloudResult<Json<Envelope>> {
    let (ctx, rx) = prepare_function(&state, name, body)?;
    dispatch(handler, ctx, rx).await
}

fn prepare_function(
    state: &AppState,
    name: String,
    body: WebhookBody,
) -> CloudResult<(CloudContext, oneshot::Receiver<Envelope>)> {
    let (exchange, rx) = Exchange::new(body, state.http.clone(), state.codec.as_ref());
    let mut exchange = exchange.with_function(name);
    Pipeline::FUNCTION.run(&mut exchange)?;
    let ctx = exchange.into_context();
    debug!(function = ctx.function_name(), "dispatching cloud function");
    Ok((ctx, rx))
}

async fn run_trigger(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WebhookBody>,
) -> CloudResult<Json<Envelope>> {
    let (handler, ctx, rx) = prepare_trigger(&state, body)?;
    dispatch(handler, ctx, rx).await
}

/// Normalizes a trigger request and resolves its handler.
fn prepare_trigger(
    state: &AppState,
    body: WebhookBody,
) -> CloudResult<(HandlerRef, CloudContext, oneshot::Receiver<Envelope>)> {
    let kind = body.trigger_kind()?;
    let sent_class = body
        .object
        .as_ref()
        .and_then(|object| object.get("className"))
        .and_then(Value::as_str)
        .filter(|class| !class.is_empty())
        .map(str::to_string);
    let (exchange, rx) = Exchange::new(body, state.http.clone(), state.codec.as_ref());
    let mut exchange = exchange.with_trigger(kind);
    Pipeline::for_trigger(kind).run(&mut exchange)?;

    // The lookup runs after the after-trigger ack is queued; returning an
    // error here drops `rx` and the ack with it.
    let ctx = exchange.into_context();
    let class_name = match sent_class.as_deref() {
        Some(class) => class,
        None => ctx
            .object()
            .map(|object| object.class_name())
            .ok_or(CloudError::MissingObject)?,
    };
    let handler = state.registry.trigger(class_name, kind)?.clone();
    debug!(class = %class_name, trigger = %kind, "dispatching trigger");
    Ok((handler, ctx, rx))
}

/// Runs the handler on its own task and answers with the first envelope sent.
///
/// For after-triggers that envelope is already waiting, so the handler keeps
/// running after the response goes out and whatever it sends is discarded.
async fn dispatch(
    handler: HandlerRef,
    ctx: CloudContext,
    rx: oneshot::Receiver<Envelope>,
) -> CloudResult<Json<Envelope>> {
    tokio::spawn(handler.call(ctx));
    rx.await.map(Json).map_err(|_| CloudError::NoResponse)
}
