//! Standalone host for cloudhook webhooks.

use axum::Router;
use cloudhook_webhook::{Cloud, CloudContext, CloudResult, WebhookApps};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const DEFAULT_FUNCTIONS_PATH: &str = "/webhooks/functions";
pub const DEFAULT_TRIGGERS_PATH: &str = "/webhooks/triggers";

/// Mounts the function and trigger apps under their paths.
pub fn build_router(apps: WebhookApps, functions_path: &str, triggers_path: &str) -> Router {
    Router::new()
        .nest(functions_path, apps.functions)
        .nest(triggers_path, apps.triggers)
}

#[derive(Debug, Deserialize)]
struct GreetParams {
    name: Option<String>,
}

/// Registers the handlers the binary ships with.
pub fn register_demo_handlers(cloud: &mut Cloud) -> CloudResult<()> {
    cloud
        .define("hello", |ctx| async move { ctx.success("Hello world!") })?
        .define("greet", |ctx| async move { greet(ctx) })?
        .before_save("Widget", |mut ctx| async move { normalize_widget(&mut ctx) })?
        .after_save("Widget", |ctx| async move {
            if let Some(widget) = ctx.object() {
                info!(
                    widget = widget.object_id().unwrap_or("<new>"),
                    "widget saved"
                );
            }
        })?;
    Ok(())
}

fn greet(ctx: CloudContext) {
    match ctx.params_as::<GreetParams>() {
        Ok(params) => {
            let name = params.name.as_deref().unwrap_or("stranger");
            ctx.success(json!({ "greeting": format!("Hello, {name}!") }))
        }
        Err(e) => ctx.error(e.to_string()),
    }
}

/// Widgets need a name; a slug is derived from it on every save.
fn normalize_widget(ctx: &mut CloudContext) {
    let Some(widget) = ctx.object_mut() else {
        return ctx.error("missing widget");
    };
    let Some(name) = widget.get_str("name").map(str::trim).filter(|n| !n.is_empty()) else {
        return ctx.error("Widget must have a name");
    };
    let slug = name.to_lowercase().replace(' ', "-");
    widget.set("slug", slug);
    ctx.success_with_object();
}
