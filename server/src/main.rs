//! Cloudhook webhook server
//!
//! Hosts cloud functions and save/delete triggers for a Parse-compatible
//! backend. Point the backend's webhooks at:
//!   POST {functions-path}/{name}
//!   POST {triggers-path}
//!
//! Usage:
//!   PARSE_WEBHOOK_KEY=... cloudhook-server --port 8080

use anyhow::{Context, Result};
use clap::Parser;
use cloudhook_server::{
    DEFAULT_FUNCTIONS_PATH, DEFAULT_TRIGGERS_PATH, build_router, register_demo_handlers,
};
use cloudhook_webhook::{Cloud, WEBHOOK_KEY_ENV, WebhookConfig};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "cloudhook-server")]
#[command(about = "Cloud Code webhook server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Mount path of the function webhooks
    #[arg(long, default_value = DEFAULT_FUNCTIONS_PATH)]
    functions_path: String,

    /// Mount path of the trigger webhook
    #[arg(long, default_value = DEFAULT_TRIGGERS_PATH)]
    triggers_path: String,

    /// Shared secret expected in X-Parse-Webhook-Key
    #[arg(long, env = WEBHOOK_KEY_ENV, hide_env_values = true)]
    webhook_key: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = WebhookConfig::from_value(args.webhook_key)
        .with_context(|| format!("{WEBHOOK_KEY_ENV} or --webhook-key must be set"))?;
    let mut cloud = Cloud::new(config).context("Failed to build webhook runtime")?;
    register_demo_handlers(&mut cloud).context("Failed to register handlers")?;
    info!(registry = ?cloud.registry(), "handlers registered");

    let app = build_router(cloud.into_apps(), &args.functions_path, &args.triggers_path);
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Functions at {}/{{name}}", args.functions_path);
    info!("Triggers at {}", args.triggers_path);
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let builder = FmtSubscriber::builder().with_target(false).compact();
    match EnvFilter::try_from_default_env() {
        Ok(filter) if !verbose => builder.with_env_filter(filter).init(),
        _ => {
            let level = if verbose { Level::DEBUG } else { Level::INFO };
            builder.with_max_level(level).init()
        }
    }
}
