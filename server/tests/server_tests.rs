use cloudhook_server::{
    DEFAULT_FUNCTIONS_PATH, DEFAULT_TRIGGERS_PATH, build_router, register_demo_handlers,
};
use cloudhook_webhook::{Cloud, WEBHOOK_KEY_HEADER, WebhookConfig, WebhookKey};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const KEY: &str = "server-test-key";

/// Spin up the server with the demo handlers on an OS-assigned port, returning the base URL.
async fn spawn_test_server() -> String {
    let mut cloud = Cloud::new(WebhookConfig::new(WebhookKey::new(KEY).unwrap())).unwrap();
    register_demo_handlers(&mut cloud).unwrap();
    let app = build_router(cloud.into_apps(), DEFAULT_FUNCTIONS_PATH, DEFAULT_TRIGGERS_PATH);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

async fn post(url: String, body: Value) -> Value {
    let resp = reqwest::Client::new()
        .post(url)
        .header(WEBHOOK_KEY_HEADER, KEY)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

// ── Functions ───────────────────────────────────────────────────

#[tokio::test]
async fn hello_is_mounted_under_functions_path() {
    let base = spawn_test_server().await;
    let body = post(format!("{base}/webhooks/functions/hello"), json!({"params": {}})).await;
    assert_eq!(body, json!({"success": "Hello world!"}));
}

#[tokio::test]
async fn greet_uses_typed_params() {
    let base = spawn_test_server().await;
    let named = post(
        format!("{base}/webhooks/functions/greet"),
        json!({"params": {"name": "Ada"}}),
    )
    .await;
    assert_eq!(named, json!({"success": {"greeting": "Hello, Ada!"}}));

    let anonymous = post(format!("{base}/webhooks/functions/greet"), json!({"params": {}})).await;
    assert_eq!(anonymous, json!({"success": {"greeting": "Hello, stranger!"}}));
}

#[tokio::test]
async fn greet_rejects_malformed_params() {
    let base = spawn_test_server().await;
    let body = post(
        format!("{base}/webhooks/functions/greet"),
        json!({"params": {"name": 42}}),
    )
    .await;
    assert!(body.get("error").is_some_and(Value::is_string));
}

// ── Triggers ────────────────────────────────────────────────────

#[tokio::test]
async fn widget_before_save_adds_slug() {
    let base = spawn_test_server().await;
    let body = post(
        format!("{base}/webhooks/triggers"),
        json!({
            "triggerName": "beforeSave",
            "object": {"className": "Widget", "name": "Blue Sprocket"}
        }),
    )
    .await;
    assert_eq!(
        body,
        json!({"success": {
            "className": "Widget",
            "name": "Blue Sprocket",
            "slug": "blue-sprocket"
        }})
    );
}

#[tokio::test]
async fn widget_before_save_requires_name() {
    let base = spawn_test_server().await;
    let body = post(
        format!("{base}/webhooks/triggers"),
        json!({
            "triggerName": "beforeSave",
            "object": {"className": "Widget", "name": "  "}
        }),
    )
    .await;
    assert_eq!(body, json!({"error": "Widget must have a name"}));
}

#[tokio::test]
async fn widget_after_save_is_acknowledged() {
    let base = spawn_test_server().await;
    let body = post(
        format!("{base}/webhooks/triggers"),
        json!({
            "triggerName": "afterSave",
            "object": {"className": "Widget", "objectId": "w1", "name": "Sprocket"}
        }),
    )
    .await;
    assert_eq!(body, json!({"success": {}}));
}

// ── Routing ─────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_gets_unauthorized_envelope() {
    let base = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/webhooks/functions/hello"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "Unauthorized Request."}));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let base = spawn_test_server().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/nonexistent"))
        .header(WEBHOOK_KEY_HEADER, KEY)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
