use crate::{Envelope, WebhookKey};
use axum::Json;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

/// Header carrying the shared webhook secret.
pub const WEBHOOK_KEY_HEADER: &str = "X-Parse-Webhook-Key";

/// Error payload returned to callers that fail the key check.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized Request.";

/// Middleware that rejects requests whose webhook key does not match.
///
/// Rejections are answered with HTTP 200 and an error envelope, before the
/// body is read.
pub async fn require_webhook_key(
    State(key): State<WebhookKey>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(WEBHOOK_KEY_HEADER)
        .map(|value| value.as_bytes());
    if !key.matches(presented) {
        warn!(
            path = %request.uri().path(),
            header_present = presented.is_some(),
            "rejected webhook request with bad key"
        );
        return Json(Envelope::error(UNAUTHORIZED_MESSAGE)).into_response();
    }
    next.run(request).await
}
