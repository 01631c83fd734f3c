use crate::{CloudError, CloudResult};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the shared webhook secret.
pub const WEBHOOK_KEY_ENV: &str = "PARSE_WEBHOOK_KEY";

/// The shared secret every webhook request must present.
///
/// Never empty: an unset key would otherwise match a request that sends no
/// header at all.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookKey(Arc<str>);

impl WebhookKey {
    pub fn new(key: impl AsRef<str>) -> CloudResult<Self> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(CloudError::MissingWebhookKey);
        }
        Ok(Self(Arc::from(key)))
    }

    /// Exact comparison against a presented header value.
    pub fn matches(&self, presented: Option<&[u8]>) -> bool {
        presented == Some(self.0.as_bytes())
    }
}

impl fmt::Debug for WebhookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookKey(<redacted>)")
    }
}

/// Process-level webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub webhook_key: WebhookKey,
}

impl WebhookConfig {
    pub fn new(webhook_key: WebhookKey) -> Self {
        Self { webhook_key }
    }

    /// Reads [`WEBHOOK_KEY_ENV`]. Fails when it is unset or empty.
    pub fn from_env() -> CloudResult<Self> {
        Self::from_value(std::env::var(WEBHOOK_KEY_ENV).ok())
    }

    /// Builds the config from an already-read variable value.
    pub fn from_value(value: Option<String>) -> CloudResult<Self> {
        let raw = value.ok_or(CloudError::MissingWebhookKey)?;
        Ok(Self::new(WebhookKey::new(raw)?))
    }
}
