use crate::app::{AppState, WebhookApps};
use crate::{CloudContext, CloudResult, HttpClient, Registry, TriggerKind, WebhookConfig};
use cloudhook_model::{CloudObject, JsonCodec, ObjectCodec};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Anything a trigger can be registered against: a class name, or an
/// object whose class is used.
pub trait ClassTarget {
    fn class_name(&self) -> &str;
}

impl ClassTarget for str {
    fn class_name(&self) -> &str {
        self
    }
}

impl ClassTarget for String {
    fn class_name(&self) -> &str {
        self
    }
}

impl ClassTarget for CloudObject {
    fn class_name(&self) -> &str {
        CloudObject::class_name(self)
    }
}

impl<T: ClassTarget + ?Sized> ClassTarget for &T {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }
}

/// Registration surface for Cloud Code handlers.
///
/// ```no_run
/// # use cloudhook_webhook::{Cloud, WebhookConfig};
/// # fn main() -> cloudhook_webhook::CloudResult<()> {
/// let mut cloud = Cloud::new(WebhookConfig::from_env()?)?;
/// cloud.define("hello", |ctx| async move { ctx.success("hi") })?;
/// cloud.before_save("Widget", |ctx| async move { ctx.success_with_object() })?;
/// let apps = cloud.into_apps();
/// let app = axum::Router::new()
///     .nest("/webhooks/functions", apps.functions)
///     .nest("/webhooks/triggers", apps.triggers);
/// # let _ = app;
/// # Ok(())
/// # }
/// ```
pub struct Cloud {
    config: WebhookConfig,
    registry: Registry,
    codec: Arc<dyn ObjectCodec>,
    http: HttpClient,
}

impl Cloud {
    pub fn new(config: WebhookConfig) -> CloudResult<Self> {
        Ok(Self {
            config,
            registry: Registry::new(),
            codec: Arc::new(JsonCodec),
            http: HttpClient::new()?,
        })
    }

    /// Replaces the default JSON codec used to materialize objects and users.
    pub fn with_codec(mut self, codec: impl ObjectCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Defines a cloud function served at `POST /{name}` on the function app.
    pub fn define<F, Fut>(&mut self, name: &str, handler: F) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.define(name, Arc::new(handler))?;
        debug!(function = name, "defined cloud function");
        Ok(self)
    }

    pub fn before_save<F, Fut>(
        &mut self,
        class: impl ClassTarget,
        handler: F,
    ) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(class.class_name(), TriggerKind::BeforeSave, handler)
    }

    pub fn after_save<F, Fut>(
        &mut self,
        class: impl ClassTarget,
        handler: F,
    ) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(class.class_name(), TriggerKind::AfterSave, handler)
    }

    pub fn before_delete<F, Fut>(
        &mut self,
        class: impl ClassTarget,
        handler: F,
    ) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(class.class_name(), TriggerKind::BeforeDelete, handler)
    }

    pub fn after_delete<F, Fut>(
        &mut self,
        class: impl ClassTarget,
        handler: F,
    ) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(class.class_name(), TriggerKind::AfterDelete, handler)
    }

    /// Registers a trigger by kind.
    pub fn register<F, Fut>(
        &mut self,
        class_name: &str,
        kind: TriggerKind,
        handler: F,
    ) -> CloudResult<&mut Self>
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry
            .register_trigger(class_name, kind, Arc::new(handler))?;
        debug!(class = class_name, trigger = %kind, "registered trigger");
        Ok(self)
    }

    /// Background jobs are not run by webhooks; the handler is dropped.
    pub fn job<F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        drop(handler);
        warn!(job = name, "running jobs is not supported; job ignored");
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Outbound HTTP helper, the same one handlers get through their context.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Freezes the registry and builds the function and trigger routers.
    pub fn into_apps(self) -> WebhookApps {
        let state = AppState {
            registry: self.registry,
            codec: self.codec,
            http: self.http,
        };
        WebhookApps::build(self.config.webhook_key, state)
    }
}
