use crate::{CloudError, CloudResult, HttpClient, Responder, TriggerKind};
use cloudhook_model::CloudObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

/// JSON body the platform posts to a webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl WebhookBody {
    /// Parses `triggerName`.
    pub fn trigger_kind(&self) -> CloudResult<TriggerKind> {
        self.trigger_name
            .as_deref()
            .ok_or(CloudError::MissingTriggerName)?
            .parse()
    }
}

/// What a handler receives: the normalized request plus its two outcomes.
///
/// Built fresh for every request by the pipeline steps and dropped once the
/// handler returns.
#[derive(Debug, Clone)]
pub struct CloudContext {
    pub(crate) function_name: Option<String>,
    pub(crate) trigger: Option<TriggerKind>,
    pub(crate) object: Option<CloudObject>,
    pub(crate) user: Option<CloudObject>,
    pub(crate) master: Option<bool>,
    pub(crate) installation_id: Option<String>,
    pub(crate) params: Value,
    pub(crate) responder: Option<Responder>,
    http: HttpClient,
}

impl CloudContext {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self {
            function_name: None,
            trigger: None,
            object: None,
            user: None,
            master: None,
            installation_id: None,
            params: Value::Null,
            responder: None,
            http,
        }
    }

    /// Name of the cloud function being run; `None` for triggers.
    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    /// Trigger being run; `None` for functions.
    pub fn trigger(&self) -> Option<TriggerKind> {
        self.trigger
    }

    /// The object the trigger fired for, with any update already merged in.
    pub fn object(&self) -> Option<&CloudObject> {
        self.object.as_ref()
    }

    pub fn object_mut(&mut self) -> Option<&mut CloudObject> {
        self.object.as_mut()
    }

    /// The requesting user, when the call was made on behalf of one.
    pub fn user(&self) -> Option<&CloudObject> {
        self.user.as_ref()
    }

    /// Whether the call was made with the master key, when the platform says.
    pub fn master(&self) -> Option<bool> {
        self.master
    }

    pub fn is_master(&self) -> bool {
        self.master.unwrap_or(false)
    }

    pub fn installation_id(&self) -> Option<&str> {
        self.installation_id.as_deref()
    }

    /// Function params; `Value::Null` when none were sent.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Deserializes the params into a typed struct.
    pub fn params_as<T: serde::de::DeserializeOwned>(&self) -> CloudResult<T> {
        Ok(serde_json::from_value(self.params.clone())?)
    }

    /// Outbound HTTP helper for calling external services.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Responds `{"success": value}`; falsy values become `true`.
    pub fn success(&self, value: impl Serialize) {
        self.respond(value, true);
    }

    /// Responds `{"error": value}`; falsy values become `true`.
    pub fn error(&self, value: impl Serialize) {
        self.respond(value, false);
    }

    /// Responds with the trigger object, including changes made by the handler.
    ///
    /// This is the reply a beforeSave hook uses to alter the object being saved.
    pub fn success_with_object(&self) {
        match &self.object {
            Some(object) => self.success(object.to_json()),
            None => self.success(()),
        }
    }

    /// Whether an envelope has already gone out for this request.
    pub fn has_responded(&self) -> bool {
        self.responder.as_ref().is_some_and(Responder::is_sent)
    }

    fn respond(&self, value: impl Serialize, success: bool) {
        let Some(responder) = &self.responder else {
            error!("no responder attached to this request; dropping response");
            return;
        };
        match serde_json::to_value(value) {
            Ok(value) if success => responder.success(value),
            Ok(value) => responder.error(value),
            Err(e) => responder.error(e.to_string()),
        }
    }
}
