use crate::{CloudContext, CloudError, CloudResult, TriggerKind};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An application-supplied webhook handler.
///
/// Implemented for every `Fn(CloudContext) -> impl Future<Output = ()>`; the
/// handler reports its outcome through [`CloudContext::success`] or
/// [`CloudContext::error`].
pub trait CloudHandler: Send + Sync + 'static {
    fn call(&self, ctx: CloudContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> CloudHandler for F
where
    F: Fn(CloudContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: CloudContext) -> BoxFuture<'static, ()> {
        Box::pin(self(ctx))
    }
}

impl fmt::Debug for dyn CloudHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CloudHandler")
    }
}

pub type HandlerRef = Arc<dyn CloudHandler>;

/// The dispatch table: function handlers by name, trigger handlers by
/// (class name, trigger kind).
///
/// Filled during registration, then shared read-only by the routers.
/// Registering the same key again replaces the previous handler.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, HandlerRef>,
    triggers: HashMap<String, HashMap<TriggerKind, HandlerRef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, handler: HandlerRef) -> CloudResult<()> {
        validate_name("function", name)?;
        self.functions.insert(name.to_string(), handler);
        Ok(())
    }

    pub fn register_trigger(
        &mut self,
        class_name: &str,
        kind: TriggerKind,
        handler: HandlerRef,
    ) -> CloudResult<()> {
        if class_name.is_empty() {
            return Err(CloudError::InvalidName {
                kind: "class",
                name: String::new(),
            });
        }
        self.triggers
            .entry(class_name.to_string())
            .or_default()
            .insert(kind, handler);
        Ok(())
    }

    /// Looks up a trigger handler. A missing entry is a configuration error.
    pub fn trigger(&self, class_name: &str, kind: TriggerKind) -> CloudResult<&HandlerRef> {
        self.triggers
            .get(class_name)
            .and_then(|by_kind| by_kind.get(&kind))
            .ok_or_else(|| CloudError::UnregisteredTrigger {
                class_name: class_name.to_string(),
                kind,
            })
    }

    pub fn function(&self, name: &str) -> Option<&HandlerRef> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &HandlerRef)> {
        self.functions.iter().map(|(name, h)| (name.as_str(), h))
    }

    pub fn has_trigger(&self, class_name: &str, kind: TriggerKind) -> bool {
        self.trigger(class_name, kind).is_ok()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.values().map(HashMap::len).sum()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();
        let mut triggers: Vec<String> = self
            .triggers
            .iter()
            .flat_map(|(class, by_kind)| by_kind.keys().map(move |kind| format!("{class}.{kind}")))
            .collect();
        triggers.sort();
        f.debug_struct("Registry")
            .field("functions", &functions)
            .field("triggers", &triggers)
            .finish()
    }
}

/// Function names become route segments, so they must be a single plain segment.
fn validate_name(kind: &'static str, name: &str) -> CloudResult<()> {
    let reserved = ['/', '{', '}', '*', ':'];
    if name.is_empty() || name.contains(reserved) {
        return Err(CloudError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}
