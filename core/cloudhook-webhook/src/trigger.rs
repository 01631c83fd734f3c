use crate::CloudError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database lifecycle event a trigger handler is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 4] = [
        TriggerKind::BeforeSave,
        TriggerKind::AfterSave,
        TriggerKind::BeforeDelete,
        TriggerKind::AfterDelete,
    ];

    /// Wire name, as sent in `triggerName`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::BeforeSave => "beforeSave",
            TriggerKind::AfterSave => "afterSave",
            TriggerKind::BeforeDelete => "beforeDelete",
            TriggerKind::AfterDelete => "afterDelete",
        }
    }

    /// After-triggers are acknowledged with an empty success before the handler runs.
    pub fn is_after(&self) -> bool {
        self.as_str().starts_with("after")
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CloudError::UnknownTrigger(s.to_string()))
    }
}
