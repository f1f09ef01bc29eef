use serde::{Deserialize, Serialize};

/// One presenter notification, as recorded by collecting presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenterEvent {
    FieldReported {
        field: String,
        valid: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        message: Option<String>,
    },
    BusyChanged {
        busy: bool,
    },
    Succeeded {
        code: String,
        timestamp: String,
    },
    Failed {
        reason: String,
    },
}

impl PresenterEvent {
    pub fn field_reported(field: &str, valid: bool, message: Option<&str>) -> Self {
        Self::FieldReported {
            field: field.to_string(),
            valid,
            message: message.map(str::to_string),
        }
    }

    /// Whether this event ends an attempt (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}
