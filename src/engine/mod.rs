use serde::Serialize;
use std::collections::BTreeMap;

pub mod backend;
pub mod code;
pub mod controller;
pub mod events;
pub mod form;
pub mod outcome;
pub mod presenter;
pub mod rules;
pub mod state;
pub mod timestamp;
pub mod validate;

pub use backend::{BackendError, RedemptionBackend, RedemptionReply, RedemptionRequest};
pub use controller::{SubmissionController, SubmitError};
pub use form::{FieldValue, FormError, FormInput};
pub use outcome::{AttemptReport, SubmissionOutcome};
pub use presenter::Presenter;
pub use rules::{FieldRule, RuleError, RuleTable};
pub use state::SubmissionState;
pub use validate::{validate_field, validate_form};

/* ---------------- validation ---------------- */

/// Result of checking one field against its rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Result of one whole-form validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub all_valid: bool,
    pub fields: BTreeMap<String, ValidationResult>,

    /// First failing field in evaluation order, for re-focusing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid: Option<String>,
}

impl FormValidation {
    pub fn new() -> Self {
        Self {
            all_valid: true,
            fields: BTreeMap::new(),
            first_invalid: None,
        }
    }

    pub fn push(&mut self, field: impl Into<String>, result: ValidationResult) {
        let field = field.into();

        if !result.valid {
            self.all_valid = false;
            if self.first_invalid.is_none() {
                self.first_invalid = Some(field.clone());
            }
        }

        self.fields.insert(field, result);
    }

    pub fn invalid_fields(&self) -> impl Iterator<Item = (&str, &ValidationResult)> {
        self.fields
            .iter()
            .filter(|(_, r)| !r.valid)
            .map(|(f, r)| (f.as_str(), r))
    }
}

impl Default for FormValidation {
    fn default() -> Self {
        Self::new()
    }
}
