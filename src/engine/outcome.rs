use serde::Serialize;

use crate::attempt_id::AttemptId;

/// Reason shown when the service rejects a code.
pub const REJECTED_REASON: &str = "兌換碼無效或已過期，請檢查後重試";

/// Reason shown when the request itself faulted.
pub const CONNECTIVITY_REASON: &str = "網路連線錯誤，請稍後再試";

/// Terminal result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Success { code: String, timestamp: String },
    Failure { reason: String },
}

impl SubmissionOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// What `SubmissionController::submit` hands back for a completed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub attempt_id: AttemptId,
    pub outcome: SubmissionOutcome,
}
