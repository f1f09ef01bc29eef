use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::attempt_id::AttemptId;
use crate::engine::form::FormInput;

/// Payload sent to the redemption service. Values are trimmed.
#[derive(Debug, Clone, Serialize)]
pub struct RedemptionRequest {
    pub attempt_id: AttemptId,
    pub fields: BTreeMap<String, String>,
}

impl RedemptionRequest {
    pub fn from_form(attempt_id: AttemptId, form: &FormInput) -> Self {
        let fields = form
            .iter()
            .map(|f| (f.name.clone(), f.raw_value.trim().to_string()))
            .collect();

        Self { attempt_id, fields }
    }
}

/// Answer from a service that was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionReply {
    Granted { code: String },
    Rejected { reason: String },
}

/// The service could not be asked, or broke while answering.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("redemption service unreachable: {0}")]
    Unreachable(String),

    #[error("redemption backend fault: {0}")]
    Fault(String),
}

#[async_trait]
pub trait RedemptionBackend: Send + Sync {
    async fn redeem(&self, request: RedemptionRequest) -> Result<RedemptionReply, BackendError>;
}
