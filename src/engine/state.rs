use serde::Serialize;

/// Whether a redemption attempt is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
}

impl SubmissionState {
    pub fn from_in_flight(in_flight: bool) -> Self {
        if in_flight {
            Self::InFlight
        } else {
            Self::Idle
        }
    }
}
