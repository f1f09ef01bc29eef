// src/backends/simulated.rs

//! Stand-in for the redemption service.
//!
//! Waits a fixed latency, then succeeds with probability 0.9. A success
//! carries a locally generated placeholder code; nothing is looked up.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use crate::engine::backend::{BackendError, RedemptionBackend, RedemptionReply, RedemptionRequest};
use crate::engine::code::generate_redeem_code;
use crate::engine::outcome::REJECTED_REASON;

pub const SIMULATED_LATENCY: Duration = Duration::from_millis(2000);

/// A roll strictly above this succeeds.
const FAILURE_THRESHOLD: f64 = 0.1;

pub struct SimulatedBackend {
    rng: Mutex<StdRng>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible outcomes and codes for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn draw(&self) -> Result<RedemptionReply, BackendError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| BackendError::Fault("random source poisoned".to_string()))?;

        let roll: f64 = rng.gen();
        Ok(reply_for_roll(roll, &mut *rng))
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reply_for_roll<R: Rng + ?Sized>(roll: f64, rng: &mut R) -> RedemptionReply {
    if roll > FAILURE_THRESHOLD {
        RedemptionReply::Granted {
            code: generate_redeem_code(rng),
        }
    } else {
        RedemptionReply::Rejected {
            reason: REJECTED_REASON.to_string(),
        }
    }
}

#[async_trait]
impl RedemptionBackend for SimulatedBackend {
    async fn redeem(&self, request: RedemptionRequest) -> Result<RedemptionReply, BackendError> {
        tracing::debug!(attempt_id = %request.attempt_id, "simulating redemption round-trip");
        tokio::time::sleep(SIMULATED_LATENCY).await;
        self.draw()
    }
}
