//! redeemform
//!
//! Field validation and guarded submission for a redemption-code claim form.
//!
//! - `engine` holds the rule table, the validator and the submission
//!   controller, plus the `Presenter` and `RedemptionBackend` seams.
//! - `backends` and `presenters` hold the concrete implementations shipped
//!   with the CLI.

pub mod attempt_id;
pub mod backends;
pub mod cli;
pub mod config;
pub mod engine;
pub mod presenters;
pub mod runner;
pub mod util;
