// src/engine/controller.rs

//! Submission state machine.
//!
//! `Idle -> (submit, form valid) -> InFlight -> (settle) -> Idle`
//!
//! A submit that arrives while an attempt is in flight is refused without
//! side effects. Once started, an attempt runs on its own task until the
//! backend settles, even if the caller stops waiting for it. It then
//! delivers exactly one outcome, clears the flag and tells the presenter
//! `set_busy(false)` exactly once. That holds for backend errors and for
//! panics inside the backend too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::attempt_id::AttemptId;
use crate::engine::backend::{RedemptionBackend, RedemptionReply, RedemptionRequest};
use crate::engine::form::FormInput;
use crate::engine::outcome::{AttemptReport, SubmissionOutcome, CONNECTIVITY_REASON};
use crate::engine::presenter::Presenter;
use crate::engine::rules::RuleTable;
use crate::engine::state::SubmissionState;
use crate::engine::timestamp::{format_locale_timestamp, Clock, SystemClock};
use crate::engine::validate::{validate_field, validate_form};
use crate::engine::{FormValidation, ValidationResult};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("form has {} invalid field(s)", .0.invalid_fields().count())]
    Invalid(FormValidation),

    #[error("a redemption attempt is already in flight")]
    Busy,

    /// The runtime shut down before the attempt settled.
    #[error("redemption attempt was cancelled before it settled")]
    Interrupted,
}

pub struct SubmissionController {
    rules: Arc<RuleTable>,
    backend: Arc<dyn RedemptionBackend>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
    in_flight: Arc<AtomicBool>,
}

/// Holds the InFlight claim. Dropping it is the only way back to Idle.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    presenter: Arc<dyn Presenter>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.presenter.set_busy(false);
    }
}

/// Everything one attempt needs once it leaves the caller.
struct Attempt {
    id: AttemptId,
    backend: Arc<dyn RedemptionBackend>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,
}

impl Attempt {
    /// Request, dispatch, release. The guard is dropped last, after the
    /// outcome has been delivered.
    async fn run(self, request: RedemptionRequest, _guard: InFlightGuard) -> SubmissionOutcome {
        let outcome = self.request(request).await;

        match &outcome {
            SubmissionOutcome::Success { code, timestamp } => {
                tracing::info!(attempt_id = %self.id, "redemption succeeded");
                self.presenter.on_success(code, timestamp);
            }
            SubmissionOutcome::Failure { reason } => {
                tracing::info!(attempt_id = %self.id, reason = %reason, "redemption failed");
                self.presenter.on_failure(reason);
            }
        }

        outcome
    }

    /// Run the backend call on its own task so a panic inside it is observed
    /// as a fault instead of unwinding through the attempt.
    async fn request(&self, request: RedemptionRequest) -> SubmissionOutcome {
        let backend = Arc::clone(&self.backend);

        match tokio::spawn(async move { backend.redeem(request).await }).await {
            Ok(Ok(RedemptionReply::Granted { code })) => SubmissionOutcome::Success {
                code,
                timestamp: format_locale_timestamp(&self.clock.now()),
            },
            Ok(Ok(RedemptionReply::Rejected { reason })) => SubmissionOutcome::failure(reason),
            Ok(Err(e)) => {
                tracing::warn!(attempt_id = %self.id, error = %e, "redemption request faulted");
                SubmissionOutcome::failure(CONNECTIVITY_REASON)
            }
            Err(e) => {
                tracing::error!(attempt_id = %self.id, error = %e, "redemption task aborted");
                SubmissionOutcome::failure(CONNECTIVITY_REASON)
            }
        }
    }
}

impl SubmissionController {
    pub fn new(
        rules: Arc<RuleTable>,
        backend: Arc<dyn RedemptionBackend>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            rules,
            backend,
            presenter,
            clock: Arc::new(SystemClock),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SubmissionState {
        SubmissionState::from_in_flight(self.in_flight.load(Ordering::Acquire))
    }

    /// Validate one field (e.g. when it loses focus) and report it.
    pub fn check_field(&self, field: &str, raw_value: &str) -> ValidationResult {
        let result = validate_field(&self.rules, field, raw_value);
        self.presenter
            .report_field_validity(field, result.valid, result.message.as_deref());
        result
    }

    /// Withdraw any error shown for a field (e.g. while the user is typing).
    pub fn clear_field(&self, field: &str) {
        self.presenter.report_field_validity(field, true, None);
    }

    /// Validate the form and, if it passes, run one redemption attempt.
    ///
    /// Dropping the returned future does not cancel the attempt; it still
    /// settles and notifies the presenter, and the controller stays InFlight
    /// until it does.
    pub async fn submit(&self, form: &FormInput) -> Result<AttemptReport, SubmitError> {
        if self.in_flight.load(Ordering::Acquire) {
            tracing::debug!("submit ignored, attempt in flight");
            return Err(SubmitError::Busy);
        }

        let validation = validate_form(&self.rules, form, self.presenter.as_ref());
        if !validation.all_valid {
            tracing::info!(
                first_invalid = validation.first_invalid.as_deref().unwrap_or_default(),
                "submission blocked by validation"
            );
            return Err(SubmitError::Invalid(validation));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("submit lost race for in-flight slot");
            return Err(SubmitError::Busy);
        }

        self.presenter.set_busy(true);
        let guard = InFlightGuard {
            flag: Arc::clone(&self.in_flight),
            presenter: Arc::clone(&self.presenter),
        };

        let attempt_id = AttemptId::new();
        tracing::info!(attempt_id = %attempt_id, "redemption attempt started");

        let request = RedemptionRequest::from_form(attempt_id.clone(), form);
        let attempt = Attempt {
            id: attempt_id.clone(),
            backend: Arc::clone(&self.backend),
            presenter: Arc::clone(&self.presenter),
            clock: Arc::clone(&self.clock),
        };

        match tokio::spawn(attempt.run(request, guard)).await {
            Ok(outcome) => Ok(AttemptReport {
                attempt_id,
                outcome,
            }),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(SubmitError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::{SimulatedBackend, SIMULATED_LATENCY};
    use crate::engine::backend::BackendError;
    use crate::engine::code::is_generated_code;
    use crate::engine::events::PresenterEvent;
    use crate::engine::form::CHECKED;
    use crate::engine::outcome::REJECTED_REASON;
    use crate::engine::rules::{FIELD_EMAIL, FIELD_REDEEM_CODE, FIELD_TERMS, FIELD_USERNAME};
    use crate::engine::timestamp::FixedClock;
    use crate::presenters::recording::RecordingPresenter;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    enum Script {
        Grant(&'static str),
        Reject,
        Error,
        Panic,
    }

    struct ScriptedBackend {
        script: Script,
        delay: Duration,
        calls: AtomicUsize,
        live: AtomicUsize,
        max_live: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                delay: Duration::from_millis(50),
                calls: AtomicUsize::new(0),
                live: AtomicUsize::new(0),
                max_live: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Most backend calls ever running at the same time.
        fn max_live(&self) -> usize {
            self.max_live.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RedemptionBackend for ScriptedBackend {
        async fn redeem(&self, _request: RedemptionRequest) -> Result<RedemptionReply, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.live.fetch_sub(1, Ordering::SeqCst);

            match self.script {
                Script::Grant(code) => Ok(RedemptionReply::Granted {
                    code: code.to_string(),
                }),
                Script::Reject => Ok(RedemptionReply::Rejected {
                    reason: REJECTED_REASON.to_string(),
                }),
                Script::Error => Err(BackendError::Unreachable("connection reset".to_string())),
                Script::Panic => panic!("backend blew up"),
            }
        }
    }

    fn valid_form() -> FormInput {
        FormInput::new()
            .with(FIELD_EMAIL, "user@example.com")
            .with(FIELD_USERNAME, "張三_01")
            .with(FIELD_REDEEM_CODE, "ABC123-XYZ")
            .with(FIELD_TERMS, CHECKED)
    }

    fn fixed_clock() -> Arc<FixedClock> {
        let at = FixedOffset::east_opt(8 * 3600)
            .expect("offset")
            .with_ymd_and_hms(2025, 1, 15, 14, 30, 45)
            .single()
            .expect("valid time");
        Arc::new(FixedClock(at))
    }

    fn controller(
        backend: Arc<dyn RedemptionBackend>,
    ) -> (SubmissionController, Arc<RecordingPresenter>) {
        let presenter = Arc::new(RecordingPresenter::new());
        let rules = Arc::new(RuleTable::standard().expect("standard rules"));
        let controller = SubmissionController::new(rules, backend, presenter.clone())
            .with_clock(fixed_clock());
        (controller, presenter)
    }

    /// Events after the validation pass.
    fn attempt_events(presenter: &RecordingPresenter) -> Vec<PresenterEvent> {
        presenter
            .events()
            .into_iter()
            .filter(|e| !matches!(e, PresenterEvent::FieldReported { .. }))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn granted_code_is_reported_with_timestamp() {
        let backend = ScriptedBackend::new(Script::Grant("ABCDEF123456"));
        let (controller, presenter) = controller(backend.clone());

        let report = controller.submit(&valid_form()).await.expect("attempt");

        assert_eq!(
            report.outcome,
            SubmissionOutcome::Success {
                code: "ABCDEF123456".to_string(),
                timestamp: "2025/01/15 下午02:30:45".to_string(),
            }
        );
        assert!(report.attempt_id.0.starts_with("attempt_"));
        assert_eq!(
            attempt_events(&presenter),
            vec![
                PresenterEvent::BusyChanged { busy: true },
                PresenterEvent::Succeeded {
                    code: "ABCDEF123456".to_string(),
                    timestamp: "2025/01/15 下午02:30:45".to_string(),
                },
                PresenterEvent::BusyChanged { busy: false },
            ]
        );
        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_surfaces_service_reason() {
        let (controller, presenter) = controller(ScriptedBackend::new(Script::Reject));

        let report = controller.submit(&valid_form()).await.expect("attempt");

        assert_eq!(report.outcome, SubmissionOutcome::failure(REJECTED_REASON));
        assert_eq!(
            attempt_events(&presenter),
            vec![
                PresenterEvent::BusyChanged { busy: true },
                PresenterEvent::Failed {
                    reason: REJECTED_REASON.to_string()
                },
                PresenterEvent::BusyChanged { busy: false },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn backend_error_becomes_connectivity_failure() {
        let (controller, presenter) = controller(ScriptedBackend::new(Script::Error));

        let report = controller.submit(&valid_form()).await.expect("attempt");

        assert_eq!(report.outcome, SubmissionOutcome::failure(CONNECTIVITY_REASON));
        assert_eq!(attempt_events(&presenter).len(), 3);
        assert_eq!(controller.state(), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_panic_still_returns_to_idle() {
        let (controller, presenter) = controller(ScriptedBackend::new(Script::Panic));

        let report = controller.submit(&valid_form()).await.expect("attempt");

        assert_eq!(report.outcome, SubmissionOutcome::failure(CONNECTIVITY_REASON));
        assert_eq!(
            attempt_events(&presenter).last(),
            Some(&PresenterEvent::BusyChanged { busy: false })
        );
        assert_eq!(controller.state(), SubmissionState::Idle);

        // still usable afterwards
        assert!(controller.submit(&valid_form()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_form_never_reaches_backend() {
        let backend = ScriptedBackend::new(Script::Grant("ABCDEF123456"));
        let (controller, presenter) = controller(backend.clone());

        let mut form = valid_form();
        form.set(FIELD_EMAIL, "plainstring");

        match controller.submit(&form).await {
            Err(SubmitError::Invalid(validation)) => {
                assert_eq!(validation.first_invalid.as_deref(), Some(FIELD_EMAIL));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }

        assert_eq!(backend.calls(), 0);
        assert!(attempt_events(&presenter).is_empty());
        assert_eq!(presenter.events().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_submit_is_refused() {
        let backend = ScriptedBackend::new(Script::Grant("ABCDEF123456"));
        let (controller, presenter) = controller(backend.clone());
        let form = valid_form();

        let (first, second) = tokio::join!(controller.submit(&form), controller.submit(&form));

        let (done, refused) = if first.is_ok() { (first, second) } else { (second, first) };
        assert!(done.is_ok());
        assert!(matches!(refused, Err(SubmitError::Busy)));
        assert_eq!(backend.calls(), 1);

        let busy: Vec<bool> = presenter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::BusyChanged { busy } => Some(busy),
                _ => None,
            })
            .collect();
        assert_eq!(busy, vec![true, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn state_is_in_flight_while_waiting() {
        let (controller, _presenter) = controller(ScriptedBackend::new(Script::Reject));
        let form = valid_form();

        let observe = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.state()
        };

        let (report, during) = tokio::join!(controller.submit(&form), observe);
        assert!(report.is_ok());
        assert_eq!(during, SubmissionState::InFlight);
        assert_eq!(controller.state(), SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_settles_before_next_attempt() {
        let backend = ScriptedBackend::new(Script::Grant("ABCDEF123456"));
        let (controller, presenter) = controller(backend.clone());
        let form = valid_form();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), controller.submit(&form)).await;
        assert!(timed_out.is_err());

        // the attempt keeps the slot until the backend answers
        assert_eq!(controller.state(), SubmissionState::InFlight);
        assert!(matches!(controller.submit(&form).await, Err(SubmitError::Busy)));

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(
            attempt_events(&presenter),
            vec![
                PresenterEvent::BusyChanged { busy: true },
                PresenterEvent::Succeeded {
                    code: "ABCDEF123456".to_string(),
                    timestamp: "2025/01/15 下午02:30:45".to_string(),
                },
                PresenterEvent::BusyChanged { busy: false },
            ]
        );

        controller.submit(&form).await.expect("follow-up attempt");
        assert_eq!(backend.calls(), 2);
        assert_eq!(backend.max_live(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_attempts_keep_busy_bracketing() {
        let presenter = Arc::new(RecordingPresenter::new());
        let rules = Arc::new(RuleTable::standard().expect("standard rules"));
        let controller = SubmissionController::new(
            rules,
            Arc::new(SimulatedBackend::seeded(11)),
            presenter.clone(),
        );
        let form = valid_form();

        for _ in 0..40 {
            presenter.take();
            let started = tokio::time::Instant::now();
            let report = controller.submit(&form).await.expect("attempt");
            assert!(started.elapsed() >= SIMULATED_LATENCY);

            let events = attempt_events(&presenter);
            assert_eq!(events.len(), 3);
            assert_eq!(events[0], PresenterEvent::BusyChanged { busy: true });
            assert!(events[1].is_terminal());
            assert_eq!(events[2], PresenterEvent::BusyChanged { busy: false });

            if let SubmissionOutcome::Success { code, .. } = &report.outcome {
                assert!(is_generated_code(code));
            }
        }
    }

    #[test]
    fn check_field_reports_and_clear_field_withdraws() {
        let (controller, presenter) = controller(ScriptedBackend::new(Script::Reject));

        let result = controller.check_field(FIELD_USERNAME, "a");
        assert!(!result.valid);
        controller.clear_field(FIELD_USERNAME);

        assert_eq!(
            presenter.events(),
            vec![
                PresenterEvent::field_reported(FIELD_USERNAME, false, result.message.as_deref()),
                PresenterEvent::field_reported(FIELD_USERNAME, true, None),
            ]
        );
    }
}
