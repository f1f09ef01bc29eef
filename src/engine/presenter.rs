/// The presentation boundary the core reports to.
///
/// Methods take `&self`: one presenter is shared by the controller across
/// attempts, so implementations use interior mutability where they keep state.
pub trait Presenter: Send + Sync {
    /// Once per field per validation pass. `message` is `None` when valid.
    fn report_field_validity(&self, field: &str, valid: bool, message: Option<&str>);

    /// `true` on entering InFlight, `false` on every return to Idle.
    fn set_busy(&self, busy: bool);

    /// Terminal success. Presenters that own form fields reset them here.
    fn on_success(&self, code: &str, timestamp: &str);

    /// Terminal failure. Never paired with `on_success` for the same attempt.
    fn on_failure(&self, reason: &str);
}
