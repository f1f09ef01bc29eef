use crate::engine::form::FormInput;
use crate::engine::presenter::Presenter;
use crate::engine::rules::{FieldRule, RuleTable};
use crate::engine::{FormValidation, ValidationResult};

/// Check one field's value against its rule.
///
/// The value is trimmed first. Checks run in order (required, pattern,
/// length) and the first failure wins. Pattern and length are skipped for an
/// empty value, so an empty optional field is valid.
pub fn validate_field(rules: &RuleTable, field: &str, raw_value: &str) -> ValidationResult {
    match rules.get(field) {
        Some(rule) => check_rule(rule, raw_value.trim()),
        None => ValidationResult::ok(),
    }
}

fn check_rule(rule: &FieldRule, value: &str) -> ValidationResult {
    if value.is_empty() {
        return if rule.required {
            ValidationResult::error(rule.failure_message())
        } else {
            ValidationResult::ok()
        };
    }

    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(value) {
            return ValidationResult::error(rule.failure_message());
        }
    }

    let len = value.chars().count();

    if rule.min_length.is_some_and(|min| len < min) || rule.max_length.is_some_and(|max| len > max) {
        return ValidationResult::error(rule.failure_message());
    }

    ValidationResult::ok()
}

/// Validate a whole form and report every field to the presenter.
///
/// Fields are evaluated in form order, followed by any registered field the
/// form does not carry (checked as empty). Each is reported exactly once,
/// whether it passes or not.
pub fn validate_form(
    rules: &RuleTable,
    form: &FormInput,
    presenter: &dyn Presenter,
) -> FormValidation {
    let mut validation = FormValidation::new();

    let present = form.iter().map(|f| (f.name.as_str(), f.raw_value.as_str()));
    let missing = rules
        .fields()
        .filter(|name| form.get(name).is_none())
        .map(|name| (name, ""));

    for (field, raw_value) in present.chain(missing) {
        let result = validate_field(rules, field, raw_value);

        presenter.report_field_validity(field, result.valid, result.message.as_deref());

        if !result.valid {
            tracing::debug!(field, "field failed validation");
        }

        validation.push(field, result);
    }

    validation
}
