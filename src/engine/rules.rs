// src/engine/rules.rs

//! Field rule table.
//!
//! Rules are plain data. A single interpreter (`engine::validate`) walks them,
//! so adding a field means adding a table entry, not a function.
//!
//! The table is built once and never mutated afterwards. Lookups by field
//! name are hash lookups; a name with no entry is unconstrained.

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

pub const FIELD_EMAIL: &str = "email";
pub const FIELD_USERNAME: &str = "username";
pub const FIELD_REDEEM_CODE: &str = "redeemCode";
pub const FIELD_TERMS: &str = "terms";

/// Fallback reason for a required field whose rule carries no message.
pub const REQUIRED_MESSAGE: &str = "此欄位為必填";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9\x{4E00}-\x{9FFF}_-]+$";
const REDEEM_CODE_PATTERN: &str = r"^[A-Z0-9-]+$";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for field '{field}': {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("field '{field}' has min_length {min} greater than max_length {max}")]
    LengthBounds { field: String, min: usize, max: usize },
}

/// Constraints for one field.
///
/// `message` is the single reason reported for any failure of this rule;
/// sub-checks are not distinguished.
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    pub required: bool,
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub message: Option<String>,
}

impl FieldRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    /// Attach a pattern. The pattern must be anchored by the caller if a
    /// full match is intended.
    pub fn pattern(mut self, field: &str, pattern: &str) -> Result<Self, RuleError> {
        let re = Regex::new(pattern).map_err(|source| RuleError::Pattern {
            field: field.to_string(),
            source,
        })?;
        self.pattern = Some(re);
        Ok(self)
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Reason reported when this rule fails.
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| REQUIRED_MESSAGE.to_string())
    }
}

/// Immutable mapping from field name to rule.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<String, FieldRule>,
    order: Vec<String>,
}

impl RuleTable {
    /// The redemption form's fixed rule set.
    pub fn standard() -> Result<Self, RuleError> {
        RuleTableBuilder::new()
            .rule(
                FIELD_EMAIL,
                FieldRule::required()
                    .pattern(FIELD_EMAIL, EMAIL_PATTERN)?
                    .message("請輸入有效的電子郵件地址"),
            )
            .rule(
                FIELD_USERNAME,
                FieldRule::required()
                    .pattern(FIELD_USERNAME, USERNAME_PATTERN)?
                    .length(2, 50)
                    .message("使用者名稱只能包含中英文、數字、底線和連字號，長度2-50字元"),
            )
            .rule(
                FIELD_REDEEM_CODE,
                FieldRule::required()
                    .pattern(FIELD_REDEEM_CODE, REDEEM_CODE_PATTERN)?
                    .length(6, 20)
                    .message("兌換碼格式不正確，只能包含大寫字母、數字和連字號，長度6-20字元"),
            )
            .rule(
                FIELD_TERMS,
                FieldRule::required().message("請同意服務條款和隱私政策"),
            )
            .build()
    }

    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::new()
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    /// Registered field names in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    entries: Vec<(String, FieldRule)>,
}

impl RuleTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. A later entry for the same field replaces the earlier one.
    pub fn rule(mut self, field: impl Into<String>, rule: FieldRule) -> Self {
        let field = field.into();
        self.entries.retain(|(name, _)| *name != field);
        self.entries.push((field, rule));
        self
    }

    pub fn build(self) -> Result<RuleTable, RuleError> {
        let mut table = RuleTable::default();

        for (field, rule) in self.entries {
            if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
                if min > max {
                    return Err(RuleError::LengthBounds { field, min, max });
                }
            }

            table.order.push(field.clone());
            table.rules.insert(field, rule);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_registers_the_four_form_fields() {
        let table = RuleTable::standard().expect("standard rules");
        let fields: Vec<&str> = table.fields().collect();
        assert_eq!(fields, vec!["email", "username", "redeemCode", "terms"]);
        assert!(table.fields().all(|f| table.get(f).is_some_and(|r| r.required)));
    }

    #[test]
    fn unknown_field_has_no_rule() {
        let table = RuleTable::standard().expect("standard rules");
        assert!(table.get("nickname").is_none());
    }

    #[test]
    fn bad_pattern_is_reported_with_field_name() {
        let err = FieldRule::required().pattern("zip", "([0-9]").unwrap_err();
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn inverted_length_bounds_are_rejected() {
        let err = RuleTable::builder()
            .rule("pin", FieldRule::required().length(8, 4))
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::LengthBounds { min: 8, max: 4, .. }));
    }

    #[test]
    fn missing_message_falls_back_to_required_text() {
        assert_eq!(FieldRule::required().failure_message(), REQUIRED_MESSAGE);
    }
}
